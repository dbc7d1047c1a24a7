// Copyright (C) 2024 Daniel Mueller <deso@posteo.net>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::PathBuf;

use clap::ArgAction;
use clap::Parser;


/// A program for composing and sending a simple email.
///
/// Parts of the email that are not provided as options are asked for
/// interactively.
#[derive(Debug, Parser)]
#[clap(version = env!("VERSION"))]
#[clap(after_help = "Example: new-email -m custom_mailer --content-type text/xml
Read the body from a file: new-email --body-input=file -b /path/to/file")]
pub(crate) struct Args {
  /// The "From" address of the message.
  #[clap(short, long)]
  pub from: Option<String>,
  /// The "To" address of the message; multiple addresses may be
  /// separated by commas.
  #[clap(short, long)]
  pub to: Option<String>,
  /// The subject of the message.
  #[clap(long)]
  pub subject: Option<String>,
  /// The body of the message.
  ///
  /// With `--body-input=file` this is the path to a file containing the
  /// body instead.
  #[clap(short, long)]
  pub body: Option<String>,
  /// The name of the mailer to use.
  #[clap(short, long, default_value = "default")]
  pub mailer: String,
  /// The content type of the body.
  ///
  /// See https://www.iana.org/assignments/media-types/media-types.xhtml
  #[clap(long, default_value = "text/html")]
  pub content_type: String,
  /// The charset of the body.
  #[clap(long, default_value = "UTF8")]
  pub charset: String,
  /// Where the body comes from: 'stdin' or 'file'.
  #[clap(long, default_value = "stdin")]
  pub body_input: String,
  /// The path to the configuration file.
  #[clap(short, long)]
  pub config: Option<PathBuf>,
  /// Increase verbosity (can be supplied multiple times).
  #[clap(short = 'v', long = "verbose", global = true, action = ArgAction::Count)]
  pub verbosity: u8,
}


#[cfg(test)]
mod tests {
  use super::*;

  use std::path::Path;


  /// Check that options are parsed with their defaults.
  #[test]
  fn parse_defaults() {
    let args = Args::try_parse_from(["new-email"]).unwrap();
    assert_eq!(args.from, None);
    assert_eq!(args.to, None);
    assert_eq!(args.subject, None);
    assert_eq!(args.body, None);
    assert_eq!(args.mailer, "default");
    assert_eq!(args.content_type, "text/html");
    assert_eq!(args.charset, "UTF8");
    assert_eq!(args.body_input, "stdin");
    assert_eq!(args.config, None);
    assert_eq!(args.verbosity, 0);
  }

  /// Check that short and long options are recognized.
  #[test]
  fn parse_options() {
    let args = Args::try_parse_from([
      "new-email",
      "-f",
      "a@x.com",
      "-t",
      "b@x.com",
      "--subject=Hi",
      "-b",
      "/path/to/file",
      "-m",
      "custom_mailer",
      "--content-type",
      "text/xml",
      "--charset=latin1",
      "--body-input=file",
      "-c",
      "config.json",
      "-vv",
    ])
    .unwrap();

    assert_eq!(args.from.as_deref(), Some("a@x.com"));
    assert_eq!(args.to.as_deref(), Some("b@x.com"));
    assert_eq!(args.subject.as_deref(), Some("Hi"));
    assert_eq!(args.body.as_deref(), Some("/path/to/file"));
    assert_eq!(args.mailer, "custom_mailer");
    assert_eq!(args.content_type, "text/xml");
    assert_eq!(args.charset, "latin1");
    assert_eq!(args.body_input, "file");
    assert_eq!(args.config.as_deref(), Some(Path::new("config.json")));
    assert_eq!(args.verbosity, 2);
  }

  /// Make sure that help output is not treated as a failure.
  #[test]
  fn help_is_not_an_error() {
    let err = Args::try_parse_from(["new-email", "--help"]).unwrap_err();
    assert!(!err.use_stderr());

    let err = Args::try_parse_from(["new-email", "--bogus"]).unwrap_err();
    assert!(err.use_stderr());
  }
}
