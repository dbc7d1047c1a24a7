// Copyright (C) 2024 Daniel Mueller <deso@posteo.net>
// SPDX-License-Identifier: GPL-3.0-or-later

#![allow(
  clippy::collapsible_if,
  clippy::fn_to_numeric_cast,
  clippy::let_and_return,
  clippy::let_unit_value
)]

mod args;
mod prompt;

use std::borrow::Cow;
use std::env::args_os;
use std::env::var_os;
use std::ffi::OsString;
use std::io;
use std::io::BufRead;
use std::io::Write;

use clap::Parser as _;

use anyhow::ensure;
use anyhow::Context as _;
use anyhow::Result;

use mailcompose::is_enabled;
use mailcompose::send_new_email;
use mailcompose::system_config_path;
use mailcompose::ComposeOpts;
use mailcompose::Config;
use mailcompose::FsReader;
use mailcompose::DEFAULT_MAILER;

use tracing::debug;
use tracing::info;
use tracing::subscriber::set_global_default as set_global_subscriber;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::FmtSubscriber;

use crate::args::Args;
use crate::prompt::TerminalPrompter;


async fn run_impl<R, W>(args: Args, input: R, mut output: W) -> Result<()>
where
  R: BufRead,
  W: Write,
{
  let Args {
    from,
    to,
    subject,
    body,
    mailer,
    content_type,
    charset,
    body_input,
    config,
    verbosity: _,
  } = args;

  let path = if let Some(config) = config {
    Cow::Owned(config)
  } else {
    system_config_path()?
  };
  debug!(path = %path.display(), "loading configuration");

  let config = Config::load(&path).await?;
  let mut registry = config.into_registry();

  ensure!(
    is_enabled(&registry),
    "no `{DEFAULT_MAILER}` mailer configured in `{}`",
    path.display()
  );

  let opts = ComposeOpts {
    mailer,
    from,
    to,
    subject,
    body,
    content_type,
    charset,
    body_input,
  };

  let count = {
    let mut prompter = TerminalPrompter::new(input, &mut output);
    send_new_email(opts, &mut registry, &mut prompter, &FsReader).await?
  };
  info!(count, "email sent");

  let () = writeln!(output, "Sent {count} emails").context("failed to report sent emails")?;
  Ok(())
}

/// Install a global tracing subscriber logging to stderr.
///
/// Without any `-v` the filter is taken from the environment.
fn setup_tracing(verbosity: u8) -> Result<()> {
  let level = match verbosity {
    0 => None,
    1 => Some(LevelFilter::INFO),
    2 => Some(LevelFilter::DEBUG),
    _ => Some(LevelFilter::TRACE),
  };

  let filter = if let Some(level) = level {
    EnvFilter::default().add_directive(level.into())
  } else {
    let directive = var_os(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    let directive = directive
      .to_str()
      .with_context(|| format!("env var `{}` is not valid UTF-8", EnvFilter::DEFAULT_ENV))?;
    EnvFilter::new(directive)
  };

  // Standard output is reserved for prompts and the final report.
  let subscriber = FmtSubscriber::builder()
    .with_writer(io::stderr)
    .with_timer(ChronoLocal::new("%Y-%m-%dT%H:%M:%S%.3f%:z".to_string()))
    .with_env_filter(filter)
    .finish();
  set_global_subscriber(subscriber).context("failed to set tracing subscriber")
}


/// Parse arguments, compose the email, and send it.
async fn run<A, T>(args: A) -> Result<()>
where
  A: IntoIterator<Item = T>,
  T: Into<OsString> + Clone,
{
  let args = match Args::try_parse_from(args) {
    Ok(args) => args,
    // Help and version output are not errors.
    Err(err) if !err.use_stderr() => {
      let () = err.print().context("failed to print usage information")?;
      return Ok(())
    },
    Err(err) => return Err(err.into()),
  };

  let () = setup_tracing(args.verbosity)?;

  run_impl(args, io::stdin().lock(), io::stdout()).await
}


#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
  run(args_os()).await
}


#[cfg(test)]
mod tests {
  use super::*;

  use std::env::temp_dir;
  use std::fs;
  use std::io::Cursor;
  use std::path::PathBuf;
  use std::process;

  use tokio::test;


  /// Create a scratch directory containing a configuration with a
  /// file based default mailer.
  fn setup(name: &str) -> (PathBuf, PathBuf) {
    let root = temp_dir().join(format!("new-email-{name}-{}", process::id()));
    let mail = root.join("mail");
    let () = fs::create_dir_all(&root).unwrap();

    let config = root.join("config.json");
    let json = format!(
      r#"{{ "mailers": {{ "default": {{ "file": {{ "directory": {:?} }} }} }} }}"#,
      mail.display().to_string()
    );
    let () = fs::write(&config, json).unwrap();
    (root, config)
  }

  /// Send an email end-to-end, prompting for the body.
  #[test]
  async fn send_end_to_end() {
    let (root, config) = setup("send");
    let config = config.display().to_string();
    let args = Args::try_parse_from([
      "new-email",
      "--from=a@x.com",
      "--to=b@x.com",
      "--subject=Hi",
      "--mailer=default",
      "--config",
      &config,
    ])
    .unwrap();

    let mut output = Vec::new();
    let () = run_impl(args, Cursor::new("Hello\n"), &mut output)
      .await
      .unwrap();
    assert_eq!(String::from_utf8(output).unwrap(), "Body: Sent 1 emails\n");

    let files = fs::read_dir(root.join("mail")).unwrap().count();
    assert_eq!(files, 1);

    let () = fs::remove_dir_all(&root).unwrap();
  }

  /// Make sure that we refuse to work without a default mailer.
  #[test]
  async fn missing_default_mailer() {
    let root = temp_dir().join(format!("new-email-disabled-{}", process::id()));
    let () = fs::create_dir_all(&root).unwrap();
    let config = root.join("config.json");
    let () = fs::write(&config, r#"{ "mailers": {} }"#).unwrap();

    let config = config.display().to_string();
    let args = Args::try_parse_from(["new-email", "--config", &config]).unwrap();
    let mut output = Vec::new();
    let err = run_impl(args, Cursor::new(""), &mut output)
      .await
      .unwrap_err();
    assert!(err.to_string().starts_with("no `default` mailer configured"), "{err}");
    assert!(output.is_empty());

    let () = fs::remove_dir_all(&root).unwrap();
  }
}
