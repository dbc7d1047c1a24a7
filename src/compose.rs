// Copyright (C) 2024 Daniel Mueller <deso@posteo.net>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;

use lettre::address::AddressError;

use thiserror::Error;

use crate::MessageSpec;
use crate::Transport;
use crate::TransportRegistry;


/// The name of the mailer used when none is specified explicitly.
pub const DEFAULT_MAILER: &str = "default";
/// The content type used when none is specified explicitly.
pub const DEFAULT_CONTENT_TYPE: &str = "text/html";
/// The charset used when none is specified explicitly.
pub const DEFAULT_CHARSET: &str = "UTF8";


/// Errors that abort the composition of an email.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ComposeError {
  /// No mailer with the given name is registered.
  #[error("the mailer `{0}` does not exist")]
  UnknownMailer(String),
  /// The file containing the body could not be read.
  #[error("could not get contents from `{}`", path.display())]
  FileRead {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
  /// The body input was neither `stdin` nor `file`.
  #[error("body input should be \"stdin\" or \"file\", not `{0}`")]
  InvalidBodySource(String),
  /// A required field of the message is empty.
  #[error("the {0} of the message must not be empty")]
  EmptyField(&'static str),
  /// An address could not be parsed.
  #[error("invalid {field} address `{address}`")]
  InvalidAddress {
    field: &'static str,
    address: String,
    #[source]
    source: AddressError,
  },
  /// The recipient list does not contain a single address.
  #[error("the message has no recipients")]
  NoRecipients,
  /// The content type and charset do not form a valid header.
  #[error("invalid content type `{0}`")]
  InvalidContentType(String),
}


/// The source of an email's body.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum BodySource {
  /// The body is provided literally.
  #[default]
  Stdin,
  /// The body is provided as the path to a file containing it.
  File,
}

impl FromStr for BodySource {
  type Err = ComposeError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "stdin" => Ok(Self::Stdin),
      "file" => Ok(Self::File),
      _ => Err(ComposeError::InvalidBodySource(s.to_string())),
    }
  }
}


/// Something capable of asking the user for a value.
pub trait Prompter {
  /// Ask for the value of the field described by `label`, blocking
  /// until one is available.
  fn ask(&mut self, label: &str) -> Result<String>;
}

impl<F> Prompter for F
where
  F: FnMut(&str) -> Result<String>,
{
  #[inline]
  fn ask(&mut self, label: &str) -> Result<String> {
    self(label)
  }
}


/// Something capable of reading the contents of a file.
pub trait FileReader {
  async fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

impl<F> FileReader for F
where
  F: Fn(&Path) -> io::Result<Vec<u8>>,
{
  #[inline]
  async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
    self(path)
  }
}


/// A [`FileReader`] reading from the file system.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsReader;

impl FileReader for FsReader {
  #[inline]
  async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
    tokio::fs::read(path).await
  }
}


/// The user provided input for composing an email.
///
/// Fields set to `None` are asked for interactively.
#[derive(Clone, Debug)]
pub struct ComposeOpts {
  /// The name of the mailer to send the email with.
  pub mailer: String,
  /// The "From" address.
  pub from: Option<String>,
  /// The "To" address(es).
  pub to: Option<String>,
  /// The subject line.
  pub subject: Option<String>,
  /// The body of the email or, if `body_input` is `file`, the path to
  /// the file containing it.
  pub body: Option<String>,
  /// The content type of the body.
  pub content_type: String,
  /// The charset of the body.
  pub charset: String,
  /// Where the body comes from; either `stdin` or `file`.
  pub body_input: String,
}

impl Default for ComposeOpts {
  fn default() -> Self {
    Self {
      mailer: DEFAULT_MAILER.to_string(),
      from: None,
      to: None,
      subject: None,
      body: None,
      content_type: DEFAULT_CONTENT_TYPE.to_string(),
      charset: DEFAULT_CHARSET.to_string(),
      body_input: "stdin".to_string(),
    }
  }
}


/// Check whether composing emails is possible at all, i.e., whether
/// the default mailer is available.
#[inline]
pub fn is_enabled<R>(registry: &R) -> bool
where
  R: TransportRegistry,
{
  registry.has(DEFAULT_MAILER)
}


fn resolve<P>(value: Option<String>, label: &str, prompter: &mut P) -> Result<String>
where
  P: Prompter,
{
  if let Some(value) = value {
    Ok(value)
  } else {
    prompter.ask(label)
  }
}


/// Compose an email from the provided options, asking for missing
/// parts, and send it using the selected mailer.
///
/// Returns the number of emails that were sent.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(mailer = %opts.mailer), err))]
pub async fn send_new_email<R, P, F>(
  opts: ComposeOpts,
  registry: &mut R,
  prompter: &mut P,
  reader: &F,
) -> Result<usize>
where
  R: TransportRegistry,
  P: Prompter,
  F: FileReader,
{
  let ComposeOpts {
    mailer,
    from,
    to,
    subject,
    body,
    content_type,
    charset,
    body_input,
  } = opts;

  if !registry.has(&mailer) {
    return Err(ComposeError::UnknownMailer(mailer).into())
  }

  let from = resolve(from, "From", prompter)?;
  let to = resolve(to, "To", prompter)?;
  let subject = resolve(subject, "Subject", prompter)?;
  let body = resolve(body, "Body", prompter)?;

  let body = match body_input.parse::<BodySource>()? {
    BodySource::Stdin => body.into_bytes(),
    BodySource::File => {
      let path = PathBuf::from(body);
      reader
        .read(&path)
        .await
        .map_err(|source| ComposeError::FileRead { path, source })?
    },
  };

  let message = MessageSpec::new(from, to, subject, body, content_type, charset)?;
  let transport = registry
    .get(&mailer)
    .ok_or_else(|| ComposeError::UnknownMailer(mailer.clone()))?;

  send_scoped(transport, &message).await
}


/// Send a message while making sure that the transport is stopped
/// again once it was started.
///
/// The outcome of the send is what gets reported: a failure to stop the
/// transport afterwards is only logged.
async fn send_scoped<T>(transport: &mut T, message: &MessageSpec) -> Result<usize>
where
  T: Transport,
{
  let () = transport.start().await?;
  let sent = transport.send(message).await;

  if let Err(_err) = transport.stop().await {
    #[cfg(feature = "tracing")]
    tracing::warn!("failed to stop transport: {_err:#}");
  }
  sent
}
