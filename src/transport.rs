// Copyright (C) 2024 Daniel Mueller <deso@posteo.net>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::hash::BuildHasher;
use std::path::PathBuf;

use anyhow::ensure;
use anyhow::Context as _;
use anyhow::Result;

use lettre::transport::smtp::authentication::Credentials;
use lettre::AsyncFileTransport;
use lettre::AsyncSmtpTransport;
use lettre::AsyncTransport as _;
use lettre::Tokio1Executor;

use crate::config::SmtpAccount;
use crate::config::SmtpMode;
use crate::MessageSpec;


/// A trait for objects capable of delivering a [`MessageSpec`].
///
/// A transport has to be started before anything can be sent through
/// it and should be stopped once it is no longer needed.
pub trait Transport {
  /// Prepare the transport for sending, e.g., by connecting to a server.
  async fn start(&mut self) -> Result<()>;

  /// Release whatever resources [`Transport::start`] acquired.
  async fn stop(&mut self) -> Result<()>;

  /// Deliver a message, returning the number of successful deliveries.
  async fn send(&mut self, message: &MessageSpec) -> Result<usize>;
}


/// A lookup of transports by name.
pub trait TransportRegistry {
  /// The type of transport managed by the registry.
  type Transport: Transport;

  /// Check whether a transport with the given name is registered.
  fn has(&self, name: &str) -> bool;

  /// Retrieve the transport with the given name.
  fn get(&mut self, name: &str) -> Option<&mut Self::Transport>;
}

impl<T> TransportRegistry for BTreeMap<String, T>
where
  T: Transport,
{
  type Transport = T;

  #[inline]
  fn has(&self, name: &str) -> bool {
    self.contains_key(name)
  }

  #[inline]
  fn get(&mut self, name: &str) -> Option<&mut Self::Transport> {
    self.get_mut(name)
  }
}

impl<T, S> TransportRegistry for HashMap<String, T, S>
where
  T: Transport,
  S: BuildHasher,
{
  type Transport = T;

  #[inline]
  fn has(&self, name: &str) -> bool {
    self.contains_key(name)
  }

  #[inline]
  fn get(&mut self, name: &str) -> Option<&mut Self::Transport> {
    self.get_mut(name)
  }
}


/// A transport delivering messages via SMTP.
pub struct SmtpMailer {
  account: SmtpAccount,
  transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpMailer {
  pub fn new(account: SmtpAccount) -> Self {
    Self {
      account,
      transport: None,
    }
  }

  fn build(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
    let account = &self.account;
    let mut builder = match account.smtp_mode {
      SmtpMode::Unencrypted => {
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(account.smtp_host.as_str())
      },
      SmtpMode::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&account.smtp_host)
        .context("failed to create TLS SMTP mailer")?,
      SmtpMode::StartTls => {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&account.smtp_host)
          .context("failed to create STARTTLS SMTP mailer")?
      },
    };

    if let Some(port) = account.smtp_port {
      builder = builder.port(port);
    }

    if let (Some(user), Some(password)) = (&account.user, &account.password) {
      builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
    }

    Ok(builder.build())
  }
}

impl Transport for SmtpMailer {
  #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(host = %self.account.smtp_host), err))]
  async fn start(&mut self) -> Result<()> {
    let host = &self.account.smtp_host;
    let transport = self.build()?;
    let connected = transport
      .test_connection()
      .await
      .with_context(|| format!("failed to connect to {host}"))?;
    ensure!(connected, "SMTP server {host} refused the connection");

    self.transport = Some(transport);
    Ok(())
  }

  async fn stop(&mut self) -> Result<()> {
    self.transport = None;
    Ok(())
  }

  #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(host = %self.account.smtp_host), err))]
  async fn send(&mut self, message: &MessageSpec) -> Result<usize> {
    let host = &self.account.smtp_host;
    let transport = self
      .transport
      .as_ref()
      .with_context(|| format!("SMTP transport for {host} has not been started"))?;
    let email = message.to_message()?;
    let _response = transport
      .send(email)
      .await
      .with_context(|| format!("failed to send email via {host}"))?;

    Ok(message.recipient_count())
  }
}


/// A transport storing messages as `.eml` files in a directory.
pub struct FileMailer {
  directory: PathBuf,
  transport: Option<AsyncFileTransport<Tokio1Executor>>,
}

impl FileMailer {
  pub fn new(directory: impl Into<PathBuf>) -> Self {
    Self {
      directory: directory.into(),
      transport: None,
    }
  }
}

impl Transport for FileMailer {
  async fn start(&mut self) -> Result<()> {
    let () = tokio::fs::create_dir_all(&self.directory)
      .await
      .with_context(|| format!("failed to create directory `{}`", self.directory.display()))?;

    self.transport = Some(AsyncFileTransport::new(&self.directory));
    Ok(())
  }

  async fn stop(&mut self) -> Result<()> {
    self.transport = None;
    Ok(())
  }

  async fn send(&mut self, message: &MessageSpec) -> Result<usize> {
    let directory = &self.directory;
    let transport = self.transport.as_ref().with_context(|| {
      format!(
        "file transport for `{}` has not been started",
        directory.display()
      )
    })?;
    let email = message.to_message()?;
    let _id = transport
      .send(email)
      .await
      .with_context(|| format!("failed to write email to `{}`", directory.display()))?;

    Ok(message.recipient_count())
  }
}


/// Any of the transports provided by this crate.
#[non_exhaustive]
pub enum Mailer {
  Smtp(SmtpMailer),
  File(FileMailer),
}

impl Transport for Mailer {
  async fn start(&mut self) -> Result<()> {
    match self {
      Self::Smtp(mailer) => mailer.start().await,
      Self::File(mailer) => mailer.start().await,
    }
  }

  async fn stop(&mut self) -> Result<()> {
    match self {
      Self::Smtp(mailer) => mailer.stop().await,
      Self::File(mailer) => mailer.stop().await,
    }
  }

  async fn send(&mut self, message: &MessageSpec) -> Result<usize> {
    match self {
      Self::Smtp(mailer) => mailer.send(message).await,
      Self::File(mailer) => mailer.send(message).await,
    }
  }
}
