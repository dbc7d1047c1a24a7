// Copyright (C) 2024 Daniel Mueller <deso@posteo.net>
// SPDX-License-Identifier: GPL-3.0-or-later

#[cfg(feature = "config")]
use std::borrow::Cow;
#[cfg(feature = "config")]
use std::collections::BTreeMap;
#[cfg(feature = "config")]
use std::env::var_os;
use std::path::PathBuf;

#[cfg(feature = "config")]
use anyhow::Context as _;
#[cfg(feature = "config")]
use anyhow::Result;

#[cfg(feature = "config")]
use serde::Deserialize;

#[cfg(feature = "config")]
use serde_json::from_slice as from_json;

#[cfg(feature = "config")]
use crate::transport::FileMailer;
#[cfg(feature = "config")]
use crate::transport::Mailer;
#[cfg(feature = "config")]
use crate::transport::SmtpMailer;


#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "config", derive(Deserialize))]
#[non_exhaustive]
pub enum SmtpMode {
  /// Use unencrypted SMTP (typically on port 25).
  Unencrypted,
  /// Use StartTLS mode (often on port 587).
  #[default]
  StartTls,
  /// Use full TLS mode (often on port 465).
  Tls,
}


/// A type representing a single SMTP account.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "config", derive(Deserialize))]
pub struct SmtpAccount {
  /// The hostname of the SMTP server.
  pub smtp_host: String,
  /// The SMTP "mode" to use.
  #[cfg_attr(feature = "config", serde(default))]
  pub smtp_mode: SmtpMode,
  /// The port to connect to, if it differs from the mode's default.
  #[cfg_attr(feature = "config", serde(default))]
  pub smtp_port: Option<u16>,
  /// The user to log in as.
  #[cfg_attr(feature = "config", serde(default))]
  pub user: Option<String>,
  /// The password to use for logging in.
  #[cfg_attr(feature = "config", serde(default))]
  pub password: Option<String>,
}


/// A type describing a directory that messages get written to.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "config", derive(Deserialize))]
pub struct FileAccount {
  /// The directory to store `.eml` files in.
  pub directory: PathBuf,
}


/// The definition of a single named mailer.
#[cfg(feature = "config")]
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailerConfig {
  /// Deliver via SMTP.
  Smtp(SmtpAccount),
  /// Write messages into a directory.
  File(FileAccount),
}


/// The system-wide configuration.
#[cfg(feature = "config")]
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
  /// The available mailers, keyed by name.
  pub mailers: BTreeMap<String, MailerConfig>,
}

#[cfg(feature = "config")]
impl Config {
  /// Load a configuration from the JSON file at `path`.
  pub async fn load(path: &std::path::Path) -> Result<Self> {
    let data = tokio::fs::read(path)
      .await
      .with_context(|| format!("failed to read configuration file `{}`", path.display()))?;
    let config = from_json::<Self>(&data)
      .with_context(|| format!("failed to parse `{}` contents as JSON", path.display()))?;
    Ok(config)
  }

  /// Instantiate all configured mailers, keyed by name.
  pub fn into_registry(self) -> BTreeMap<String, Mailer> {
    self
      .mailers
      .into_iter()
      .map(|(name, config)| {
        let mailer = match config {
          MailerConfig::Smtp(account) => Mailer::Smtp(SmtpMailer::new(account)),
          MailerConfig::File(account) => Mailer::File(FileMailer::new(account.directory)),
        };
        (name, mailer)
      })
      .collect()
  }
}


/// Retrieve the path to the system-wide configuration file.
///
/// This is `$XDG_CONFIG_HOME/mailcompose/config.json`, with
/// `$XDG_CONFIG_HOME` defaulting to `$HOME/.config`.
#[cfg(feature = "config")]
pub fn system_config_path() -> Result<Cow<'static, std::path::Path>> {
  let config_dir = if let Some(dir) = var_os("XDG_CONFIG_HOME").filter(|dir| !dir.is_empty()) {
    PathBuf::from(dir)
  } else {
    let home = var_os("HOME").context("neither `XDG_CONFIG_HOME` nor `HOME` are set")?;
    PathBuf::from(home).join(".config")
  };

  let path = config_dir.join("mailcompose").join("config.json");
  Ok(Cow::Owned(path))
}


/// Load the system-wide configuration.
#[cfg(feature = "config")]
pub async fn system_config() -> Result<Config> {
  let path = system_config_path()?;
  Config::load(&path).await
}


#[cfg(all(test, feature = "config"))]
mod tests {
  use super::*;


  /// Check that we can parse a configuration with all mailer kinds.
  #[test]
  fn parse_config() {
    let json = br#"{
      "mailers": {
        "default": {
          "smtp": {
            "smtp_host": "smtp.example.com",
            "smtp_mode": "Tls",
            "user": "me",
            "password": "secret"
          }
        },
        "archive": { "file": { "directory": "/tmp/mail" } },
        "relay": { "smtp": { "smtp_host": "localhost", "smtp_port": 2525 } }
      }
    }"#;

    let config = from_json::<Config>(json).unwrap();
    assert_eq!(config.mailers.len(), 3);

    match &config.mailers["default"] {
      MailerConfig::Smtp(account) => {
        assert_eq!(account.smtp_host, "smtp.example.com");
        assert_eq!(account.smtp_mode, SmtpMode::Tls);
        assert_eq!(account.user.as_deref(), Some("me"));
      },
      other => panic!("unexpected mailer: {other:?}"),
    }

    match &config.mailers["relay"] {
      MailerConfig::Smtp(account) => {
        assert_eq!(account.smtp_mode, SmtpMode::StartTls);
        assert_eq!(account.smtp_port, Some(2525));
        assert_eq!(account.password, None);
      },
      other => panic!("unexpected mailer: {other:?}"),
    }

    let registry = config.into_registry();
    assert!(matches!(registry["archive"], Mailer::File(..)));
    assert!(matches!(registry["default"], Mailer::Smtp(..)));
  }

  /// Make sure that unknown mailer kinds are rejected.
  #[test]
  fn parse_invalid_config() {
    let json = br#"{ "mailers": { "default": { "carrier-pigeon": {} } } }"#;
    let _err = from_json::<Config>(json).unwrap_err();
  }
}
