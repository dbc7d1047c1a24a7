// Copyright (C) 2024 Daniel Mueller <deso@posteo.net>
// SPDX-License-Identifier: GPL-3.0-or-later

//! A library for composing a single email from optional parts and
//! interactive prompts and sending it through a named transport.

#![allow(
  async_fn_in_trait,
  clippy::collapsible_else_if,
  clippy::collapsible_if,
  clippy::let_and_return,
  clippy::let_unit_value
)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod compose;
mod config;
mod message;
mod transport;

pub use crate::compose::is_enabled;
pub use crate::compose::send_new_email;
pub use crate::compose::BodySource;
pub use crate::compose::ComposeError;
pub use crate::compose::ComposeOpts;
pub use crate::compose::FileReader;
pub use crate::compose::FsReader;
pub use crate::compose::Prompter;
pub use crate::compose::DEFAULT_CHARSET;
pub use crate::compose::DEFAULT_CONTENT_TYPE;
pub use crate::compose::DEFAULT_MAILER;
#[cfg(feature = "config")]
#[cfg_attr(docsrs, doc(cfg(feature = "config")))]
pub use crate::config::system_config;
#[cfg(feature = "config")]
#[cfg_attr(docsrs, doc(cfg(feature = "config")))]
pub use crate::config::system_config_path;
#[cfg(feature = "config")]
#[cfg_attr(docsrs, doc(cfg(feature = "config")))]
pub use crate::config::Config;
pub use crate::config::FileAccount;
#[cfg(feature = "config")]
#[cfg_attr(docsrs, doc(cfg(feature = "config")))]
pub use crate::config::MailerConfig;
pub use crate::config::SmtpAccount;
pub use crate::config::SmtpMode;
pub use crate::message::MessageSpec;
pub use crate::transport::FileMailer;
pub use crate::transport::Mailer;
pub use crate::transport::SmtpMailer;
pub use crate::transport::Transport;
pub use crate::transport::TransportRegistry;
