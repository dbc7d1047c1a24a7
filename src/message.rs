// Copyright (C) 2024 Daniel Mueller <deso@posteo.net>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::str;

use anyhow::Context as _;
use anyhow::Result;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::message::MaybeString;
use lettre::Message;

use crate::ComposeError;


fn parse_mailbox(field: &'static str, address: &str) -> Result<Mailbox, ComposeError> {
  address
    .parse::<Mailbox>()
    .map_err(|source| ComposeError::InvalidAddress {
      field,
      address: address.to_string(),
      source,
    })
}


/// A fully resolved email, ready to be handed to a transport.
///
/// All fields are guaranteed to be non-empty and all addresses to be
/// valid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageSpec {
  from: String,
  to: String,
  subject: String,
  body: Vec<u8>,
  content_type: String,
  charset: String,
  sender: Mailbox,
  receivers: Vec<Mailbox>,
}

impl MessageSpec {
  /// Create a new message from its parts.
  ///
  /// `to` may contain multiple comma separated recipients.
  pub fn new<B>(
    from: impl Into<String>,
    to: impl Into<String>,
    subject: impl Into<String>,
    body: B,
    content_type: impl Into<String>,
    charset: impl Into<String>,
  ) -> Result<Self, ComposeError>
  where
    B: Into<Vec<u8>>,
  {
    let from = from.into();
    let to = to.into();
    let subject = subject.into();
    let body = body.into();
    let content_type = content_type.into();
    let charset = charset.into();

    let fields = [
      ("from", from.is_empty()),
      ("to", to.is_empty()),
      ("subject", subject.is_empty()),
      ("body", body.is_empty()),
      ("content-type", content_type.is_empty()),
      ("charset", charset.is_empty()),
    ];

    if let Some((field, _)) = fields.into_iter().find(|(_, empty)| *empty) {
      return Err(ComposeError::EmptyField(field))
    }

    let sender = parse_mailbox("from", &from)?;
    let receivers = split_recipients(&to)
      .map(|recipient| parse_mailbox("to", recipient))
      .collect::<Result<Vec<_>, _>>()?;
    if receivers.is_empty() {
      return Err(ComposeError::NoRecipients)
    }

    let header = format!("{content_type}; charset={charset}");
    let _content_type =
      ContentType::parse(&header).map_err(|_err| ComposeError::InvalidContentType(header))?;

    Ok(Self {
      from,
      to,
      subject,
      body,
      content_type,
      charset,
      sender,
      receivers,
    })
  }

  #[inline]
  pub fn from(&self) -> &str {
    &self.from
  }

  #[inline]
  pub fn to(&self) -> &str {
    &self.to
  }

  #[inline]
  pub fn subject(&self) -> &str {
    &self.subject
  }

  #[inline]
  pub fn body(&self) -> &[u8] {
    &self.body
  }

  #[inline]
  pub fn content_type(&self) -> &str {
    &self.content_type
  }

  #[inline]
  pub fn charset(&self) -> &str {
    &self.charset
  }

  /// Iterate over the individual recipients of the message.
  pub fn recipients(&self) -> impl Iterator<Item = &str> + Clone {
    split_recipients(&self.to)
  }

  /// The number of recipients the message is addressed to.
  #[inline]
  pub fn recipient_count(&self) -> usize {
    self.receivers.len()
  }

  /// Convert the message into a `lettre` [`Message`].
  pub fn to_message(&self) -> Result<Message> {
    let content_type = format!("{}; charset={}", self.content_type, self.charset);
    let content_type = ContentType::parse(&content_type)
      .with_context(|| format!("failed to parse content type specification `{content_type}`"))?;
    let email = self
      .receivers
      .iter()
      .cloned()
      .fold(Message::builder(), |email, to| email.to(to))
      .from(self.sender.clone())
      .subject(self.subject.as_str());

    // `lettre` only converts line endings for string bodies, so prefer
    // that representation whenever the body is valid UTF-8.
    let body = if let Ok(body) = str::from_utf8(&self.body) {
      MaybeString::String(body.to_string())
    } else {
      MaybeString::Binary(self.body.clone())
    };

    email
      .header(content_type)
      .body(body)
      .context("failed to create email message")
  }
}


fn split_recipients(to: &str) -> impl Iterator<Item = &str> + Clone {
  to.split(',')
    .map(str::trim)
    .filter(|recipient| !recipient.is_empty())
}
