// Copyright (C) 2024 Daniel Mueller <deso@posteo.net>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::io::BufRead;
use std::io::Write;

use anyhow::ensure;
use anyhow::Context as _;
use anyhow::Result;

use mailcompose::Prompter;


/// A [`Prompter`] asking for values on a terminal (or anything else
/// that looks like one).
pub(crate) struct TerminalPrompter<R, W> {
  input: R,
  output: W,
}

impl<R, W> TerminalPrompter<R, W> {
  pub fn new(input: R, output: W) -> Self {
    Self { input, output }
  }
}

impl<R, W> Prompter for TerminalPrompter<R, W>
where
  R: BufRead,
  W: Write,
{
  fn ask(&mut self, label: &str) -> Result<String> {
    let () = write!(self.output, "{label}: ").context("failed to write prompt")?;
    let () = self.output.flush().context("failed to flush prompt")?;

    let mut line = String::new();
    let count = self
      .input
      .read_line(&mut line)
      .with_context(|| format!("failed to read {}", label.to_lowercase()))?;
    ensure!(
      count > 0,
      "unexpected end of input while reading {}",
      label.to_lowercase()
    );

    let len = line.trim_end_matches(['\r', '\n']).len();
    let () = line.truncate(len);
    Ok(line)
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  use std::io::Cursor;


  /// Check that answers are read line by line.
  #[test]
  fn read_answers() {
    let input = Cursor::new("a@x.com\r\nHello world\n");
    let mut output = Vec::new();
    let mut prompter = TerminalPrompter::new(input, &mut output);

    assert_eq!(prompter.ask("From").unwrap(), "a@x.com");
    assert_eq!(prompter.ask("Body").unwrap(), "Hello world");
    drop(prompter);

    assert_eq!(output, b"From: Body: ");
  }

  /// Make sure that running out of input is reported.
  #[test]
  fn end_of_input() {
    let mut prompter = TerminalPrompter::new(Cursor::new(""), Vec::new());
    let err = prompter.ask("Subject").unwrap_err();
    assert_eq!(err.to_string(), "unexpected end of input while reading subject");
  }

  /// Check that an empty line is reported as an empty answer.
  #[test]
  fn empty_answer() {
    let mut prompter = TerminalPrompter::new(Cursor::new("\n"), Vec::new());
    assert_eq!(prompter.ask("To").unwrap(), "");
  }
}
