// Copyright (C) 2024 Daniel Mueller <deso@posteo.net>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::io::stdout;

use anyhow::Result;

use clap::CommandFactory as _;
use clap::Parser;

use clap_complete::generate;
use clap_complete::Shell;


#[allow(unused)]
mod new_email {
  include!("../src/args.rs");
}


/// Generate a shell completion script for the program.
#[derive(Debug, Parser)]
struct Args {
  /// The shell for which to generate a completion script for.
  #[clap(value_enum)]
  shell: Shell,
  /// The command for which to generate the shell completion script.
  #[clap(default_value = "new-email")]
  command: String,
}


fn main() -> Result<()> {
  let args = Args::parse();
  let mut command = new_email::Args::command();
  let () = generate(args.shell, &mut command, &args.command, &mut stdout());
  Ok(())
}
