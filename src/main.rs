//! # repo-pin CLI
//!
//! This is the binary entry point for the `repo-pin` command-line tool.
//!
//! It parses the command line with `clap`, runs the selected command and lets
//! `anyhow` turn any error into a message and a non-zero exit status. The
//! dependency resolution itself lives in the `repo_pin` library crate.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
