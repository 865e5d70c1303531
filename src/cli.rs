//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;

use repo_pin::defaults;

use crate::commands;

/// repo-pin - Check out a tree of git dependencies pinned to compatible tags
#[derive(Parser, Debug)]
#[command(name = "repo-pin")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check out every dependency listed in the configuration file, recursively
    Sync(commands::sync::SyncArgs),

    /// Parse a configuration file and list its entries without touching git
    Validate(commands::validate::ValidateArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        match self.command {
            Commands::Sync(args) => commands::sync::execute(args, &self.color),
            Commands::Validate(args) => commands::validate::execute(args, &self.color),
        }
    }
}

/// `REPO_PIN_LOG` takes a full filter string and wins over `--log-level`.
fn init_logging(level: &str) {
    let env = Env::default().filter_or(defaults::LOG_ENV, level);
    // A second initialization (tests calling execute twice) is harmless.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}
