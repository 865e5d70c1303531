//! # Validate Command Implementation
//!
//! This module implements the `validate` subcommand, which checks a
//! configuration file without cloning or checking anything out.
//!
//! ## Functionality
//!
//! - **Schema Validation**: parses the file and applies the entry rules
//!   (required fields, no duplicate tags within an entry).
//! - **Entry Listing**: prints each entry with its resolved destination,
//!   ordered tag list and effective compatibility mode.
//! - **Conflict Preview**: feeds the entries through a fresh registry, so two
//!   entries of the same file that could never be reconciled are reported
//!   before any git work happens.
//!
//! Nested configuration files are not followed; they only exist once their
//! repository has been checked out.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Result};
use clap::Args;

use repo_pin::config::{self, CompatibilityMode};
use repo_pin::defaults;
use repo_pin::output::{marker, Marker, OutputConfig};
use repo_pin::path::{canonical_file, resolve_base_path};
use repo_pin::registry::{Outcome, Registry};
use repo_pin::repository::NoTagDates;

/// Parse a configuration file and list its entries
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the configuration file to validate.
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = defaults::CONFIG_FILE_NAME,
        env = "REPO_PIN_CONFIG"
    )]
    pub config: PathBuf,

    /// Compatibility mode assumed for entries that do not declare one.
    #[arg(
        short,
        long,
        value_name = "MODE",
        default_value_t = defaults::COMPATIBILITY_MODE,
        env = "REPO_PIN_MODE"
    )]
    pub mode: CompatibilityMode,
}

/// Execute the `validate` command.
///
/// # Arguments
/// * `args` - The command arguments
/// * `color_flag` - The value of the global --color flag ("always", "never", or "auto")
pub fn execute(args: ValidateArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    println!(
        "{} Validating configuration: {}",
        marker(&out, Marker::Scan),
        args.config.display()
    );

    let canonical = canonical_file(&args.config).map_err(|e| {
        println!("{} {}", marker(&out, Marker::Error), e);
        anyhow!("Configuration file not found: {}", args.config.display())
    })?;

    let entries = match config::from_file(&canonical) {
        Ok(entries) => {
            println!(
                "{} Configuration file parsed successfully",
                marker(&out, Marker::Ok)
            );
            entries
        }
        Err(e) => {
            println!(
                "{} Configuration parsing failed: {}",
                marker(&out, Marker::Error),
                e
            );
            bail!("Configuration parsing failed: {}", e);
        }
    };

    let config_dir = canonical.parent().unwrap_or(Path::new("/"));

    println!(
        "\n{} Entries ({}):",
        marker(&out, Marker::Summary),
        entries.len()
    );

    let mut registry = Registry::new();
    let mut conflicts = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        let path = resolve_base_path(config_dir, &entry.base_path);
        let mode = entry.mode_or(args.mode);
        let tags = entry.ordered_tags();

        println!("   {}. {} @ {} ({})", index + 1, entry.url, entry.tag, mode);
        println!("      path: {}", path.display());
        if !entry.compatible_tags.is_empty() {
            println!("      compatible: {}", entry.compatible_tags.join(", "));
        }
        if entry.skip_lfs {
            println!("      large-file content: skipped");
        }

        if let Outcome::Conflict(conflict) =
            registry.reconcile(&entry.url, &path, &tags, mode, &NoTagDates)
        {
            conflicts.push(conflict);
        }
    }

    println!("\n{} Validation Result:", marker(&out, Marker::Summary));
    if !conflicts.is_empty() {
        for conflict in &conflicts {
            println!("{} {}", marker(&out, Marker::Error), conflict);
        }
        bail!(
            "Configuration validation failed: {} unresolvable request(s)",
            conflicts.len()
        );
    }

    if registry.is_empty() {
        println!(
            "{} Configuration is valid (no dependencies listed)",
            marker(&out, Marker::Ok)
        );
    } else {
        println!(
            "{} Configuration is valid ({} unique repositories)",
            marker(&out, Marker::Ok),
            registry.len()
        );
    }
    Ok(())
}
