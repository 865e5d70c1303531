//! # Sync Command Implementation
//!
//! This module implements the `sync` subcommand, the main entry point of the
//! tool. It reads the root configuration file, checks out every dependency at
//! its resolved tag, follows the configuration files found inside newly
//! checked-out repositories, and reports what happened.
//!
//! ## Process
//!
//! 1.  **Setup**: builds the git-backed repository operations (wrapped in a
//!     dry-run layer for `--dry-run`), the tag date provider and the prompter.
//! 2.  **Walk**: runs the dependency walker from the root file.
//! 3.  **Report**: prints the summary, the failures and, with `--tree`, the
//!     discovered dependency tree.
//!
//! The command fails when any entry failed, any configuration file was
//! invalid, or two requests for the same repository could not be reconciled.

use std::borrow::Cow;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use clap::Args;
use log::info;
use ptree::{print_tree, Style, TreeItem};

use repo_pin::config::CompatibilityMode;
use repo_pin::defaults;
use repo_pin::output::{entry_status, marker, Marker, OutputConfig};
use repo_pin::prompt::{FixedAnswer, Prompter, TerminalPrompter};
use repo_pin::repository::{
    DryRunOperations, GitRepositoryOperations, GitTagDates, RepositoryOperations,
};
use repo_pin::walker::{DependencyNode, EntryNode, RunSummary, WalkOptions, Walker};

/// Check out every dependency listed in the configuration file, recursively
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Path to the root configuration file.
    ///
    /// Nested configuration files are looked up under the same file name.
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = defaults::CONFIG_FILE_NAME,
        env = "REPO_PIN_CONFIG"
    )]
    pub config: PathBuf,

    /// Do not open configuration files nested deeper than this.
    #[arg(
        short = 'd',
        long,
        value_name = "NUM",
        default_value_t = defaults::MAX_DEPTH,
        env = "REPO_PIN_MAX_DEPTH"
    )]
    pub max_depth: usize,

    /// Compatibility mode for entries that do not declare one (strict or permissive).
    #[arg(
        short,
        long,
        value_name = "MODE",
        default_value_t = defaults::COMPATIBILITY_MODE,
        env = "REPO_PIN_MODE"
    )]
    pub mode: CompatibilityMode,

    /// Show what would be cloned and checked out without changing anything.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Process only the root configuration file, exactly as written.
    #[arg(long)]
    pub no_recursive: bool,

    /// Discard local modifications in existing working copies before checkout.
    #[arg(short, long)]
    pub force: bool,

    /// Replace directories that are in the way without asking.
    #[arg(short, long)]
    pub yes: bool,

    /// Private key to use for git over SSH.
    #[arg(long, value_name = "FILE", env = "REPO_PIN_SSH_KEY")]
    pub ssh_key: Option<PathBuf>,

    /// Print the discovered dependency tree with resolved tags.
    #[arg(long)]
    pub tree: bool,

    /// Only print failures.
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the `sync` command.
///
/// # Arguments
/// * `args` - The command arguments
/// * `color_flag` - The value of the global --color flag ("always", "never", or "auto")
pub fn execute(args: SyncArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);

    if !args.config.is_file() {
        bail!("Configuration file not found: {}", args.config.display());
    }

    let mut git = GitRepositoryOperations::new();
    let mut dates = GitTagDates::new();
    if let Some(key) = &args.ssh_key {
        git = git.with_ssh_key(key.clone());
        dates = dates.with_ssh_key(key.clone());
    }

    let ops: Box<dyn RepositoryOperations> = if args.dry_run {
        Box::new(DryRunOperations::new(git))
    } else {
        Box::new(git)
    };
    let prompter = prompter_for(&args);

    let options = WalkOptions {
        max_depth: args.max_depth,
        default_mode: args.mode,
        recursive: !args.no_recursive,
        force: args.force,
    };

    if !args.quiet {
        println!(
            "{} Synchronizing dependencies from {}{}",
            marker(&out, Marker::Sync),
            args.config.display(),
            if args.dry_run { " (dry run)" } else { "" }
        );
    }

    let report = Walker::new(ops.as_ref(), &dates, prompter.as_ref(), options)
        .run(&args.config)
        .map_err(|e| {
            eprintln!("{} {}", marker(&out, Marker::Error), e);
            anyhow!("Synchronization aborted: {}", e)
        })?;

    if args.tree {
        if let Some(root) = &report.tree {
            println!("\n{} Dependency tree:", marker(&out, Marker::Tree));
            print_tree(&build_tree_node(root, &out))
                .map_err(|e| anyhow!("Failed to display tree: {}", e))?;
        }
    }

    print_failures(&report.summary, &out);
    if !args.quiet {
        print_summary(&report.summary, &out);
    }

    if !report.summary.is_success() {
        bail!(
            "{} of {} entries failed, {} configuration file(s) invalid",
            report.summary.failed,
            report.summary.total,
            report.summary.config_errors.len()
        );
    }

    Ok(())
}

/// A dry run removes nothing, so directories in the way are reported through
/// the dry-run log instead of asking whether to replace them.
fn prompter_for(args: &SyncArgs) -> Box<dyn Prompter> {
    if args.dry_run {
        info!("[dry-run] directories in the way are reported, not replaced");
        Box::new(FixedAnswer(true))
    } else if args.yes {
        Box::new(FixedAnswer(true))
    } else {
        Box::new(TerminalPrompter)
    }
}

fn print_summary(summary: &RunSummary, out: &OutputConfig) {
    println!("\n{} Summary:", marker(out, Marker::Summary));
    println!("   Entries processed: {}", summary.total);
    println!("   Succeeded: {}", summary.succeeded);
    println!("   Already up to date: {}", summary.skipped);
    println!("   Failed: {}", summary.failed);
    println!("   Unique repositories: {}", summary.unique_repositories);

    if summary.is_success() {
        println!("{} All dependencies are in place", marker(out, Marker::Ok));
    }
}

fn print_failures(summary: &RunSummary, out: &OutputConfig) {
    for message in &summary.config_errors {
        eprintln!("{} {}", marker(out, Marker::Error), message);
    }
    for failure in &summary.failures {
        eprintln!(
            "{} {}: {}",
            marker(out, Marker::Error),
            failure.url,
            failure.message
        );
    }
}

/// Configuration file nodes are labelled with their path; entry nodes with
/// the repository, its resolved tag and status. An entry's children are the
/// entries of the configuration file found inside it.
fn build_tree_node(node: &DependencyNode, out: &OutputConfig) -> TreeNode {
    TreeNode {
        label: node.config.display().to_string(),
        children: node
            .entries
            .iter()
            .map(|entry| build_entry_node(entry, out))
            .collect(),
    }
}

fn build_entry_node(entry: &EntryNode, out: &OutputConfig) -> TreeNode {
    let children = entry
        .nested
        .as_ref()
        .map(|nested| {
            nested
                .entries
                .iter()
                .map(|child| build_entry_node(child, out))
                .collect()
        })
        .unwrap_or_default();

    TreeNode {
        label: format!(
            "{} @ {} [{}] -> {}",
            entry.url,
            entry.tag,
            entry_status(out, &entry.status),
            entry.path.display()
        ),
        children,
    }
}

/// Tree node structure for ptree visualization
#[derive(Clone, Debug)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: Write>(&self, f: &mut W, _style: &Style) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        Cow::Borrowed(&self.children)
    }
}
