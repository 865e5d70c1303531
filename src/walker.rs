//! # Dependency Walker
//!
//! Reads a configuration file, materializes each entry, and recurses into
//! the configuration file of every repository it newly checked out.
//!
//! ## Process
//!
//! For each configuration file, at a given depth:
//!
//! 1.  **Cycle guard**: the file's canonical path is recorded; a file that
//!     was already processed in this run is skipped, however it was reached.
//!
//! 2.  **Entries**: each entry is reconciled with the [`Registry`]. The
//!     outcome decides the work: nothing for an already satisfied request,
//!     fetch and checkout for a changed tag, full clone and setup for a new
//!     repository. A failure marks the entry and its record as failed and
//!     processing moves on to the next entry. A [`Conflict`] stops the run.
//!
//! 3.  **Recursion**: unless the depth bound is reached, the walker looks for
//!     a configuration file with the same name inside every repository that
//!     was newly and successfully materialized, and processes it at
//!     `depth + 1`.
//!
//! Execution is single-threaded and depth-first: one entry is finished,
//! including its git operations, before the next one starts.
//!
//! [`Conflict`]: crate::error::Conflict

use std::collections::HashSet;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use crate::config::{self, CompatibilityMode, DependencyEntry};
use crate::defaults;
use crate::error::{Error, Result};
use crate::path::{canonical_file, resolve_base_path};
use crate::prompt::Prompter;
use crate::registry::{Outcome, Registry};
use crate::repository::{ContentOptions, RepositoryOperations, TagDateProvider};

/// Knobs for one run.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Nested configuration files deeper than this are not opened.
    pub max_depth: usize,
    /// Mode for entries that do not declare one.
    pub default_mode: CompatibilityMode,
    /// Follow nested configuration files and arbitrate shared repositories.
    /// When off, only the root file is processed and every entry is
    /// materialized as requested.
    pub recursive: bool,
    /// Hard-reset existing working copies before checking out.
    pub force: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_depth: defaults::MAX_DEPTH,
            default_mode: defaults::COMPATIBILITY_MODE,
            recursive: true,
            force: false,
        }
    }
}

/// What happened to one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryStatus {
    /// Freshly cloned and checked out.
    Cloned,
    /// An existing working copy of the same URL was fetched and checked out.
    Reused,
    /// A known repository was moved to a newly resolved tag.
    Updated,
    /// The working copy already satisfied the request.
    AlreadySatisfied,
    /// Materialization failed with this message.
    Failed(String),
}

impl EntryStatus {
    pub fn is_success(&self) -> bool {
        !matches!(self, EntryStatus::Failed(_))
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryStatus::Cloned => write!(f, "cloned"),
            EntryStatus::Reused => write!(f, "reused"),
            EntryStatus::Updated => write!(f, "updated"),
            EntryStatus::AlreadySatisfied => write!(f, "up to date"),
            EntryStatus::Failed(_) => write!(f, "failed"),
        }
    }
}

/// One processed entry, with the nested configuration file it led to.
#[derive(Debug, Clone)]
pub struct EntryNode {
    pub url: String,
    /// Tag the registry resolved for the repository after this entry.
    pub tag: String,
    pub path: PathBuf,
    pub status: EntryStatus,
    /// Set when the entry was the first request for its URL.
    pub discovered: bool,
    pub nested: Option<DependencyNode>,
}

/// One processed configuration file.
#[derive(Debug, Clone)]
pub struct DependencyNode {
    pub config: PathBuf,
    pub depth: usize,
    pub entries: Vec<EntryNode>,
}

/// An entry that could not be materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    pub url: String,
    pub message: String,
}

/// Counts for the end-of-run report.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Entries that needed no work; included in `succeeded`.
    pub skipped: usize,
    pub unique_repositories: usize,
    pub failures: Vec<EntryFailure>,
    /// Configuration files that could not be read or parsed.
    pub config_errors: Vec<String>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.config_errors.is_empty()
    }
}

/// Result of a complete run.
#[derive(Debug)]
pub struct WalkReport {
    pub summary: RunSummary,
    /// `None` when the root file could not be processed.
    pub tree: Option<DependencyNode>,
    pub registry: Registry,
}

/// Walks a tree of configuration files and materializes their entries.
pub struct Walker<'a> {
    ops: &'a dyn RepositoryOperations,
    dates: &'a dyn TagDateProvider,
    prompter: &'a dyn Prompter,
    options: WalkOptions,
    registry: Registry,
    processed: HashSet<PathBuf>,
    config_name: OsString,
    summary: RunSummary,
}

impl<'a> Walker<'a> {
    pub fn new(
        ops: &'a dyn RepositoryOperations,
        dates: &'a dyn TagDateProvider,
        prompter: &'a dyn Prompter,
        options: WalkOptions,
    ) -> Self {
        Self {
            ops,
            dates,
            prompter,
            options,
            registry: Registry::new(),
            processed: HashSet::new(),
            config_name: OsString::from(defaults::CONFIG_FILE_NAME),
            summary: RunSummary::default(),
        }
    }

    /// Process `root` and everything reachable from it.
    ///
    /// Entry failures and invalid configuration files are reported in the
    /// summary; only a fatal conflict returns `Err`.
    pub fn run(mut self, root: &Path) -> Result<WalkReport> {
        if let Some(name) = root.file_name() {
            self.config_name = name.to_os_string();
        }

        let tree = self.walk_file(root, 0)?;
        self.summary.unique_repositories = self.registry.len();

        info!(
            "{} entries, {} succeeded, {} failed, {} unique repositories",
            self.summary.total,
            self.summary.succeeded,
            self.summary.failed,
            self.summary.unique_repositories
        );

        Ok(WalkReport {
            summary: self.summary,
            tree,
            registry: self.registry,
        })
    }

    fn walk_file(&mut self, file: &Path, depth: usize) -> Result<Option<DependencyNode>> {
        let canonical = match canonical_file(file) {
            Ok(path) => path,
            Err(e) => {
                self.config_error(file, &e);
                return Ok(None);
            }
        };

        if !self.processed.insert(canonical.clone()) {
            debug!("{} was already processed", canonical.display());
            return Ok(None);
        }

        let entries = match config::from_file(&canonical) {
            Ok(entries) => entries,
            Err(e) => {
                self.config_error(&canonical, &e);
                return Ok(None);
            }
        };

        info!(
            "processing {} ({} entries, depth {})",
            canonical.display(),
            entries.len(),
            depth
        );

        let config_dir = canonical
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));

        let mut node = DependencyNode {
            config: canonical.clone(),
            depth,
            entries: Vec::with_capacity(entries.len()),
        };
        for entry in &entries {
            let entry_node = self.process_entry(entry, &config_dir)?;
            node.entries.push(entry_node);
        }

        if !self.options.recursive {
            return Ok(Some(node));
        }
        if depth >= self.options.max_depth {
            if node.entries.iter().any(|e| e.discovered) {
                debug!(
                    "depth limit {} reached at {}; nested files are not opened",
                    self.options.max_depth,
                    canonical.display()
                );
            }
            return Ok(Some(node));
        }

        for entry_node in node.entries.iter_mut() {
            if !entry_node.discovered || !entry_node.status.is_success() {
                continue;
            }
            let failed = self
                .registry
                .lookup(&entry_node.url)
                .is_some_and(|record| record.checkout_failed);
            if failed {
                continue;
            }

            let nested = entry_node.path.join(&self.config_name);
            if nested.is_file() {
                entry_node.nested = self.walk_file(&nested, depth + 1)?;
            }
        }

        Ok(Some(node))
    }

    fn config_error(&mut self, file: &Path, e: &Error) {
        error!("skipping {}: {}", file.display(), e);
        self.summary.config_errors.push(e.to_string());
    }

    fn process_entry(&mut self, entry: &DependencyEntry, config_dir: &Path) -> Result<EntryNode> {
        self.summary.total += 1;

        let path = resolve_base_path(config_dir, &entry.base_path);
        let mode = entry.mode_or(self.options.default_mode);
        let tags = entry.ordered_tags();

        let outcome = if self.options.recursive {
            self.registry
                .reconcile(&entry.url, &path, &tags, mode, self.dates)
        } else {
            if self.registry.lookup(&entry.url).is_none() {
                self.registry.insert_new(
                    &entry.url,
                    path.clone(),
                    entry.tag.clone(),
                    entry.compatible_tags.clone(),
                    mode,
                );
            }
            Outcome::New
        };

        let (result, discovered) = match outcome {
            Outcome::Conflict(conflict) => {
                error!("{}", conflict);
                return Err(conflict.into());
            }
            Outcome::AlreadySatisfied => {
                debug!("{} already satisfied at {}", entry.url, path.display());
                (Ok(EntryStatus::AlreadySatisfied), false)
            }
            Outcome::NeedsCheckout(tag) => {
                let failed = self
                    .registry
                    .lookup(&entry.url)
                    .is_some_and(|record| record.checkout_failed);
                let result = if failed {
                    Err(Error::PreviouslyFailed {
                        url: entry.url.clone(),
                    })
                } else {
                    self.move_to_tag(entry, &path, &tag)
                        .map(|_| EntryStatus::Updated)
                };
                (result, false)
            }
            Outcome::New => (self.materialize_new(entry, &path), true),
        };

        let tag = self
            .registry
            .lookup(&entry.url)
            .map(|record| record.resolved_tag.clone())
            .unwrap_or_else(|| entry.tag.clone());

        let status = match result {
            Ok(status) => {
                if status == EntryStatus::AlreadySatisfied {
                    self.summary.skipped += 1;
                } else {
                    self.registry.mark_materialized(&entry.url);
                }
                self.summary.succeeded += 1;
                status
            }
            Err(e) => {
                warn!("{} ({}): {}", entry.url, tag, e);
                self.registry.mark_failed(&entry.url);
                self.summary.failed += 1;
                self.summary.failures.push(EntryFailure {
                    url: entry.url.clone(),
                    message: e.to_string(),
                });
                EntryStatus::Failed(e.to_string())
            }
        };

        Ok(EntryNode {
            url: entry.url.clone(),
            tag,
            path,
            status,
            discovered,
            nested: None,
        })
    }

    /// Move a known working copy to `tag`: fetch and checkout only.
    fn move_to_tag(&self, entry: &DependencyEntry, path: &Path, tag: &str) -> Result<()> {
        info!("moving {} to {}", entry.url, tag);
        let options = content_options(entry);
        self.ops.fetch_all(path)?;
        if self.options.force {
            self.ops.reset_hard(path, options)?;
        }
        self.ops.checkout(&entry.url, path, tag, options)
    }

    /// Set up a repository seen for the first time in this run.
    fn materialize_new(&self, entry: &DependencyEntry, path: &Path) -> Result<EntryStatus> {
        let url = entry.url.as_str();

        if self.ops.exists(path) {
            if self.ops.is_repository_at(path, url) {
                info!("reusing {} at {}", url, path.display());
                self.move_to_tag(entry, path, &entry.tag)?;
                self.sync_contents(entry, path)?;
                return Ok(EntryStatus::Reused);
            }

            let question = format!(
                "{} exists but is not a working copy of {}. Replace it?",
                path.display(),
                url
            );
            if !self.prompter.confirm(&question) {
                return Err(Error::ForeignDirectory {
                    url: url.to_string(),
                    path: path.to_path_buf(),
                });
            }
            self.ops.remove(path)?;
        }

        info!("cloning {} into {}", url, path.display());
        let options = content_options(entry);
        let setup = self
            .ops
            .clone_repository(url, path, options)
            .and_then(|_| self.ops.checkout(url, path, &entry.tag, options))
            .and_then(|_| self.sync_contents(entry, path));

        if let Err(e) = setup {
            if self.ops.exists(path) {
                debug!("removing partial clone at {}", path.display());
                if let Err(cleanup) = self.ops.remove(path) {
                    warn!(
                        "could not remove partial clone at {}: {}",
                        path.display(),
                        cleanup
                    );
                }
            }
            return Err(e);
        }

        Ok(EntryStatus::Cloned)
    }

    fn sync_contents(&self, entry: &DependencyEntry, path: &Path) -> Result<()> {
        self.ops.sync_submodules(path, content_options(entry))?;
        self.ops.sync_large_file_content(path, entry.skip_lfs)
    }
}

fn content_options(entry: &DependencyEntry) -> ContentOptions {
    ContentOptions {
        skip_large_files: entry.skip_lfs,
    }
}
