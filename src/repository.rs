//! # Repository Operations
//!
//! The dependency walker never runs `git` itself. It goes through two narrow
//! traits so the resolution engine can be exercised without touching the
//! network or the disk:
//!
//! - **`RepositoryOperations`**: existence checks, clone, fetch, checkout,
//!   reset, submodule and large-file sync against a working copy.
//! - **`TagDateProvider`**: creation dates of tags, used only to break ties
//!   between equally acceptable tags.
//!
//! `GitRepositoryOperations` and `GitTagDates` are the real implementations
//! backed by [`crate::git`]. `DryRunOperations` wraps any implementation,
//! answers read-only questions from it, and logs the mutating calls instead
//! of performing them.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::error::Result;
use crate::git::{self, GitEnv};
use crate::path::same_repository_url;

/// How working-tree content is materialized by every operation that writes
/// files: clone, checkout, reset and submodule update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentOptions {
    /// Do not download large-file (LFS) content.
    pub skip_large_files: bool,
}

/// Operations against an on-disk working copy.
pub trait RepositoryOperations {
    /// Whether anything exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Whether `path` is a working copy whose origin is `expected_url`.
    fn is_repository_at(&self, path: &Path, expected_url: &str) -> bool;

    /// Clone `url` into `destination`.
    fn clone_repository(&self, url: &str, destination: &Path, options: ContentOptions)
        -> Result<()>;

    /// Fetch every remote, including tags.
    fn fetch_all(&self, path: &Path) -> Result<()>;

    /// Check out `tag`. Must fail with [`crate::error::Error::TagNotFound`]
    /// when the tag does not exist.
    fn checkout(&self, url: &str, path: &Path, tag: &str, options: ContentOptions)
        -> Result<()>;

    /// Discard local modifications.
    fn reset_hard(&self, path: &Path, options: ContentOptions) -> Result<()>;

    /// Initialize and update submodules recursively.
    fn sync_submodules(&self, path: &Path, options: ContentOptions) -> Result<()>;

    /// Download large-file content unless `skip` is set.
    fn sync_large_file_content(&self, path: &Path, skip: bool) -> Result<()>;

    /// Delete a working copy, e.g. after a clone that never reached a
    /// consistent state.
    fn remove(&self, path: &Path) -> Result<()>;
}

/// Source of tag creation dates. Fails soft: tags without a resolvable date
/// are simply absent from the returned map.
pub trait TagDateProvider {
    fn dates_for_tags(&self, working_copy: &Path, tags: &[String])
        -> HashMap<String, DateTime<Utc>>;
}

/// A provider that knows no dates. Useful when chronological tie-breaks are
/// not wanted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTagDates;

impl TagDateProvider for NoTagDates {
    fn dates_for_tags(&self, _: &Path, _: &[String]) -> HashMap<String, DateTime<Utc>> {
        HashMap::new()
    }
}

/// Repository operations backed by the system `git` binary.
#[derive(Debug, Clone, Default)]
pub struct GitRepositoryOperations {
    env: GitEnv,
}

impl GitRepositoryOperations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `key` for every SSH connection git makes.
    pub fn with_ssh_key(mut self, key: PathBuf) -> Self {
        self.env.ssh_key = Some(key);
        self
    }

    fn env_for(&self, options: ContentOptions) -> GitEnv {
        GitEnv {
            skip_lfs_smudge: options.skip_large_files,
            ..self.env.clone()
        }
    }
}

impl RepositoryOperations for GitRepositoryOperations {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_repository_at(&self, path: &Path, expected_url: &str) -> bool {
        if !path.join(".git").exists() {
            return false;
        }
        match git::origin_url(&self.env, path) {
            Some(url) => same_repository_url(&url, expected_url),
            None => false,
        }
    }

    fn clone_repository(
        &self,
        url: &str,
        destination: &Path,
        options: ContentOptions,
    ) -> Result<()> {
        git::clone(&self.env_for(options), url, destination)
    }

    fn fetch_all(&self, path: &Path) -> Result<()> {
        git::fetch_all(&self.env, path)
    }

    fn checkout(
        &self,
        url: &str,
        path: &Path,
        tag: &str,
        options: ContentOptions,
    ) -> Result<()> {
        git::checkout_tag(&self.env_for(options), url, path, tag)
    }

    fn reset_hard(&self, path: &Path, options: ContentOptions) -> Result<()> {
        git::reset_hard(&self.env_for(options), path)
    }

    fn sync_submodules(&self, path: &Path, options: ContentOptions) -> Result<()> {
        if !path.join(".gitmodules").exists() {
            return Ok(());
        }
        git::sync_submodules(&self.env_for(options), path)
    }

    fn sync_large_file_content(&self, path: &Path, skip: bool) -> Result<()> {
        if skip || !git::uses_lfs(path) {
            return Ok(());
        }
        git::lfs_pull(&self.env, path)
    }

    fn remove(&self, path: &Path) -> Result<()> {
        if path.exists() {
            fs::remove_dir_all(path)?;
        }
        Ok(())
    }
}

/// Tag dates read with `git for-each-ref`.
#[derive(Debug, Clone, Default)]
pub struct GitTagDates {
    env: GitEnv,
}

impl GitTagDates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ssh_key(mut self, key: PathBuf) -> Self {
        self.env.ssh_key = Some(key);
        self
    }
}

impl TagDateProvider for GitTagDates {
    fn dates_for_tags(
        &self,
        working_copy: &Path,
        tags: &[String],
    ) -> HashMap<String, DateTime<Utc>> {
        match git::tag_dates(&self.env, working_copy) {
            Ok(mut dates) => {
                dates.retain(|tag, _| tags.contains(tag));
                dates
            }
            Err(e) => {
                debug!(
                    "no tag dates available in {}: {}",
                    working_copy.display(),
                    e
                );
                HashMap::new()
            }
        }
    }
}

/// Reports what would be done instead of doing it.
pub struct DryRunOperations<O> {
    inner: O,
}

impl<O: RepositoryOperations> DryRunOperations<O> {
    pub fn new(inner: O) -> Self {
        Self { inner }
    }
}

impl<O: RepositoryOperations> RepositoryOperations for DryRunOperations<O> {
    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn is_repository_at(&self, path: &Path, expected_url: &str) -> bool {
        self.inner.is_repository_at(path, expected_url)
    }

    fn clone_repository(
        &self,
        url: &str,
        destination: &Path,
        options: ContentOptions,
    ) -> Result<()> {
        info!(
            "[dry-run] would clone {} into {}{}",
            url,
            destination.display(),
            if options.skip_large_files {
                " (skipping LFS content)"
            } else {
                ""
            }
        );
        Ok(())
    }

    fn fetch_all(&self, path: &Path) -> Result<()> {
        info!("[dry-run] would fetch all remotes in {}", path.display());
        Ok(())
    }

    fn checkout(&self, url: &str, path: &Path, tag: &str, _: ContentOptions) -> Result<()> {
        info!(
            "[dry-run] would check out {} of {} in {}",
            tag,
            url,
            path.display()
        );
        Ok(())
    }

    fn reset_hard(&self, path: &Path, _: ContentOptions) -> Result<()> {
        info!("[dry-run] would reset {}", path.display());
        Ok(())
    }

    fn sync_submodules(&self, path: &Path, _: ContentOptions) -> Result<()> {
        info!("[dry-run] would update submodules in {}", path.display());
        Ok(())
    }

    fn sync_large_file_content(&self, path: &Path, skip: bool) -> Result<()> {
        if !skip {
            info!("[dry-run] would pull LFS content in {}", path.display());
        }
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        info!("[dry-run] would remove {}", path.display());
        Ok(())
    }
}
