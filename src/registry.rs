//! # Repository Registry
//!
//! The registry is the single source of truth about every repository seen
//! during one run. It maps a repository URL to a [`RegistryRecord`] holding
//! the working-copy location, the winning tag and its materialization state.
//!
//! Every request for a URL goes through [`Registry::reconcile`]. The first
//! request inserts a record; later requests are checked against it:
//!
//! 1. A different location for the same URL is a [`Conflict::PathMismatch`].
//! 2. Tag lists without a shared tag are a [`Conflict::ApiIncompatible`],
//!    unless both sides are Permissive, in which case the union is taken.
//! 3. Otherwise the [`crate::resolver`] decides the new winning tag.
//!
//! The registry is an owned value threaded through the walk by mutable
//! reference; there is no global state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::debug;

use crate::config::CompatibilityMode;
use crate::error::Conflict;
use crate::repository::TagDateProvider;
use crate::resolver::{resolve, TieBreak};
use crate::tags::intersect;

/// Everything the registry knows about one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryRecord {
    /// Normalized absolute location of the working copy. Never changes.
    pub absolute_path: PathBuf,
    pub resolved_tag: String,
    /// Ordered tag list minus `resolved_tag`.
    pub compatible_tags: Vec<String>,
    /// May only move from Permissive to Strict.
    pub mode: CompatibilityMode,
    /// A working copy at `resolved_tag` exists on disk.
    pub already_materialized: bool,
    /// `resolved_tag` changed and the working copy has not followed yet.
    pub pending_checkout: bool,
    /// An operation against this repository failed; no more retries or
    /// dependency discovery for it in this run.
    pub checkout_failed: bool,
}

impl RegistryRecord {
    pub fn new(
        absolute_path: PathBuf,
        resolved_tag: String,
        compatible_tags: Vec<String>,
        mode: CompatibilityMode,
    ) -> Self {
        Self {
            absolute_path,
            resolved_tag,
            compatible_tags,
            mode,
            already_materialized: false,
            pending_checkout: false,
            checkout_failed: false,
        }
    }

    /// Compatible tags with the resolved tag appended.
    pub fn ordered_tags(&self) -> Vec<String> {
        let mut tags = self.compatible_tags.clone();
        tags.push(self.resolved_tag.clone());
        tags
    }
}

/// What the caller has to do after reconciling a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// First time this URL is seen; clone and set it up from scratch.
    New,
    /// The working copy already satisfies the request.
    AlreadySatisfied,
    /// The winning tag changed; fetch and check out this tag.
    NeedsCheckout(String),
    /// The request cannot be reconciled; the run must stop.
    Conflict(Conflict),
}

/// Process-lifetime map from repository URL to its resolved state.
#[derive(Debug, Default)]
pub struct Registry {
    records: BTreeMap<String, RegistryRecord>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, url: &str) -> Option<&RegistryRecord> {
        self.records.get(url)
    }

    /// Number of unique repositories seen.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Create a record for a URL seen for the first time.
    pub fn insert_new(
        &mut self,
        url: &str,
        absolute_path: PathBuf,
        tag: String,
        compatible_tags: Vec<String>,
        mode: CompatibilityMode,
    ) {
        self.records.insert(
            url.to_string(),
            RegistryRecord::new(absolute_path, tag, compatible_tags, mode),
        );
    }

    /// Merge a request for `url` into the registry.
    ///
    /// `ordered_tags` is the request's compatible tags with its pinned tag
    /// last. `dates` is only consulted when a tie between equally good tags
    /// has to be broken.
    pub fn reconcile(
        &mut self,
        url: &str,
        absolute_path: &Path,
        ordered_tags: &[String],
        mode: CompatibilityMode,
        dates: &dyn TagDateProvider,
    ) -> Outcome {
        let Some(record) = self.records.get_mut(url) else {
            let (tag, compatible) = match ordered_tags.split_last() {
                Some((tag, compatible)) => (tag.clone(), compatible.to_vec()),
                None => (String::new(), Vec::new()),
            };
            self.insert_new(url, absolute_path.to_path_buf(), tag, compatible, mode);
            return Outcome::New;
        };

        if record.absolute_path != absolute_path {
            return Outcome::Conflict(Conflict::PathMismatch {
                url: url.to_string(),
                existing: record.absolute_path.clone(),
                requested: absolute_path.to_path_buf(),
            });
        }

        let existing_tags = record.ordered_tags();
        let both_permissive =
            record.mode == CompatibilityMode::Permissive && mode == CompatibilityMode::Permissive;
        if !both_permissive && intersect(&existing_tags, ordered_tags).is_empty() {
            return Outcome::Conflict(Conflict::ApiIncompatible {
                url: url.to_string(),
                existing_tags,
                requested_tags: ordered_tags.to_vec(),
            });
        }

        let working_copy = record
            .already_materialized
            .then_some(record.absolute_path.as_path());
        let resolution = resolve(
            record,
            ordered_tags,
            mode,
            &TieBreak::new(dates, working_copy),
        );

        let changed = resolution.tag != record.resolved_tag;
        debug!(
            "reconciled {}: {} ({}) -> {} ({})",
            url, record.resolved_tag, record.mode, resolution.tag, resolution.mode
        );

        record.resolved_tag = resolution.tag;
        record.compatible_tags = resolution.compatible_tags;
        record.mode = resolution.mode;
        if changed {
            record.pending_checkout = true;
        }

        if record.pending_checkout || !record.already_materialized {
            Outcome::NeedsCheckout(record.resolved_tag.clone())
        } else {
            Outcome::AlreadySatisfied
        }
    }

    /// The working copy now sits at the resolved tag.
    pub fn mark_materialized(&mut self, url: &str) {
        if let Some(record) = self.records.get_mut(url) {
            record.already_materialized = true;
            record.pending_checkout = false;
        }
    }

    /// An operation against the repository failed; terminal for this run.
    pub fn mark_failed(&mut self, url: &str) {
        if let Some(record) = self.records.get_mut(url) {
            record.checkout_failed = true;
        }
    }
}
