//! # repo-pin
//!
//! This library resolves and checks out a tree of git dependencies, each
//! pinned to a tag, across nested configuration files that are only
//! discovered once their repository has been checked out. It backs the
//! `repo-pin` command-line tool but can be embedded elsewhere.
//!
//! ## Quick Example
//!
//! ```
//! use repo_pin::config::CompatibilityMode;
//! use repo_pin::registry::{Outcome, Registry};
//! use repo_pin::repository::NoTagDates;
//! use std::path::Path;
//!
//! let tags = |list: &[&str]| list.iter().map(|t| t.to_string()).collect::<Vec<_>>();
//! let url = "https://example.com/org/lib-a.git";
//! let path = Path::new("/work/libs/lib-a");
//!
//! let mut registry = Registry::new();
//! let first = registry.reconcile(
//!     url, path, &tags(&["v1.0", "v1.5", "v2.0"]), CompatibilityMode::Strict, &NoTagDates,
//! );
//! assert_eq!(first, Outcome::New);
//! registry.mark_materialized(url);
//!
//! // A second requester only accepts up to v1.5
//! let second = registry.reconcile(
//!     url, path, &tags(&["v1.0", "v1.5"]), CompatibilityMode::Strict, &NoTagDates,
//! );
//! assert_eq!(second, Outcome::NeedsCheckout("v1.5".to_string()));
//! ```
//!
//! ## Core Concepts
//!
//! - **Configuration (`config`)**: the schema of `repo-pin.json` files, an
//!   ordered list of dependency entries.
//! - **Tag comparison (`tags`)**: intersection and order-preserving union of
//!   chronological tag lists.
//! - **Resolution (`resolver`)**: the Strict/Permissive mode matrix that
//!   picks the winning tag when two entries request the same repository.
//! - **Registry (`registry`)**: one record per repository URL for the whole
//!   run; detects path and tag conflicts.
//! - **Walker (`walker`)**: reads configuration files depth-first, checks
//!   repositories out and recurses into their own configuration files.
//! - **Repository operations (`repository`, `git`)**: the narrow interface to
//!   the `git` binary, with a dry-run wrapper.
//!
//! ## Execution Flow
//!
//! Walker → (per entry) Registry reconcile → Resolver → repository
//! operations → (for each newly checked-out repository) Walker recursion.

pub mod config;
pub mod defaults;
pub mod error;
pub mod git;
pub mod output;
pub mod path;
pub mod prompt;
pub mod registry;
pub mod repository;
pub mod resolver;
pub mod tags;
pub mod walker;

#[cfg(test)]
mod tags_proptest;
