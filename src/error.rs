//! # Error Handling
//!
//! This module defines the centralized error handling mechanism for
//! `repo-pin`. It uses the `thiserror` library to create a comprehensive
//! `Error` enum that covers every anticipated failure mode, with enough
//! context (URL, tag, path) to act on without re-running in verbose mode.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum representing all errors that can occur within
//!   the library.
//!
//! - **`Conflict`**: The two fatal reconciliation failures. A conflict means
//!   two requesters disagree about a shared repository in a way that cannot be
//!   resolved, so the whole run is aborted rather than the offending entry.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! Errors split into two scopes, reported by [`Error::is_fatal`]:
//!
//! - Entry-scoped: configuration errors abort the file they occur in, and
//!   version-control failures abort only the entry being materialized.
//! - Run-scoped: a [`Conflict`] aborts the entire run.

use std::path::PathBuf;

use thiserror::Error;

fn hint_suffix(hint: &Option<String>) -> String {
    hint.as_ref()
        .map(|h| format!("\n  hint: {}", h))
        .unwrap_or_default()
}

/// A fatal disagreement between two requests for the same repository.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// The same URL was requested at two different locations on disk.
    #[error(
        "Path conflict for {url}: already resolved at {existing} but also requested at {requested}"
    )]
    PathMismatch {
        url: String,
        existing: PathBuf,
        requested: PathBuf,
    },

    /// The two requests share no tag at all.
    #[error(
        "API incompatibility for {url}: no common tag between [{}] and [{}]",
        existing_tags.join(", "),
        requested_tags.join(", ")
    )]
    ApiIncompatible {
        url: String,
        existing_tags: Vec<String>,
        requested_tags: Vec<String>,
    },
}

/// Main error type for repo-pin operations
#[derive(Error, Debug)]
pub enum Error {
    /// A configuration file could not be parsed or failed validation.
    #[error("Configuration error in {}: {message}{}", path.display(), hint_suffix(hint))]
    ConfigParse {
        path: PathBuf,
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// Cloning a repository failed.
    #[error("Git clone error for {url}: {message}{}", hint_suffix(hint))]
    GitClone {
        url: String,
        message: String,
        /// Optional hint for how to resolve the clone issue
        hint: Option<String>,
    },

    /// A git command exited unsuccessfully or could not be spawned.
    #[error("Git command failed in {}: {command} - {stderr}", path.display())]
    GitCommand {
        command: String,
        path: PathBuf,
        stderr: String,
    },

    /// The requested tag does not exist in the working copy.
    #[error("Tag {tag} not found for {url} in {}", path.display())]
    TagNotFound {
        url: String,
        tag: String,
        path: PathBuf,
    },

    /// The destination exists but is not a working copy of the expected URL.
    #[error("{} exists and is not a working copy of {url}", path.display())]
    ForeignDirectory { url: String, path: PathBuf },

    /// An entry could not be materialized because an earlier operation
    /// against the same repository already failed in this run.
    #[error("{url} was not retried after an earlier failure in this run")]
    PreviouslyFailed { url: String },

    /// A fatal reconciliation conflict.
    #[error(transparent)]
    Conflict(#[from] Conflict),

    /// An error with a path-related operation.
    #[error("Path operation error: {message}")]
    Path { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error aborts the whole run rather than a single entry or file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
