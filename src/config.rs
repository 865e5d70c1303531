//! # Configuration Schema and Parsing
//!
//! This module defines the data structures that represent a `repo-pin.json`
//! configuration file and the logic for parsing and validating it.
//!
//! A configuration file is an ordered list of dependency entries. JSON is the
//! primary format; files with a `.yaml` or `.yml` extension are read as YAML
//! with the same schema.
//!
//! ```json
//! [
//!   {
//!     "url": "https://example.com/org/lib-a.git",
//!     "base_path": "libs/lib-a",
//!     "tag": "v2.0",
//!     "compatible_tags": ["v1.0", "v1.5"],
//!     "compatibility": "strict",
//!     "skip_lfs": false
//!   }
//! ]
//! ```
//!
//! Field names are snake_case; the camelCase spellings `basePath`,
//! `pinnedTag`, `compatibleTags`, `compatibilityMode` and `skipLargeFileSync`
//! are accepted as aliases. Unknown fields are rejected.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How a repository's tag is arbitrated when several entries request it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompatibilityMode {
    /// Intersection: only tags acceptable to every requester survive.
    Strict,
    /// Union: the most advanced tag any requester knows about wins.
    Permissive,
}

impl fmt::Display for CompatibilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompatibilityMode::Strict => write!(f, "strict"),
            CompatibilityMode::Permissive => write!(f, "permissive"),
        }
    }
}

impl FromStr for CompatibilityMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(CompatibilityMode::Strict),
            "permissive" => Ok(CompatibilityMode::Permissive),
            other => Err(format!(
                "unknown compatibility mode '{}' (expected 'strict' or 'permissive')",
                other
            )),
        }
    }
}

/// One repository reference inside a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencyEntry {
    /// Repository identity; one URL names one physical repository.
    pub url: String,
    /// Where the working copy lives, relative to the configuration file's
    /// directory unless absolute.
    #[serde(alias = "basePath")]
    pub base_path: PathBuf,
    /// The tag this entry would check out on its own.
    #[serde(alias = "pinnedTag")]
    pub tag: String,
    /// Additional tags considered interchangeable with `tag`, oldest first.
    #[serde(default, alias = "compatibleTags")]
    pub compatible_tags: Vec<String>,
    /// Falls back to the run-level default when absent.
    #[serde(default, alias = "compatibilityMode")]
    pub compatibility: Option<CompatibilityMode>,
    /// Skip large-file (LFS) content when materializing.
    #[serde(default, alias = "skipLargeFileSync")]
    pub skip_lfs: bool,
}

impl DependencyEntry {
    /// The ordered tag list: compatible tags with the pinned tag appended last.
    pub fn ordered_tags(&self) -> Vec<String> {
        let mut tags = self.compatible_tags.clone();
        tags.push(self.tag.clone());
        tags
    }

    /// The entry's mode, or `default` if it does not declare one.
    pub fn mode_or(&self, default: CompatibilityMode) -> CompatibilityMode {
        self.compatibility.unwrap_or(default)
    }

    fn validate(&self, index: usize, path: &Path) -> Result<()> {
        let invalid = |message: String, hint: &str| Error::ConfigParse {
            path: path.to_path_buf(),
            message,
            hint: Some(hint.to_string()),
        };

        if self.url.trim().is_empty() {
            return Err(invalid(
                format!("entry {} has an empty url", index),
                "Set 'url' to the repository to clone",
            ));
        }
        if self.base_path.as_os_str().is_empty() {
            return Err(invalid(
                format!("entry {} ({}) has an empty base_path", index, self.url),
                "Set 'base_path' to the directory the working copy should live in",
            ));
        }
        if self.tag.trim().is_empty() {
            return Err(invalid(
                format!("entry {} ({}) has an empty tag", index, self.url),
                "Set 'tag' to the version tag to check out",
            ));
        }

        let mut seen = HashSet::new();
        for tag in self.compatible_tags.iter().chain(std::iter::once(&self.tag)) {
            if tag.trim().is_empty() {
                return Err(invalid(
                    format!("entry {} ({}) lists an empty compatible tag", index, self.url),
                    "Remove the empty string from 'compatible_tags'",
                ));
            }
            if !seen.insert(tag.as_str()) {
                return Err(invalid(
                    format!("entry {} ({}) lists tag '{}' twice", index, self.url, tag),
                    "Each tag may appear once across 'compatible_tags' and 'tag'",
                ));
            }
        }

        Ok(())
    }
}

/// The parsed contents of one configuration file.
pub type DependencyFile = Vec<DependencyEntry>;

/// Serialization format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Picks the format from the file extension; anything but `.yaml`/`.yml`
    /// is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Format::Yaml
            }
            _ => Format::Json,
        }
    }
}

/// Parse and validate configuration content. `path` is only used in error
/// messages.
pub fn parse(content: &str, format: Format, path: &Path) -> Result<DependencyFile> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let parsed: std::result::Result<DependencyFile, String> = match format {
        Format::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        Format::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
    };

    let entries = parsed.map_err(|message| {
        let hint = if message.contains("missing field") {
            Some("Each entry needs 'url', 'base_path' and 'tag'".to_string())
        } else if message.contains("unknown field") {
            Some(
                "Known fields: url, base_path, tag, compatible_tags, compatibility, skip_lfs"
                    .to_string(),
            )
        } else {
            None
        };
        Error::ConfigParse {
            path: path.to_path_buf(),
            message,
            hint,
        }
    })?;

    for (index, entry) in entries.iter().enumerate() {
        entry.validate(index, path)?;
    }

    Ok(entries)
}

/// Read, parse and validate a configuration file.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<DependencyFile> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| Error::ConfigParse {
        path: path.to_path_buf(),
        message: e.to_string(),
        hint: None,
    })?;
    parse(&content, Format::from_path(path), path)
}
