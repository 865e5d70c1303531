//! Shared test utilities for integration and E2E tests.
//!
//! - [`TestFixture`]: a temporary directory with a `repo-pin.json` and a
//!   command builder for the CLI binary.
//! - [`MockOperations`]: an in-memory stand-in for git. Every "remote" is a
//!   set of tags, each optionally carrying the content of the nested
//!   configuration file that checking that tag out produces.
//! - [`entry`] / [`config`]: builders for configuration file content.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let fixture = TestFixture::new().with_config(&config(&[entry(LIB_A, "libs/a", "v1", &[])]));
//! let ops = MockOperations::new().with_tag(LIB_A, "v1");
//! let report = fixture.walk(&ops, WalkOptions::default()).unwrap();
//! ```

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use assert_fs::prelude::*;
use serde_json::{json, Value};

use repo_pin::error::{Error, Result};
use repo_pin::path::same_repository_url;
use repo_pin::prompt::FixedAnswer;
use repo_pin::repository::{ContentOptions, NoTagDates, RepositoryOperations};
use repo_pin::walker::{WalkOptions, WalkReport, Walker};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    pub use super::{config, entry, entry_with_mode, skipping_lfs, MockOperations, TestFixture};
    pub use super::{LIB_A, LIB_B, LIB_C, LIB_D, LIB_E};
}

pub const LIB_A: &str = "https://example.com/org/lib-a.git";
pub const LIB_B: &str = "https://example.com/org/lib-b.git";
pub const LIB_C: &str = "https://example.com/org/lib-c.git";
pub const LIB_D: &str = "https://example.com/org/lib-d.git";
pub const LIB_E: &str = "https://example.com/org/lib-e.git";

const CONFIG_NAME: &str = "repo-pin.json";
const ORIGIN_MARKER: &str = ".mock-origin";
const TAG_MARKER: &str = ".mock-tag";

/// One dependency entry with the run's default compatibility mode.
pub fn entry(url: &str, base_path: &str, tag: &str, compatible: &[&str]) -> Value {
    json!({
        "url": url,
        "base_path": base_path,
        "tag": tag,
        "compatible_tags": compatible,
    })
}

/// One dependency entry with an explicit compatibility mode.
pub fn entry_with_mode(
    url: &str,
    base_path: &str,
    tag: &str,
    compatible: &[&str],
    mode: &str,
) -> Value {
    let mut value = entry(url, base_path, tag, compatible);
    value["compatibility"] = json!(mode);
    value
}

/// `entry` with large-file content skipped.
pub fn skipping_lfs(mut entry: Value) -> Value {
    entry["skip_lfs"] = json!(true);
    entry
}

/// A configuration file containing `entries`.
pub fn config(entries: &[Value]) -> String {
    serde_json::to_string_pretty(entries).expect("entries serialize")
}

/// A temporary directory with an optional root `repo-pin.json`.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write the root configuration file.
    pub fn with_config(self, content: &str) -> Self {
        self.with_file(CONFIG_NAME, content)
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The directory as the walker sees it, with symlinks resolved.
    pub fn root(&self) -> PathBuf {
        dunce::canonicalize(self.temp_dir.path()).expect("temp dir canonicalizes")
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join(CONFIG_NAME)
    }

    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Run the walker on the root file; directories in the way are never
    /// replaced unless `replace` is set via [`TestFixture::walk_with_answer`].
    pub fn walk(&self, ops: &MockOperations, options: WalkOptions) -> Result<WalkReport> {
        self.walk_with_answer(ops, options, false)
    }

    pub fn walk_with_answer(
        &self,
        ops: &MockOperations,
        options: WalkOptions,
        replace: bool,
    ) -> Result<WalkReport> {
        let prompter = FixedAnswer(replace);
        Walker::new(ops, &NoTagDates, &prompter, options).run(&self.config_path())
    }

    /// A command for the binary, running inside this fixture.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("repo-pin");
        cmd.current_dir(self.path());
        cmd.env_remove("REPO_PIN_CONFIG")
            .env_remove("REPO_PIN_MODE")
            .env_remove("REPO_PIN_MAX_DEPTH")
            .env_remove("REPO_PIN_LOG");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory remotes and on-disk fake working copies.
///
/// `clone_repository` creates the destination with a marker file holding the
/// URL. `checkout` writes (or removes) the nested configuration file the
/// catalog defines for that tag.
#[derive(Default)]
pub struct MockOperations {
    remotes: HashMap<String, BTreeMap<String, Option<String>>>,
    failing_submodules: HashSet<String>,
    calls: RefCell<Vec<String>>,
}

impl MockOperations {
    pub fn new() -> Self {
        Self::default()
    }

    /// `url` has `tag`, without a nested configuration file.
    pub fn with_tag(mut self, url: &str, tag: &str) -> Self {
        self.remotes
            .entry(url.to_string())
            .or_default()
            .insert(tag.to_string(), None);
        self
    }

    pub fn with_tags(self, url: &str, tags: &[&str]) -> Self {
        tags.iter().fold(self, |ops, tag| ops.with_tag(url, tag))
    }

    /// Checking out `tag` of `url` produces a nested configuration file.
    pub fn with_nested_config(mut self, url: &str, tag: &str, content: &str) -> Self {
        self.remotes
            .entry(url.to_string())
            .or_default()
            .insert(tag.to_string(), Some(content.to_string()));
        self
    }

    /// Submodule sync fails for working copies of `url`.
    pub fn failing_submodules(mut self, url: &str) -> Self {
        self.failing_submodules.insert(url.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Number of recorded calls starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    /// Tag currently checked out in the fake working copy at `path`.
    pub fn checked_out_tag(path: &Path) -> Option<String> {
        fs::read_to_string(path.join(TAG_MARKER)).ok()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn origin(path: &Path) -> Option<String> {
        fs::read_to_string(path.join(ORIGIN_MARKER)).ok()
    }
}

/// Marks recorded calls made while large-file content is skipped.
fn skip_suffix(options: ContentOptions) -> &'static str {
    if options.skip_large_files {
        " [skip-lfs]"
    } else {
        ""
    }
}

impl RepositoryOperations for MockOperations {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_repository_at(&self, path: &Path, expected_url: &str) -> bool {
        Self::origin(path).is_some_and(|origin| same_repository_url(&origin, expected_url))
    }

    fn clone_repository(&self, url: &str, destination: &Path, options: ContentOptions) -> Result<()> {
        self.record(format!("clone {}{}", url, skip_suffix(options)));
        if !self.remotes.contains_key(url) {
            return Err(Error::GitClone {
                url: url.to_string(),
                message: "repository not found".to_string(),
                hint: None,
            });
        }
        fs::create_dir_all(destination)?;
        fs::write(destination.join(ORIGIN_MARKER), url)?;
        Ok(())
    }

    fn fetch_all(&self, path: &Path) -> Result<()> {
        self.record(format!("fetch {}", path.display()));
        Ok(())
    }

    fn checkout(&self, url: &str, path: &Path, tag: &str, options: ContentOptions) -> Result<()> {
        self.record(format!(
            "checkout {} {}{}",
            url,
            tag,
            skip_suffix(options)
        ));
        let nested = Self::origin(path)
            .and_then(|origin| self.remotes.get(&origin))
            .and_then(|tags| tags.get(tag));
        let Some(nested) = nested else {
            return Err(Error::TagNotFound {
                url: url.to_string(),
                tag: tag.to_string(),
                path: path.to_path_buf(),
            });
        };

        let nested_path = path.join(CONFIG_NAME);
        match nested {
            Some(content) => fs::write(&nested_path, content)?,
            None if nested_path.exists() => fs::remove_file(&nested_path)?,
            None => {}
        }
        fs::write(path.join(TAG_MARKER), tag)?;
        Ok(())
    }

    fn reset_hard(&self, path: &Path, options: ContentOptions) -> Result<()> {
        self.record(format!("reset {}{}", path.display(), skip_suffix(options)));
        Ok(())
    }

    fn sync_submodules(&self, path: &Path, options: ContentOptions) -> Result<()> {
        self.record(format!(
            "submodules {}{}",
            path.display(),
            skip_suffix(options)
        ));
        let failing = Self::origin(path).is_some_and(|o| self.failing_submodules.contains(&o));
        if failing {
            return Err(Error::GitCommand {
                command: "git submodule update --init --recursive".to_string(),
                path: path.to_path_buf(),
                stderr: "fatal: could not read submodule".to_string(),
            });
        }
        Ok(())
    }

    fn sync_large_file_content(&self, path: &Path, skip: bool) -> Result<()> {
        self.record(format!("lfs {} skip={}", path.display(), skip));
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        self.record(format!("remove {}", path.display()));
        if path.exists() {
            fs::remove_dir_all(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_with_config() {
        let fixture = TestFixture::new().with_config("[]");
        assert!(fixture.config_path().exists());
    }

    #[test]
    fn test_config_builder_is_valid_json() {
        let content = config(&[entry_with_mode(LIB_A, "a", "v2", &["v1"], "strict")]);
        let value: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value[0]["compatibility"], "strict");
        assert_eq!(value[0]["compatible_tags"][0], "v1");
    }

    #[test]
    fn test_mock_checkout_writes_nested_config() {
        let fixture = TestFixture::new();
        let ops = MockOperations::new().with_nested_config(LIB_A, "v1", "[]");
        let dest = fixture.path().join("a");

        ops.clone_repository(LIB_A, &dest, ContentOptions::default())
            .unwrap();
        ops.checkout(LIB_A, &dest, "v1", ContentOptions::default())
            .unwrap();

        assert!(ops.is_repository_at(&dest, LIB_A));
        assert_eq!(fs::read_to_string(dest.join(CONFIG_NAME)).unwrap(), "[]");
        assert_eq!(MockOperations::checked_out_tag(&dest).as_deref(), Some("v1"));
        assert!(matches!(
            ops.checkout(LIB_A, &dest, "v9", ContentOptions::default()),
            Err(Error::TagNotFound { .. })
        ));
    }
}
