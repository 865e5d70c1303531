//! Path and URL helpers for repo-pin

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding component. The filesystem is never consulted, so the path does
/// not need to exist.
pub fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root; a leading `..` on a
                // relative path is kept
                match result.components().next_back() {
                    Some(Component::Normal(_)) => {
                        result.pop();
                    }
                    Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                    _ => result.push(".."),
                }
            }
            other => result.push(other.as_os_str()),
        }
    }
    if result.as_os_str().is_empty() {
        result.push(".");
    }
    result
}

/// Resolve an entry's `base_path` against the directory of the configuration
/// file that declared it. `config_dir` must already be absolute.
///
/// Symlinks are resolved in the part of the path that exists, so two
/// spellings of one directory resolve identically. Components that do not
/// exist yet are appended as written.
pub fn resolve_base_path(config_dir: &Path, base_path: &Path) -> PathBuf {
    let lexical = if base_path.is_absolute() {
        normalize(base_path)
    } else {
        normalize(&config_dir.join(base_path))
    };
    canonicalize_existing_prefix(&lexical)
}

fn canonicalize_existing_prefix(path: &Path) -> PathBuf {
    let mut existing = path;
    let mut missing = Vec::new();
    loop {
        if let Ok(canonical) = dunce::canonicalize(existing) {
            return missing
                .iter()
                .rev()
                .fold(canonical, |acc: PathBuf, name| acc.join(name));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}

/// Canonical absolute path of an existing configuration file.
pub fn canonical_file(path: &Path) -> Result<PathBuf> {
    dunce::canonicalize(path).map_err(|e| Error::Path {
        message: format!("cannot resolve {}: {}", path.display(), e),
    })
}

/// Whether two repository URLs name the same remote, ignoring a trailing
/// slash or `.git` suffix.
pub fn same_repository_url(a: &str, b: &str) -> bool {
    fn trim(url: &str) -> &str {
        let url = url.trim().trim_end_matches('/');
        url.strip_suffix(".git").unwrap_or(url)
    }
    trim(a) == trim(b)
}
