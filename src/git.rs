//! Thin wrappers around the system `git` binary.
//!
//! Every function shells out with `git -C <path> ...` and turns a non-zero
//! exit status into [`Error::GitCommand`] carrying the captured stderr. The
//! system binary brings along whatever authentication the user has
//! configured: SSH keys and agents, credential helpers, `~/.gitconfig`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use chrono::{DateTime, Utc};
use log::debug;

use crate::error::{Error, Result};

/// Process-level settings applied to every git invocation.
#[derive(Debug, Clone, Default)]
pub struct GitEnv {
    /// Private key passed to ssh through `GIT_SSH_COMMAND`.
    pub ssh_key: Option<PathBuf>,
    /// Keep LFS pointer files instead of downloading their content whenever
    /// git writes the working tree.
    pub skip_lfs_smudge: bool,
}

impl GitEnv {
    fn command(&self) -> Command {
        let mut command = Command::new("git");
        if self.skip_lfs_smudge {
            command.env("GIT_LFS_SKIP_SMUDGE", "1");
        }
        if let Some(key) = &self.ssh_key {
            command.env(
                "GIT_SSH_COMMAND",
                format!("ssh -i \"{}\" -o IdentitiesOnly=yes", key.display()),
            );
        }
        command
    }
}

fn describe(args: &[&str]) -> String {
    format!("git {}", args.join(" "))
}

/// Run `git -C <path> <args>` and return its output if it succeeded.
fn run_in(env: &GitEnv, path: &Path, args: &[&str]) -> Result<Output> {
    debug!("{} (in {})", describe(args), path.display());
    let output = env
        .command()
        .arg("-C")
        .arg(path)
        .args(args)
        .output()
        .map_err(|e| Error::GitCommand {
            command: describe(args),
            path: path.to_path_buf(),
            stderr: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(Error::GitCommand {
            command: describe(args),
            path: path.to_path_buf(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}

/// Clone `url` into `target_dir`, creating parent directories first.
pub fn clone(env: &GitEnv, url: &str, target_dir: &Path) -> Result<()> {
    if let Some(parent) = target_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    debug!("git clone {} {}", url, target_dir.display());
    let mut command = env.command();
    command.args(["clone", "--quiet", url]).arg(target_dir);

    let output = command.output().map_err(|e| Error::GitClone {
        url: url.to_string(),
        message: e.to_string(),
        hint: Some("Make sure git is installed and on PATH".to_string()),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let hint = if stderr.contains("Authentication failed")
            || stderr.contains("Permission denied")
            || stderr.contains("Could not read from remote repository")
        {
            Some(
                "Check that your SSH key is loaded in ssh-agent (or pass --ssh-key) \
                 and that you have access to the repository"
                    .to_string(),
            )
        } else {
            None
        };
        return Err(Error::GitClone {
            url: url.to_string(),
            message: stderr,
            hint,
        });
    }

    Ok(())
}

/// Fetch all remotes, including tags, overwriting moved tags.
pub fn fetch_all(env: &GitEnv, path: &Path) -> Result<()> {
    run_in(env, path, &["fetch", "--all", "--tags", "--force", "--quiet"]).map(|_| ())
}

/// Whether `tag` names a commit in the working copy.
pub fn has_tag(env: &GitEnv, path: &Path, tag: &str) -> bool {
    let spec = format!("refs/tags/{}^{{commit}}", tag);
    run_in(env, path, &["rev-parse", "--verify", "--quiet", &spec]).is_ok()
}

/// Check out `tag` (detached). Reports [`Error::TagNotFound`] when the tag
/// does not exist, so callers can tell a bad pin from a broken repository.
pub fn checkout_tag(env: &GitEnv, url: &str, path: &Path, tag: &str) -> Result<()> {
    if !has_tag(env, path, tag) {
        return Err(Error::TagNotFound {
            url: url.to_string(),
            tag: tag.to_string(),
            path: path.to_path_buf(),
        });
    }
    let target = format!("tags/{}", tag);
    run_in(env, path, &["checkout", "--quiet", &target]).map(|_| ())
}

/// Discard local modifications in the working copy.
pub fn reset_hard(env: &GitEnv, path: &Path) -> Result<()> {
    run_in(env, path, &["reset", "--hard", "--quiet"]).map(|_| ())
}

/// Bring submodules in line with the checked-out commit.
pub fn sync_submodules(env: &GitEnv, path: &Path) -> Result<()> {
    run_in(env, path, &["submodule", "sync", "--recursive", "--quiet"])?;
    run_in(
        env,
        path,
        &["submodule", "update", "--init", "--recursive", "--quiet"],
    )
    .map(|_| ())
}

/// Whether the working copy routes any path through the LFS filter.
pub fn uses_lfs(path: &Path) -> bool {
    fs::read_to_string(path.join(".gitattributes"))
        .map(|content| content.contains("filter=lfs"))
        .unwrap_or(false)
}

/// Download large-file content for the checked-out commit.
pub fn lfs_pull(env: &GitEnv, path: &Path) -> Result<()> {
    run_in(env, path, &["lfs", "pull"]).map(|_| ())
}

/// URL of the `origin` remote, if the path is a working copy that has one.
pub fn origin_url(env: &GitEnv, path: &Path) -> Option<String> {
    run_in(env, path, &["config", "--get", "remote.origin.url"])
        .ok()
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .filter(|url| !url.is_empty())
}

/// Creation date of every tag in the working copy.
pub fn tag_dates(env: &GitEnv, path: &Path) -> Result<HashMap<String, DateTime<Utc>>> {
    let output = run_in(
        env,
        path,
        &[
            "for-each-ref",
            "--format=%(refname:short)%09%(creatordate:unix)",
            "refs/tags",
        ],
    )?;
    Ok(parse_tag_dates(&String::from_utf8_lossy(&output.stdout)))
}

/// Parse `for-each-ref` output of the form `<tag>\t<unix seconds>`.
/// Malformed lines are skipped.
pub fn parse_tag_dates(stdout: &str) -> HashMap<String, DateTime<Utc>> {
    stdout
        .lines()
        .filter_map(|line| {
            let (tag, seconds) = line.split_once('\t')?;
            let seconds: i64 = seconds.trim().parse().ok()?;
            let date = DateTime::from_timestamp(seconds, 0)?;
            Some((tag.to_string(), date))
        })
        .collect()
}
