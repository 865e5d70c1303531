//! Default values for repo-pin configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use crate::config::CompatibilityMode;

/// File name of the root configuration file, also searched for inside every
/// newly checked-out repository.
pub const CONFIG_FILE_NAME: &str = "repo-pin.json";

/// How many levels of nested configuration files are followed below the root.
pub const MAX_DEPTH: usize = 5;

/// Mode applied to entries that do not declare one.
pub const COMPATIBILITY_MODE: CompatibilityMode = CompatibilityMode::Permissive;

/// Environment variable that overrides the `--log-level` flag with a full
/// `env_logger` filter string.
pub const LOG_ENV: &str = "REPO_PIN_LOG";
