//! # Output Configuration
//!
//! Controls how `repo-pin` decorates what it prints: emoji markers and
//! colored status words when the terminal supports them, bracketed plain
//! text otherwise.
//!
//! The `--color=never|always|auto` flag wins. In `auto` mode the usual
//! environment conventions apply: `NO_COLOR`, `CLICOLOR=0`,
//! `CLICOLOR_FORCE=1` and `TERM=dumb`.
//!
//! ```rust,ignore
//! use repo_pin::output::{marker, Marker, OutputConfig};
//!
//! let out = OutputConfig::from_env_and_flag("auto");
//! println!("{} Synchronizing...", marker(&out, Marker::Sync));
//! ```

use std::env;

use console::style;

use crate::walker::EntryStatus;

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// Build from the `--color` flag value ("always", "never" or "auto").
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // Presence alone disables colors (https://no-color.org/)
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns `emoji_str` when colors are enabled, `plain` otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// The line prefixes used by the commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Ok,
    Error,
    Warning,
    Scan,
    Sync,
    Summary,
    Tree,
}

/// Emoji or bracketed text for a [`Marker`].
pub fn marker(config: &OutputConfig, kind: Marker) -> &'static str {
    match kind {
        Marker::Ok => emoji(config, "✅", "[OK]"),
        Marker::Error => emoji(config, "❌", "[ERR]"),
        Marker::Warning => emoji(config, "⚠️", "[WARN]"),
        Marker::Scan => emoji(config, "🔍", "[SCAN]"),
        Marker::Sync => emoji(config, "🔄", "[SYNC]"),
        Marker::Summary => emoji(config, "📊", "[INFO]"),
        Marker::Tree => emoji(config, "🌳", "[TREE]"),
    }
}

/// Renders an entry status, colored green for success, yellow for an
/// untouched entry and red for failure.
pub fn entry_status(config: &OutputConfig, status: &EntryStatus) -> String {
    let text = status.to_string();
    if !config.use_color {
        return text;
    }
    match status {
        EntryStatus::AlreadySatisfied => style(text).yellow().to_string(),
        EntryStatus::Failed(_) => style(text).red().to_string(),
        _ => style(text).green().to_string(),
    }
}
