//! # Tag Comparison
//!
//! Pure functions over ordered tag sequences. A sequence is expected to be
//! chronological (oldest first), but nothing here verifies that; the
//! functions only rely on tag identity and position.
//!
//! - [`intersect`] keeps the tags of one sequence that the other also lists.
//! - [`ordered_union`] merges two sequences that share a timeline. When the
//!   sequences cannot be proven to share one, it falls back to an unordered
//!   union and says so through [`TagUnion::Unordered`].
//!
//! Semantic-version parsing lives here too; the resolver uses it as a
//! tie-break when no tag dates are available.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

use log::{debug, warn};
use semver::Version;

/// Result of merging two tag sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagUnion {
    /// Both sequences share a timeline; the order is chronological.
    Ordered(Vec<String>),
    /// No common timeline could be established. Tags are sorted lexically so
    /// the result is deterministic, but that order carries no meaning.
    Unordered(Vec<String>),
}

impl TagUnion {
    pub fn into_tags(self) -> Vec<String> {
        match self {
            TagUnion::Ordered(tags) | TagUnion::Unordered(tags) => tags,
        }
    }

    pub fn is_ordered(&self) -> bool {
        matches!(self, TagUnion::Ordered(_))
    }
}

/// The elements of `a` that also appear in `b`, in `a`'s order.
pub fn intersect(a: &[String], b: &[String]) -> Vec<String> {
    let members: HashSet<&str> = b.iter().map(String::as_str).collect();
    a.iter()
        .filter(|tag| members.contains(tag.as_str()))
        .cloned()
        .collect()
}

/// Merge two chronological tag sequences without losing order.
///
/// If either sequence is empty the other is returned as is. Sequences whose
/// first tags differ, or that have equal length without being identical,
/// cannot be placed on one timeline and produce [`TagUnion::Unordered`] with
/// a warning. Otherwise the longer sequence is the backbone, and any tag of
/// the shorter one missing from it is appended at the end.
pub fn ordered_union(a: &[String], b: &[String]) -> TagUnion {
    if a.is_empty() {
        return TagUnion::Ordered(b.to_vec());
    }
    if b.is_empty() {
        return TagUnion::Ordered(a.to_vec());
    }

    if a[0] != b[0] {
        warn!(
            "tag lists [{}] and [{}] start with different tags; their order cannot be merged",
            a.join(", "),
            b.join(", ")
        );
        return unordered_union(a, b);
    }

    if a.len() == b.len() && a != b {
        warn!(
            "tag lists [{}] and [{}] have the same length but differ; their order cannot be merged",
            a.join(", "),
            b.join(", ")
        );
        return unordered_union(a, b);
    }

    let (backbone, other) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut merged = backbone.to_vec();
    let present: HashSet<&str> = backbone.iter().map(String::as_str).collect();
    for tag in other {
        if !present.contains(tag.as_str()) {
            debug!(
                "tag {} is missing from [{}]; appending it at the end",
                tag,
                backbone.join(", ")
            );
            merged.push(tag.clone());
        }
    }

    TagUnion::Ordered(merged)
}

fn unordered_union(a: &[String], b: &[String]) -> TagUnion {
    let set: BTreeSet<&String> = a.iter().chain(b.iter()).collect();
    TagUnion::Unordered(set.into_iter().cloned().collect())
}

/// Parse a tag such as `v1.2.3`, `1.2.3` or `refs/tags/v1.2.3` as a semantic
/// version.
pub fn parse_semver_tag(tag: &str) -> Option<Version> {
    let tag = tag.strip_prefix("refs/tags/").unwrap_or(tag);
    let version_str = tag.strip_prefix('v').unwrap_or(tag);
    Version::parse(version_str).ok()
}

/// Compare two tags as semantic versions; `None` unless both parse.
pub fn compare_semver(a: &str, b: &str) -> Option<Ordering> {
    Some(parse_semver_tag(a)?.cmp(&parse_semver_tag(b)?))
}
