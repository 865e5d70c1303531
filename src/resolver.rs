//! # Compatibility Resolution
//!
//! Decides which tag wins when a repository that is already in the registry
//! is requested again. The decision depends on the mode of the existing
//! record and the mode of the incoming request:
//!
//! | existing   | incoming   | rule                                                  |
//! |------------|------------|-------------------------------------------------------|
//! | Strict     | Strict     | keep the pinned tag if both accept it, otherwise the  |
//! |            |            | most advanced common tag                              |
//! | Strict     | Permissive | the existing resolution stands                        |
//! | Permissive | Permissive | union of both lists; its last tag wins                |
//! | Permissive | Strict     | adopt the incoming request and become Strict for good |
//!
//! The "most advanced common tag" is the shared tag whose smaller position
//! across the two lists is largest: the furthest point both timelines agree
//! on. Ties, and unions whose order cannot be trusted, are broken by tag
//! creation date, then by semantic version, then by list position.

use std::cmp::Ordering;
use std::path::Path;

use log::debug;

use crate::config::CompatibilityMode;
use crate::registry::RegistryRecord;
use crate::repository::TagDateProvider;
use crate::tags::{compare_semver, intersect, ordered_union, parse_semver_tag, TagUnion};

/// The state a record should move to after a reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub tag: String,
    pub compatible_tags: Vec<String>,
    pub mode: CompatibilityMode,
}

impl Resolution {
    fn from_list(mut tags: Vec<String>, winner: String, mode: CompatibilityMode) -> Self {
        tags.retain(|t| *t != winner);
        Self {
            tag: winner,
            compatible_tags: tags,
            mode,
        }
    }
}

/// Picks among equally acceptable tags, asking for tag dates only when a
/// tie actually has to be broken.
pub struct TieBreak<'a> {
    dates: &'a dyn TagDateProvider,
    working_copy: Option<&'a Path>,
}

impl<'a> TieBreak<'a> {
    /// `working_copy` is where dates can be read from; `None` when no
    /// materialized working copy exists yet.
    pub fn new(dates: &'a dyn TagDateProvider, working_copy: Option<&'a Path>) -> Self {
        Self {
            dates,
            working_copy,
        }
    }

    /// The newest candidate by creation date, else the greatest by semantic
    /// version, else `None`.
    pub fn newest(&self, candidates: &[String]) -> Option<String> {
        if let Some(path) = self.working_copy {
            let dates = self.dates.dates_for_tags(path, candidates);
            let newest = candidates
                .iter()
                .filter_map(|tag| dates.get(tag).map(|date| (tag, *date)))
                .max_by_key(|(_, date)| *date);
            if let Some((tag, date)) = newest {
                debug!("picked {} as the newest tag ({})", tag, date);
                return Some(tag.clone());
            }
        }

        candidates
            .iter()
            .filter(|tag| parse_semver_tag(tag).is_some())
            .max_by(|a, b| compare_semver(a, b).unwrap_or(Ordering::Equal))
            .cloned()
    }
}

/// Merge an incoming request into an existing record.
///
/// The caller has already checked that the two requests share a tag
/// whenever either side is Strict.
pub fn resolve(
    existing: &RegistryRecord,
    incoming_tags: &[String],
    incoming_mode: CompatibilityMode,
    tie_break: &TieBreak<'_>,
) -> Resolution {
    use CompatibilityMode::{Permissive, Strict};

    let existing_tags = existing.ordered_tags();
    match (existing.mode, incoming_mode) {
        (Strict, Strict) => resolve_strict(existing, &existing_tags, incoming_tags, tie_break),
        (Strict, Permissive) => Resolution {
            tag: existing.resolved_tag.clone(),
            compatible_tags: existing.compatible_tags.clone(),
            mode: Strict,
        },
        (Permissive, Permissive) => resolve_permissive(&existing_tags, incoming_tags, tie_break),
        (Permissive, Strict) => match incoming_tags.split_last() {
            Some((pinned, compatible)) => Resolution {
                tag: pinned.clone(),
                compatible_tags: compatible.to_vec(),
                mode: Strict,
            },
            None => Resolution {
                tag: existing.resolved_tag.clone(),
                compatible_tags: existing.compatible_tags.clone(),
                mode: Strict,
            },
        },
    }
}

fn resolve_strict(
    existing: &RegistryRecord,
    existing_tags: &[String],
    incoming_tags: &[String],
    tie_break: &TieBreak<'_>,
) -> Resolution {
    let common = intersect(existing_tags, incoming_tags);

    if common.contains(&existing.resolved_tag) {
        return Resolution::from_list(
            common,
            existing.resolved_tag.clone(),
            CompatibilityMode::Strict,
        );
    }

    let winner = most_advanced_common_tag(&common, existing_tags, incoming_tags, tie_break)
        .unwrap_or_else(|| existing.resolved_tag.clone());
    Resolution::from_list(common, winner, CompatibilityMode::Strict)
}

/// For each shared tag take the smaller of its positions in the two lists
/// and return the tag where that is largest.
pub fn most_advanced_common_tag(
    common: &[String],
    a: &[String],
    b: &[String],
    tie_break: &TieBreak<'_>,
) -> Option<String> {
    let position = |list: &[String], tag: &String| list.iter().position(|t| t == tag);

    let scored: Vec<(&String, usize)> = common
        .iter()
        .filter_map(|tag| Some((tag, position(a, tag)?.min(position(b, tag)?))))
        .collect();
    let best = scored.iter().map(|(_, score)| *score).max()?;
    let candidates: Vec<String> = scored
        .into_iter()
        .filter(|(_, score)| *score == best)
        .map(|(tag, _)| tag.clone())
        .collect();

    if candidates.len() == 1 {
        return candidates.into_iter().next();
    }

    debug!(
        "tags [{}] are equally advanced; breaking the tie",
        candidates.join(", ")
    );
    // `common` follows `a`'s order, so the last candidate is the latest in `a`
    tie_break
        .newest(&candidates)
        .or_else(|| candidates.last().cloned())
}

fn resolve_permissive(
    existing_tags: &[String],
    incoming_tags: &[String],
    tie_break: &TieBreak<'_>,
) -> Resolution {
    let union = ordered_union(existing_tags, incoming_tags);
    let winner = match &union {
        TagUnion::Ordered(tags) => tags.last().cloned(),
        // Sorted lexically, so the last tag is a deterministic fallback
        TagUnion::Unordered(tags) => tie_break.newest(tags).or_else(|| tags.last().cloned()),
    };

    Resolution::from_list(
        union.into_tags(),
        winner.unwrap_or_default(),
        CompatibilityMode::Permissive,
    )
}
