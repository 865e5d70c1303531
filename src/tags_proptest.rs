//! Property-based tests for tag comparison and permissive resolution.
//!
//! These tests use proptest to generate random tag lists and verify that
//! invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use std::collections::HashSet;
    use std::path::PathBuf;

    use crate::config::CompatibilityMode;
    use crate::registry::RegistryRecord;
    use crate::repository::NoTagDates;
    use crate::resolver::{resolve, TieBreak};
    use crate::tags::{intersect, ordered_union, TagUnion};
    use proptest::prelude::*;

    /// A list of distinct tags; real tag lists never repeat a tag.
    fn tag_list(max: usize) -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("v[0-9]{1,2}", 0..max).prop_map(|tags| {
            let mut seen = HashSet::new();
            tags.into_iter().filter(|t| seen.insert(t.clone())).collect()
        })
    }

    fn non_empty_tag_list(max: usize) -> impl Strategy<Value = Vec<String>> {
        tag_list(max).prop_filter("needs at least one tag", |tags| !tags.is_empty())
    }

    fn permissive_record(ordered: &[String]) -> RegistryRecord {
        let (pinned, compatible) = ordered.split_last().unwrap();
        RegistryRecord::new(
            PathBuf::from("/work/a"),
            pinned.clone(),
            compatible.to_vec(),
            CompatibilityMode::Permissive,
        )
    }

    // ============================================================================
    // intersect property tests
    // ============================================================================

    proptest! {
        /// Property: intersect(a, b) is the subsequence of `a` whose tags are in `b`
        #[test]
        fn intersect_is_filtered_subsequence(a in tag_list(10), b in tag_list(10)) {
            let result = intersect(&a, &b);
            let expected: Vec<String> = a.iter().filter(|t| b.contains(t)).cloned().collect();
            prop_assert_eq!(result, expected);
        }

        /// Property: both argument orders produce the same set of tags
        #[test]
        fn intersect_is_symmetric_as_set(a in tag_list(10), b in tag_list(10)) {
            let ab: HashSet<String> = intersect(&a, &b).into_iter().collect();
            let ba: HashSet<String> = intersect(&b, &a).into_iter().collect();
            prop_assert_eq!(ab, ba);
        }
    }

    // ============================================================================
    // ordered_union property tests
    // ============================================================================

    proptest! {
        /// Property: merging a list with itself returns it unchanged
        #[test]
        fn ordered_union_is_idempotent(a in tag_list(10)) {
            prop_assert_eq!(ordered_union(&a, &a), TagUnion::Ordered(a.clone()));
        }

        /// Property: when one list is a prefix of the other, the longer one is the result
        #[test]
        fn ordered_union_of_prefix_is_longer_list(a in non_empty_tag_list(10), cut in 1usize..10) {
            let cut = cut.min(a.len());
            let prefix = a[..cut].to_vec();
            prop_assert_eq!(ordered_union(&prefix, &a), TagUnion::Ordered(a.clone()));
            prop_assert_eq!(ordered_union(&a, &prefix), TagUnion::Ordered(a.clone()));
        }

        /// Property: nothing from either list is lost
        #[test]
        fn ordered_union_keeps_every_tag(a in tag_list(10), b in tag_list(10)) {
            let union: HashSet<String> = ordered_union(&a, &b).into_tags().into_iter().collect();
            let expected: HashSet<String> = a.iter().chain(b.iter()).cloned().collect();
            prop_assert_eq!(union, expected);
        }

        /// Property: the merged list never repeats a tag
        #[test]
        fn ordered_union_has_no_duplicates(a in tag_list(10), b in tag_list(10)) {
            let union = ordered_union(&a, &b).into_tags();
            let distinct: HashSet<&String> = union.iter().collect();
            prop_assert_eq!(distinct.len(), union.len());
        }

        /// Property: same input, same output
        #[test]
        fn ordered_union_is_deterministic(a in tag_list(10), b in tag_list(10)) {
            prop_assert_eq!(ordered_union(&a, &b), ordered_union(&a, &b));
        }
    }

    // ============================================================================
    // permissive resolution property tests
    // ============================================================================

    proptest! {
        /// Property: Permissive+Permissive picks the same tag whichever request came first
        #[test]
        fn permissive_resolution_is_commutative(
            x in non_empty_tag_list(8),
            y in non_empty_tag_list(8),
        ) {
            let tie_break = TieBreak::new(&NoTagDates, None);
            let forward = resolve(&permissive_record(&x), &y, CompatibilityMode::Permissive, &tie_break);
            let backward = resolve(&permissive_record(&y), &x, CompatibilityMode::Permissive, &tie_break);
            prop_assert_eq!(forward.tag, backward.tag);
        }

        /// Property: the winning tag is never also listed as compatible
        #[test]
        fn resolution_excludes_winner_from_compatible(
            x in non_empty_tag_list(8),
            y in non_empty_tag_list(8),
        ) {
            let tie_break = TieBreak::new(&NoTagDates, None);
            let result = resolve(&permissive_record(&x), &y, CompatibilityMode::Permissive, &tie_break);
            prop_assert!(!result.compatible_tags.contains(&result.tag));
        }
    }
}
