//! Property-based tests for the finder (spec §8 invariant 9: every result
//! range's covered runes normalize to the query, and results never overlap).

use proptest::prelude::*;
use yaml_canvas::finder::Finder;
use yaml_canvas::line::new_from_string;

fn haystack_strategy() -> impl Strategy<Value = String> {
    "[a-c]{0,20}"
}

fn needle_strategy() -> impl Strategy<Value = String> {
    "[a-c]{1,4}"
}

proptest! {
    /// Every match range, read back off the source, equals the query
    /// exactly (identity normalizer): matches are byte/rune exact.
    #[test]
    fn matches_cover_exactly_the_query_text(haystack in haystack_strategy(), needle in needle_strategy()) {
        let source = new_from_string(haystack.clone());
        let mut finder = Finder::new();
        finder.load(&source).unwrap();
        let ranges = finder.find(&needle);

        for r in &ranges {
            prop_assert_eq!(r.start.line, 0);
            prop_assert_eq!(r.end.line, 0);
            let slice = &haystack[r.start.col..r.end.col];
            prop_assert_eq!(slice, needle.as_str());
        }
    }

    /// Results never overlap and are sorted by start position.
    #[test]
    fn results_are_sorted_and_non_overlapping(haystack in haystack_strategy(), needle in needle_strategy()) {
        let source = new_from_string(haystack);
        let mut finder = Finder::new();
        finder.load(&source).unwrap();
        let ranges = finder.find(&needle);

        for pair in ranges.windows(2) {
            prop_assert!(pair[0].end <= pair[1].start);
            prop_assert!(pair[0].start < pair[1].start);
        }
    }

    /// Running `find` twice on the same loaded source returns identical
    /// ranges (spec "Finder: find is stable").
    #[test]
    fn find_is_idempotent(haystack in haystack_strategy(), needle in needle_strategy()) {
        let source = new_from_string(haystack);
        let mut finder = Finder::new();
        finder.load(&source).unwrap();
        prop_assert_eq!(finder.find(&needle), finder.find(&needle));
    }
}
