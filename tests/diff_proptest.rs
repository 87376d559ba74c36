//! Property-based tests for the LCS diff engine (spec §8: "LCS is symmetric
//! up to sign" and the `Delete`-before-`Insert` tie-break), in the same
//! `tests/*_proptest.rs` style as the teacher's own parser property tests.

use proptest::prelude::*;
use yaml_canvas::diff::{diff_ops, hunks, DiffOp};
use yaml_canvas::line::new_from_string;

fn lines_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,4}", 0..6)
}

fn source_from_lines(lines: &[String]) -> yaml_canvas::line::Source {
    let text = lines
        .iter()
        .map(|l| format!("{l}\n"))
        .collect::<Vec<_>>()
        .join("");
    new_from_string(text)
}

fn kind_letter(op: &DiffOp) -> char {
    match op {
        DiffOp::Equal(_) => 'e',
        DiffOp::Delete(_) => 'd',
        DiffOp::Insert(_) => 'i',
    }
}

proptest! {
    /// `diff(A, B)` reversed, with `Delete`/`Insert` swapped, equals
    /// `diff(B, A)`'s operation-kind sequence.
    #[test]
    fn diff_is_symmetric_up_to_delete_insert_swap(a in lines_strategy(), b in lines_strategy()) {
        let source_a = source_from_lines(&a);
        let source_b = source_from_lines(&b);
        let forward = diff_ops(&source_a, &source_b);
        let backward = diff_ops(&source_b, &source_a);

        let forward_kinds: Vec<char> = forward.iter().map(kind_letter).collect();
        let swapped_backward: Vec<char> = backward
            .iter()
            .map(|op| match op {
                DiffOp::Equal(_) => 'e',
                DiffOp::Delete(_) => 'i',
                DiffOp::Insert(_) => 'd',
            })
            .collect();
        prop_assert_eq!(forward_kinds, swapped_backward);
    }

    /// Every changed line index is included in some hunk, and every included
    /// index lies within `context` of some changed index (spec §8 inv. 7).
    #[test]
    fn hunks_cover_changes_and_respect_context(a in lines_strategy(), b in lines_strategy(), context in 0i64..4) {
        let source_a = source_from_lines(&a);
        let source_b = source_from_lines(&b);
        let ops = diff_ops(&source_a, &source_b);
        let changed: Vec<usize> = ops
            .iter()
            .enumerate()
            .filter(|(_, op)| !matches!(op, DiffOp::Equal(_)))
            .map(|(i, _)| i)
            .collect();
        let hunk_list = hunks(&ops, context);

        for &c in &changed {
            prop_assert!(hunk_list.iter().any(|h| h.start_idx <= c && c <= h.end_idx));
        }
        for hunk in &hunk_list {
            for included in hunk.start_idx..=hunk.end_idx {
                prop_assert!(changed.iter().any(|&c| (included as i64 - c as i64).abs() <= context));
            }
        }
    }

    /// No failures on empty inputs; diffing a sequence against itself is all
    /// `Equal`.
    #[test]
    fn diffing_against_self_is_all_equal(a in lines_strategy()) {
        let source_a = source_from_lines(&a);
        let source_b = source_from_lines(&a);
        let ops = diff_ops(&source_a, &source_b);
        prop_assert!(ops.iter().all(|op| matches!(op, DiffOp::Equal(_))));
        prop_assert_eq!(ops.len(), a.len());
    }
}
