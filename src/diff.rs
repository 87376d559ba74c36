//! LCS line diff and unified-diff hunk summarization (spec §4.6).
//!
//! The diff operates on *line content strings*, computed once per line (not
//! once per DP cell), via a classic O(mn) dynamic-programming LCS with ties
//! broken toward `Delete` before `Insert` so a line modification renders as
//! "- old" immediately followed by "+ new".

use crate::line::{Annotation, AnnotationPosition, Line, LineFlag, Source};

/// One diff operation, carrying the *post* line for `Equal` (spec §4.6: "so
/// the rendered diff shows the after content for unchanged lines").
#[derive(Debug, Clone)]
pub enum DiffOp {
    Equal(Line),
    Delete(Line),
    Insert(Line),
}

impl DiffOp {
    fn line(&self) -> &Line {
        match self {
            DiffOp::Equal(l) | DiffOp::Delete(l) | DiffOp::Insert(l) => l,
        }
    }

    fn flag(&self) -> LineFlag {
        match self {
            DiffOp::Equal(_) => LineFlag::Default,
            DiffOp::Delete(_) => LineFlag::Deleted,
            DiffOp::Insert(_) => LineFlag::Inserted,
        }
    }
}

/// A contiguous group of diff operations with unified-diff bookkeeping
/// (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hunk {
    pub start_idx: usize,
    pub end_idx: usize,
    pub from_line: usize,
    pub to_line: usize,
    pub from_count: usize,
    pub to_count: usize,
}

impl Hunk {
    /// `"@@ -{from_line},{from_count} +{to_line},{to_count} @@"` with the
    /// GNU empty-half rules from spec §4.6.
    pub fn header(&self) -> String {
        format!(
            "@@ -{} +{} @@",
            half_header(self.from_line, self.from_count),
            half_header(self.to_line, self.to_count)
        )
    }
}

fn half_header(line: usize, count: usize) -> String {
    if count == 0 {
        "0,0".to_string()
    } else if count == 1 {
        format!("{line}")
    } else {
        format!("{line},{count}")
    }
}

/// Line content strings for a `Source`, computed once (spec: "computed once
/// per line — not per comparison").
fn content_lines(source: &Source) -> Vec<String> {
    source
        .all_lines()
        .iter()
        .map(|line| {
            line.segments
                .items
                .iter()
                .map(|seg| seg.part.origin.strip_suffix('\n').unwrap_or(&seg.part.origin))
                .collect::<String>()
        })
        .collect()
}

/// Compute the LCS-based diff between `a` and `b`'s lines, producing an
/// interleaved operation stream. Ties in the DP backtrack prefer `Delete`
/// before `Insert` (spec §4.6).
pub fn diff_ops(a: &Source, b: &Source) -> Vec<DiffOp> {
    let a_lines = a.all_lines();
    let b_lines = b.all_lines();
    let a_content = content_lines(a);
    let b_content = content_lines(b);
    let m = a_lines.len();
    let n = b_lines.len();

    // dp[i][j] = LCS length of a_content[i..] and b_content[j..]
    let mut dp = vec![vec![0usize; n + 1]; m + 1];
    for i in (0..m).rev() {
        for j in (0..n).rev() {
            dp[i][j] = if a_content[i] == b_content[j] {
                dp[i + 1][j + 1] + 1
            } else {
                dp[i + 1][j].max(dp[i][j + 1])
            };
        }
    }

    let mut ops = Vec::new();
    let mut i = 0;
    let mut j = 0;
    while i < m && j < n {
        if a_content[i] == b_content[j] {
            ops.push(DiffOp::Equal(b_lines[j].clone()));
            i += 1;
            j += 1;
        } else if dp[i + 1][j] >= dp[i][j + 1] {
            ops.push(DiffOp::Delete(a_lines[i].clone()));
            i += 1;
        } else {
            ops.push(DiffOp::Insert(b_lines[j].clone()));
            j += 1;
        }
    }
    while i < m {
        ops.push(DiffOp::Delete(a_lines[i].clone()));
        i += 1;
    }
    while j < n {
        ops.push(DiffOp::Insert(b_lines[j].clone()));
        j += 1;
    }
    ops
}

/// Builds the full interleaved diff `Source`, named `"{a}..{b}"`, with each
/// line's flag set according to its operation.
pub fn full_diff(a: &Source, b: &Source) -> Source {
    let ops = diff_ops(a, b);
    let (tokens, offset) = merge_tokens(a, b);
    let mut source = Source::default();
    source.set_tokens(tokens);
    for op in &ops {
        source.push_line(remapped_line(op, offset));
    }
    source.set_name(diff_name(a, b));
    source
}

fn diff_name(a: &Source, b: &Source) -> String {
    format!("{}..{}", a.name().unwrap_or(""), b.name().unwrap_or(""))
}

/// Concatenate `a`'s and `b`'s master token lists so a combined diff
/// `Source` can resolve every segment's `source_index` (`a`'s tokens keep
/// their original indices; `b`'s are offset by `a.tokens().len()`).
fn merge_tokens(a: &Source, b: &Source) -> (Vec<crate::token::Token>, usize) {
    let mut tokens = a.tokens().to_vec();
    let offset = tokens.len();
    tokens.extend(b.tokens().iter().cloned());
    (tokens, offset)
}

/// Clone `op`'s line, setting its flag and remapping segment source indices
/// if the line originated from `b` (`Equal`/`Insert`; `Delete` lines are
/// `a`'s and keep their original indices).
fn remapped_line(op: &DiffOp, b_offset: usize) -> Line {
    let mut line = op.line().clone();
    line.flag = op.flag();
    if !matches!(op, DiffOp::Delete(_)) {
        line.offset_source_indices(b_offset);
    }
    line
}

/// Given a non-negative `context` (negatives treated as 0), mark every
/// non-`Equal` op plus `context` ops on either side as included, then group
/// contiguous included runs into [`Hunk`]s.
pub fn hunks(ops: &[DiffOp], context: i64) -> Vec<Hunk> {
    let context = context.max(0) as usize;
    let n = ops.len();
    let mut included = vec![false; n];
    for (i, op) in ops.iter().enumerate() {
        if !matches!(op, DiffOp::Equal(_)) {
            let start = i.saturating_sub(context);
            let end = (i + context + 1).min(n);
            for slot in included.iter_mut().take(end).skip(start) {
                *slot = true;
            }
        }
    }

    let mut out = Vec::new();
    let mut i = 0;
    while i < n {
        if !included[i] {
            i += 1;
            continue;
        }
        let start = i;
        let mut end = i;
        while end + 1 < n && included[end + 1] {
            end += 1;
        }
        out.push(build_hunk(ops, start, end));
        i = end + 1;
    }
    out
}

fn build_hunk(ops: &[DiffOp], start_idx: usize, end_idx: usize) -> Hunk {
    let slice = &ops[start_idx..=end_idx];
    let from_lines: Vec<&Line> = slice
        .iter()
        .filter(|op| !matches!(op, DiffOp::Insert(_)))
        .map(DiffOp::line)
        .collect();
    let to_lines: Vec<&Line> = slice
        .iter()
        .filter(|op| !matches!(op, DiffOp::Delete(_)))
        .map(DiffOp::line)
        .collect();
    Hunk {
        start_idx,
        end_idx,
        from_line: from_lines.first().map(|l| l.number).unwrap_or(0),
        to_line: to_lines.first().map(|l| l.number).unwrap_or(0),
        from_count: from_lines.len(),
        to_count: to_lines.len(),
    }
}

/// Builds the filtered, hunk-summarized `Source`: one `Annotation{content =
/// header, position = Above, col = 0}` on the first line of every hunk.
pub fn hunk_summary(a: &Source, b: &Source, context: i64) -> Source {
    let ops = diff_ops(a, b);
    let hunk_list = hunks(&ops, context);
    let (tokens, token_offset) = merge_tokens(a, b);
    let mut source = Source::default();
    source.set_tokens(tokens);
    for hunk in &hunk_list {
        for (offset, op) in ops[hunk.start_idx..=hunk.end_idx].iter().enumerate() {
            let mut line = remapped_line(op, token_offset);
            if offset == 0 {
                line.add_annotation(Annotation::new(hunk.header(), AnnotationPosition::Above, 0));
            }
            source.push_line(line);
        }
    }
    source.set_name(diff_name(a, b));
    source
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::new_from_string;

    fn src(name: &str, text: &str) -> Source {
        new_from_string(text).with_name(name)
    }

    fn render_default(source: &Source) -> String {
        use crate::position::Spans;
        use crate::printer::{default_gutter, Printer, PrinterConfig};
        use crate::style::testing::PlainStyle;
        use crate::style::Styles;

        let styles = Styles::new(PlainStyle, []);
        let config = PrinterConfig {
            container: PlainStyle,
            width: 0,
            word_wrap: false,
            annotations_enabled: true,
        };
        let printer = Printer::new(styles, config).with_gutter(default_gutter());
        printer.print(source, &Spans::new())
    }

    /// S3 — full diff with default (line number + diff marker) gutter.
    #[test]
    fn s3_full_diff_line_numbers() {
        let a = src("a", "key: value\nold: line\n");
        let b = src("b", "key: value\nnew: line\n");
        let out = full_diff(&a, &b);
        let rendered = render_default(&out);
        assert_eq!(
            rendered,
            "   1  key: value\n   2 -old: line\n   2 +new: line"
        );
    }

    /// S4 — scattered changes across 5 lines, context 1.
    #[test]
    fn s4_summary_diff_two_scattered_changes() {
        let a = src("a", "a: 1\nb: 2\nc: 3\nd: 4\ne: 5\n");
        let b = src("b", "a: X\nb: 2\nc: 3\nd: 4\ne: Y\n");
        let out = hunk_summary(&a, &b, 1);
        let rendered = render_default(&out);
        let expected = [
            "      @@ -1,2 +1,2 @@",
            "   1 -a: 1",
            "   1 +a: X",
            "   2  b: 2",
            "      @@ -4,2 +4,2 @@",
            "   4  d: 4",
            "   5 -e: 5",
            "   5 +e: Y",
        ]
        .join("\n");
        assert_eq!(rendered, expected);
    }

    #[test]
    fn hunk_header_empty_half_renders_zero_zero() {
        let hunk = Hunk {
            start_idx: 0,
            end_idx: 0,
            from_line: 0,
            to_line: 1,
            from_count: 0,
            to_count: 1,
        };
        assert_eq!(hunk.header(), "@@ -0,0 +1 @@");
    }

    #[test]
    fn diff_is_symmetric_up_to_delete_insert_swap() {
        let a = src("a", "x\ny\n");
        let b = src("b", "x\nz\n");
        let forward = diff_ops(&a, &b);
        let backward = diff_ops(&b, &a);
        let flipped: Vec<&str> = backward
            .iter()
            .map(|op| match op {
                DiffOp::Equal(_) => "eq",
                DiffOp::Delete(_) => "ins",
                DiffOp::Insert(_) => "del",
            })
            .collect();
        let forward_kinds: Vec<&str> = forward
            .iter()
            .map(|op| match op {
                DiffOp::Equal(_) => "eq",
                DiffOp::Delete(_) => "del",
                DiffOp::Insert(_) => "ins",
            })
            .collect();
        assert_eq!(forward_kinds, flipped);
    }

    #[test]
    fn empty_inputs_produce_empty_diff() {
        let a = Source::default();
        let b = Source::default();
        let ops = diff_ops(&a, &b);
        assert!(ops.is_empty());
        assert!(hunks(&ops, 2).is_empty());
    }
}
