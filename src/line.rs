//! The line model (spec §3, §4.3): grouping a flat token stream into visual
//! [`Line`]s while reconstructing byte offsets, indent levels, and the
//! `Prev`/`Next` relinking the external lexer's API expects.
//!
//! A [`Source`] owns the master list of (pre-split) tokens plus the ordered
//! lines built over them; every [`crate::token::Segment`] refers back into
//! this list by index rather than by pointer, which sidesteps the original's
//! `Prev`/`Next` token graph while preserving forward/backward traversal
//! (`Source::tokens` reassembles it).

use std::fmt;

use crate::position::{Position, Range};
use crate::token::{Segment, Segments, Token};

/// A line's role, set by the diff engine (F) or error annotator (H); the
/// line builder always produces `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFlag {
    Default,
    Inserted,
    Deleted,
    Annotation,
}

impl Default for LineFlag {
    fn default() -> Self {
        LineFlag::Default
    }
}

/// Where an annotation is rendered relative to its line's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationPosition {
    Above,
    Below,
}

/// Per-line text emitted above or below the content (spec glossary).
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub content: String,
    pub position: AnnotationPosition,
    pub col: usize,
}

impl Annotation {
    pub fn new(content: impl Into<String>, position: AnnotationPosition, col: usize) -> Self {
        Self {
            content: content.into(),
            position,
            col,
        }
    }
}

/// One visual line: an ordered run of [`Segment`]s plus flag/annotation
/// metadata. Segment columns are strictly increasing and widths are
/// non-negative (spec §3 invariant).
#[derive(Debug, Clone, Default)]
pub struct Line {
    pub number: usize,
    pub segments: Segments,
    pub flag: LineFlag,
    pub annotations: Vec<Annotation>,
}

impl Line {
    fn new(number: usize) -> Self {
        Self {
            number,
            segments: Segments::new(),
            flag: LineFlag::Default,
            annotations: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn width(&self) -> usize {
        self.segments.items.iter().map(Segment::width).sum()
    }

    pub fn add_annotation(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }

    /// Shift every segment's `source_index` by `delta`, used when merging
    /// lines from two different `Source`s (the diff engine, module F) into
    /// one combined token list.
    pub fn offset_source_indices(&mut self, delta: usize) {
        for seg in &mut self.segments.items {
            seg.source_index += delta;
        }
    }
}

/// Error returned by [`Source::validate`] and surfaced during line building
/// when a column or line-number rule from spec §4.3 is violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineBuilderError {
    /// Segment columns did not strictly increase within a single line.
    NonMonotonicColumn { line_index: usize },
}

impl fmt::Display for LineBuilderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineBuilderError::NonMonotonicColumn { line_index } => {
                write!(f, "segment columns are not strictly increasing on line index {line_index}")
            }
        }
    }
}

impl std::error::Error for LineBuilderError {}

/// An ordered sequence of [`Line`]s built from a token stream, plus overlays
/// keyed by a numeric style id (see [`crate::style::StyleKind::to_overlay_key`]).
///
/// Overlays are stored in first-seen-kind order, not by hash, because the
/// renderer composes overlapping kinds in the order they were added (spec
/// §4.4, §4.5) and that ordering must be reproducible across runs.
#[derive(Debug, Clone, Default)]
pub struct Source {
    name: Option<String>,
    /// The master, pre-split token list. `Segment::source_index` indexes
    /// into this vector.
    tokens: Vec<Token>,
    lines: Vec<Line>,
    overlays: Vec<(u32, Vec<Range>)>,
}

impl Source {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Append an already-built `Line` (used by the diff engine, which
    /// constructs lines from two existing `Source`s rather than from a raw
    /// token stream).
    pub fn push_line(&mut self, line: Line) {
        self.lines.push(line);
    }

    pub fn set_tokens(&mut self, tokens: Vec<Token>) {
        self.tokens = tokens;
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    pub fn line_mut(&mut self, index: usize) -> Option<&mut Line> {
        self.lines.get_mut(index)
    }

    pub fn source_token(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Index of the first token equal to `tk` in the master token list, used
    /// by the error annotator (module H) to resolve a directly-held `Token`
    /// back into this source's coordinate space.
    pub fn index_of_token(&self, tk: &Token) -> Option<usize> {
        self.tokens.iter().position(|t| t == tk)
    }

    pub fn all_lines(&self) -> &[Line] {
        &self.lines
    }

    /// Reassembles the master token list, i.e. the pre-split source tokens
    /// in original order (spec invariant 1: concatenated origins round-trip
    /// byte-for-byte with the input stream).
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Every token's origin, concatenated, with the final `\n` trimmed.
    pub fn content(&self) -> String {
        let mut out = String::new();
        for tk in &self.tokens {
            out.push_str(&tk.origin);
        }
        if out.ends_with('\n') {
            out.pop();
        }
        out
    }

    pub fn clear_overlays(&mut self) {
        self.overlays.clear();
    }

    pub fn add_overlay(&mut self, kind: u32, ranges: impl IntoIterator<Item = Range>) {
        let ranges: Vec<Range> = ranges.into_iter().filter(|r| !r.is_empty()).collect();
        if ranges.is_empty() {
            return;
        }
        match self.overlays.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, existing)) => existing.extend(ranges),
            None => self.overlays.push((kind, ranges)),
        }
    }

    pub fn overlay_ranges(&self, kind: u32) -> &[Range] {
        self.overlays
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    /// Overlay kinds in first-seen order — the order `blend` composes them
    /// in during rendering.
    pub fn overlay_kinds(&self) -> impl Iterator<Item = u32> + '_ {
        self.overlays.iter().map(|(k, _)| *k)
    }

    /// `(Position{line, 0}, &Line)` for every line, in order.
    pub fn lines(&self) -> impl Iterator<Item = (Position, &Line)> {
        self.lines
            .iter()
            .enumerate()
            .map(|(i, l)| (Position::new(i, 0), l))
    }

    /// `(Position, rune)` for every rune in the source, with a `\n` emitted
    /// between lines (and after the last line if its last segment's origin
    /// ended with one) so that cross-line substring search observes line
    /// boundaries. Rune columns, not byte columns.
    pub fn runes(&self) -> Vec<(Position, char)> {
        let mut out = Vec::new();
        for (line_idx, line) in self.lines.iter().enumerate() {
            let mut col = 0usize;
            for seg in &line.segments.items {
                let trimmed = seg.part.origin.strip_suffix('\n').unwrap_or(&seg.part.origin);
                for ch in trimmed.chars() {
                    out.push((Position::new(line_idx, col), ch));
                    col += 1;
                }
            }
            if line_ends_with_newline(line) {
                out.push((Position::new(line_idx, col), '\n'));
            }
        }
        out
    }

    /// All `(line, col)` positions where `source_index`'s token appears.
    /// `None` if the token is not part of this `Source`.
    pub fn positions_from_token(&self, source_index: usize) -> Option<Vec<Position>> {
        if source_index >= self.tokens.len() {
            return None;
        }
        let mut found = Vec::new();
        for (line_idx, line) in self.lines.iter().enumerate() {
            let mut col = 0usize;
            for seg in &line.segments.items {
                if seg.source_index == source_index {
                    found.push(Position::new(line_idx, col));
                }
                col += seg.width();
            }
        }
        if found.is_empty() {
            None
        } else {
            Some(found)
        }
    }

    /// For each input position, the set of ranges the *source token* at that
    /// position occupies across all lines it spans. Deduplicated across
    /// inputs; `None` on empty input or an out-of-bounds position.
    pub fn token_position_ranges(&self, positions: &[Position]) -> Option<Vec<Range>> {
        self.position_ranges(positions, false)
    }

    /// Same as [`Source::token_position_ranges`] but trims leading/trailing
    /// whitespace of each part; a part that is entirely whitespace is
    /// omitted.
    pub fn content_position_ranges(&self, positions: &[Position]) -> Option<Vec<Range>> {
        self.position_ranges(positions, true)
    }

    pub fn content_position_ranges_from_token(&self, source_index: usize) -> Option<Vec<Range>> {
        let positions = self.positions_from_token(source_index)?;
        self.content_position_ranges(&positions)
    }

    /// All ranges sharing the source token under `(line_idx, col)`, so a
    /// click on one line of a multi-line scalar highlights every line it
    /// covers. `None` if no segment covers that position.
    pub fn token_ranges_at(&self, line_idx: usize, col: usize) -> Option<Vec<Range>> {
        self.token_position_ranges(&[Position::new(line_idx, col)])
    }

    /// Same as [`Source::token_ranges_at`] but trims leading/trailing
    /// whitespace of each covered part, omitting parts that are entirely
    /// whitespace.
    pub fn content_ranges_at(&self, line_idx: usize, col: usize) -> Option<Vec<Range>> {
        self.content_position_ranges(&[Position::new(line_idx, col)])
    }

    fn position_ranges(&self, positions: &[Position], trim: bool) -> Option<Vec<Range>> {
        if positions.is_empty() {
            return None;
        }
        let mut source_indices = Vec::new();
        for pos in positions {
            let line = self.lines.get(pos.line)?;
            let source_index = line.segments.source_token_at(pos.col)?;
            if !source_indices.contains(&source_index) {
                source_indices.push(source_index);
            }
        }
        let mut ranges = Vec::new();
        for source_index in source_indices {
            for (line_idx, line) in self.lines.iter().enumerate() {
                for (start, end, seg) in line.segments.with_columns() {
                    if seg.source_index != source_index {
                        continue;
                    }
                    let (s, e) = if trim {
                        match trimmed_span(&seg.part.origin, start, end) {
                            Some(span) => span,
                            None => continue,
                        }
                    } else {
                        (start, end)
                    };
                    if let Ok(r) = Range::new(Position::new(line_idx, s), Position::new(line_idx, e)) {
                        if !r.is_empty() {
                            ranges.push(r);
                        }
                    }
                }
            }
        }
        if ranges.is_empty() {
            None
        } else {
            ranges.sort_by_key(|r| (r.start, r.end));
            Some(ranges)
        }
    }

    /// Validate column monotonicity within each line (spec §4.3, §8 inv. 3).
    pub fn validate(&self) -> Result<(), LineBuilderError> {
        for (idx, line) in self.lines.iter().enumerate() {
            let mut last_end: Option<usize> = None;
            for (start, end, _) in line.segments.with_columns() {
                if let Some(prev_end) = last_end {
                    if start < prev_end {
                        return Err(LineBuilderError::NonMonotonicColumn { line_index: idx });
                    }
                }
                last_end = Some(end);
            }
        }
        Ok(())
    }
}

fn line_ends_with_newline(line: &Line) -> bool {
    line.segments
        .items
        .last()
        .map(|seg| seg.part.origin.ends_with('\n'))
        .unwrap_or(false)
}

/// Rune-column span of `origin`'s trimmed (non-whitespace) content within a
/// segment spanning `[start, end)`, or `None` if the whole part is
/// whitespace.
fn trimmed_span(origin: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    let trimmed = origin.strip_suffix('\n').unwrap_or(origin);
    let chars: Vec<char> = trimmed.chars().collect();
    let first_non_ws = chars.iter().position(|c| !c.is_whitespace())?;
    let last_non_ws = chars.iter().rposition(|c| !c.is_whitespace())?;
    debug_assert_eq!(end - start, chars.len());
    Some((start + first_non_ws, start + last_non_ws + 1))
}

/// Builds a [`Source`] from a flat token stream (spec §4.3).
///
/// Multi-line token origins are split into one part per visual line, each
/// appended to the line in progress; a new line starts whenever the
/// previous segment's part ended with `\n` (or there is no current line
/// yet). Offsets advance by *byte* length across split parts; indent fields
/// are copied unchanged into every part.
pub struct SourceBuilder {
    lines: Vec<Line>,
    tokens: Vec<Token>,
    current: Option<Line>,
    prev_line_number: Option<usize>,
}

impl SourceBuilder {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            tokens: Vec::new(),
            current: None,
            prev_line_number: None,
        }
    }

    pub fn push(&mut self, tk: Token) {
        let source_index = self.tokens.len();
        self.tokens.push(tk.clone());

        for part in split_origin(&tk) {
            if self.current.is_none() {
                self.start_line(part.position.line);
            }
            let line = self.current.as_mut().expect("line started above");
            let ended_with_newline = part.origin.ends_with('\n');
            line.segments.append(source_index, part);
            if ended_with_newline {
                self.lines.push(self.current.take().unwrap());
            }
        }
    }

    fn start_line(&mut self, lexer_line: usize) {
        let number = match self.prev_line_number {
            None => lexer_line,
            Some(prev) if lexer_line > prev => lexer_line,
            Some(prev) => prev + 1,
        };
        self.prev_line_number = Some(number);
        self.current = Some(Line::new(number));
    }

    pub fn build(mut self) -> Source {
        if let Some(last) = self.current.take() {
            if !last.is_empty() {
                self.lines.push(last);
            }
        }
        Source {
            name: None,
            tokens: self.tokens,
            lines: self.lines,
            overlays: Vec::new(),
        }
    }
}

impl Default for SourceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Split one source token's origin into per-visual-line parts, advancing
/// `offset` by byte length and copying `indent_num`/`indent_level` unchanged
/// (spec §4.3 "Offset and indent reconstruction").
fn split_origin(tk: &Token) -> Vec<Token> {
    if !tk.origin.contains('\n') {
        return vec![tk.clone()];
    }
    let mut parts = Vec::new();
    let mut rest = tk.origin.as_str();
    let mut offset = tk.position.offset;
    let mut line_no = tk.position.line;
    let mut first = true;
    loop {
        let (part_str, remainder) = match rest.find('\n') {
            Some(idx) => (&rest[..=idx], &rest[idx + 1..]),
            None => (rest, ""),
        };
        if part_str.is_empty() {
            break;
        }
        let mut pos = tk.position;
        pos.offset = offset;
        pos.line = line_no;
        pos.column = if first { tk.position.column } else { 1 };
        parts.push(Token::new(tk.kind, tk.value.clone(), part_str, pos));
        offset += part_str.len();
        line_no += 1;
        first = false;
        rest = remainder;
        if rest.is_empty() {
            break;
        }
    }
    parts
}

/// Construct a `Source` directly from a token stream (spec "Lifecycle").
pub fn new_from_tokens(tokens: impl IntoIterator<Item = Token>) -> Source {
    let mut builder = SourceBuilder::new();
    for tk in tokens {
        builder.push(tk);
    }
    builder.build()
}

/// Construct a `Source` from a single already-complete token.
pub fn new_from_token(tk: Token) -> Source {
    new_from_tokens([tk])
}

/// Construct a `Source` directly from a string, with no lexer involved: the
/// whole input becomes one `Unknown`-kind token whose `origin` and `value`
/// are the string itself. Used by the diff engine and tests when only plain
/// text (not a real token stream) is available.
pub fn new_from_string(s: impl Into<String>) -> Source {
    use crate::token::{Position as TPos, TokenKind};
    let s = s.into();
    let tk = Token::new(TokenKind::Unknown, s.clone(), s, TPos::new(1, 1, 0));
    new_from_token(tk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Position as TPos, TokenKind};

    fn tok(kind: TokenKind, origin: &str, line: usize, column: usize, offset: usize) -> Token {
        Token::new(kind, origin.trim(), origin, TPos::new(line, column, offset))
    }

    #[test]
    fn single_line_tokens_build_one_line() {
        let source = new_from_tokens([
            tok(TokenKind::StringPlain, "key", 1, 1, 0),
            tok(TokenKind::MappingValue, ":", 1, 4, 3),
            tok(TokenKind::StringPlain, " value\n", 1, 5, 4),
        ]);
        assert_eq!(source.line_count(), 1);
        assert_eq!(source.line(0).unwrap().number, 1);
        assert_eq!(source.content(), "key: value");
    }

    #[test]
    fn multiline_token_splits_into_consecutive_lines() {
        let source = new_from_tokens([
            tok(TokenKind::BlockLiteral, "|\n", 1, 5, 4),
            tok(TokenKind::StringPlain, "  a\n  b\n", 2, 1, 6),
        ]);
        assert_eq!(source.line_count(), 3);
        assert_eq!(source.line(0).unwrap().number, 1);
        assert_eq!(source.line(1).unwrap().number, 2);
        assert_eq!(source.line(2).unwrap().number, 3);
    }

    #[test]
    fn content_round_trips_token_origins() {
        let tokens = [
            tok(TokenKind::StringPlain, "a", 1, 1, 0),
            tok(TokenKind::MappingValue, ": b\n", 1, 2, 1),
        ];
        let concatenated: String = tokens.iter().map(|t| t.origin.as_str()).collect();
        let source = new_from_tokens(tokens);
        let round_tripped: String = source.tokens().iter().map(|t| t.origin.as_str()).collect();
        assert_eq!(round_tripped, concatenated);
        assert_eq!(source.content(), "a: b");
    }

    #[test]
    fn line_number_normalization_increments_on_repeat() {
        let source = new_from_tokens([
            tok(TokenKind::StringPlain, "a\n", 5, 1, 0),
            tok(TokenKind::StringPlain, "b\n", 5, 1, 2),
            tok(TokenKind::StringPlain, "c\n", 100, 1, 4),
        ]);
        assert_eq!(source.line(0).unwrap().number, 5);
        assert_eq!(source.line(1).unwrap().number, 6);
        assert_eq!(source.line(2).unwrap().number, 100);
    }

    #[test]
    fn runes_emit_newline_between_lines() {
        let source = new_from_tokens([
            tok(TokenKind::StringPlain, "ab\n", 1, 1, 0),
            tok(TokenKind::StringPlain, "cd", 2, 1, 3),
        ]);
        let runes = source.runes();
        let chars: String = runes.iter().map(|(_, c)| *c).collect();
        assert_eq!(chars, "ab\ncd");
    }

    #[test]
    fn positions_from_token_locates_every_occupied_line() {
        let source = new_from_tokens([
            tok(TokenKind::BlockLiteral, "|\n", 1, 5, 4),
            tok(TokenKind::StringPlain, "  a\n  b\n", 2, 1, 6),
        ]);
        let positions = source.positions_from_token(1).unwrap();
        assert_eq!(positions, vec![Position::new(1, 0), Position::new(2, 0)]);
    }

    #[test]
    fn ranges_at_locate_every_line_of_a_multiline_token() {
        let source = new_from_tokens([
            tok(TokenKind::BlockLiteral, "|\n", 1, 5, 4),
            tok(TokenKind::StringPlain, "  a\n  b\n", 2, 1, 6),
        ]);
        let token_ranges = source.token_ranges_at(1, 0).unwrap();
        assert_eq!(
            token_ranges,
            vec![
                Range::new(Position::new(1, 0), Position::new(1, 3)).unwrap(),
                Range::new(Position::new(2, 0), Position::new(2, 3)).unwrap(),
            ]
        );
        let content_ranges = source.content_ranges_at(2, 0).unwrap();
        assert_eq!(
            content_ranges,
            vec![
                Range::new(Position::new(1, 2), Position::new(1, 3)).unwrap(),
                Range::new(Position::new(2, 2), Position::new(2, 3)).unwrap(),
            ]
        );
    }

    #[test]
    fn ranges_at_miss_returns_none() {
        let source = new_from_tokens([tok(TokenKind::StringPlain, "ab", 1, 1, 0)]);
        assert!(source.token_ranges_at(0, 50).is_none());
    }

    #[test]
    fn validate_rejects_non_monotonic_columns() {
        let mut source = new_from_tokens([tok(TokenKind::StringPlain, "ab", 1, 1, 0)]);
        // Force a malformed line by hand to exercise the validator.
        let bad_segment_source_index = 0;
        source.lines[0].segments.items.push(Segment::new(
            bad_segment_source_index,
            tok(TokenKind::StringPlain, "x", 1, 1, 0),
        ));
        assert!(source.validate().is_err());
    }
}
