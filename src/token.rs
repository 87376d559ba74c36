//! Token and segment types.
//!
//! [`Token`] mirrors the shape of the external lexer's output (see spec §6):
//! a semantic [`TokenKind`], the literal `value`, the exact source bytes in
//! `origin` (whitespace, quotes and indicators included), and a 1-indexed
//! [`Position`]. Tokens are immutable once produced; the line model ([`crate::line`])
//! clones and re-splits them per visual line.
//!
//! A [`Segment`] pairs one source token with the fragment of its origin
//! (`part`) that belongs to a single visual line — for single-line tokens the
//! whole origin; for a multi-line scalar, one fragment per line.

use serde::{Deserialize, Serialize};

/// Semantic category of a token, independent of its literal text.
///
/// This is a closed set covering the constructs [`crate::style::StyleKind`]'s
/// `TypeStyle` table dispatches on; an external lexer's richer token alphabet
/// is expected to map onto this set before reaching this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// Plain (unquoted) scalar text.
    StringPlain,
    StringDoubleQuoted,
    StringSingleQuoted,
    Integer,
    IntegerHex,
    IntegerOctal,
    IntegerBinary,
    Float,
    FloatInfinity,
    FloatNaN,
    Bool,
    Null,
    NullImplicit,
    AnchorIndicator,
    AliasIndicator,
    MergeKey,
    Tag,
    MappingValue,
    MappingStart,
    MappingEnd,
    SequenceEntry,
    SequenceStart,
    SequenceEnd,
    CollectEntry,
    DocumentHeading,
    BlockLiteral,
    BlockFolded,
    Comment,
    Directive,
    Whitespace,
    Unknown,
}

/// The lexer's 1-indexed source position, distinct from the zero-indexed
/// rune [`crate::position::Position`] used everywhere downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
    pub indent_num: usize,
    pub indent_level: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
            indent_num: 0,
            indent_level: 0,
        }
    }
}

/// A single lexer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub origin: String,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, origin: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            value: value.into(),
            origin: origin.into(),
            position,
        }
    }
}

/// Pairing of a source token (by index into the owning [`crate::line::Source`])
/// with one visual-line fragment of its origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Index of the source token in the owning `Source`'s token list.
    pub source_index: usize,
    /// The fragment of `origin` belonging to this visual line (for a
    /// single-line token, identical in content to the source token).
    pub part: Token,
}

impl Segment {
    pub fn new(source_index: usize, part: Token) -> Self {
        Self { source_index, part }
    }

    /// Rune count of `part.origin` with a single trailing `\n` stripped.
    /// `\r` is deliberately left in the width (spec §9).
    pub fn width(&self) -> usize {
        let trimmed = strip_single_trailing_newline(&self.part.origin);
        trimmed.chars().count()
    }

    pub fn source_equals(&self, source_index: usize) -> bool {
        self.source_index == source_index
    }

    pub fn part_equals(&self, tk: &Token) -> bool {
        &self.part == tk
    }

    pub fn contains(&self, source_index: usize) -> bool {
        self.source_equals(source_index)
    }
}

fn strip_single_trailing_newline(s: &str) -> &str {
    s.strip_suffix('\n').unwrap_or(s)
}

/// An ordered collection of [`Segment`]s belonging to one [`crate::line::Line`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Segments {
    pub items: Vec<Segment>,
}

impl Segments {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn append(&mut self, source_index: usize, part: Token) {
        self.items.push(Segment::new(source_index, part));
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Deduplicated source token indices, preserving first-seen order.
    pub fn source_tokens(&self) -> Vec<usize> {
        let mut seen = Vec::new();
        for seg in &self.items {
            if !seen.contains(&seg.source_index) {
                seen.push(seg.source_index);
            }
        }
        seen
    }

    pub fn part_tokens(&self) -> Vec<Token> {
        self.items.iter().map(|s| s.part.clone()).collect()
    }

    /// The max starting rune column of any part on this line, used to place
    /// annotations past the end of content.
    pub fn next_column(&self) -> usize {
        let mut col = 0usize;
        let mut running = 0usize;
        for seg in &self.items {
            col = col.max(running);
            running += seg.width();
        }
        col.max(running)
    }

    /// The source token index whose part covers rune column `col`
    /// (end-exclusive).
    pub fn source_token_at(&self, col: usize) -> Option<usize> {
        let mut running = 0usize;
        for seg in &self.items {
            let width = seg.width();
            if col >= running && col < running + width {
                return Some(seg.source_index);
            }
            running += width;
        }
        None
    }

    /// Byte-free iteration helper: (start_col, end_col, segment) triples.
    pub fn with_columns(&self) -> Vec<(usize, usize, &Segment)> {
        let mut running = 0usize;
        let mut out = Vec::with_capacity(self.items.len());
        for seg in &self.items {
            let width = seg.width();
            out.push((running, running + width, seg));
            running += width;
        }
        out
    }
}
