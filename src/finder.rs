//! Normalized substring search over a [`Source`] (spec §4.7).
//!
//! The finder loads a `Source` once, building a parallel rune buffer (run
//! through the configured [`Normalizer`]) and a parallel [`Position`]
//! buffer, then performs ordinary substring search over runes. Because the
//! normalizer must be rune-length-preserving, matched rune indices map
//! directly back onto the original `Source`'s positions.

use std::fmt;

use unicode_normalization::UnicodeNormalization;

use crate::line::Source;
use crate::position::{Position, Range};

/// A length-preserving (one input rune -> one output rune), idempotent text
/// transform applied before matching (spec §4.7).
pub trait Normalizer {
    fn normalize(&self, s: &str) -> String;
}

/// The identity normalizer: matches are byte/rune-exact.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityNormalizer;

impl Normalizer for IdentityNormalizer {
    fn normalize(&self, s: &str) -> String {
        s.to_string()
    }
}

/// NFKD-decomposes, strips combining marks, and ASCII-lowercases — the
/// "standard" normalizer from spec §4.7, used so e.g. `"Thaïs"` matches a
/// search for `"Thais"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardNormalizer;

impl Normalizer for StandardNormalizer {
    fn normalize(&self, s: &str) -> String {
        s.chars().map(normalize_char).collect()
    }
}

/// Decompose a single rune and keep its first non-combining-mark
/// constituent, ASCII-lowercased. Folding one rune to exactly one rune is
/// what keeps [`StandardNormalizer`] length-preserving.
fn normalize_char(c: char) -> char {
    let decomposed: String = c.nfkd().collect();
    let base = decomposed
        .chars()
        .find(|ch| !unicode_normalization::char::is_combining_mark(*ch))
        .unwrap_or(c);
    base.to_ascii_lowercase()
}

/// Error produced when a normalizer turns out not to be rune-length
/// preserving (spec: `BadNormalizer`, detected via a sanity check at load
/// time rather than left to corrupt results silently).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadNormalizerError;

impl fmt::Display for BadNormalizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "normalizer did not produce exactly one rune per input rune")
    }
}

impl std::error::Error for BadNormalizerError {}

struct LoadedIndex {
    buffer: Vec<char>,
    positions: Vec<Position>,
}

/// Byte-faithful, optionally-normalized substring search (spec §4.7).
///
/// State machine: `Unloaded -> load(source) -> Loaded`; `find` is only
/// meaningful once loaded (spec "Finder state"). Calling `load` again
/// atomically replaces any previous index. Calling `find` before any
/// `load` returns no results rather than panicking.
pub struct Finder {
    normalizer: Box<dyn Normalizer>,
    loaded: Option<LoadedIndex>,
}

impl Finder {
    pub fn new() -> Self {
        Self {
            normalizer: Box::new(IdentityNormalizer),
            loaded: None,
        }
    }

    pub fn with_normalizer(normalizer: impl Normalizer + 'static) -> Self {
        Self {
            normalizer: Box::new(normalizer),
            loaded: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Build the rune/position index over `source`, validating the
    /// normalizer is length-preserving on every rune.
    pub fn load(&mut self, source: &Source) -> Result<(), BadNormalizerError> {
        let runes = source.runes();
        let mut buffer = Vec::with_capacity(runes.len());
        let mut positions = Vec::with_capacity(runes.len());
        for (pos, ch) in runes {
            let normalized = self.normalizer.normalize(&ch.to_string());
            let mut chars = normalized.chars();
            let first = chars.next().ok_or(BadNormalizerError)?;
            if chars.next().is_some() {
                return Err(BadNormalizerError);
            }
            buffer.push(first);
            positions.push(pos);
        }
        self.loaded = Some(LoadedIndex { buffer, positions });
        Ok(())
    }

    /// Find every non-overlapping occurrence of `q` (after normalization)
    /// in the loaded source, sorted by start position. Empty `q` returns no
    /// ranges.
    pub fn find(&self, q: &str) -> Vec<Range> {
        let loaded = match &self.loaded {
            Some(l) => l,
            None => return Vec::new(),
        };
        if q.is_empty() {
            return Vec::new();
        }
        let normalized_q: Vec<char> = self.normalizer.normalize(q).chars().collect();
        if normalized_q.is_empty() || normalized_q.len() > loaded.buffer.len() {
            return Vec::new();
        }

        let mut out = Vec::new();
        let mut i = 0usize;
        while i + normalized_q.len() <= loaded.buffer.len() {
            if loaded.buffer[i..i + normalized_q.len()] == normalized_q[..] {
                let start = loaded.positions[i];
                let last_idx = i + normalized_q.len() - 1;
                let end = advance_end(loaded.positions[last_idx], loaded.buffer[last_idx]);
                if let Ok(range) = Range::new(start, end) {
                    out.push(range);
                }
                i += normalized_q.len();
            } else {
                i += 1;
            }
        }
        out
    }
}

impl Default for Finder {
    fn default() -> Self {
        Self::new()
    }
}

/// The position immediately after a matched rune: same line with `col + 1`,
/// or `(line + 1, 0)` if the matched rune was the line-boundary `\n` (spec
/// §4.7, §9 open question ii).
fn advance_end(pos: Position, matched: char) -> Position {
    if matched == '\n' {
        Position::new(pos.line + 1, 0)
    } else {
        Position::new(pos.line, pos.col + 1)
    }
}
