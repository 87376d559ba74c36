//! The error annotator (spec §4.8): resolves a main + nested error location
//! against a parsed [`Source`], groups proximate locations into hunks with
//! `...` separators, and renders an annotated excerpt via a [`Printer`].
//!
//! Every failure to resolve a nested (or, for a path-only main, the main)
//! location is caught and logged at `debug` rather than propagated (spec
//! §7: "caught and logged at debug only; rendering continues").

use std::collections::BTreeMap;
use std::fmt;

use crate::decoder::{FileGetter, Path, Part};
use crate::line::{Annotation, AnnotationPosition, Source};
use crate::position::{Span, Spans};
use crate::printer::Printer;
use crate::style::{Style, StyleKind};
use crate::token::Token;

/// One nested error location: either a path (resolved through a
/// [`FileGetter`]) or a direct token, never both, plus its own message.
#[derive(Debug, Clone)]
pub struct NestedError {
    pub message: String,
    pub path: Option<Path>,
    pub token: Option<Token>,
}

impl NestedError {
    pub fn with_path(message: impl Into<String>, path: Path) -> Self {
        Self {
            message: message.into(),
            path: Some(path),
            token: None,
        }
    }

    pub fn with_token(message: impl Into<String>, token: Token) -> Self {
        Self {
            message: message.into(),
            path: None,
            token: Some(token),
        }
    }

    pub fn plain(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
            token: None,
        }
    }
}

/// The main error's location, mutually exclusive between a path (resolved
/// via a `FileGetter`) and a directly-known token (spec §4.8 data model).
#[derive(Debug, Clone)]
enum MainLocation {
    Path(Path),
    Token(Token),
}

/// A resolved `(line, col)` plus the source-token index it came from, used
/// internally once a path or token has been located in a `Source`.
struct ResolvedLoc {
    line_idx: usize,
    col: usize,
    token_index: usize,
}

/// An annotated error: a message plus an optional main location, nested
/// sub-errors, and the collaborators (`FileGetter`, `Source`) needed to
/// resolve locations into a styled excerpt (spec §4.8).
pub struct Error {
    message: String,
    main: Option<MainLocation>,
    nested: Vec<NestedError>,
    file_getter: Option<Box<dyn FileGetter>>,
    source: Option<Source>,
    source_lines: usize,
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("message", &self.message)
            .field("nested", &self.nested.len())
            .field("source_lines", &self.source_lines)
            .finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

impl Error {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            main: None,
            nested: Vec::new(),
            file_getter: None,
            source: None,
            source_lines: 2,
        }
    }

    pub fn with_main_path(mut self, path: Path) -> Self {
        self.main = Some(MainLocation::Path(path));
        self
    }

    pub fn with_main_token(mut self, token: Token) -> Self {
        self.main = Some(MainLocation::Token(token));
        self
    }

    pub fn with_nested(mut self, nested: NestedError) -> Self {
        self.nested.push(nested);
        self
    }

    pub fn with_file_getter(mut self, file_getter: impl FileGetter + 'static) -> Self {
        self.file_getter = Some(Box::new(file_getter));
        self
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_source_lines(mut self, n: usize) -> Self {
        self.source_lines = n;
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn nested(&self) -> &[NestedError] {
        &self.nested
    }

    /// The main path's display string; if absent, the most specific nested
    /// path — preferring `Part::Key` entries, then longer paths (spec
    /// §4.8 "Path resolution for display").
    pub fn path(&self) -> Option<String> {
        if let Some(MainLocation::Path(p)) = &self.main {
            return Some(p.to_string());
        }
        self.nested
            .iter()
            .filter_map(|n| n.path.as_ref())
            .max_by_key(|p| (p.part == Part::Key, p.expression().len()))
            .map(|p| p.to_string())
    }

    /// This error's message plus every nested message, flattened — the
    /// equivalent of the spec's `Unwrap` for languages with `is`/`as`-style
    /// error predicates.
    pub fn flatten(&self) -> Vec<&str> {
        let mut out = vec![self.message.as_str()];
        out.extend(self.nested.iter().map(|n| n.message.as_str()));
        out
    }

    /// Render the full annotated excerpt (spec §4.8 rendering decision
    /// tree) using `printer`.
    pub fn render<S: Style + PartialEq + 'static>(&self, printer: &Printer<S>) -> String {
        if self.message.is_empty() {
            return String::new();
        }
        if self.main.is_none() {
            let nested_has_location = self.nested.iter().any(|n| n.path.is_some() || n.token.is_some());
            if !nested_has_location {
                return self.plain_with_nested();
            }
            return self.render_hunked(None, printer);
        }
        match self.resolve_main() {
            Ok(loc) => self.render_hunked(Some(loc), printer),
            Err(degraded) => degraded,
        }
    }

    fn plain_with_nested(&self) -> String {
        let mut out = self.message.clone();
        for n in &self.nested {
            out.push_str(&format!("\n  \u{2022} {}", n.message));
        }
        out
    }

    fn resolve_main(&self) -> Result<ResolvedLoc, String> {
        let main = self.main.as_ref().expect("checked by caller");
        match main {
            MainLocation::Token(tk) => {
                let source = match &self.source {
                    Some(s) => s,
                    None => return Err(self.message.clone()),
                };
                self.locate(source, tk).ok_or_else(|| self.message.clone())
            }
            MainLocation::Path(path) => {
                let degrade = || format!("at {}: {}", path, self.message);
                let source = match &self.source {
                    Some(s) => s,
                    None => return Err(degrade()),
                };
                let file_getter = match &self.file_getter {
                    Some(f) => f,
                    None => {
                        tracing::debug!(target: "printer::annotator", %path, "no source getter to resolve main path");
                        return Err(degrade());
                    }
                };
                let file = match file_getter.file() {
                    Ok(f) => f,
                    Err(_) => {
                        tracing::debug!(target: "printer::annotator", %path, "file getter failed resolving main path");
                        return Err(degrade());
                    }
                };
                let tk = match file.token_for_path(path) {
                    Some(t) => t,
                    None => {
                        tracing::debug!(target: "printer::annotator", %path, "path did not resolve to a token");
                        return Err(degrade());
                    }
                };
                self.locate(source, &tk).ok_or_else(degrade)
            }
        }
    }

    fn resolve_nested(&self, n: &NestedError, source: &Source) -> Option<ResolvedLoc> {
        if let Some(tk) = &n.token {
            return self.locate(source, tk);
        }
        let path = n.path.as_ref()?;
        let file_getter = self.file_getter.as_ref()?;
        let file = file_getter.file().ok()?;
        let tk = file.token_for_path(path)?;
        self.locate(source, &tk)
    }

    fn locate(&self, source: &Source, tk: &Token) -> Option<ResolvedLoc> {
        let token_index = source.index_of_token(tk)?;
        let positions = source.positions_from_token(token_index)?;
        let first = *positions.first()?;
        Some(ResolvedLoc {
            line_idx: first.line,
            col: first.col,
            token_index,
        })
    }

    fn render_hunked<S: Style + PartialEq + 'static>(&self, main_loc: Option<ResolvedLoc>, printer: &Printer<S>) -> String {
        let source = match &self.source {
            Some(s) => s,
            None => return self.message.clone(),
        };

        let mut nested_resolved = Vec::new();
        for n in &self.nested {
            match self.resolve_nested(n, source) {
                Some(loc) => nested_resolved.push((loc, n.message.clone())),
                None => {
                    tracing::debug!(target: "printer::annotator", nested_message = %n.message, "failed to resolve nested error location");
                }
            }
        }

        let mut all_indices: Vec<usize> = nested_resolved.iter().map(|(loc, _)| loc.line_idx).collect();
        if let Some(loc) = &main_loc {
            all_indices.push(loc.line_idx);
        }
        all_indices.sort_unstable();
        all_indices.dedup();
        if all_indices.is_empty() {
            return self.message.clone();
        }

        let hunk_ranges = merge_into_hunks(&all_indices, self.source_lines, source.line_count());

        let mut working = source.clone();
        if let Some(loc) = &main_loc {
            if let Some(ranges) = working.content_position_ranges_from_token(loc.token_index) {
                working.add_overlay(StyleKind::GenericError.to_overlay_key(), ranges);
            }
        }
        for (loc, _) in &nested_resolved {
            if let Some(ranges) = working.content_position_ranges_from_token(loc.token_index) {
                working.add_overlay(StyleKind::GenericError.to_overlay_key(), ranges);
            }
        }

        let mut by_line: BTreeMap<usize, Vec<(usize, String)>> = BTreeMap::new();
        for (loc, msg) in &nested_resolved {
            by_line.entry(loc.line_idx).or_default().push((loc.col, msg.clone()));
        }
        for (line_idx, entries) in &by_line {
            let min_col = entries.iter().map(|(c, _)| *c).min().unwrap_or(0);
            let joined = entries.iter().map(|(_, m)| m.as_str()).collect::<Vec<_>>().join("; ");
            if let Some(line) = working.line_mut(*line_idx) {
                line.add_annotation(Annotation::new(joined, AnnotationPosition::Below, min_col));
            }
        }

        let mut spans = Spans::new();
        for (i, (start, end)) in hunk_ranges.iter().enumerate() {
            if i > 0 {
                if let Some(line) = working.line_mut(*start) {
                    line.add_annotation(Annotation::new("...", AnnotationPosition::Above, 0));
                }
            }
            spans.push(Span::new(*start, *end));
        }

        let body = printer.print(&working, &spans);
        let header = match &main_loc {
            Some(loc) => {
                let line_number = source.line(loc.line_idx).map(|l| l.number).unwrap_or(loc.line_idx + 1);
                format!("[{}:{}] {}:\n\n", line_number, loc.col + 1, self.message)
            }
            None => format!("{}:\n\n", self.message),
        };
        format!("{header}{body}")
    }
}

/// Group sorted, deduplicated line indices into hunks: two raw indices
/// merge into the same hunk when the next one falls within `2*context + 1`
/// of the last (their `context`-wide windows abut), then each hunk's window
/// expands by `context` on both sides, clipped to `[0, line_count)` (spec
/// §4.8 step 5).
fn merge_into_hunks(indices: &[usize], context: usize, line_count: usize) -> Vec<(usize, usize)> {
    let mut runs: Vec<(usize, usize)> = Vec::new();
    for &idx in indices {
        match runs.last_mut() {
            Some((_, last)) if idx <= *last + 2 * context + 1 => *last = idx,
            _ => runs.push((idx, idx)),
        }
    }
    runs.iter()
        .map(|(first, last)| {
            let start = first.saturating_sub(context);
            let end = (last + context + 1).min(line_count);
            (start, end)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{FileGetter, ParsedFile};
    use crate::line::new_from_tokens;
    use crate::printer::{no_gutter, Printer, PrinterConfig};
    use crate::style::testing::TagStyle;
    use crate::token::{Position as TPos, TokenKind};

    fn tok(kind: TokenKind, origin: &str, line: usize, column: usize, offset: usize) -> Token {
        Token::new(kind, origin.trim(), origin, TPos::new(line, column, offset))
    }

    fn tagged_printer() -> Printer<TagStyle> {
        let styles = crate::style::testing::identity_styles();
        let config = PrinterConfig {
            container: TagStyle::new(StyleKind::Text),
            width: 0,
            word_wrap: false,
            annotations_enabled: true,
        };
        Printer::new(styles, config).with_gutter(no_gutter())
    }

    fn doc_source() -> Source {
        new_from_tokens([
            tok(TokenKind::StringPlain, "a", 1, 1, 0),
            tok(TokenKind::MappingValue, ":", 1, 2, 1),
            tok(TokenKind::Whitespace, " ", 1, 3, 2),
            tok(TokenKind::StringPlain, "b\n", 1, 4, 3),
            tok(TokenKind::StringPlain, "foo", 2, 1, 5),
            tok(TokenKind::MappingValue, ":", 2, 4, 8),
            tok(TokenKind::Whitespace, " ", 2, 5, 9),
            tok(TokenKind::StringPlain, "bar\n", 2, 6, 10),
            tok(TokenKind::StringPlain, "key", 3, 1, 14),
            tok(TokenKind::MappingValue, ":", 3, 4, 17),
            tok(TokenKind::Whitespace, " ", 3, 5, 18),
            tok(TokenKind::StringPlain, "value", 3, 6, 19),
        ])
    }

    #[test]
    fn empty_message_renders_empty() {
        let err = Error::new("");
        let printer = tagged_printer();
        assert_eq!(err.render(&printer), "");
    }

    #[test]
    fn no_location_renders_plain_with_bullets() {
        let err = Error::new("bad thing").with_nested(NestedError::plain("detail one"));
        let printer = tagged_printer();
        assert_eq!(err.render(&printer), "bad thing\n  \u{2022} detail one");
    }

    #[test]
    fn unresolvable_main_path_degrades_to_text() {
        let path = Path::new("$.key", Part::Value);
        let err = Error::new("invalid value").with_main_path(path);
        let printer = tagged_printer();
        assert_eq!(err.render(&printer), "at $.key: invalid value");
    }

    /// S6 — a resolvable main token renders header + styled excerpt with
    /// the offending token wrapped in `GenericError`.
    #[test]
    fn s6_error_with_resolved_main_token() {
        let source = doc_source();
        let key_token = source.tokens()[8].clone();
        let err = Error::new("invalid value")
            .with_main_token(key_token)
            .with_source(source);
        let printer = tagged_printer();
        let out = err.render(&printer);
        let expected = concat!(
            "[3:1] invalid value:\n\n",
            "<name-tag>a</name-tag><punctuation-mapping-value>:</punctuation-mapping-value>",
            "<text> </text><literal-string>b</literal-string>\n",
            "<name-tag>foo</name-tag><punctuation-mapping-value>:</punctuation-mapping-value>",
            "<text> </text><literal-string>bar</literal-string>\n",
            "<generic-error>key</generic-error><punctuation-mapping-value>:</punctuation-mapping-value>",
            "<text> </text><literal-string>value</literal-string>",
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn merge_into_hunks_groups_close_indices() {
        let hunks = merge_into_hunks(&[0, 1, 4], 1, 5);
        assert_eq!(hunks, vec![(0, 3), (3, 5)]);
    }

    #[test]
    fn merge_into_hunks_splits_far_indices() {
        let hunks = merge_into_hunks(&[0, 10], 1, 20);
        assert_eq!(hunks, vec![(0, 2), (9, 12)]);
    }

    struct NullFileGetter;
    impl FileGetter for NullFileGetter {
        fn file(&self) -> Result<Box<dyn ParsedFile>, crate::decoder::DecodeError> {
            Err(crate::decoder::DecodeError::NoSource)
        }
    }

    #[test]
    fn main_path_without_file_getter_degrades() {
        let err = Error::new("oops")
            .with_main_path(Path::new("$.x", Part::Value))
            .with_source(doc_source())
            .with_file_getter(NullFileGetter);
        let printer = tagged_printer();
        assert_eq!(err.render(&printer), "at $.x: oops");
    }
}
