//! The decoder adapter (spec §4.10): a thin wrapper around a parsed YAML AST
//! that resolves paths to tokens, decodes into caller types, and validates
//! against caller-supplied rules — wrapping any path-carrying failure with
//! the document [`Source`] so it can be rendered as an annotated excerpt by
//! [`crate::error`].
//!
//! `FileGetter`, `ParsedFile`, and `Validator` are the external collaborator
//! traits this crate consumes (spec §6 "External Interfaces"); this crate
//! never parses YAML itself.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::Error as AnnotatedError;
use crate::line::Source;

/// Which half of a mapping entry a [`Path`] addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part {
    Key,
    Value,
}

/// A YAML path expression (e.g. `$.metadata.name`) plus the [`Part`] it
/// addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    expression: String,
    part: Part,
}

impl Path {
    pub fn new(expression: impl Into<String>, part: Part) -> Self {
        Self {
            expression: expression.into(),
            part,
        }
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn part(&self) -> Part {
        self.part
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}

/// A parsed document, queryable by [`Path`]. Supplied by the caller's YAML
/// parser — this crate has no opinion on its internal representation.
pub trait ParsedFile {
    fn token_for_path(&self, path: &Path) -> Option<crate::token::Token>;
}

/// Resolves a document into a [`ParsedFile`] (spec §6: `file() -> (ParsedFile,
/// Error)`). Object-safe (no associated type) so [`crate::error::Error`] can
/// hold one behind a `Box<dyn FileGetter>`.
pub trait FileGetter {
    fn file(&self) -> Result<Box<dyn ParsedFile>, DecodeError>;
}

/// A caller-supplied decode step (spec: `decode(target)`), parameterized
/// over the decoded type.
pub trait Decode<T> {
    fn decode(&self, data: &str) -> Result<T, CollaboratorFailure>;
}

/// A caller-supplied validation step (spec: `validate(data) -> Error`).
pub trait Validator {
    fn validate(&self, data: &str) -> Option<CollaboratorFailure>;
}

/// A decode or validation failure returned by a [`Decode`]/[`Validator`]
/// collaborator, optionally carrying the [`Path`] it occurred at.
#[derive(Debug, Clone)]
pub struct CollaboratorFailure {
    pub message: String,
    pub path: Option<Path>,
}

impl CollaboratorFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: Path) -> Self {
        self.path = Some(path);
        self
    }
}

/// This crate's own error taxonomy (spec §7), for failures internal to the
/// adapter rather than ones returned by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A path did not resolve to a token.
    NotFound,
    /// The annotator was asked to resolve a path without a parsed source.
    NoSource,
    /// A `*_context` call observed its cancellation flag set.
    Cancelled,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::NotFound => write!(f, "path did not resolve to a token"),
            DecodeError::NoSource => write!(f, "no parsed source available to resolve against"),
            DecodeError::Cancelled => write!(f, "operation was cancelled"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// A cooperative cancellation flag for the `*_context` entry points (spec
/// §5: "propagate cancellation to their collaborators and return promptly").
/// This crate has no async runtime in its stack, so cancellation is a plain
/// checked flag rather than a future.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Wraps a [`FileGetter`] and (optionally) the parsed document's [`Source`],
/// exposing `get_value`/`decode`/`validate` and wrapping any path-carrying
/// collaborator failure with the source for annotated rendering.
pub struct Decoder<F: FileGetter> {
    file_getter: F,
    source: Option<Source>,
    source_lines: usize,
}

impl<F: FileGetter> Decoder<F> {
    pub fn new(file_getter: F) -> Self {
        Self {
            file_getter,
            source: None,
            source_lines: 2,
        }
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_source_lines(mut self, n: usize) -> Self {
        self.source_lines = n;
        self
    }

    /// `(value, found)` for the token at `path`, or `(String::new(), false)`
    /// if it does not resolve.
    pub fn get_value(&self, path: &Path) -> (String, bool) {
        self.get_value_context(path, &Cancellation::new())
    }

    pub fn get_value_context(&self, path: &Path, cancellation: &Cancellation) -> (String, bool) {
        if cancellation.is_cancelled() {
            return (String::new(), false);
        }
        match self.resolve(path) {
            Some(tk) => (tk.value, true),
            None => (String::new(), false),
        }
    }

    pub fn decode<T>(&self, decoder: &dyn Decode<T>, data: &str) -> Result<T, AnnotatedError> {
        self.decode_context(decoder, data, &Cancellation::new())
    }

    pub fn decode_context<T>(
        &self,
        decoder: &dyn Decode<T>,
        data: &str,
        cancellation: &Cancellation,
    ) -> Result<T, AnnotatedError> {
        if cancellation.is_cancelled() {
            return Err(AnnotatedError::new("decode cancelled"));
        }
        decoder.decode(data).map_err(|failure| self.wrap_failure(failure))
    }

    pub fn validate(&self, validator: &dyn Validator, data: &str) -> Result<(), AnnotatedError> {
        self.validate_context(validator, data, &Cancellation::new())
    }

    pub fn validate_context(
        &self,
        validator: &dyn Validator,
        data: &str,
        cancellation: &Cancellation,
    ) -> Result<(), AnnotatedError> {
        if cancellation.is_cancelled() {
            return Err(AnnotatedError::new("validation cancelled"));
        }
        match validator.validate(data) {
            None => Ok(()),
            Some(failure) => Err(self.wrap_failure(failure)),
        }
    }

    fn resolve(&self, path: &Path) -> Option<crate::token::Token> {
        let file = self.file_getter.file().ok()?;
        file.token_for_path(path)
    }

    /// Wrap a collaborator's failure with the document source (spec §4.10:
    /// "if the validator returned a path-carrying error, wrap it with the
    /// document source so printing produces an annotated excerpt").
    fn wrap_failure(&self, failure: CollaboratorFailure) -> AnnotatedError {
        let mut err = AnnotatedError::new(failure.message).with_source_lines(self.source_lines);
        if let Some(path) = failure.path {
            err = err.with_main_path(path);
        }
        if let Some(source) = &self.source {
            err = err.with_source(source.clone());
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::new_from_string;

    struct StubFile;
    impl ParsedFile for StubFile {
        fn token_for_path(&self, path: &Path) -> Option<crate::token::Token> {
            if path.expression() == "$.key" {
                Some(crate::token::Token::new(
                    crate::token::TokenKind::StringPlain,
                    "value",
                    "value",
                    crate::token::Position::new(1, 1, 0),
                ))
            } else {
                None
            }
        }
    }

    struct StubFileGetter;
    impl FileGetter for StubFileGetter {
        fn file(&self) -> Result<Box<dyn ParsedFile>, DecodeError> {
            Ok(Box::new(StubFile))
        }
    }

    struct AlwaysFails;
    impl Validator for AlwaysFails {
        fn validate(&self, _data: &str) -> Option<CollaboratorFailure> {
            Some(CollaboratorFailure::new("bad value").with_path(Path::new("$.key", Part::Value)))
        }
    }

    struct AlwaysPasses;
    impl Validator for AlwaysPasses {
        fn validate(&self, _data: &str) -> Option<CollaboratorFailure> {
            None
        }
    }

    #[test]
    fn get_value_resolves_known_path() {
        let decoder = Decoder::new(StubFileGetter);
        let (value, found) = decoder.get_value(&Path::new("$.key", Part::Value));
        assert!(found);
        assert_eq!(value, "value");
    }

    #[test]
    fn get_value_reports_unresolved_path() {
        let decoder = Decoder::new(StubFileGetter);
        let (value, found) = decoder.get_value(&Path::new("$.missing", Part::Value));
        assert!(!found);
        assert_eq!(value, "");
    }

    #[test]
    fn validate_passes_through_success() {
        let decoder = Decoder::new(StubFileGetter);
        assert!(decoder.validate(&AlwaysPasses, "anything").is_ok());
    }

    #[test]
    fn validate_wraps_path_carrying_failure_with_source() {
        let decoder = Decoder::new(StubFileGetter).with_source(new_from_string("key: value"));
        let err = decoder.validate(&AlwaysFails, "key: value").unwrap_err();
        assert_eq!(err.message(), "bad value");
        assert_eq!(err.path().as_deref(), Some("$.key"));
    }

    #[test]
    fn cancelled_context_call_short_circuits() {
        let decoder = Decoder::new(StubFileGetter);
        let cancellation = Cancellation::new();
        cancellation.cancel();
        let (_, found) = decoder.get_value_context(&Path::new("$.key", Part::Value), &cancellation);
        assert!(!found);
    }
}
