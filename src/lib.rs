//! # yaml-canvas
//!
//! Friendly, precise, presentation-oriented handling of tokenized YAML
//! documents: a line model over lexer tokens, a styled renderer with
//! gutters/overlays/word-wrap, an LCS line differ with unified-diff hunks,
//! a normalizing text finder, and an error annotator that excerpts and
//! highlights the offending source.
//!
//! This crate does not lex or parse YAML itself — it consumes a token
//! stream produced elsewhere (see [`token::Token`]) and the handful of
//! collaborator traits in [`decoder`].

pub mod decoder;
pub mod diff;
pub mod error;
pub mod finder;
pub mod line;
pub mod position;
pub mod printer;
pub mod revision;
pub mod style;
pub mod token;

pub use line::Source;
pub use position::{Position, Range, Span};
pub use printer::Printer;
pub use token::Token;
