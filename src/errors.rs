//! Error taxonomy (§7 of the design): well-formedness, validity, encoding,
//! structural, resource and programmer errors, each carrying a [`Position`].
//!
//! Grounded on `errors.rs`/`parser/mod.rs` of the teacher crate: a flat
//! `Error` enum for fatal conditions plus a narrower `SyntaxError` for the
//! lexical layer, composed into the top-level error via `#[from]`.

use std::io;

use crate::position::Position;

/// Severity with which a condition is reported to the sink's error channel.
///
/// Only [`Severity::Fatal`] unwinds `receive`; [`Severity::Warning`] and
/// [`Severity::Error`] are delivered and parsing continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

/// A lexical-layer failure raised by the [`crate::tokenizer::Tokenizer`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("'--' is not allowed inside a comment")]
    CommentDoubleHyphen,
    #[error("unexpected character '{0}' after '<!'")]
    InvalidBangMarkup(char),
    #[error("unexpected character '{0}' in markup")]
    UnexpectedChar(char),
    #[error("a name was expected but none was found")]
    ExpectedName,
    #[error("unquoted attribute value")]
    UnquotedAttributeValue,
    #[error("unterminated attribute value: reached end of tag before closing quote")]
    UnclosedAttributeValue,
    #[error("a '=' was expected between an attribute name and its value")]
    ExpectedEq,
    #[error("malformed processing instruction target '{0}'")]
    InvalidPiTarget(String),
    #[error("malformed character reference")]
    InvalidCharRef,
}

/// A well-formedness violation (§7, all fatal).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum WfError {
    #[error("duplicate attribute '{0}'")]
    DuplicateAttribute(String),
    #[error("expected closing tag '</{expected}>', found '</{found}>'")]
    TagMismatch { expected: String, found: String },
    #[error("end tag '</{0}>' without matching start tag")]
    UnmatchedEndTag(String),
    #[error("unbound namespace prefix '{0}'")]
    UnboundPrefix(String),
    #[error("reference to undeclared entity '{0}' in a standalone document")]
    UndeclaredEntityStandalone(String),
    #[error("content is not allowed after the document element")]
    ContentAfterRoot,
    #[error("a second DOCTYPE declaration is not allowed")]
    SecondDoctype,
    #[error("DOCTYPE declaration is not allowed after the document element")]
    DoctypeAfterRoot,
    #[error("document has no root element")]
    NoRootElement,
    #[error("illegal character U+{0:04X} in this context")]
    IllegalChar(u32),
    #[error("self-referential entity '{0}'")]
    RecursiveEntity(String),
    #[error("unexpected end of input inside {0}")]
    UnexpectedEof(&'static str),
    #[error("attribute '{0}' and a differently-prefixed attribute resolve to the same expanded name")]
    DuplicateExpandedAttribute(String),
    #[error("xmlns:{0}=\"\" is not allowed in an XML 1.0 document")]
    EmptyNamespaceUriInXml10(String),
    #[error("external entity '{0}' declares XML 1.1 but the including document is XML 1.0")]
    ExternalEntityVersionConflict(String),
}

/// Top level error type returned from [`crate::parser::Parser::receive`] and
/// [`crate::parser::Parser::close`].
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    WellFormedness(#[from] WfError),

    #[error("receive() called after close()")]
    UseAfterClose,

    #[error("external entity could not be resolved: {0}")]
    EntityResolution(String),
}

/// A [`Result`](std::result::Result) specialized to this crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// An error together with the position it was detected at and the severity
/// it should be reported with -- this is what reaches [`crate::events::ErrorHandler`].
#[derive(Debug)]
pub struct ReportedError {
    pub severity: Severity,
    pub position: Position,
    pub message: String,
}

impl ReportedError {
    pub fn new(severity: Severity, position: Position, message: impl Into<String>) -> Self {
        ReportedError { severity, position, message: message.into() }
    }
}

/// The three-valued outcome of a speculative sub-parser attempt (§3, §9):
/// a grammar fragment either matched, definitely failed, or needs more
/// input to decide. Mirrors the `Option<usize>` / `None` convention used by
/// the teacher crate's lexical sub-parsers, made explicit as a named type so
/// `FAILURE` and `UNDERFLOW` are never confused with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadResult<T> {
    /// The fragment matched; `T` carries whatever was produced (often a byte
    /// count consumed).
    Ok(T),
    /// The fragment definitely does not match. The caller must restore its
    /// position to the mark taken before the attempt.
    Failure,
    /// Not enough input to decide yet. The caller must leave its position at
    /// the mark and retry once more data has arrived.
    Underflow,
}

impl<T> ReadResult<T> {
    pub fn is_underflow(&self) -> bool {
        matches!(self, ReadResult::Underflow)
    }
}
