//! Parse and extraction error types.

use source_map::Span;
use thiserror::Error;

/// An error that occurred while tokenizing markup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct ParseError {
    /// The kind of error.
    pub kind: ParseErrorKind,
    /// The location in the source where the error occurred.
    pub span: Span,
}

impl ParseError {
    /// Creates a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of parse error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// An unexpected end of input was encountered.
    #[error("unexpected end of input: expected {expected}")]
    UnexpectedEof {
        /// What was expected.
        expected: String,
    },

    /// An unclosed tag was found.
    #[error("unclosed tag: <{tag_name}>")]
    UnclosedTag {
        /// The name of the unclosed tag.
        tag_name: String,
    },

    /// An invalid attribute was found.
    #[error("invalid attribute: {message}")]
    InvalidAttribute {
        /// A description of the problem.
        message: String,
    },

    /// An invalid tag name was found.
    #[error("invalid tag name: {name}")]
    InvalidTagName {
        /// The invalid tag name.
        name: String,
    },
}

/// An error returned by [`extract`](crate::extract).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// No tag names were requested.
    #[error("at least one tag name must be requested")]
    EmptyTagList,

    /// A requested tag name can never match an element.
    #[error("invalid requested tag name: {0:?}")]
    InvalidTagName(String),

    /// The buffer is not text.
    #[error("component source is not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidUtf8 {
        /// Length of the valid prefix.
        valid_up_to: usize,
    },

    /// The markup could not be tokenized.
    #[error(transparent)]
    Parse(#[from] ParseError),
}
