//! Byte ranges in a component file.

use serde::Serialize;
use std::fmt;
use std::ops::Range;
use text_size::TextSize;

/// A byte offset into a source string.
pub type ByteOffset = TextSize;

/// A half-open byte range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    /// First byte.
    pub start: ByteOffset,
    /// One past the last byte.
    pub end: ByteOffset,
}

impl Span {
    /// Creates a span. `start` must not be after `end`.
    #[inline]
    pub fn new(start: impl Into<ByteOffset>, end: impl Into<ByteOffset>) -> Self {
        let (start, end) = (start.into(), end.into());
        debug_assert!(start <= end, "span starts after it ends");
        Self { start, end }
    }

    /// A zero-width span, e.g. the content of a self-closing element.
    #[inline]
    pub fn empty(at: impl Into<ByteOffset>) -> Self {
        let at = at.into();
        Self { start: at, end: at }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// The span as a `usize` range for slicing.
    #[inline]
    pub fn range(self) -> Range<usize> {
        u32::from(self.start) as usize..u32::from(self.end) as usize
    }

    /// Returns the covered text, or `None` if the span is out of bounds or
    /// splits a character.
    #[inline]
    pub fn get(self, source: &str) -> Option<&str> {
        source.get(self.range())
    }

    /// Returns the covered text.
    ///
    /// # Panics
    ///
    /// If the span does not lie on character boundaries of `source`.
    #[inline]
    pub fn slice(self, source: &str) -> &str {
        &source[self.range()]
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", u32::from(self.start), u32::from(self.end))
    }
}
