//! Line index for offset ↔ line/column conversion.
//!
//! `\n`, `\r\n` and a lone `\r` all count as one line break. A break belongs to
//! the line it terminates, so the offset of a `\n` reports the line before it,
//! while the offset right after the break reports the next line.

use crate::ByteOffset;
use text_size::TextSize;
use thiserror::Error;

/// A line and column position (0-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LineCol {
    /// 0-indexed line number.
    pub line: u32,
    /// 0-indexed column (byte offset within the line).
    pub col: u32,
}

impl LineCol {
    /// Creates a new line/column position.
    #[inline]
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

/// Rejected input to [`LineIndex::checked_line_of`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineIndexError {
    /// The offset was negative.
    #[error("byte offset must be non-negative, got {0}")]
    Negative(i64),
    /// The offset points past the end of the indexed text.
    #[error("byte offset {offset} is past the end of the text ({len} bytes)")]
    OutOfBounds {
        /// The offending offset.
        offset: i64,
        /// Length of the indexed text.
        len: u32,
    },
}

/// An index for efficient conversion between byte offsets and line/column positions.
///
/// The index stores the byte offset of the start of each line, enabling O(log n)
/// lookups in both directions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// Byte offset of the start of each line.
    /// `line_starts[i]` is the offset where line `i` begins.
    line_starts: Vec<ByteOffset>,
    /// Total length of the indexed text.
    len: TextSize,
}

impl LineIndex {
    /// Creates a new line index from source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];
        let bytes = text.as_bytes();

        for (offset, &b) in bytes.iter().enumerate() {
            let is_break = match b {
                b'\n' => true,
                // `\r\n` is one break, counted at the `\n`
                b'\r' => bytes.get(offset + 1) != Some(&b'\n'),
                _ => false,
            };
            if is_break {
                // Next line starts after the break
                line_starts.push(TextSize::from((offset + 1) as u32));
            }
        }

        Self {
            line_starts,
            len: TextSize::of(text),
        }
    }

    /// Returns the number of lines in the source.
    #[inline]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Returns the number of line breaks in the source.
    #[inline]
    pub fn break_count(&self) -> usize {
        self.line_starts.len() - 1
    }

    /// Returns the length of the indexed text.
    #[inline]
    pub fn len(&self) -> TextSize {
        self.len
    }

    /// Returns true if the indexed text was empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == TextSize::from(0)
    }

    /// Returns the 0-based line containing `offset`.
    ///
    /// Offsets past the end of the text report the last line.
    pub fn line_of(&self, offset: ByteOffset) -> u32 {
        // Number of line starts at or before `offset`, minus the one at 0
        let starts = self.line_starts.partition_point(|&start| start <= offset);
        (starts - 1) as u32
    }

    /// Like [`line_of`](Self::line_of), for offsets that come from untyped input.
    pub fn checked_line_of(&self, offset: i64) -> Result<u32, LineIndexError> {
        if offset < 0 {
            return Err(LineIndexError::Negative(offset));
        }
        let len = u32::from(self.len);
        if offset > i64::from(len) {
            return Err(LineIndexError::OutOfBounds { offset, len });
        }
        Ok(self.line_of(TextSize::from(offset as u32)))
    }

    /// Converts a byte offset to a line/column position.
    ///
    /// Returns `None` if the offset is out of bounds.
    pub fn line_col(&self, offset: ByteOffset) -> Option<LineCol> {
        if offset > self.len {
            return None;
        }

        let line = self.line_of(offset);
        let line_start = self.line_starts[line as usize];
        let col = u32::from(offset) - u32::from(line_start);

        Some(LineCol { line, col })
    }

    /// Converts a line/column position to a byte offset.
    ///
    /// Returns `None` if the line is out of bounds.
    pub fn offset(&self, line_col: LineCol) -> Option<ByteOffset> {
        let line_start = self.line_start(line_col.line)?;
        Some(line_start + TextSize::from(line_col.col))
    }

    /// Returns the byte offset where a line starts.
    pub fn line_start(&self, line: u32) -> Option<ByteOffset> {
        self.line_starts.get(line as usize).copied()
    }

    /// Returns the text of a line without its line break.
    pub fn line_text<'a>(&self, line: u32, text: &'a str) -> Option<&'a str> {
        let start = u32::from(self.line_start(line)?) as usize;
        let end = self
            .line_starts
            .get(line as usize + 1)
            .map(|&next| u32::from(next) as usize)
            .unwrap_or(text.len());

        Some(text[start..end].trim_end_matches(['\n', '\r']))
    }
}
