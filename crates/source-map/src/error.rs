//! Source map decoding errors.

use thiserror::Error;

/// An error raised while reading a serialized source map.
#[derive(Debug, Error)]
pub enum SourceMapError {
    /// The JSON document could not be parsed.
    #[error("invalid source map JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Only version 3 maps are understood.
    #[error("unsupported source map version {0}, expected 3")]
    UnsupportedVersion(u32),

    /// A character outside the base64 alphabet appeared in `mappings`.
    #[error("invalid base64 digit {0:?} in mappings")]
    InvalidBase64(char),

    /// A VLQ value ended with its continuation bit set.
    #[error("unterminated VLQ value in mappings")]
    UnterminatedVlq,

    /// A VLQ value does not fit in 64 bits.
    #[error("VLQ value overflows in mappings")]
    VlqOverflow,

    /// A segment had a field count other than 1, 4 or 5.
    #[error("mapping segment has {0} fields, expected 1, 4 or 5")]
    InvalidSegment(usize),

    /// A segment referenced a source or name that does not exist, or a negative position.
    #[error("mapping segment is out of range: {0}")]
    OutOfRange(&'static str),
}
