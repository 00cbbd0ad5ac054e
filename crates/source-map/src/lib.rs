//! Source position tracking and mapping for sfc-loader.
//!
//! This crate provides the line index used to turn byte offsets in a component
//! file into line numbers, and the version 3 source map table that lets stack
//! traces and debuggers resolve compiled section code back to the component.

mod builder;
mod error;
mod line_index;
mod span;
pub mod vlq;

pub use builder::{Mapping, MappingEntry, SourceMap, SourceMapBuilder};
pub use error::SourceMapError;
pub use line_index::{LineCol, LineIndex, LineIndexError};
pub use span::{ByteOffset, Span};
