//! Section extraction for single-file components.
//!
//! This crate provides:
//! - A tag-interior lexer using `logos`
//! - A push-style markup tokenizer that accepts input in chunks
//! - Extraction of top-level `<template>`, `<script>`, `<style>` (or any
//!   other requested) sections with their attributes and line offsets
//!
//! # Example
//!
//! ```
//! use sfc_parser::extract;
//!
//! let source = "<template>\n  <p>{{ msg }}</p>\n</template>\n<script>\nexport default {}\n</script>";
//!
//! let sections = extract(source, &["template", "script"]).unwrap();
//! assert_eq!(sections.len(), 2);
//! assert_eq!(sections[1].tag, "script");
//! assert_eq!(sections[1].offset, 4);
//! ```

mod entities;
mod error;
mod extract;
mod lexer;
mod tokenizer;

pub use entities::decode_entities;
pub use error::{ExtractError, ParseError, ParseErrorKind};
pub use extract::{extract, extract_bytes, Section};
pub use lexer::{Lexer, Token, TokenKind};
pub use source_map::Span;
pub use tokenizer::{Attribute, Handler, StartTag, Tokenizer};

/// The sections a component loader asks for.
pub const COMPONENT_TAGS: [&str; 3] = ["template", "script", "style"];
