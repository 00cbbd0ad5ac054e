//! Section extraction.
//!
//! Every requested tag name moves through `closed -> open(1) -> open(n) ->
//! ... -> open(1) -> closed`. Same-named tags inside an open section only
//! change the depth; the section is emitted when the depth returns to zero,
//! so sections come out in the document order of their end tags.

use crate::error::{ExtractError, ParseError, ParseErrorKind};
use crate::tokenizer::{Handler, StartTag, Tokenizer};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use source_map::{ByteOffset, LineIndex, Span};
use std::collections::hash_map::Entry;

/// One extracted top-level region of a component file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Section {
    /// Lower-cased tag name.
    pub tag: SmolStr,
    /// Raw text between the opening and closing tag.
    pub text: String,
    /// Attributes of the opening tag; the first of duplicated names wins.
    pub attributes: IndexMap<SmolStr, String>,
    /// `0` for sections with a `src` attribute, otherwise the 1-based line on
    /// which `text` begins.
    pub offset: u32,
    /// Where `text` lives in the component.
    pub content_span: Span,
}

impl Section {
    /// Returns the value of an attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Returns the `lang` attribute, if present and non-empty.
    pub fn lang(&self) -> Option<&str> {
        self.attribute("lang").filter(|lang| !lang.is_empty())
    }

    /// Returns the `src` attribute.
    pub fn src(&self) -> Option<&str> {
        self.attribute("src")
    }

    /// Returns true if the content lives in another file.
    pub fn is_external(&self) -> bool {
        self.attributes.contains_key("src")
    }
}

/// Extracts every section whose tag is in `tags` from `source`.
///
/// # Errors
///
/// Fails before tokenizing when `tags` is empty or names something that can
/// never be a tag, and afterwards on malformed markup or a requested element
/// that is never closed. No partial results are returned.
pub fn extract<S: AsRef<str>>(source: &str, tags: &[S]) -> Result<Vec<Section>, ExtractError> {
    let tags = validate_tags(tags)?;

    let mut tokenizer = Tokenizer::new(SectionCollector::new(source, tags));
    tokenizer.write(source)?;
    let collector = tokenizer.end()?;
    Ok(collector.finish()?)
}

/// Like [`extract`], for a buffer that has not been checked to be text.
pub fn extract_bytes<S: AsRef<str>>(
    source: &[u8],
    tags: &[S],
) -> Result<Vec<Section>, ExtractError> {
    validate_tags(tags)?;
    let source = std::str::from_utf8(source).map_err(|err| ExtractError::InvalidUtf8 {
        valid_up_to: err.valid_up_to(),
    })?;
    extract(source, tags)
}

fn validate_tags<S: AsRef<str>>(tags: &[S]) -> Result<Vec<SmolStr>, ExtractError> {
    if tags.is_empty() {
        return Err(ExtractError::EmptyTagList);
    }

    tags.iter()
        .map(|tag| {
            let tag = tag.as_ref();
            let valid = tag.starts_with(|c: char| c.is_ascii_alphabetic())
                && !tag.contains(|c: char| {
                    c.is_ascii_whitespace() || matches!(c, '<' | '>' | '/' | '"' | '\'' | '=')
                });
            if valid {
                Ok(SmolStr::new(tag.to_ascii_lowercase()))
            } else {
                Err(ExtractError::InvalidTagName(tag.to_string()))
            }
        })
        .collect()
}

#[derive(Debug)]
struct OpenSection {
    depth: u32,
    attributes: IndexMap<SmolStr, String>,
    content_start: ByteOffset,
    open_span: Span,
}

/// Tracks requested tags while the tokenizer runs.
struct SectionCollector<'a> {
    source: &'a str,
    line_index: LineIndex,
    tags: Vec<SmolStr>,
    open: FxHashMap<SmolStr, OpenSection>,
    sections: Vec<Section>,
}

impl<'a> SectionCollector<'a> {
    fn new(source: &'a str, tags: Vec<SmolStr>) -> Self {
        Self {
            source,
            line_index: LineIndex::new(source),
            tags,
            open: FxHashMap::default(),
            sections: Vec::new(),
        }
    }

    fn complete(&mut self, tag: SmolStr, attributes: IndexMap<SmolStr, String>, content: Span) {
        let offset = if attributes.contains_key("src") {
            0
        } else {
            self.line_index.line_of(content.start) + 1
        };
        let text = content.get(self.source).unwrap_or_default().to_string();

        tracing::debug!(%tag, offset, bytes = text.len(), "extracted section");
        self.sections.push(Section {
            tag,
            text,
            attributes,
            offset,
            content_span: content,
        });
    }

    fn finish(self) -> Result<Vec<Section>, ParseError> {
        let unclosed = self
            .open
            .iter()
            .min_by_key(|(_, section)| section.open_span.start);

        match unclosed {
            Some((tag, section)) => Err(ParseError::new(
                ParseErrorKind::UnclosedTag {
                    tag_name: tag.to_string(),
                },
                section.open_span,
            )),
            None => Ok(self.sections),
        }
    }
}

impl Handler for SectionCollector<'_> {
    fn open_tag(&mut self, tag: &StartTag) {
        if !self.tags.contains(&tag.name) {
            return;
        }

        if let Some(open) = self.open.get_mut(&tag.name) {
            if !tag.self_closing {
                open.depth += 1;
            }
            return;
        }

        let mut attributes = IndexMap::with_capacity(tag.attributes.len());
        for attribute in &tag.attributes {
            attributes
                .entry(attribute.name.clone())
                .or_insert_with(|| attribute.value.clone());
        }

        if tag.self_closing {
            self.complete(tag.name.clone(), attributes, Span::empty(tag.span.end));
            return;
        }

        self.open.insert(
            tag.name.clone(),
            OpenSection {
                depth: 1,
                attributes,
                content_start: tag.span.end,
                open_span: tag.span,
            },
        );
    }

    fn close_tag(&mut self, name: &str, span: Span) {
        let Entry::Occupied(mut entry) = self.open.entry(SmolStr::new(name)) else {
            return;
        };

        entry.get_mut().depth -= 1;
        if entry.get().depth > 0 {
            return;
        }

        let (tag, open) = entry.remove_entry();
        self.complete(tag, open.attributes, Span::new(open.content_start, span.start));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_script_on_second_line() {
        let sections = extract("<script>\nmodule.exports = {}\n</script>", &["script"]).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].tag, "script");
        assert_eq!(sections[0].text, "\nmodule.exports = {}\n");
        assert_eq!(sections[0].offset, 1);
        assert_eq!(sections[0].content_span, Span::new(8u32, 29u32));
    }

    #[test]
    fn test_external_section() {
        let sections = extract(r#"<script src="./a.js"></script>"#, &["script"]).unwrap();
        assert_eq!(sections[0].src(), Some("./a.js"));
        assert!(sections[0].is_external());
        assert_eq!(sections[0].offset, 0);
        assert_eq!(sections[0].text, "");
    }

    #[test]
    fn test_external_section_on_later_line_keeps_zero_offset() {
        let source = "<template>\n<p/>\n</template>\n<script src=\"./a.js\">\n</script>";
        let sections = extract(source, &["script"]).unwrap();
        assert_eq!(sections[0].offset, 0);
        assert_eq!(sections[0].text, "\n");
    }

    #[test]
    fn test_self_closing_external_section() {
        let sections = extract("<div/>\n<script src='x.js' />", &["script"]).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].text, "");
        assert_eq!(sections[0].offset, 0);
    }

    #[test]
    fn test_nested_template_is_literal_content() {
        let sections = extract("<template><template>{{x}}</template></template>", &["template"])
            .unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].text, "<template>{{x}}</template>");
    }

    #[test]
    fn test_deep_nesting_is_depth_balanced() {
        for depth in 1..5 {
            let inner = format!(
                "{}x{}",
                "<template>".repeat(depth),
                "</template>".repeat(depth)
            );
            let source = format!("<template>{inner}</template>");
            let sections = extract(&source, &["template"]).unwrap();
            assert_eq!(sections.len(), 1, "depth {depth}");
            assert_eq!(sections[0].text, inner);
        }
    }

    #[test]
    fn test_offset_counts_lines_before_content() {
        let source = "<template>\n  <p/>\n</template>\n\n<script>\nexport default {}\n</script>";
        let sections = extract(source, &["template", "script"]).unwrap();
        assert_eq!(sections[0].tag, "template");
        assert_eq!(sections[0].offset, 1);
        assert_eq!(sections[1].tag, "script");
        assert_eq!(sections[1].offset, 5);
    }

    #[test]
    fn test_crlf_offsets_match_lf() {
        let lf = "<template>\n<p/>\n</template>\n<script>\nx\n</script>";
        let crlf = lf.replace('\n', "\r\n");
        let a = extract(lf, &["script"]).unwrap();
        let b = extract(&crlf, &["script"]).unwrap();
        assert_eq!(a[0].offset, 4);
        assert_eq!(a[0].offset, b[0].offset);
    }

    #[test]
    fn test_sections_in_end_tag_order() {
        let source = "<template><div><script>a</script></div></template>";
        let sections = extract(source, &["template", "script"]).unwrap();
        let tags: Vec<_> = sections.iter().map(|s| s.tag.as_str()).collect();
        assert_eq!(tags, ["script", "template"]);
    }

    #[test]
    fn test_repeated_sections() {
        let source = "<style>a{}</style>\n<style scoped>b{}</style>";
        let sections = extract(source, &["style"]).unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].attribute("scoped"), Some(""));
        assert_eq!(sections[1].offset, 2);
    }

    #[test]
    fn test_untracked_tags_are_ignored() {
        let source = "<template><style>x</style></template><style>y</style>";
        let sections = extract(source, &["template"]).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].text, "<style>x</style>");
    }

    #[test]
    fn test_tags_match_case_insensitively() {
        let sections = extract("<SCRIPT Lang=\"TS\">x</Script>", &["Script"]).unwrap();
        assert_eq!(sections[0].tag, "script");
        assert_eq!(sections[0].lang(), Some("TS"));
    }

    #[test]
    fn test_first_duplicate_attribute_wins() {
        let sections = extract(r#"<script lang="ts" lang="js"></script>"#, &["script"]).unwrap();
        assert_eq!(sections[0].lang(), Some("ts"));
        assert_eq!(sections[0].attributes.len(), 1);
    }

    #[test]
    fn test_attribute_values_are_decoded() {
        let source = r#"<style title="&copy; 2024 &amp; co" data-x=&hellip;></style>"#;
        let sections = extract(source, &["style"]).unwrap();
        assert_eq!(sections[0].attribute("title"), Some("\u{a9} 2024 & co"));
        assert_eq!(sections[0].attribute("data-x"), Some("\u{2026}"));
    }

    #[test]
    fn test_stray_end_tag_is_ignored() {
        let sections = extract("</script><script>x</script>", &["script"]).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].text, "x");
    }

    #[test]
    fn test_extraction_is_repeatable() {
        let source = "<template>\n<template>a</template>\n</template>\n<script lang=\"js\">\nb\n</script>";
        let first = extract(source, &["template", "script"]).unwrap();
        let second = extract(source, &["template", "script"]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unclosed_section_is_an_error() {
        let err = extract("<template><p>x</p>", &["template"]).unwrap_err();
        assert_eq!(
            err,
            ExtractError::Parse(ParseError::new(
                ParseErrorKind::UnclosedTag {
                    tag_name: "template".to_string()
                },
                Span::new(0u32, 10u32),
            ))
        );
    }

    #[test]
    fn test_unclosed_raw_section_message() {
        let err = extract("<script>\nlet a", &["script"]).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"unclosed tag: <script>");
    }

    #[test]
    fn test_tag_list_is_validated_first() {
        let empty: [&str; 0] = [];
        assert_eq!(
            extract("<<<", &empty).unwrap_err(),
            ExtractError::EmptyTagList
        );
        assert_eq!(
            extract("<script></script>", &["scr ipt"]).unwrap_err(),
            ExtractError::InvalidTagName("scr ipt".to_string())
        );
        assert_eq!(
            extract_bytes(b"\xff", &empty).unwrap_err(),
            ExtractError::EmptyTagList
        );
    }

    #[test]
    fn test_bytes_must_be_text() {
        assert_eq!(
            extract_bytes(b"<script>\xff</script>", &["script"]).unwrap_err(),
            ExtractError::InvalidUtf8 { valid_up_to: 8 }
        );
        let sections = extract_bytes(b"<script>x</script>", &["script"]).unwrap();
        assert_eq!(sections[0].text, "x");
    }
}
