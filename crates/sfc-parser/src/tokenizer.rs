//! Push-style markup tokenizer.
//!
//! Callers feed text with [`Tokenizer::write`] and finish with
//! [`Tokenizer::end`]; tag, text and comment events are delivered in document
//! order to a [`Handler`]. Constructs split across writes are held back until
//! they are complete, so events never depend on how the input was chunked
//! (text may arrive in several pieces).
//!
//! `<script>` and `<style>` hold raw text: nothing inside them is recognized
//! as markup until the matching end tag.

use crate::entities::decode_entities;
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::{Lexer, Token, TokenKind};
use smol_str::SmolStr;
use source_map::Span;
use text_size::TextSize;

/// Elements whose content is raw text.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// An attribute on an opening tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Lower-cased attribute name.
    pub name: SmolStr,
    /// Value with character references decoded; empty for boolean attributes.
    pub value: String,
    /// Span from the start of the name to the end of the value.
    pub span: Span,
}

/// An opening tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    /// Lower-cased tag name.
    pub name: SmolStr,
    /// Attributes in source order, duplicates included.
    pub attributes: Vec<Attribute>,
    /// Span from `<` to `>` inclusive.
    pub span: Span,
    /// Whether the tag ended with `/>`.
    pub self_closing: bool,
}

/// Receives tokenizer events.
pub trait Handler {
    /// Called for every opening tag.
    fn open_tag(&mut self, tag: &StartTag);

    /// Called for every closing tag with its lower-cased name.
    fn close_tag(&mut self, name: &str, span: Span);

    /// Called for character data between tags.
    fn text(&mut self, _span: Span) {}

    /// Called for comments, doctypes and processing instructions.
    fn comment(&mut self, _span: Span) {}
}

enum Step {
    Advanced,
    NeedMore,
}

enum RawClose {
    Found(usize),
    NeedMore,
    Missing,
}

/// A push-style markup tokenizer.
///
/// A tokenizer that returned an error must not be written to again.
pub struct Tokenizer<H> {
    source: String,
    pos: usize,
    raw_text: Option<SmolStr>,
    handler: H,
}

impl<H: Handler> Tokenizer<H> {
    /// Creates a tokenizer delivering events to `handler`.
    pub fn new(handler: H) -> Self {
        Self {
            source: String::new(),
            pos: 0,
            raw_text: None,
            handler,
        }
    }

    /// Returns everything written so far.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Feeds more input.
    pub fn write(&mut self, chunk: &str) -> Result<(), ParseError> {
        self.source.push_str(chunk);
        self.run(false)
    }

    /// Signals the end of input and returns the handler.
    ///
    /// Fails if the input stops inside a tag, comment or raw-text element.
    pub fn end(mut self) -> Result<H, ParseError> {
        self.run(true)?;
        Ok(self.handler)
    }

    fn run(&mut self, eof: bool) -> Result<(), ParseError> {
        loop {
            if let Some(name) = self.raw_text.clone() {
                match find_raw_close(&self.source[self.pos..], &name, eof) {
                    RawClose::Found(rel) => {
                        if rel > 0 {
                            self.handler.text(span(self.pos, self.pos + rel));
                        }
                        self.pos += rel;
                        self.raw_text = None;
                    }
                    RawClose::NeedMore => return Ok(()),
                    RawClose::Missing => {
                        return Err(ParseError::new(
                            ParseErrorKind::UnclosedTag {
                                tag_name: name.to_string(),
                            },
                            span(self.pos, self.source.len()),
                        ))
                    }
                }
            }

            let rest = &self.source[self.pos..];
            if rest.is_empty() {
                return Ok(());
            }

            match rest.find('<') {
                Some(0) => match self.markup(eof)? {
                    Step::Advanced => {}
                    Step::NeedMore => return Ok(()),
                },
                Some(rel) => {
                    self.handler.text(span(self.pos, self.pos + rel));
                    self.pos += rel;
                }
                None => {
                    let end = self.source.len();
                    self.handler.text(span(self.pos, end));
                    self.pos = end;
                    return Ok(());
                }
            }
        }
    }

    /// Handles the construct starting with the `<` at the current position.
    fn markup(&mut self, eof: bool) -> Result<Step, ParseError> {
        let start = self.pos;
        let Some(&next) = self.source.as_bytes().get(start + 1) else {
            if !eof {
                return Ok(Step::NeedMore);
            }
            self.handler.text(span(start, start + 1));
            self.pos += 1;
            return Ok(Step::Advanced);
        };

        match next {
            b'!' | b'?' => self.declaration(eof),
            b'/' => self.close_tag(eof),
            c if c.is_ascii_alphabetic() => self.open_tag(eof),
            // A `<` that starts nothing is text
            _ => {
                self.handler.text(span(start, start + 1));
                self.pos += 1;
                Ok(Step::Advanced)
            }
        }
    }

    fn declaration(&mut self, eof: bool) -> Result<Step, ParseError> {
        let start = self.pos;
        let rest = &self.source[start..];

        let (terminator, body) = if rest.starts_with("<!--") {
            ("-->", 4)
        } else if !eof && "<!--".starts_with(rest) {
            return Ok(Step::NeedMore);
        } else {
            (">", 2)
        };

        match rest[body..].find(terminator) {
            Some(rel) => {
                let end = start + body + rel + terminator.len();
                self.handler.comment(span(start, end));
                self.pos = end;
                Ok(Step::Advanced)
            }
            None => self.incomplete(eof, format!("`{terminator}` to close markup declaration")),
        }
    }

    fn close_tag(&mut self, eof: bool) -> Result<Step, ParseError> {
        let start = self.pos;
        let rest = &self.source[start..];
        let Some(gt) = rest.find('>') else {
            return self.incomplete(eof, "`>` to close end tag");
        };

        let end = start + gt + 1;
        let inner = &rest[2..gt];
        if !inner.starts_with(|c: char| c.is_ascii_alphabetic()) {
            // `</>` and `</ x>` are dropped like comments
            self.handler.comment(span(start, end));
            self.pos = end;
            return Ok(Step::Advanced);
        }

        let name_len = inner
            .find(|c: char| c.is_ascii_whitespace() || c == '/')
            .unwrap_or(inner.len());
        let name = inner[..name_len].to_ascii_lowercase();

        self.handler.close_tag(&name, span(start, end));
        self.pos = end;
        Ok(Step::Advanced)
    }

    fn open_tag(&mut self, eof: bool) -> Result<Step, ParseError> {
        let start = self.pos;
        let rest = &self.source[start..];
        let Some(name_len) = rest[1..].find(|c: char| c.is_ascii_whitespace() || c == '/' || c == '>')
        else {
            return self.incomplete(eof, "`>` to close start tag");
        };

        let name_end = 1 + name_len;
        let raw_name = &rest[1..name_end];
        if raw_name.contains(['<', '"', '\'', '=']) {
            return Err(ParseError::new(
                ParseErrorKind::InvalidTagName {
                    name: raw_name.to_string(),
                },
                span(start + 1, start + name_end),
            ));
        }

        let Some(gt) = find_tag_end(&rest[name_end..]) else {
            return self.incomplete(eof, format!("`>` to close <{raw_name}>"));
        };

        let tag_end = name_end + gt + 1;
        let (attributes, self_closing) =
            parse_attributes(&rest[name_end..tag_end], (start + name_end) as u32)?;
        let tag = StartTag {
            name: SmolStr::new(raw_name.to_ascii_lowercase()),
            attributes,
            span: span(start, start + tag_end),
            self_closing,
        };

        self.handler.open_tag(&tag);
        self.pos = start + tag_end;
        if !self_closing && RAW_TEXT_ELEMENTS.contains(&tag.name.as_str()) {
            self.raw_text = Some(tag.name);
        }
        Ok(Step::Advanced)
    }

    /// Waits for more input, or fails if there is none.
    fn incomplete(&self, eof: bool, expected: impl Into<String>) -> Result<Step, ParseError> {
        if !eof {
            return Ok(Step::NeedMore);
        }
        Err(ParseError::new(
            ParseErrorKind::UnexpectedEof {
                expected: expected.into(),
            },
            span(self.pos, self.source.len()),
        ))
    }
}

fn span(start: usize, end: usize) -> Span {
    Span::new(TextSize::from(start as u32), TextSize::from(end as u32))
}

/// Finds the `>` that ends a start tag, skipping quoted values.
fn find_tag_end(interior: &str) -> Option<usize> {
    let mut quote = None;
    for (i, b) in interior.bytes().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return Some(i),
            None => {}
        }
    }
    None
}

/// Finds the end tag closing a raw-text element.
fn find_raw_close(rest: &str, name: &str, eof: bool) -> RawClose {
    let bytes = rest.as_bytes();
    let mut from = 0;

    while let Some(rel) = rest[from..].find("</") {
        let at = from + rel;
        let name_end = at + 2 + name.len();
        if name_end > bytes.len() {
            // Possibly a prefix of the end tag
            break;
        }

        if bytes[at + 2..name_end].eq_ignore_ascii_case(name.as_bytes()) {
            match bytes.get(name_end) {
                Some(b) if b.is_ascii_whitespace() || *b == b'/' || *b == b'>' => {
                    return RawClose::Found(at)
                }
                Some(_) => {}
                // The end tag itself reports the missing `>`
                None if eof => return RawClose::Found(at),
                None => return RawClose::NeedMore,
            }
        }
        from = at + 2;
    }

    if eof {
        RawClose::Missing
    } else {
        RawClose::NeedMore
    }
}

/// Parses the attributes between a tag name and its closing `>`.
fn parse_attributes(interior: &str, base: u32) -> Result<(Vec<Attribute>, bool), ParseError> {
    let tokens: Vec<Token> = Lexer::new(interior, base).collect();
    let text = |from: TextSize, to: TextSize| {
        &interior[(u32::from(from) - base) as usize..(u32::from(to) - base) as usize]
    };

    let mut attributes = Vec::new();
    let mut self_closing = false;
    let mut i = 0;

    while let Some(token) = tokens.get(i) {
        i += 1;
        match token.kind {
            TokenKind::Name => {
                let name = text(token.span.start, token.span.end).to_ascii_lowercase();
                let mut end = token.span.end;
                let mut value = String::new();

                if tokens.get(i).map(|t| t.kind) == Some(TokenKind::Eq) {
                    let eq_span = tokens[i].span;
                    i += 1;
                    let value_token = tokens.get(i).ok_or_else(|| {
                        invalid_attribute(format!("missing value for `{name}`"), eq_span)
                    })?;
                    i += 1;

                    match value_token.kind {
                        TokenKind::DoubleQuoted | TokenKind::SingleQuoted => {
                            let quoted = text(value_token.span.start, value_token.span.end);
                            value = decode_entities(&quoted[1..quoted.len() - 1]).into_owned();
                            end = value_token.span.end;
                        }
                        TokenKind::Name | TokenKind::Slash => {
                            // Unquoted values run until whitespace
                            end = value_token.span.end;
                            while let Some(next) = tokens.get(i) {
                                let glued = matches!(
                                    next.kind,
                                    TokenKind::Name | TokenKind::Slash | TokenKind::Eq
                                );
                                if !glued || next.span.start != end {
                                    break;
                                }
                                end = next.span.end;
                                i += 1;
                            }
                            value = decode_entities(text(value_token.span.start, end)).into_owned();
                        }
                        other => {
                            return Err(invalid_attribute(
                                format!("expected a value for `{name}`, found {}", other.name()),
                                value_token.span,
                            ))
                        }
                    }
                }

                attributes.push(Attribute {
                    name: SmolStr::new(name),
                    value,
                    span: Span::new(token.span.start, end),
                });
            }
            TokenKind::Slash | TokenKind::RAngle => {}
            TokenKind::SlashRAngle => self_closing = true,
            other => {
                return Err(invalid_attribute(
                    format!("unexpected {} in tag", other.name()),
                    token.span,
                ))
            }
        }
    }

    Ok((attributes, self_closing))
}

fn invalid_attribute(message: String, span: Span) -> ParseError {
    ParseError::new(ParseErrorKind::InvalidAttribute { message }, span)
}
