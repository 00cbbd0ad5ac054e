//! Lexer for the inside of an opening tag, using logos.
//!
//! The tokenizer finds where a tag ends; this lexer splits what lies between
//! the tag name and the closing `>` into attribute names, `=` and values.

use logos::Logos;
use source_map::Span;
use text_size::TextSize;

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The span of the token in the whole document.
    pub span: Span,
}

/// Token kinds inside an opening tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Logos, Default)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum TokenKind {
    /// `>`
    #[token(">")]
    RAngle,

    /// `/>`
    #[token("/>")]
    SlashRAngle,

    /// A `/` that does not end the tag
    #[token("/")]
    Slash,

    /// `=`
    #[token("=")]
    Eq,

    /// `<`, never valid inside a tag
    #[token("<")]
    LAngle,

    /// A `"`-quoted value, quotes included
    #[regex(r#""[^"]*""#)]
    DoubleQuoted,

    /// A `'`-quoted value, quotes included
    #[regex(r"'[^']*'")]
    SingleQuoted,

    /// An attribute name or unquoted value
    #[regex(r#"[^ \t\r\n\f"'<>/=]+"#)]
    Name,

    /// Invalid/unknown token
    #[default]
    Error,
}

impl TokenKind {
    /// Returns a human-readable name for this token kind.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::RAngle => "'>'",
            TokenKind::SlashRAngle => "'/>'",
            TokenKind::Slash => "'/'",
            TokenKind::Eq => "'='",
            TokenKind::LAngle => "'<'",
            TokenKind::DoubleQuoted | TokenKind::SingleQuoted => "quoted value",
            TokenKind::Name => "name",
            TokenKind::Error => "invalid token",
        }
    }
}

/// A lexer over one tag interior.
pub struct Lexer<'src> {
    inner: logos::Lexer<'src, TokenKind>,
    base: u32,
}

impl<'src> Lexer<'src> {
    /// Creates a lexer for `source`, which starts at byte `base` of the document.
    pub fn new(source: &'src str, base: u32) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            base,
        }
    }

    /// Returns the text of the current token.
    pub fn slice(&self) -> &'src str {
        self.inner.slice()
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let kind = match self.inner.next()? {
            Ok(kind) => kind,
            Err(()) => TokenKind::Error,
        };
        let span = self.inner.span();
        Some(Token {
            kind,
            span: Span::new(
                TextSize::from(self.base + span.start as u32),
                TextSize::from(self.base + span.end as u32),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(source: &str) -> Vec<TokenKind> {
        Lexer::new(source, 0).map(|t| t.kind).collect()
    }

    #[test]
    fn test_plain_attribute() {
        assert_eq!(
            tokenize(r#" lang="ts">"#),
            vec![
                TokenKind::Name,
                TokenKind::Eq,
                TokenKind::DoubleQuoted,
                TokenKind::RAngle
            ]
        );
    }

    #[test]
    fn test_boolean_and_single_quoted() {
        assert_eq!(
            tokenize(" scoped\n  src='./a.css' />"),
            vec![
                TokenKind::Name,
                TokenKind::Name,
                TokenKind::Eq,
                TokenKind::SingleQuoted,
                TokenKind::SlashRAngle
            ]
        );
    }

    #[test]
    fn test_quoted_value_may_hold_markup() {
        assert_eq!(
            tokenize(r#" title="a > b">"#),
            vec![
                TokenKind::Name,
                TokenKind::Eq,
                TokenKind::DoubleQuoted,
                TokenKind::RAngle
            ]
        );
    }

    #[test]
    fn test_unterminated_quote_is_error() {
        let tokens = tokenize(r#" title="a>"#);
        assert_eq!(&tokens[..2], &[TokenKind::Name, TokenKind::Eq]);
        assert_eq!(tokens[2], TokenKind::Error);
    }

    #[test]
    fn test_spans_are_document_relative() {
        let tokens: Vec<_> = Lexer::new(" id=x>", 10).collect();
        assert_eq!(tokens[0].span, Span::new(11u32, 13u32));
        assert_eq!(tokens[2].span, Span::new(14u32, 15u32));
    }
}
