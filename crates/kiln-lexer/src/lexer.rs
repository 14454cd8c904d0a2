// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The lexer implementation using logos.

use logos::Logos;
use kiln_ast::token::{Token, TokenKind};
use kiln_ast::Span;

/// Raw token type for logos - we parse literal values in a second pass.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum RawToken {
    // === Keywords ===
    #[token("break")]
    Break,
    #[token("const")]
    Const,
    #[token("else")]
    Else,
    #[token("false")]
    False,
    #[token("fn")]
    Fn,
    #[token("if")]
    If,
    #[token("impl")]
    Impl,
    #[token("let")]
    Let,
    #[token("return")]
    Return,
    #[token("static")]
    Static,
    #[token("true")]
    True,
    #[token("while")]
    While,

    // === Operators (order matters - longer first) ===
    #[token("**")]
    StarStar,
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("<<")]
    LtLt,
    #[token(">>")]
    GtGt,
    #[token("->")]
    Arrow,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("!")]
    Bang,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,

    // === Delimiters ===
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,

    // === Comments (skip them) ===
    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    // === Literals ===
    #[regex(r"[0-9]+")]
    Int,

    // Character literal; escapes are validated in the conversion pass
    #[regex(r"'([^'\\\n]|\\.)'")]
    Char,

    // String literal; escapes are validated in the conversion pass
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    Str,

    // === Identifier (must come after keywords) ===
    #[regex(r"[a-zA-Z][a-zA-Z0-9_]*")]
    Ident,
}

/// The lexer for Kiln source code.
pub struct Lexer<'a> {
    source: &'a str,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self { source }
    }

    /// Tokenize the entire source.
    ///
    /// The returned stream always ends with a single `Eof` token. The first
    /// lexical error aborts tokenization.
    pub fn tokenize(&self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        let mut logos_lexer = RawToken::lexer(self.source);

        while let Some(result) = logos_lexer.next() {
            let span = logos_lexer.span();
            let slice = logos_lexer.slice();

            let kind = match result {
                Ok(raw) => self.convert_token(raw, slice, span.start, span.end)?,
                Err(()) => return Err(self.unexpected(span.start)),
            };

            tokens.push(Token {
                kind,
                span: Span::new(span.start, span.end),
            });
        }

        tokens.push(Token {
            kind: TokenKind::Eof,
            span: Span::new(self.source.len(), self.source.len()),
        });

        Ok(tokens)
    }

    /// Convert a raw logos token to our TokenKind, parsing literals.
    fn convert_token(
        &self,
        raw: RawToken,
        slice: &str,
        start: usize,
        end: usize,
    ) -> Result<TokenKind, LexError> {
        Ok(match raw {
            // Keywords
            RawToken::Break => TokenKind::Break,
            RawToken::Const => TokenKind::Const,
            RawToken::Else => TokenKind::Else,
            RawToken::False => TokenKind::Bool(false),
            RawToken::Fn => TokenKind::Fn,
            RawToken::If => TokenKind::If,
            RawToken::Impl => TokenKind::Impl,
            RawToken::Let => TokenKind::Let,
            RawToken::Return => TokenKind::Return,
            RawToken::Static => TokenKind::Static,
            RawToken::True => TokenKind::Bool(true),
            RawToken::While => TokenKind::While,

            // Operators
            RawToken::StarStar => TokenKind::StarStar,
            RawToken::EqEq => TokenKind::EqEq,
            RawToken::BangEq => TokenKind::BangEq,
            RawToken::LtEq => TokenKind::LtEq,
            RawToken::GtEq => TokenKind::GtEq,
            RawToken::AmpAmp => TokenKind::AmpAmp,
            RawToken::PipePipe => TokenKind::PipePipe,
            RawToken::LtLt => TokenKind::Shl,
            RawToken::GtGt => TokenKind::Shr,
            RawToken::Arrow => TokenKind::Arrow,
            RawToken::Plus => TokenKind::Plus,
            RawToken::Minus => TokenKind::Minus,
            RawToken::Star => TokenKind::Star,
            RawToken::Slash => TokenKind::Slash,
            RawToken::Percent => TokenKind::Percent,
            RawToken::Eq => TokenKind::Eq,
            RawToken::Lt => TokenKind::Lt,
            RawToken::Gt => TokenKind::Gt,
            RawToken::Bang => TokenKind::Bang,
            RawToken::Amp => TokenKind::Amp,
            RawToken::Pipe => TokenKind::Pipe,
            RawToken::Caret => TokenKind::Caret,

            // Delimiters
            RawToken::LBrace => TokenKind::LBrace,
            RawToken::RBrace => TokenKind::RBrace,
            RawToken::LParen => TokenKind::LParen,
            RawToken::RParen => TokenKind::RParen,
            RawToken::Colon => TokenKind::Colon,
            RawToken::Semi => TokenKind::Semi,
            RawToken::Comma => TokenKind::Comma,

            // Literals - parse the values
            RawToken::Int => {
                let value = slice
                    .parse::<i32>()
                    .map_err(|_| LexError::invalid_integer(slice, start, end))?;
                TokenKind::Int(value)
            }
            RawToken::Char => {
                let inner = &slice[1..slice.len() - 1];
                TokenKind::Char(parse_char(inner, start)?)
            }
            RawToken::Str => {
                let inner = &slice[1..slice.len() - 1];
                TokenKind::Str(parse_string(inner, start)?)
            }
            RawToken::Ident => TokenKind::Ident(slice.to_string()),

            RawToken::LineComment => unreachable!("comments are skipped"),
        })
    }

    /// Classify a stray character, with a better message for literals that
    /// never reached their closing quote.
    fn unexpected(&self, pos: usize) -> LexError {
        let ch = self.source[pos..].chars().next().unwrap_or('?');
        match ch {
            '"' => LexError::unterminated("string", pos, self.source.len()),
            '\'' => LexError::unterminated("character", pos, self.source.len()),
            _ => LexError::unexpected_char(ch, pos),
        }
    }
}

/// Parse the inside of a character literal.
fn parse_char(inner: &str, pos: usize) -> Result<char, LexError> {
    let mut chars = inner.chars();
    match chars.next() {
        Some('\\') => match chars.next() {
            Some('n') => Ok('\n'),
            Some('\'') => Ok('\''),
            Some(c) => Err(LexError::invalid_escape(c, pos)),
            None => Err(LexError::invalid_escape('\\', pos)),
        },
        Some(c) => Ok(c),
        None => Err(LexError::invalid_escape('\'', pos)),
    }
}

/// Parse the inside of a string literal, processing the fixed escape set.
fn parse_string(inner: &str, pos: usize) -> Result<String, LexError> {
    let mut result = String::new();
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('"') => result.push('"'),
                Some(other) => return Err(LexError::invalid_escape(other, pos)),
                None => return Err(LexError::invalid_escape('\\', pos)),
            }
        } else {
            result.push(c);
        }
    }

    Ok(result)
}

/// A lexer error with location and friendly message.
#[derive(Debug, Clone)]
pub struct LexError {
    pub span: Span,
    pub message: String,
    pub hint: Option<String>,
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for LexError {}

impl LexError {
    fn unexpected_char(ch: char, pos: usize) -> Self {
        Self {
            span: Span::new(pos, pos + ch.len_utf8()),
            message: format!("unexpected character `{}`", ch.escape_default()),
            hint: None,
        }
    }

    fn unterminated(what: &str, start: usize, end: usize) -> Self {
        Self {
            span: Span::new(start, end),
            message: format!("unterminated {} literal", what),
            hint: Some(format!(
                "add a closing {}",
                if what == "string" { "'\"'" } else { "\"'\"" }
            )),
        }
    }

    fn invalid_escape(ch: char, pos: usize) -> Self {
        Self {
            span: Span::new(pos, pos + 1),
            message: format!(
                "unsupported or invalid escape sequence: \\{}",
                ch.escape_default()
            ),
            hint: Some("supported escapes: \\n and quote escapes".to_string()),
        }
    }

    fn invalid_integer(literal: &str, start: usize, end: usize) -> Self {
        Self {
            span: Span::new(start, end),
            message: format!("invalid integer: `{}`", literal),
            hint: Some("integers must fit in 32 bits".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_ast::token::TokenKind::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .tokenize()
            .expect("lex failed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn empty_source_is_just_eof() {
        assert_eq!(kinds(""), vec![Eof]);
    }

    #[test]
    fn keywords_and_idents() {
        assert_eq!(
            kinds("fn main while whale"),
            vec![
                Fn,
                Ident("main".into()),
                While,
                Ident("whale".into()),
                Eof
            ]
        );
    }

    #[test]
    fn multi_char_operators_win_over_single() {
        assert_eq!(
            kinds("** == != <= >= && || << >> ->"),
            vec![StarStar, EqEq, BangEq, LtEq, GtEq, AmpAmp, PipePipe, Shl, Shr, Arrow, Eof]
        );
        // Longest-match fallback to the single-char form
        assert_eq!(kinds("* = ! < > & |"), vec![Star, Eq, Bang, Lt, Gt, Amp, Pipe, Eof]);
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(kinds("1 // the rest\n2"), vec![Int(1), Int(2), Eof]);
    }

    #[test]
    fn literals() {
        assert_eq!(
            kinds("42 'x' '\\n' \"hi\\n\" true false"),
            vec![
                Int(42),
                Char('x'),
                Char('\n'),
                Str("hi\n".into()),
                Bool(true),
                Bool(false),
                Eof
            ]
        );
    }

    #[test]
    fn spans_are_byte_offsets() {
        let tokens = Lexer::new("ab + 1").tokenize().unwrap();
        assert_eq!(tokens[0].span, Span::new(0, 2));
        assert_eq!(tokens[1].span, Span::new(3, 4));
        assert_eq!(tokens[2].span, Span::new(5, 6));
        assert_eq!(tokens[3].span, Span::new(6, 6));
    }

    #[test]
    fn integer_overflow_is_fatal() {
        let err = Lexer::new("2147483648").tokenize().unwrap_err();
        assert!(err.message.contains("invalid integer"));
        // i32::MIN is only reachable through unary minus, so the bare literal
        // is rejected too.
        assert!(Lexer::new("2147483647").tokenize().is_ok());
    }

    #[test]
    fn bad_escape_is_fatal() {
        let err = Lexer::new(r#""a\qb""#).tokenize().unwrap_err();
        assert!(err.message.contains("escape"));
        let err = Lexer::new(r"'\t'").tokenize().unwrap_err();
        assert!(err.message.contains("escape"));
    }

    #[test]
    fn unterminated_string() {
        let err = Lexer::new("\"abc").tokenize().unwrap_err();
        assert!(err.message.contains("unterminated string"));
    }

    #[test]
    fn unexpected_character() {
        let err = Lexer::new("let @ = 1;").tokenize().unwrap_err();
        assert!(err.message.contains("unexpected character"));
        assert_eq!(err.span.start, 4);
    }
}
