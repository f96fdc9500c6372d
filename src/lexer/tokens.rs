//! Token definitions for the interface-file lexer

use crate::common::Span;
use logos::Logos;
use serde::{Deserialize, Serialize};

/// A token with its kind, span, and text
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

impl Token {
    pub fn line(&self) -> usize {
        self.span.line
    }
}

/// Token kinds recognized by the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Logos, Serialize, Deserialize)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
pub enum TokenKind {
    // Keywords
    #[token("namespace")]
    Namespace,
    #[token("class")]
    Class,
    #[token("static")]
    Static,
    #[token("const")]
    Const,

    /// `}///\namespace` end marker, possibly with blanks after the brace.
    /// Produced by the `}` callback, never matched on its own.
    NamespaceEnd,

    /// `#include <path>` override line
    #[regex(r"#[ \t]*include[ \t]*<[^>\n]*>")]
    Include,

    /// Block comments are lexed so an unterminated one can be reported;
    /// the token stream drops them.
    #[token("/*", block_comment)]
    BlockComment,

    // Literals
    #[regex(r"[0-9][0-9_]*", priority = 2)]
    IntLit,
    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*([eE][+-]?[0-9]+)?")]
    FloatLit,
    #[token("\"", string_literal)]
    StringLit,

    // Identifiers (priority 1 so keywords take precedence)
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", priority = 1)]
    Ident,

    // Delimiters
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}", close_brace)]
    RBrace,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,

    // Punctuation
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token("::")]
    ColonColon,
    #[token("&")]
    Amp,
    #[token("*")]
    Star,
    #[token("=")]
    Eq,

    /// Any other single character; the parser decides whether it is legal
    #[regex(r".", priority = 0)]
    Unknown,

    // Special
    Eof,
}

const NAMESPACE_MARKER: &str = "///\\namespace";

/// A `}` followed on the same line by the marker closes a namespace;
/// anything else leaves a plain brace.
fn close_brace(lex: &mut logos::Lexer<TokenKind>) -> TokenKind {
    let rest = lex.remainder();
    let marker = rest.trim_start_matches([' ', '\t']);
    if marker.starts_with(NAMESPACE_MARKER) {
        lex.bump(rest.len() - marker.len() + NAMESPACE_MARKER.len());
        TokenKind::NamespaceEnd
    } else {
        TokenKind::RBrace
    }
}

fn block_comment(lex: &mut logos::Lexer<TokenKind>) -> bool {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => false,
    }
}

fn string_literal(lex: &mut logos::Lexer<TokenKind>) -> bool {
    let rest = lex.remainder();
    let mut escaped = false;
    for (i, c) in rest.char_indices() {
        match c {
            '\n' => return false,
            '\\' if !escaped => escaped = true,
            '"' if !escaped => {
                lex.bump(i + 1);
                return true;
            }
            _ => escaped = false,
        }
    }
    false
}

impl TokenKind {
    /// Tokens the parser never sees
    pub fn is_trivia(&self) -> bool {
        matches!(self, TokenKind::BlockComment)
    }

    /// Get the string representation of the token
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Namespace => "namespace",
            TokenKind::Class => "class",
            TokenKind::Static => "static",
            TokenKind::Const => "const",
            TokenKind::NamespaceEnd => "}///\\namespace",
            TokenKind::Include => "#include",
            TokenKind::BlockComment => "<comment>",
            TokenKind::IntLit => "<int>",
            TokenKind::FloatLit => "<float>",
            TokenKind::StringLit => "<string>",
            TokenKind::Ident => "<ident>",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::Comma => ",",
            TokenKind::Semi => ";",
            TokenKind::ColonColon => "::",
            TokenKind::Amp => "&",
            TokenKind::Star => "*",
            TokenKind::Eq => "=",
            TokenKind::Unknown => "<unknown>",
            TokenKind::Eof => "<eof>",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
