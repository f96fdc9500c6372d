//! Lexer for interface files
//!
//! [`TokenStream`] lazily turns source text into tokens with 1-based line
//! numbers. Comments are dropped; anything the grammar does not know becomes
//! a single-character [`TokenKind::Unknown`] token for the parser to reject.

mod tokens;

pub use tokens::{Token, TokenKind};

use crate::common::Span;
use crate::diagnostics::{CompileError, SourceFile};
use logos::{Logos, SpannedIter};

/// What went wrong while lexing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    UnterminatedComment,
    UnterminatedString,
    /// Input no token rule accepts
    InvalidInput,
}

/// Lexing failure before it is attached to a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

impl LexError {
    pub fn into_diagnostic(self, source: &SourceFile) -> CompileError {
        let src = source.to_named_source();
        let line = self.span.line;
        let span = self.span.into();
        match self.kind {
            LexErrorKind::UnterminatedComment => CompileError::UnterminatedComment { line, span, src },
            LexErrorKind::UnterminatedString => CompileError::UnterminatedString { line, span, src },
            LexErrorKind::InvalidInput => CompileError::InvalidInput {
                text: source
                    .content
                    .get(self.span.start..self.span.end)
                    .unwrap_or_default()
                    .to_string(),
                line,
                span,
                src,
            },
        }
    }
}

/// Lazy token iterator over one source text
pub struct TokenStream<'src> {
    source: &'src str,
    inner: SpannedIter<'src, TokenKind>,
    line: usize,
    scanned: usize,
    failed: bool,
}

impl<'src> TokenStream<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            inner: TokenKind::lexer(source).spanned(),
            line: 1,
            scanned: 0,
            failed: false,
        }
    }

    /// Advance the running line counter up to `offset`
    fn line_at(&mut self, offset: usize) -> usize {
        if offset > self.scanned {
            self.line += self.source[self.scanned..offset]
                .bytes()
                .filter(|b| *b == b'\n')
                .count();
            self.scanned = offset;
        }
        self.line
    }
}

impl Iterator for TokenStream<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let source = self.source;
        loop {
            let (result, range) = self.inner.next()?;
            let line = self.line_at(range.start);
            let span = Span::new(range.start, range.end, line);
            let text = &source[range];

            let kind = match result {
                Ok(kind) => kind,
                Err(()) => {
                    self.failed = true;
                    let kind = if text.starts_with('"') {
                        LexErrorKind::UnterminatedString
                    } else if text.starts_with("/*") {
                        LexErrorKind::UnterminatedComment
                    } else {
                        LexErrorKind::InvalidInput
                    };
                    return Some(Err(LexError { kind, span }));
                }
            };

            if kind.is_trivia() {
                continue;
            }

            return Some(Ok(Token {
                kind,
                span,
                text: text.to_string(),
            }));
        }
    }
}

/// Lex the whole source, appending a trailing [`TokenKind::Eof`]
pub fn lex(source: &SourceFile) -> Result<Vec<Token>, CompileError> {
    let text: &str = &source.content;
    let mut tokens = Vec::new();
    for token in TokenStream::new(text) {
        tokens.push(token.map_err(|e| e.into_diagnostic(source))?);
    }

    let line = 1 + text.bytes().filter(|b| *b == b'\n').count();
    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(text.len(), text.len(), line),
        text: String::new(),
    });

    tracing::debug!(count = tokens.len(), "lexed tokens");
    Ok(tokens)
}

/// Convenience wrapper for unnamed input
pub fn lex_str(source: &str) -> Result<Vec<Token>, CompileError> {
    lex(&SourceFile::anonymous(source))
}
