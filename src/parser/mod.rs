//! Parser for interface files
//!
//! A recursive descent parser that produces an [`Ast`] from a token stream.
//! Errors inside a class body or at item level are collected and parsing
//! resumes at the next member or item; running into end of file with an
//! open namespace or class stops the parse.

use crate::ast::*;
use crate::common::{IdGenerator, NodeId, Span};
use crate::config::ParserConfig;
use crate::diagnostics::{CompileError, SourceFile};
use crate::lexer::{Token, TokenKind};
use miette::NamedSource;

type PResult<T> = Result<T, CompileError>;

/// Parse a token stream into an AST
pub fn parse(tokens: &[Token], source: &SourceFile) -> Result<Ast, Vec<CompileError>> {
    parse_with(tokens, source, &ParserConfig::default())
}

/// Parse with explicit parser settings
pub fn parse_with(
    tokens: &[Token],
    source: &SourceFile,
    config: &ParserConfig,
) -> Result<Ast, Vec<CompileError>> {
    let mut parser = Parser::new(tokens, source, config);
    let ast = parser.parse_program();
    if parser.errors.is_empty() {
        Ok(ast)
    } else {
        Err(parser.errors)
    }
}

/// Parser state
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    id_gen: IdGenerator,
    source: &'a SourceFile,
    config: &'a ParserConfig,
    errors: Vec<CompileError>,
    eof: Token,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], source: &'a SourceFile, config: &'a ParserConfig) -> Self {
        let end = source.content.len();
        let eof = Token {
            kind: TokenKind::Eof,
            span: Span::new(end, end, tokens.last().map_or(1, |t| t.span.line)),
            text: String::new(),
        };
        Self {
            tokens,
            pos: 0,
            id_gen: IdGenerator::new(),
            source,
            config,
            errors: Vec::new(),
            eof,
        }
    }

    fn next_id(&mut self) -> NodeId {
        self.id_gen.next()
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    fn peek(&self) -> TokenKind {
        self.current().kind
    }

    fn peek_n(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek() == kind
    }

    fn at_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.peek())
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> PResult<Token> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_ident(&mut self, expected: &str) -> PResult<Token> {
        self.expect(TokenKind::Ident, expected)
    }

    fn span(&self) -> Span {
        self.current().span
    }

    fn src(&self) -> NamedSource<String> {
        self.source.to_named_source()
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        let tok = self.current();
        if tok.kind == TokenKind::Eof {
            CompileError::UnexpectedEof {
                expected: expected.to_string(),
                line: tok.span.line,
                span: tok.span.into(),
                src: self.src(),
            }
        } else {
            CompileError::UnexpectedToken {
                expected: expected.to_string(),
                found: format!("`{}`", tok.text),
                line: tok.span.line,
                span: tok.span.into(),
                src: self.src(),
            }
        }
    }

    // ==================== PROGRAM ====================

    fn parse_program(&mut self) -> Ast {
        let mut items = Vec::new();
        if let Err(fatal) = self.parse_items(&mut items, false) {
            self.errors.push(fatal);
        }
        Ast { items }
    }

    /// Parse items until end of file or, inside a namespace, its closing marker.
    /// An `Err` is fatal and ends the whole parse.
    fn parse_items(&mut self, items: &mut Vec<Item>, in_namespace: bool) -> PResult<()> {
        loop {
            match self.peek() {
                TokenKind::Eof => return Ok(()),
                TokenKind::NamespaceEnd | TokenKind::RBrace if in_namespace => return Ok(()),
                TokenKind::NamespaceEnd | TokenKind::RBrace => {
                    let tok = self.current();
                    return Err(CompileError::UnmatchedNamespaceEnd {
                        line: tok.span.line,
                        span: tok.span.into(),
                        src: self.src(),
                    });
                }
                _ => {}
            }

            match self.parse_item() {
                Ok(Some(item)) => items.push(item),
                Ok(None) => {}
                Err(e) if self.at(TokenKind::Eof) => return Err(e),
                Err(e) => {
                    self.errors.push(e);
                    self.recover_item();
                }
            }
        }
    }

    /// Skip to the next token that can start an item, stepping over balanced braces
    fn recover_item(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek() {
                TokenKind::Eof | TokenKind::NamespaceEnd => return,
                TokenKind::Namespace | TokenKind::Class | TokenKind::Include if depth == 0 => {
                    return;
                }
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace if depth == 0 => return,
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        if self.at(TokenKind::Semi) {
                            self.advance();
                        }
                        continue;
                    }
                }
                _ => {}
            }
            self.advance();
        }
    }

    // ==================== ITEMS ====================

    fn parse_item(&mut self) -> PResult<Option<Item>> {
        let include = if self.at(TokenKind::Include) {
            let tok = self.advance();
            Some(Include::from_directive(&tok.text, tok.span))
        } else {
            None
        };

        match self.peek() {
            TokenKind::Namespace => self.parse_namespace(include).map(Some),
            TokenKind::Class => self.parse_class(include),
            _ => match include {
                Some(include) => {
                    self.dangling_include(include);
                    Ok(None)
                }
                None => Err(self.unexpected("`namespace`, `class` or `#include`")),
            },
        }
    }

    fn dangling_include(&mut self, include: Include) {
        self.errors.push(CompileError::DanglingInclude {
            path: include.path,
            line: include.span.line,
            span: include.span.into(),
            src: self.src(),
        });
    }

    // ==================== NAMESPACES ====================

    fn parse_namespace(&mut self, include: Option<Include>) -> PResult<Item> {
        let start = self.expect(TokenKind::Namespace, "`namespace`")?.span;

        let name = if self.at(TokenKind::Ident) {
            let tok = self.advance();
            if !starts_lowercase(&tok.text) {
                self.errors.push(CompileError::InvalidNamespaceName {
                    name: tok.text.clone(),
                    line: tok.span.line,
                    span: tok.span.into(),
                    src: self.src(),
                });
            }
            Some(tok.text)
        } else {
            None
        };

        self.expect(TokenKind::LBrace, "`{` to open namespace")?;

        let mut items = Vec::new();
        self.parse_items(&mut items, true)?;

        if self.at(TokenKind::Eof) {
            return Err(CompileError::UnclosedNamespace {
                name: name.clone().unwrap_or_else(|| "<anonymous>".to_string()),
                line: start.line,
                span: start.into(),
                src: self.src(),
            });
        }

        let end = self.advance();
        let close_name = if end.kind == TokenKind::NamespaceEnd
            && self.at(TokenKind::Ident)
            && self.current().span.line == end.span.line
        {
            Some(self.advance().text)
        } else {
            None
        };

        if let (Some(open), Some(close)) = (&name, &close_name) {
            if open != close {
                tracing::warn!(
                    line = end.span.line,
                    "namespace `{}` closed with marker naming `{}`",
                    open,
                    close
                );
            }
        }

        Ok(Item::Namespace(NamespaceDef {
            id: self.next_id(),
            name,
            include,
            items,
            close_name,
            span: start.merge(end.span),
        }))
    }

    // ==================== CLASSES ====================

    fn parse_class(&mut self, include: Option<Include>) -> PResult<Option<Item>> {
        let start = self.expect(TokenKind::Class, "`class`")?.span;
        let name_tok = self.expect_ident("class name")?;

        if self.at(TokenKind::ColonColon) {
            let mut path = vec![name_tok.text];
            while self.at(TokenKind::ColonColon) {
                self.advance();
                path.push(self.expect_ident("class name")?.text);
            }
            let span = start.merge(self.span());
            self.expect(TokenKind::Semi, "`;` after forward declaration")?;
            self.errors.push(CompileError::QualifiedForwardDeclaration {
                name: path.join("::"),
                line: start.line,
                span: span.into(),
                src: self.src(),
            });
            return Ok(None);
        }

        self.check_class_name(&name_tok);

        if self.at(TokenKind::Semi) {
            let semi = self.advance();
            if let Some(include) = include {
                self.dangling_include(include);
            }
            return Ok(Some(Item::ForwardDecl(ForwardDecl {
                id: self.next_id(),
                name: name_tok.text,
                span: start.merge(semi.span),
            })));
        }

        let open = self.expect(TokenKind::LBrace, "`{` or `;` after class name")?;
        let class_name = name_tok.text;

        let mut members: Vec<(Member, usize)> = Vec::new();
        while !self.at(TokenKind::RBrace) {
            if self.at_any(&[TokenKind::Eof, TokenKind::NamespaceEnd]) {
                return Err(self.unexpected(&format!("`}}` to close class `{class_name}`")));
            }
            match self.parse_member(&class_name) {
                Ok(member) => members.push(member),
                Err(e) => {
                    self.errors.push(e);
                    self.recover_member();
                }
            }
        }

        let close = self.advance();
        if self.at(TokenKind::Semi) {
            self.advance();
        } else {
            self.errors
                .push(self.unexpected(&format!("`;` after body of class `{class_name}`")));
        }

        if self.config.one_declaration_per_line && open.span.line != close.span.line {
            self.check_one_per_line(&class_name, &members);
        }

        Ok(Some(Item::Class(ClassDef {
            id: self.next_id(),
            name: class_name,
            include,
            members: members.into_iter().map(|(m, _)| m).collect(),
            span: start.merge(close.span),
        })))
    }

    fn check_class_name(&mut self, tok: &Token) {
        if !starts_uppercase(&tok.text) {
            self.errors.push(CompileError::InvalidClassName {
                name: tok.text.clone(),
                line: tok.span.line,
                span: tok.span.into(),
                src: self.src(),
            });
        }
    }

    /// Members paired with the line of their terminating `;`
    fn check_one_per_line(&mut self, class: &str, members: &[(Member, usize)]) {
        for pair in members.windows(2) {
            let (_, prev_end) = &pair[0];
            let (member, _) = &pair[1];
            let span = member.span();
            if span.line == *prev_end {
                self.errors.push(CompileError::MultipleDeclarationsPerLine {
                    class: class.to_string(),
                    line: span.line,
                    span: span.into(),
                    src: self.src(),
                });
            }
        }
    }

    /// Skip past the next `;`, stopping early at the end of the class body
    fn recover_member(&mut self) {
        loop {
            match self.peek() {
                TokenKind::Eof | TokenKind::NamespaceEnd | TokenKind::RBrace => return,
                TokenKind::Semi => {
                    self.advance();
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ==================== MEMBERS ====================

    fn parse_member(&mut self, class: &str) -> PResult<(Member, usize)> {
        let start = self.span();

        let is_static = if self.at(TokenKind::Static) {
            self.advance();
            true
        } else {
            false
        };

        if !is_static
            && self.at(TokenKind::Ident)
            && self.current().text == class
            && self.peek_n(1) == TokenKind::LParen
        {
            self.advance();
            let params = self.parse_params(class, class)?;
            let semi = self.expect(TokenKind::Semi, "`;` after constructor")?;
            let member = Member::Constructor(ConstructorDecl {
                id: self.next_id(),
                params,
                span: start.merge(semi.span),
            });
            return Ok((member, semi.span.line));
        }

        let return_type = self.parse_type()?;
        let name_tok = self.expect_ident("method name")?;
        let name = name_tok.text.clone();

        if is_static && !starts_alphabetic(&name) {
            self.errors.push(CompileError::InvalidStaticMethodName {
                class: class.to_string(),
                name: name.clone(),
                line: name_tok.span.line,
                span: name_tok.span.into(),
                src: self.src(),
            });
        } else if !is_static && !starts_lowercase(&name) {
            self.errors.push(CompileError::InvalidMethodName {
                class: class.to_string(),
                name: name.clone(),
                line: name_tok.span.line,
                span: name_tok.span.into(),
                src: self.src(),
            });
        }

        let params = self.parse_params(class, &name)?;

        let is_const = if self.at(TokenKind::Const) {
            let tok = self.advance();
            if is_static {
                self.errors.push(CompileError::ConstStaticMethod {
                    class: class.to_string(),
                    name: name.clone(),
                    line: tok.span.line,
                    span: tok.span.into(),
                    src: self.src(),
                });
            }
            true
        } else {
            false
        };

        let semi = self.expect(TokenKind::Semi, "`;` after method declaration")?;

        let member = Member::Method(MethodDecl {
            id: self.next_id(),
            name,
            is_static,
            is_const,
            params,
            return_type,
            span: start.merge(semi.span),
        });
        Ok((member, semi.span.line))
    }

    fn parse_params(&mut self, class: &str, member: &str) -> PResult<Vec<Param>> {
        self.expect(TokenKind::LParen, "`(`")?;
        let mut params = Vec::new();

        while !self.at(TokenKind::RParen) {
            params.push(self.parse_param(class, member)?);
            if !self.at(TokenKind::RParen) {
                self.expect(TokenKind::Comma, "`,` or `)`")?;
            }
        }

        self.expect(TokenKind::RParen, "`)`")?;
        Ok(params)
    }

    fn parse_param(&mut self, class: &str, member: &str) -> PResult<Param> {
        let ty = self.parse_type()?;
        let name = self.expect_ident("parameter name")?.text;

        if self.at(TokenKind::Eq) {
            let tok = self.current();
            return Err(CompileError::DefaultArgument {
                signature: format!("{class}::{member}"),
                line: tok.span.line,
                span: tok.span.into(),
                src: self.src(),
            });
        }

        Ok(Param {
            id: self.next_id(),
            name,
            ty,
        })
    }

    // ==================== TYPES ====================

    fn parse_type(&mut self) -> PResult<TypeExpr> {
        let start = self.span();

        let is_const = if self.at(TokenKind::Const) {
            self.advance();
            true
        } else {
            false
        };

        let mut name = self.parse_qualified_name("type name")?;
        let mut wrapper = None;

        if self.at(TokenKind::Lt) {
            if name.name != "shared_ptr" {
                return Err(self.unexpected("type name (templates other than `shared_ptr` are not supported)"));
            }
            self.advance();
            let inner = self.parse_qualified_name("type inside `shared_ptr<>`")?;
            self.expect(TokenKind::Gt, "`>` closing `shared_ptr<`")?;
            wrapper = Some(name);
            name = inner;
        }

        let indirection = match self.peek() {
            TokenKind::Amp => {
                self.advance();
                Indirection::Reference
            }
            TokenKind::Star => {
                self.advance();
                Indirection::Pointer
            }
            _ => Indirection::Value,
        };

        let end = self.tokens.get(self.pos.saturating_sub(1)).map_or(start, |t| t.span);

        Ok(TypeExpr {
            id: self.next_id(),
            is_const,
            name,
            wrapper,
            indirection,
            span: start.merge(end),
        })
    }

    fn parse_qualified_name(&mut self, expected: &str) -> PResult<QualifiedName> {
        let mut segments = vec![self.expect_ident(expected)?.text];
        while self.at(TokenKind::ColonColon) {
            self.advance();
            segments.push(self.expect_ident(expected)?.text);
        }
        let name = segments.pop().unwrap_or_default();
        Ok(QualifiedName::new(segments, name))
    }
}

fn starts_lowercase(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_lowercase())
}

fn starts_uppercase(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

fn starts_alphabetic(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}
