//! Stage-by-stage driver for one input file
//!
//! `Start -> Lexing -> Parsing -> Collecting -> Resolving -> Classifying -> Done`.
//! Any stage may end the run in `Failed`; nothing is retried. Running the
//! pipeline again starts over from `Start`.

use crate::ast::Ast;
use crate::check;
use crate::config::WrapConfig;
use crate::diagnostics::{CompileError, Diagnostics, ErrorKind, SourceFile};
use crate::hir::Module;
use crate::lexer;
use crate::parser;
use crate::resolve::Resolver;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Start,
    Lexing,
    Parsing,
    Collecting,
    Resolving,
    Classifying,
    Done,
    Failed(ErrorKind),
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done | Stage::Failed(_))
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Failed(kind) => write!(f, "failed ({kind})"),
            other => write!(f, "{}", format!("{other:?}").to_lowercase()),
        }
    }
}

pub struct Pipeline<'a> {
    source: SourceFile,
    config: &'a WrapConfig,
    stage: Stage,
}

impl<'a> Pipeline<'a> {
    pub fn new(source: SourceFile, config: &'a WrapConfig) -> Self {
        Self {
            source,
            config,
            stage: Stage::Start,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    fn enter(&mut self, next: Stage) {
        tracing::debug!(file = %self.source.name, from = %self.stage, to = %next, "stage");
        self.stage = next;
    }

    fn fail(&mut self, errors: Vec<CompileError>) -> Diagnostics {
        let kind = errors.first().map_or(ErrorKind::Parse, CompileError::kind);
        self.enter(Stage::Failed(kind));
        Diagnostics::from_errors(self.source.name.clone(), errors)
    }

    /// Lex and parse only
    pub fn parse(&mut self) -> Result<Ast, Diagnostics> {
        self.stage = Stage::Start;

        self.enter(Stage::Lexing);
        let tokens = lexer::lex(&self.source).map_err(|e| self.fail(vec![e]))?;

        self.enter(Stage::Parsing);
        let ast = parser::parse_with(&tokens, &self.source, &self.config.parser)
            .map_err(|errors| self.fail(errors))?;
        tracing::debug!(items = ast.items.len(), "parsed");
        Ok(ast)
    }

    /// Run every stage and hand back the classified module tree
    pub fn run(&mut self) -> Result<Module, Diagnostics> {
        let ast = self.parse()?;

        self.enter(Stage::Collecting);
        let source = self.source.clone();
        let mut resolver = Resolver::new(&source);
        resolver.collect(&ast).map_err(|e| self.fail(vec![e]))?;

        self.enter(Stage::Resolving);
        resolver
            .resolve_references(&ast)
            .map_err(|e| self.fail(vec![e]))?;
        let resolved = resolver.finish(ast);

        self.enter(Stage::Classifying);
        let module = check::check(&resolved, &source, &self.config.check)
            .map_err(|e| self.fail(vec![e]))?;

        self.enter(Stage::Done);
        Ok(module)
    }
}
