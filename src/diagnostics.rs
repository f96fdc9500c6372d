//! Diagnostic reporting with source locations
//!
//! Every stage reports through [`CompileError`]; the pipeline hands the
//! collected errors back as a single [`Diagnostics`] value.

use crate::common::Span;
use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Source file for error reporting
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub content: Arc<str>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: Arc::from(content.into()),
        }
    }

    /// Unnamed input, as used by [`crate::parse_and_resolve`]
    pub fn anonymous(content: impl Into<String>) -> Self {
        Self::new("<input>", content)
    }

    pub fn to_named_source(&self) -> NamedSource<String> {
        NamedSource::new(self.name.clone(), self.content.to_string())
    }
}

/// Convert our Span to miette's SourceSpan
impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        SourceSpan::new(span.start.into(), span.len())
    }
}

/// Coarse classification of a diagnostic, one per failing stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Lex,
    Parse,
    Resolution,
    UnresolvedType,
    InvalidWrapping,
    DuplicateMethod,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Lex => "LexError",
            ErrorKind::Parse => "ParseError",
            ErrorKind::Resolution => "ResolutionError",
            ErrorKind::UnresolvedType => "UnresolvedTypeError",
            ErrorKind::InvalidWrapping => "InvalidWrappingError",
            ErrorKind::DuplicateMethod => "DuplicateMethodError",
        };
        f.write_str(name)
    }
}

/// Compiler diagnostic
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CompileError {
    // === Lex Errors ===
    #[error("Unterminated block comment")]
    #[diagnostic(code(lex::unterminated_comment))]
    UnterminatedComment {
        line: usize,
        #[label("comment starts here and never ends")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Unterminated string literal")]
    #[diagnostic(code(lex::unterminated_string))]
    UnterminatedString {
        line: usize,
        #[label("string starts here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Unrecognized input `{text}`")]
    #[diagnostic(code(lex::invalid_input))]
    InvalidInput {
        text: String,
        line: usize,
        #[label("not part of the interface language")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    // === Parse Errors ===
    #[error("Unexpected token: expected {expected}, found {found}")]
    #[diagnostic(code(parse::unexpected_token))]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
        #[label("unexpected token here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Unexpected end of file: expected {expected}")]
    #[diagnostic(code(parse::unexpected_eof))]
    UnexpectedEof {
        expected: String,
        line: usize,
        #[label("expected more tokens")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Namespace `{name}` must start with a lowercase letter")]
    #[diagnostic(code(parse::namespace_name))]
    InvalidNamespaceName {
        name: String,
        line: usize,
        #[label("namespace declared here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Class `{name}` must start with an uppercase letter")]
    #[diagnostic(code(parse::class_name))]
    InvalidClassName {
        name: String,
        line: usize,
        #[label("class declared here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Method `{class}::{name}` must start with a lowercase letter")]
    #[diagnostic(
        code(parse::method_name),
        help("mark it `static` if it is a static method")
    )]
    InvalidMethodName {
        class: String,
        name: String,
        line: usize,
        #[label("method declared here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Static method `{class}::{name}` must start with a letter")]
    #[diagnostic(code(parse::static_method_name))]
    InvalidStaticMethodName {
        class: String,
        name: String,
        line: usize,
        #[label("static method declared here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Static method `{class}::{name}` cannot be const")]
    #[diagnostic(code(parse::const_static))]
    ConstStaticMethod {
        class: String,
        name: String,
        line: usize,
        #[label("`const` on a static method")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("More than one declaration on line {line} in class `{class}`")]
    #[diagnostic(
        code(parse::one_declaration_per_line),
        help("put each constructor and method on its own line")
    )]
    MultipleDeclarationsPerLine {
        class: String,
        line: usize,
        #[label("second declaration on this line")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Namespace `{name}` is never closed")]
    #[diagnostic(
        code(parse::unclosed_namespace),
        help("close it with `}}///\\namespace {name}`")
    )]
    UnclosedNamespace {
        name: String,
        line: usize,
        #[label("opened here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Namespace end marker without an open namespace")]
    #[diagnostic(code(parse::unmatched_namespace_end))]
    UnmatchedNamespaceEnd {
        line: usize,
        #[label("nothing to close here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Forward declaration `{name}` cannot carry a namespace qualification")]
    #[diagnostic(
        code(parse::qualified_forward_declaration),
        help("forward declarations only work for classes that need no namespace")
    )]
    QualifiedForwardDeclaration {
        name: String,
        line: usize,
        #[label("qualified forward declaration")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Include override `{path}` must immediately precede a namespace or class definition")]
    #[diagnostic(code(parse::dangling_include))]
    DanglingInclude {
        path: String,
        line: usize,
        #[label("include override here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Default argument values are not supported (in `{signature}`)")]
    #[diagnostic(code(parse::default_argument))]
    DefaultArgument {
        signature: String,
        line: usize,
        #[label("default value here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    // === Resolution Errors ===
    #[error("Duplicate definition of class `{name}`")]
    #[diagnostic(code(resolve::duplicate_class))]
    DuplicateClass {
        name: String,
        line: usize,
        #[label("redefined here")]
        span: SourceSpan,
        #[label("first defined here")]
        first_span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Unresolved type `{name}` in `{signature}` (tried {attempted})")]
    #[diagnostic(
        code(resolve::unresolved_type),
        help("declare the class in this file, or add `class {bare};` if it is wrapped elsewhere")
    )]
    UnresolvedType {
        name: String,
        bare: String,
        signature: String,
        attempted: String,
        line: usize,
        #[label("type not found")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    // === Classification Errors ===
    #[error("Cannot wrap `{ty}` in `{signature}`: {reason}")]
    #[diagnostic(code(check::invalid_wrapping))]
    InvalidWrapping {
        ty: String,
        reason: String,
        signature: String,
        line: usize,
        #[label("{reason}")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Duplicate member `{name}` in class `{class}`")]
    #[diagnostic(
        code(check::duplicate_method),
        help("overloaded methods are not supported; give each method a distinct name")
    )]
    DuplicateMethod {
        class: String,
        name: String,
        line: usize,
        #[label("declared again here")]
        span: SourceSpan,
        #[label("first declared here")]
        first_span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Ambiguous constructor overload in class `{class}`: signature key `{key}` is already taken")]
    #[diagnostic(
        code(check::ambiguous_constructor),
        help("constructor overloads are told apart by arity and the first letter of each argument type")
    )]
    AmbiguousConstructor {
        class: String,
        key: String,
        line: usize,
        #[label("collides with an earlier constructor")]
        span: SourceSpan,
        #[label("earlier constructor")]
        first_span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },
}

impl CompileError {
    pub fn kind(&self) -> ErrorKind {
        use CompileError::*;
        match self {
            UnterminatedComment { .. } | UnterminatedString { .. } | InvalidInput { .. } => {
                ErrorKind::Lex
            }
            UnexpectedToken { .. }
            | UnexpectedEof { .. }
            | InvalidNamespaceName { .. }
            | InvalidClassName { .. }
            | InvalidMethodName { .. }
            | InvalidStaticMethodName { .. }
            | ConstStaticMethod { .. }
            | MultipleDeclarationsPerLine { .. }
            | UnclosedNamespace { .. }
            | UnmatchedNamespaceEnd { .. }
            | QualifiedForwardDeclaration { .. }
            | DanglingInclude { .. }
            | DefaultArgument { .. } => ErrorKind::Parse,
            DuplicateClass { .. } => ErrorKind::Resolution,
            UnresolvedType { .. } => ErrorKind::UnresolvedType,
            InvalidWrapping { .. } => ErrorKind::InvalidWrapping,
            DuplicateMethod { .. } | AmbiguousConstructor { .. } => ErrorKind::DuplicateMethod,
        }
    }

    /// 1-based source line of the offending construct
    pub fn line(&self) -> usize {
        use CompileError::*;
        match self {
            UnterminatedComment { line, .. }
            | UnterminatedString { line, .. }
            | InvalidInput { line, .. }
            | UnexpectedToken { line, .. }
            | UnexpectedEof { line, .. }
            | InvalidNamespaceName { line, .. }
            | InvalidClassName { line, .. }
            | InvalidMethodName { line, .. }
            | InvalidStaticMethodName { line, .. }
            | ConstStaticMethod { line, .. }
            | MultipleDeclarationsPerLine { line, .. }
            | UnclosedNamespace { line, .. }
            | UnmatchedNamespaceEnd { line, .. }
            | QualifiedForwardDeclaration { line, .. }
            | DanglingInclude { line, .. }
            | DefaultArgument { line, .. }
            | DuplicateClass { line, .. }
            | UnresolvedType { line, .. }
            | InvalidWrapping { line, .. }
            | DuplicateMethod { line, .. }
            | AmbiguousConstructor { line, .. } => *line,
        }
    }

    /// Path to the offending symbol, when the error is about one
    pub fn symbol(&self) -> Option<String> {
        use CompileError::*;
        match self {
            InvalidNamespaceName { name, .. }
            | InvalidClassName { name, .. }
            | UnclosedNamespace { name, .. }
            | QualifiedForwardDeclaration { name, .. }
            | DuplicateClass { name, .. }
            | UnresolvedType { name, .. } => Some(name.clone()),
            InvalidMethodName { class, name, .. }
            | InvalidStaticMethodName { class, name, .. }
            | ConstStaticMethod { class, name, .. }
            | DuplicateMethod { class, name, .. } => Some(format!("{class}::{name}")),
            MultipleDeclarationsPerLine { class, .. } | AmbiguousConstructor { class, .. } => {
                Some(class.clone())
            }
            DefaultArgument { signature, .. } | InvalidWrapping { signature, .. } => {
                Some(signature.clone())
            }
            DanglingInclude { path, .. } => Some(path.clone()),
            UnterminatedComment { .. }
            | UnterminatedString { .. }
            | InvalidInput { .. }
            | UnexpectedToken { .. }
            | UnexpectedEof { .. }
            | UnmatchedNamespaceEnd { .. } => None,
        }
    }

    pub fn to_record(&self) -> DiagnosticRecord {
        DiagnosticRecord {
            kind: self.kind(),
            message: self.to_string(),
            line: self.line(),
            symbol: self.symbol(),
        }
    }
}

/// Plain, serializable view of a diagnostic for host tools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    pub kind: ErrorKind,
    pub message: String,
    pub line: usize,
    pub symbol: Option<String>,
}

/// All diagnostics produced for one input file
#[derive(Error, Debug, Diagnostic, Clone)]
#[error("{} error(s) in {}", .errors.len(), .file)]
pub struct Diagnostics {
    pub file: String,
    #[related]
    errors: Vec<CompileError>,
}

impl Diagnostics {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            errors: Vec::new(),
        }
    }

    pub fn from_errors(file: impl Into<String>, errors: Vec<CompileError>) -> Self {
        Self {
            file: file.into(),
            errors,
        }
    }

    pub fn push(&mut self, error: CompileError) {
        self.errors.push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Get errors by reference
    pub fn errors(&self) -> &[CompileError] {
        &self.errors
    }

    /// Kind of the first reported error
    pub fn first_kind(&self) -> Option<ErrorKind> {
        self.errors.first().map(CompileError::kind)
    }

    pub fn records(&self) -> Vec<DiagnosticRecord> {
        self.errors.iter().map(CompileError::to_record).collect()
    }
}
