//! Front-end for the wrap interface language
//!
//! An interface file declares, namespace by namespace, the classes,
//! constructors and methods a binding generator should expose. This crate
//! turns that text into a validated [`Module`] tree in which every name is
//! fully qualified and every parameter and return type carries a wrapping
//! strategy.
//!
//! # Architecture
//!
//! ```text
//! Source → Lexer → Parser → AST → Collect → Resolve → Classify → Module
//! ```
//!
//! # Example
//!
//! ```
//! let module = wrapidl::parse_and_resolve(
//!     "namespace gtsam { class Point2 { Point2(); double x(); }; }///\\namespace gtsam",
//! )
//! .unwrap();
//! let point = wrapidl::lookup(&module, "gtsam::Point2").unwrap();
//! assert_eq!(point.methods().count(), 1);
//! ```

pub mod ast;
pub mod check;
pub mod common;
pub mod config;
pub mod deps;
pub mod diagnostics;
pub mod hir;
pub mod lexer;
pub mod parser;
pub mod pipeline;
pub mod resolve;

// Re-export diagnostics for convenience
pub use diagnostics::{CompileError, DiagnosticRecord, Diagnostics, ErrorKind, SourceFile};

// Re-exports for convenience
pub use ast::Ast;
pub use config::WrapConfig;
pub use deps::DependencyGraph;
pub use hir::{Class, Module};
pub use pipeline::{Pipeline, Stage};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse, resolve and classify an interface file with default settings
pub fn parse_and_resolve(text: &str) -> Result<Module, Diagnostics> {
    parse_and_resolve_with("<input>", text, &WrapConfig::default())
}

/// Parse, resolve and classify a named interface file
pub fn parse_and_resolve_with(
    name: &str,
    text: &str,
    config: &WrapConfig,
) -> Result<Module, Diagnostics> {
    Pipeline::new(SourceFile::new(name, text), config).run()
}

/// Look up a class or forward declaration by fully-qualified name
pub fn lookup<'m>(module: &'m Module, qualified_name: &str) -> Option<&'m Class> {
    module.lookup(qualified_name)
}

/// Lex and parse only, without resolution
pub fn parse(text: &str) -> Result<Ast, Diagnostics> {
    let config = WrapConfig::default();
    Pipeline::new(SourceFile::anonymous(text), &config).parse()
}
