//! Scope resolution: collect every class by fully-qualified path, then
//! resolve each class reference against that table

pub mod resolver;
pub mod symbols;

pub use resolver::{ResolvedAst, Resolver, resolve};
pub use symbols::{ClassId, ClassSymbol, DeclKind, ResolvedClass, SymbolTable};
