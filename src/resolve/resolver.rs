//! Name resolution pass
//!
//! Two passes over the AST. Collection records every class and forward
//! declaration under its fully-qualified path; the reference pass then
//! resolves every class-typed parameter and return type. Because collection
//! finishes first, declaration order never matters.

use super::symbols::*;
use crate::ast::*;
use crate::common::{NodeId, Span};
use crate::diagnostics::{CompileError, SourceFile};

/// Resolved AST (AST + symbol table)
#[derive(Debug)]
pub struct ResolvedAst {
    pub ast: Ast,
    pub symbols: SymbolTable,
}

/// Resolve names in an AST. Stops at the first error.
pub fn resolve(ast: Ast, source: &SourceFile) -> Result<ResolvedAst, CompileError> {
    let mut resolver = Resolver::new(source);
    resolver.collect(&ast)?;
    resolver.resolve_references(&ast)?;
    Ok(resolver.finish(ast))
}

/// Name resolver
pub struct Resolver<'a> {
    symbols: SymbolTable,
    source: &'a SourceFile,
}

impl<'a> Resolver<'a> {
    pub fn new(source: &'a SourceFile) -> Self {
        Self {
            symbols: SymbolTable::new(),
            source,
        }
    }

    /// First pass: record every class and stub by fully-qualified path
    pub fn collect(&mut self, ast: &Ast) -> Result<(), CompileError> {
        self.collect_items(&ast.items, &mut Vec::new())?;
        tracing::debug!(classes = self.symbols.len(), "collected declarations");
        Ok(())
    }

    /// Second pass: resolve every class-typed parameter and return type
    pub fn resolve_references(&mut self, ast: &Ast) -> Result<(), CompileError> {
        self.resolve_items(&ast.items, &mut Vec::new())?;
        tracing::debug!(
            references = self.symbols.reference_count(),
            "resolved class references"
        );
        Ok(())
    }

    pub fn finish(self, ast: Ast) -> ResolvedAst {
        ResolvedAst {
            ast,
            symbols: self.symbols,
        }
    }

    // ==================== COLLECTION ====================

    fn collect_items(&mut self, items: &[Item], scope: &mut Vec<String>) -> Result<(), CompileError> {
        for item in items {
            match item {
                Item::Namespace(ns) => {
                    let pushed = enter(scope, ns);
                    self.collect_items(&ns.items, scope)?;
                    if pushed {
                        scope.pop();
                    }
                }
                Item::Class(class) => {
                    let path = QualifiedName::new(scope.clone(), class.name.clone());
                    self.declare(path, DeclKind::Declared, class.id, class.span)?;
                }
                Item::ForwardDecl(decl) => {
                    let path = QualifiedName::new(scope.clone(), decl.name.clone());
                    self.declare(path, DeclKind::ForwardOnly, decl.id, decl.span)?;
                }
            }
        }
        Ok(())
    }

    fn declare(
        &mut self,
        path: QualifiedName,
        kind: DeclKind,
        node_id: NodeId,
        span: Span,
    ) -> Result<(), CompileError> {
        let name = path.to_string();
        match self.symbols.declare(path, kind, node_id, span) {
            Ok(_) => Ok(()),
            Err(existing) => Err(CompileError::DuplicateClass {
                name,
                line: span.line,
                span: span.into(),
                first_span: self.symbols.get(existing).span.into(),
                src: self.source.to_named_source(),
            }),
        }
    }

    // ==================== REFERENCES ====================

    fn resolve_items(&mut self, items: &[Item], scope: &mut Vec<String>) -> Result<(), CompileError> {
        for item in items {
            match item {
                Item::Namespace(ns) => {
                    let pushed = enter(scope, ns);
                    self.resolve_items(&ns.items, scope)?;
                    if pushed {
                        scope.pop();
                    }
                }
                Item::Class(class) => self.resolve_class(class, scope)?,
                Item::ForwardDecl(_) => {}
            }
        }
        Ok(())
    }

    fn resolve_class(&mut self, class: &ClassDef, scope: &[String]) -> Result<(), CompileError> {
        for member in &class.members {
            if let Member::Method(method) = member {
                self.resolve_type(&method.return_type, class, member, scope)?;
            }
            for param in member.params() {
                self.resolve_type(&param.ty, class, member, scope)?;
            }
        }
        Ok(())
    }

    fn resolve_type(
        &mut self,
        ty: &TypeExpr,
        class: &ClassDef,
        member: &Member,
        scope: &[String],
    ) -> Result<(), CompileError> {
        if !ty.is_class_ref() {
            return Ok(());
        }

        let candidates = candidate_paths(&ty.name, scope);
        for candidate in &candidates {
            if let Some(id) = self.symbols.lookup(&candidate.to_string()) {
                let symbol = self.symbols.get(id);
                let resolved = ResolvedClass {
                    class: id,
                    path: symbol.path.clone(),
                    external: symbol.is_forward_only(),
                };
                tracing::trace!(reference = %ty.name, resolved = %resolved.path, "resolved");
                self.symbols.record_ref(ty.id, resolved);
                return Ok(());
            }
        }

        if let Some(id) = self.symbols.root_stub(&ty.name.name) {
            tracing::trace!(reference = %ty.name, "trusting forward declaration");
            self.symbols.record_ref(
                ty.id,
                ResolvedClass {
                    class: id,
                    path: ty.name.clone(),
                    external: true,
                },
            );
            return Ok(());
        }

        let attempted = candidates
            .iter()
            .map(|c| format!("`{c}`"))
            .collect::<Vec<_>>()
            .join(", ");
        Err(CompileError::UnresolvedType {
            name: ty.name.to_string(),
            bare: ty.name.name.clone(),
            signature: signature(&class.name, member),
            attempted,
            line: ty.span.line,
            span: ty.span.into(),
            src: self.source.to_named_source(),
        })
    }
}

/// Push a named namespace onto the scope; anonymous ones add no segment
fn enter(scope: &mut Vec<String>, ns: &NamespaceDef) -> bool {
    match &ns.name {
        Some(name) => {
            scope.push(name.clone());
            true
        }
        None => false,
    }
}

/// Keys to try for a reference: qualified names are taken as absolute,
/// bare names are tried in each enclosing namespace, innermost first
fn candidate_paths(name: &QualifiedName, scope: &[String]) -> Vec<QualifiedName> {
    if name.is_qualified() {
        return vec![name.clone()];
    }
    (0..=scope.len())
        .rev()
        .map(|depth| QualifiedName::new(scope[..depth].to_vec(), name.name.clone()))
        .collect()
}
