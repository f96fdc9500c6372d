//! Symbol table implementation
//!
//! Classes live in an arena and are indexed by their fully-qualified path
//! (`outer::inner::Name`). There are no scope chains: the resolver builds
//! candidate keys itself and asks for exact matches.

use crate::ast::QualifiedName;
use crate::common::{NodeId, Span};
use id_arena::{Arena, Id};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

pub type ClassId = Id<ClassSymbol>;

/// Whether a class has a body in this file or is only asserted to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Declared,
    ForwardOnly,
}

/// Symbol information
#[derive(Debug, Clone)]
pub struct ClassSymbol {
    /// Fully-qualified path
    pub path: QualifiedName,
    pub kind: DeclKind,
    /// Defining AST node (the class, or the stub while no class was seen)
    pub node_id: NodeId,
    /// Span in source
    pub span: Span,
}

impl ClassSymbol {
    pub fn is_forward_only(&self) -> bool {
        self.kind == DeclKind::ForwardOnly
    }
}

/// Result of resolving one class reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedClass {
    pub class: ClassId,
    /// Path the generator should use
    pub path: QualifiedName,
    /// Backed only by a forward declaration; not verified
    pub external: bool,
}

/// Symbol table keyed by fully-qualified path
#[derive(Debug, Default)]
pub struct SymbolTable {
    classes: Arena<ClassSymbol>,
    by_path: IndexMap<String, ClassId>,
    /// Forward-only stubs declared outside any namespace, by bare name
    root_stubs: FxHashMap<String, ClassId>,
    /// Reference node -> resolved class
    node_to_ref: FxHashMap<NodeId, ResolvedClass>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a class or stub. A stub and a definition with the same path
    /// merge into the definition; two definitions conflict and the existing
    /// entry is returned as the error.
    pub fn declare(
        &mut self,
        path: QualifiedName,
        kind: DeclKind,
        node_id: NodeId,
        span: Span,
    ) -> Result<ClassId, ClassId> {
        let key = path.to_string();
        if let Some(&existing) = self.by_path.get(&key) {
            let symbol = &mut self.classes[existing];
            return match (symbol.kind, kind) {
                (DeclKind::Declared, DeclKind::Declared) => Err(existing),
                (DeclKind::ForwardOnly, DeclKind::Declared) => {
                    if symbol.path.namespaces.is_empty() {
                        self.root_stubs.remove(&symbol.path.name);
                    }
                    symbol.kind = DeclKind::Declared;
                    symbol.node_id = node_id;
                    symbol.span = span;
                    Ok(existing)
                }
                (_, DeclKind::ForwardOnly) => Ok(existing),
            };
        }

        let root_stub = (kind == DeclKind::ForwardOnly && path.namespaces.is_empty())
            .then(|| path.name.clone());
        let id = self.classes.alloc(ClassSymbol {
            path,
            kind,
            node_id,
            span,
        });
        self.by_path.insert(key, id);
        if let Some(name) = root_stub {
            self.root_stubs.insert(name, id);
        }
        Ok(id)
    }

    /// Exact lookup by fully-qualified path
    pub fn lookup(&self, path: &str) -> Option<ClassId> {
        self.by_path.get(path).copied()
    }

    /// A forward-only stub declared outside any namespace with bare name `name`
    pub fn root_stub(&self, name: &str) -> Option<ClassId> {
        self.root_stubs.get(name).copied()
    }

    /// Get symbol by id
    pub fn get(&self, id: ClassId) -> &ClassSymbol {
        &self.classes[id]
    }

    /// Record a reference from NodeId to its class
    pub fn record_ref(&mut self, node_id: NodeId, resolved: ResolvedClass) {
        self.node_to_ref.insert(node_id, resolved);
    }

    /// Resolution of a reference node
    pub fn ref_for_node(&self, node_id: NodeId) -> Option<&ResolvedClass> {
        self.node_to_ref.get(&node_id)
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    pub fn reference_count(&self) -> usize {
        self.node_to_ref.len()
    }
}
