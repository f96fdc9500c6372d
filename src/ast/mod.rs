//! Abstract Syntax Tree for interface files
//!
//! This module defines the untyped tree produced by the parser. Names are
//! kept exactly as written; resolution and classification happen later.

use crate::common::{NodeId, Span};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level AST
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ast {
    pub items: Vec<Item>,
}

/// Declaration allowed at file or namespace level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Item {
    Namespace(NamespaceDef),
    Class(ClassDef),
    ForwardDecl(ForwardDecl),
}

/// `#include <path>` placed right before a namespace or class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Include {
    /// Path between the angle brackets
    pub path: String,
    pub span: Span,
}

impl Include {
    /// Parse the text of an include token, e.g. `#include <gtsam/Pose2.h>`
    pub fn from_directive(text: &str, span: Span) -> Self {
        let path = text
            .split_once('<')
            .and_then(|(_, rest)| rest.strip_suffix('>'))
            .unwrap_or_default()
            .trim()
            .to_string();
        Self { path, span }
    }
}

// ==================== NAMESPACES ====================

/// `namespace name { ... }///\namespace [name]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceDef {
    pub id: NodeId,
    /// `None` for an anonymous namespace
    pub name: Option<String>,
    pub include: Option<Include>,
    pub items: Vec<Item>,
    /// Name written after the end marker, if any
    pub close_name: Option<String>,
    pub span: Span,
}

// ==================== CLASSES ====================

/// `class Name { members };`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDef {
    pub id: NodeId,
    pub name: String,
    pub include: Option<Include>,
    pub members: Vec<Member>,
    pub span: Span,
}

/// `class Name;`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardDecl {
    pub id: NodeId,
    pub name: String,
    pub span: Span,
}

/// Class member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Member {
    Constructor(ConstructorDecl),
    Method(MethodDecl),
}

impl Member {
    pub fn span(&self) -> Span {
        match self {
            Member::Constructor(c) => c.span,
            Member::Method(m) => m.span,
        }
    }

    pub fn params(&self) -> &[Param] {
        match self {
            Member::Constructor(c) => &c.params,
            Member::Method(m) => &m.params,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructorDecl {
    pub id: NodeId,
    pub params: Vec<Param>,
    pub span: Span,
}

/// Regular or static method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDecl {
    pub id: NodeId,
    pub name: String,
    pub is_static: bool,
    pub is_const: bool,
    pub params: Vec<Param>,
    pub return_type: TypeExpr,
    pub span: Span,
}

/// Function parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub id: NodeId,
    pub name: String,
    pub ty: TypeExpr,
}

// ==================== TYPES ====================

/// Possibly qualified name, e.g. `gtsam::Point2`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifiedName {
    pub namespaces: Vec<String>,
    pub name: String,
}

impl QualifiedName {
    pub fn new(namespaces: Vec<String>, name: impl Into<String>) -> Self {
        Self {
            namespaces,
            name: name.into(),
        }
    }

    pub fn bare(name: impl Into<String>) -> Self {
        Self::new(Vec::new(), name)
    }

    pub fn is_qualified(&self) -> bool {
        !self.namespaces.is_empty()
    }

    /// Segments from the root, name last
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.namespaces
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.name.as_str()))
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ns in &self.namespaces {
            write!(f, "{ns}::")?;
        }
        f.write_str(&self.name)
    }
}

/// Names the grammar knows without a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Builtin {
    String,
    Bool,
    SizeT,
    Int,
    Double,
    Char,
    Void,
    Matrix,
    Vector,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Builtin> {
        let builtin = match name {
            "string" => Builtin::String,
            "bool" => Builtin::Bool,
            "size_t" => Builtin::SizeT,
            "int" => Builtin::Int,
            "double" => Builtin::Double,
            "char" => Builtin::Char,
            "void" => Builtin::Void,
            "Matrix" => Builtin::Matrix,
            "Vector" => Builtin::Vector,
            _ => return None,
        };
        Some(builtin)
    }

    pub fn is_eigen(&self) -> bool {
        matches!(self, Builtin::Matrix | Builtin::Vector)
    }
}

/// How a type is passed: plain, `&` or `*`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Indirection {
    Value,
    Reference,
    Pointer,
}

/// Type as written in a signature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeExpr {
    pub id: NodeId,
    pub is_const: bool,
    pub name: QualifiedName,
    /// Shared-pointer wrapper around `name`, e.g. `boost::shared_ptr`
    pub wrapper: Option<QualifiedName>,
    pub indirection: Indirection,
    pub span: Span,
}

impl TypeExpr {
    /// Builtin meaning of the name; qualified names are never builtins
    pub fn builtin(&self) -> Option<Builtin> {
        if self.name.is_qualified() {
            None
        } else {
            Builtin::from_name(&self.name.name)
        }
    }

    /// True when the name must be resolved to a class
    pub fn is_class_ref(&self) -> bool {
        self.builtin().is_none()
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_const {
            f.write_str("const ")?;
        }
        match &self.wrapper {
            Some(wrapper) => write!(f, "{wrapper}<{}>", self.name)?,
            None => write!(f, "{}", self.name)?,
        }
        match self.indirection {
            Indirection::Value => Ok(()),
            Indirection::Reference => f.write_str("&"),
            Indirection::Pointer => f.write_str("*"),
        }
    }
}

/// Human-readable signature used in diagnostics, e.g. `Foo::bar(const Baz& b)`
pub fn signature(class: &str, member: &Member) -> String {
    let (name, params) = match member {
        Member::Constructor(c) => (class, &c.params),
        Member::Method(m) => (m.name.as_str(), &m.params),
    };
    let params = params
        .iter()
        .map(|p| format!("{} {}", p.ty, p.name))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{class}::{name}({params})")
}
