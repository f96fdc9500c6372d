//! Module tree handed to binding generators
//!
//! The HIR is the validated form of one interface file: every name is fully
//! qualified and every parameter and return type carries the wrapping
//! strategy a generator should use. It is built once by [`crate::check`] and
//! never mutated afterwards.

mod print;

use serde::{Deserialize, Serialize};

/// A whole parsed, resolved and classified file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub namespaces: Vec<Namespace>,
    /// Classes and surviving forward declarations outside any namespace
    pub classes: Vec<Class>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    /// `None` for an anonymous namespace
    pub name: Option<String>,
    /// Named enclosing namespaces from the root, this one included
    pub path: Vec<String>,
    /// Include override placed before the namespace
    pub include: Option<String>,
    pub namespaces: Vec<Namespace>,
    pub classes: Vec<Class>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub name: String,
    pub namespaces: Vec<String>,
    /// Include override placed before the class
    pub include: Option<String>,
    /// Header the generated wrapper includes
    pub header: String,
    /// A `class X;` stub with no definition in this file
    pub forward_only: bool,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Member {
    Constructor(Constructor),
    Method(Method),
    StaticMethod(StaticMethod),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constructor {
    pub args: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub args: Vec<Argument>,
    pub returns: TypeRef,
    pub is_const: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticMethod {
    pub name: String,
    pub args: Vec<Argument>,
    pub returns: TypeRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    pub ty: TypeRef,
}

// ==================== TYPES ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    String,
    Bool,
    SizeT,
    Int,
    Double,
    Char,
    Void,
}

impl Primitive {
    pub fn as_str(&self) -> &'static str {
        match self {
            Primitive::String => "string",
            Primitive::Bool => "bool",
            Primitive::SizeT => "size_t",
            Primitive::Int => "int",
            Primitive::Double => "double",
            Primitive::Char => "char",
            Primitive::Void => "void",
        }
    }
}

/// What a type reference denotes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    Primitive(Primitive),
    EigenMatrix,
    EigenVector,
    ClassValue,
    ClassConstRef,
    SharedPointer,
    /// `X*`, only produced for classes
    RawPointer,
}

impl TypeKind {
    pub fn is_class(&self) -> bool {
        matches!(
            self,
            TypeKind::ClassValue
                | TypeKind::ClassConstRef
                | TypeKind::SharedPointer
                | TypeKind::RawPointer
        )
    }
}

/// How the generator moves a value across the binding boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Wrapping {
    ByValueCopy,
    ByConstReference,
    /// Shared ownership through a smart pointer
    ByOwnedPointer,
    ByRawValue,
    ByMatrix,
    ByVector,
}

/// Where a class reference was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassOrigin {
    /// Defined in this file
    Declared,
    /// Only forward-declared; external, unverified
    External,
}

/// A classified parameter or return type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    pub kind: TypeKind,
    pub wrapping: Wrapping,
    /// Fully-qualified namespace path for classes, empty otherwise
    pub namespaces: Vec<String>,
    pub name: String,
    /// Set for class references only
    pub origin: Option<ClassOrigin>,
    /// Raw-pointer return: a heap allocation the caller now owns
    pub transfers_ownership: bool,
}

impl TypeRef {
    /// `ns::Name` for classes, the bare name otherwise
    pub fn qualified_name(&self) -> String {
        qualify(&self.namespaces, &self.name)
    }
}

fn qualify(namespaces: &[String], name: &str) -> String {
    let mut out = String::new();
    for ns in namespaces {
        out.push_str(ns);
        out.push_str("::");
    }
    out.push_str(name);
    out
}

// ==================== QUERIES ====================

impl Class {
    pub fn qualified_name(&self) -> String {
        qualify(&self.namespaces, &self.name)
    }

    pub fn constructors(&self) -> impl Iterator<Item = &Constructor> {
        self.members.iter().filter_map(|m| match m {
            Member::Constructor(c) => Some(c),
            _ => None,
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.members.iter().filter_map(|m| match m {
            Member::Method(m) => Some(m),
            _ => None,
        })
    }

    pub fn static_methods(&self) -> impl Iterator<Item = &StaticMethod> {
        self.members.iter().filter_map(|m| match m {
            Member::StaticMethod(m) => Some(m),
            _ => None,
        })
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods().find(|m| m.name == name)
    }

    pub fn static_method(&self, name: &str) -> Option<&StaticMethod> {
        self.static_methods().find(|m| m.name == name)
    }

    /// Every type this class mentions, arguments and returns alike
    pub fn type_refs(&self) -> impl Iterator<Item = &TypeRef> {
        self.members.iter().flat_map(|member| {
            let (args, returns) = match member {
                Member::Constructor(c) => (&c.args, None),
                Member::Method(m) => (&m.args, Some(&m.returns)),
                Member::StaticMethod(m) => (&m.args, Some(&m.returns)),
            };
            returns.into_iter().chain(args.iter().map(|a| &a.ty))
        })
    }
}

impl Namespace {
    fn collect_classes<'a>(&'a self, out: &mut Vec<&'a Class>) {
        out.extend(self.classes.iter());
        for ns in &self.namespaces {
            ns.collect_classes(out);
        }
    }

    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.iter().find(|ns| ns.name.as_deref() == Some(name))
    }

    pub fn class(&self, name: &str) -> Option<&Class> {
        self.classes.iter().find(|c| c.name == name)
    }
}

impl Module {
    /// All classes and stubs, depth first in source order of each level
    pub fn classes(&self) -> Vec<&Class> {
        let mut out: Vec<&Class> = self.classes.iter().collect();
        for ns in &self.namespaces {
            ns.collect_classes(&mut out);
        }
        out
    }

    /// Stubs that no definition in this file replaced
    pub fn forward_declarations(&self) -> Vec<&Class> {
        self.classes().into_iter().filter(|c| c.forward_only).collect()
    }

    /// Top-level namespace by name
    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.iter().find(|ns| ns.name.as_deref() == Some(name))
    }

    /// Find a class or stub by fully-qualified name, e.g. `gtsam::Pose2`
    pub fn lookup(&self, qualified_name: &str) -> Option<&Class> {
        self.classes()
            .into_iter()
            .find(|c| c.qualified_name() == qualified_name)
    }
}
