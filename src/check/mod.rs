//! Type classification
//!
//! Lowers a resolved AST into the module tree. Every parameter and return
//! type gets a [`TypeKind`] and a [`Wrapping`]; member-name clashes and
//! illegal type combinations are reported here. Checking stops at the first
//! error since nothing downstream can use a partially classified tree.

use crate::ast::{self, Builtin, ClassDef, Indirection, Item, NamespaceDef, TypeExpr, signature};
use crate::common::Span;
use crate::config::CheckConfig;
use crate::diagnostics::{CompileError, SourceFile};
use crate::hir::{
    Argument, Class, ClassOrigin, Constructor, Member, Method, Module, Namespace, Primitive,
    StaticMethod, TypeKind, TypeRef, Wrapping,
};
use crate::resolve::{ResolvedAst, SymbolTable};
use rustc_hash::{FxHashMap, FxHashSet};

/// Where a type appears in a signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Argument,
    Return,
}

/// Classify every signature of a resolved AST and build the module tree
pub fn check(
    resolved: &ResolvedAst,
    source: &SourceFile,
    config: &CheckConfig,
) -> Result<Module, CompileError> {
    let mut classifier = Classifier::new(&resolved.symbols, source, config);
    let (namespaces, classes) = classifier.lower_items(&resolved.ast.items, &[], None)?;
    let module = Module {
        namespaces,
        classes,
    };
    tracing::debug!(
        classes = module.classes().len(),
        stubs = module.forward_declarations().len(),
        "classified module"
    );
    Ok(module)
}

/// Lowering state for one file
pub struct Classifier<'a> {
    symbols: &'a SymbolTable,
    source: &'a SourceFile,
    config: &'a CheckConfig,
    /// Stubs already placed in the tree, by fully-qualified path
    emitted_stubs: FxHashSet<String>,
}

impl<'a> Classifier<'a> {
    pub fn new(symbols: &'a SymbolTable, source: &'a SourceFile, config: &'a CheckConfig) -> Self {
        Self {
            symbols,
            source,
            config,
            emitted_stubs: FxHashSet::default(),
        }
    }

    // ==================== TREE ====================

    fn lower_items(
        &mut self,
        items: &[Item],
        scope: &[String],
        inherited_include: Option<&str>,
    ) -> Result<(Vec<Namespace>, Vec<Class>), CompileError> {
        let mut namespaces = Vec::new();
        let mut classes = Vec::new();
        for item in items {
            match item {
                Item::Namespace(ns) => {
                    namespaces.push(self.lower_namespace(ns, scope, inherited_include)?);
                }
                Item::Class(class) => {
                    classes.push(self.lower_class(class, scope, inherited_include)?);
                }
                Item::ForwardDecl(decl) => {
                    if let Some(stub) = self.lower_stub(&decl.name, scope) {
                        classes.push(stub);
                    }
                }
            }
        }
        Ok((namespaces, classes))
    }

    fn lower_namespace(
        &mut self,
        ns: &NamespaceDef,
        scope: &[String],
        inherited_include: Option<&str>,
    ) -> Result<Namespace, CompileError> {
        let mut path = scope.to_vec();
        if let Some(name) = &ns.name {
            path.push(name.clone());
        }
        let include = ns.include.as_ref().map(|inc| inc.path.clone());
        let (namespaces, classes) =
            self.lower_items(&ns.items, &path, include.as_deref().or(inherited_include))?;
        Ok(Namespace {
            name: ns.name.clone(),
            path,
            include,
            namespaces,
            classes,
        })
    }

    /// A stub survives only if no definition with the same path exists
    fn lower_stub(&mut self, name: &str, scope: &[String]) -> Option<Class> {
        let path = ast::QualifiedName::new(scope.to_vec(), name).to_string();
        let id = self.symbols.lookup(&path)?;
        if !self.symbols.get(id).is_forward_only() || !self.emitted_stubs.insert(path) {
            return None;
        }
        Some(Class {
            name: name.to_string(),
            namespaces: scope.to_vec(),
            include: None,
            header: format!("{name}.h"),
            forward_only: true,
            members: Vec::new(),
        })
    }

    fn lower_class(
        &mut self,
        class: &ClassDef,
        scope: &[String],
        inherited_include: Option<&str>,
    ) -> Result<Class, CompileError> {
        self.check_member_names(class)?;

        let mut members = Vec::with_capacity(class.members.len());
        let mut signatures: FxHashMap<Vec<(TypeKind, String)>, Span> = FxHashMap::default();
        let mut ctor_keys: FxHashMap<String, Span> = FxHashMap::default();

        for member in &class.members {
            let args = member
                .params()
                .iter()
                .map(|p| {
                    Ok(Argument {
                        name: p.name.clone(),
                        ty: self.classify(&p.ty, Position::Argument, class, member)?,
                    })
                })
                .collect::<Result<Vec<_>, CompileError>>()?;

            let lowered = match member {
                ast::Member::Constructor(ctor) => {
                    self.check_constructor(class, ctor, &args, &mut signatures, &mut ctor_keys)?;
                    Member::Constructor(Constructor { args })
                }
                ast::Member::Method(m) => {
                    let returns = self.classify(&m.return_type, Position::Return, class, member)?;
                    if m.is_static {
                        Member::StaticMethod(StaticMethod {
                            name: m.name.clone(),
                            args,
                            returns,
                        })
                    } else {
                        Member::Method(Method {
                            name: m.name.clone(),
                            args,
                            returns,
                            is_const: m.is_const,
                        })
                    }
                }
            };
            members.push(lowered);
        }

        let include = class.include.as_ref().map(|inc| inc.path.clone());
        let header = include
            .as_deref()
            .or(inherited_include)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}.h", class.name));

        Ok(Class {
            name: class.name.clone(),
            namespaces: scope.to_vec(),
            include,
            header,
            forward_only: false,
            members,
        })
    }

    // ==================== MEMBER NAMES ====================

    /// Instance methods and static methods are two separate name spaces
    fn check_member_names(&self, class: &ClassDef) -> Result<(), CompileError> {
        let mut seen: FxHashMap<(bool, &str), Span> = FxHashMap::default();
        for member in &class.members {
            let ast::Member::Method(m) = member else {
                continue;
            };
            let key = (m.is_static, m.name.as_str());
            if let Some(&first) = seen.get(&key) {
                return Err(CompileError::DuplicateMethod {
                    class: class.name.clone(),
                    name: m.name.clone(),
                    line: m.span.line,
                    span: m.span.into(),
                    first_span: first.into(),
                    src: self.source.to_named_source(),
                });
            }
            seen.insert(key, m.span);
        }
        Ok(())
    }

    fn check_constructor(
        &self,
        class: &ClassDef,
        ctor: &ast::ConstructorDecl,
        args: &[Argument],
        signatures: &mut FxHashMap<Vec<(TypeKind, String)>, Span>,
        keys: &mut FxHashMap<String, Span>,
    ) -> Result<(), CompileError> {
        let exact: Vec<(TypeKind, String)> = args
            .iter()
            .map(|a| (a.ty.kind, a.ty.qualified_name()))
            .collect();
        if let Some(&first) = signatures.get(&exact) {
            return Err(CompileError::DuplicateMethod {
                class: class.name.clone(),
                name: class.name.clone(),
                line: ctor.span.line,
                span: ctor.span.into(),
                first_span: first.into(),
                src: self.source.to_named_source(),
            });
        }
        signatures.insert(exact, ctor.span);

        let key = constructor_key(args);
        if let Some(&first) = keys.get(&key) {
            if !self.config.reject_ambiguous_constructors {
                tracing::warn!(
                    class = %class.name,
                    key = %key,
                    line = ctor.span.line,
                    "constructor overloads share a signature key"
                );
                return Ok(());
            }
            return Err(CompileError::AmbiguousConstructor {
                class: class.name.clone(),
                key,
                line: ctor.span.line,
                span: ctor.span.into(),
                first_span: first.into(),
                src: self.source.to_named_source(),
            });
        }
        keys.insert(key, ctor.span);
        Ok(())
    }

    // ==================== TYPES ====================

    /// Pick the kind and wrapping strategy for one signature type
    pub fn classify(
        &self,
        ty: &TypeExpr,
        position: Position,
        class: &ClassDef,
        member: &ast::Member,
    ) -> Result<TypeRef, CompileError> {
        let invalid = |reason: &str| CompileError::InvalidWrapping {
            ty: ty.to_string(),
            reason: reason.to_string(),
            signature: signature(&class.name, member),
            line: ty.span.line,
            span: ty.span.into(),
            src: self.source.to_named_source(),
        };

        if let Some(builtin) = ty.builtin() {
            if ty.wrapper.is_some() {
                return Err(invalid(if builtin.is_eigen() {
                    "Eigen types cannot be held by a shared pointer"
                } else {
                    "primitive types cannot be held by a shared pointer"
                }));
            }
            if builtin == Builtin::Void {
                return match (position, ty.indirection, ty.is_const) {
                    (Position::Return, Indirection::Value, false) => {
                        Ok(builtin_ref(TypeKind::Primitive(Primitive::Void), Wrapping::ByRawValue, ty))
                    }
                    _ => Err(invalid("`void` is only valid as a plain return type")),
                };
            }
            match ty.indirection {
                Indirection::Pointer => {
                    return Err(invalid("raw pointers are only supported for classes"));
                }
                Indirection::Reference if !ty.is_const => {
                    return Err(invalid("non-const references are not supported"));
                }
                _ => {}
            }
            let (kind, wrapping) = match builtin {
                Builtin::Matrix => (TypeKind::EigenMatrix, Wrapping::ByMatrix),
                Builtin::Vector => (TypeKind::EigenVector, Wrapping::ByVector),
                Builtin::String => (TypeKind::Primitive(Primitive::String), Wrapping::ByRawValue),
                Builtin::Bool => (TypeKind::Primitive(Primitive::Bool), Wrapping::ByRawValue),
                Builtin::SizeT => (TypeKind::Primitive(Primitive::SizeT), Wrapping::ByRawValue),
                Builtin::Int => (TypeKind::Primitive(Primitive::Int), Wrapping::ByRawValue),
                Builtin::Double => (TypeKind::Primitive(Primitive::Double), Wrapping::ByRawValue),
                Builtin::Char => (TypeKind::Primitive(Primitive::Char), Wrapping::ByRawValue),
                Builtin::Void => (TypeKind::Primitive(Primitive::Void), Wrapping::ByRawValue),
            };
            return Ok(builtin_ref(kind, wrapping, ty));
        }

        let Some(resolved) = self.symbols.ref_for_node(ty.id) else {
            return Err(CompileError::UnresolvedType {
                name: ty.name.to_string(),
                bare: ty.name.name.clone(),
                signature: signature(&class.name, member),
                attempted: format!("`{}`", ty.name),
                line: ty.span.line,
                span: ty.span.into(),
                src: self.source.to_named_source(),
            });
        };

        let (kind, wrapping) = match (ty.wrapper.is_some(), ty.indirection) {
            (_, Indirection::Reference) if !ty.is_const => {
                return Err(invalid("non-const references are not supported"));
            }
            (true, Indirection::Pointer) => {
                return Err(invalid("pointers to shared pointers are not supported"));
            }
            (true, _) => (TypeKind::SharedPointer, Wrapping::ByOwnedPointer),
            (false, Indirection::Pointer) => (TypeKind::RawPointer, Wrapping::ByOwnedPointer),
            (false, Indirection::Reference) => match position {
                Position::Argument => (TypeKind::ClassConstRef, Wrapping::ByConstReference),
                Position::Return => (TypeKind::ClassValue, Wrapping::ByValueCopy),
            },
            (false, Indirection::Value) => (TypeKind::ClassValue, Wrapping::ByValueCopy),
        };

        Ok(TypeRef {
            kind,
            wrapping,
            namespaces: resolved.path.namespaces.clone(),
            name: resolved.path.name.clone(),
            origin: Some(if resolved.external {
                ClassOrigin::External
            } else {
                ClassOrigin::Declared
            }),
            transfers_ownership: kind == TypeKind::RawPointer && position == Position::Return,
        })
    }
}

fn builtin_ref(kind: TypeKind, wrapping: Wrapping, ty: &TypeExpr) -> TypeRef {
    TypeRef {
        kind,
        wrapping,
        namespaces: Vec::new(),
        name: ty.name.name.clone(),
        origin: None,
        transfers_ownership: false,
    }
}

/// Overload key a generated binding dispatches on: arity plus the first
/// letter of each argument's bare type name, e.g. `2:dd`
pub fn constructor_key(args: &[Argument]) -> String {
    let initials: String = args
        .iter()
        .filter_map(|a| a.ty.name.chars().next())
        .collect();
    format!("{}:{}", args.len(), initials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ErrorKind;
    use crate::{lexer, parser, resolve};

    fn check_src(src: &str) -> Result<Module, CompileError> {
        check_with(src, &CheckConfig::default())
    }

    fn check_with(src: &str, config: &CheckConfig) -> Result<Module, CompileError> {
        let source = SourceFile::anonymous(src);
        let tokens = lexer::lex(&source).unwrap();
        let ast = parser::parse(&tokens, &source).unwrap();
        let resolved = resolve::resolve(ast, &source)?;
        check(&resolved, &source, config)
    }

    fn arg_ty(module: &Module, fqn: &str) -> TypeRef {
        let class = module.lookup(fqn).unwrap();
        class.constructors().next().unwrap().args[0].ty.clone()
    }

    #[test]
    fn test_const_ref_argument() {
        let m = check_src("class A { A(); };\nclass B { B(const A& a); };").unwrap();
        let ty = arg_ty(&m, "B");
        assert_eq!(ty.kind, TypeKind::ClassConstRef);
        assert_eq!(ty.wrapping, Wrapping::ByConstReference);
        assert_eq!(ty.origin, Some(ClassOrigin::Declared));
    }

    #[test]
    fn test_raw_pointer_return_transfers_ownership() {
        let m = check_src("class A { A(); };\nclass B { A* make(); };").unwrap();
        let ret = &m.lookup("B").unwrap().method("make").unwrap().returns;
        assert_eq!(ret.kind, TypeKind::RawPointer);
        assert_eq!(ret.wrapping, Wrapping::ByOwnedPointer);
        assert!(ret.transfers_ownership);
    }

    #[test]
    fn test_shared_matrix_rejected() {
        let err = check_src("class B { B(boost::shared_ptr<Matrix> m); };").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidWrapping);
    }

    #[test]
    fn test_void_argument_rejected() {
        let err = check_src("class B { void f(void v); };").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidWrapping);
    }

    #[test]
    fn test_static_and_method_names_are_separate() {
        let m = check_src("class B {\n  int f();\n  static int f();\n};").unwrap();
        let b = m.lookup("B").unwrap();
        assert!(b.method("f").is_some());
        assert!(b.static_method("f").is_some());

        let err = check_src("class B {\n  static int f();\n  static int f(int x);\n};").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateMethod);
        assert_eq!(err.line(), 3);
    }

    #[test]
    fn test_ambiguous_constructor_is_configurable() {
        let src = "class V { V(); };\nclass W { W(); };\nclass B {\n  B(const V& v);\n  B(const W& w);\n};";
        assert!(check_src(src).is_ok(), "different initials are fine");

        let src = "class Va { Va(); };\nclass Vb { Vb(); };\nclass B {\n  B(const Va& v);\n  B(const Vb& w);\n};";
        assert!(check_src(src).is_ok(), "collisions are only logged by default");
        let strict = CheckConfig {
            reject_ambiguous_constructors: true,
        };
        assert!(matches!(
            check_with(src, &strict),
            Err(CompileError::AmbiguousConstructor { .. })
        ));
    }

    #[test]
    fn test_constructor_key() {
        let m = check_src("class P { P(double x, int y); };").unwrap();
        let ctor = m.lookup("P").unwrap().constructors().next().unwrap().clone();
        assert_eq!(constructor_key(&ctor.args), "2:di");
    }

    #[test]
    fn test_superseded_stub_dropped() {
        let m = check_src("class Foo; class Foo { Foo(); };").unwrap();
        assert_eq!(m.classes.len(), 1);
        assert!(!m.classes[0].forward_only);
    }

    #[test]
    fn test_header_falls_back_to_namespace_include() {
        let src = "#include <geo/all.h>\nnamespace geo {\nclass P { P(); };\n#include <geo/Q.h>\nclass Q { Q(); };\n}///\\namespace geo";
        let m = check_src(src).unwrap();
        assert_eq!(m.lookup("geo::P").unwrap().header, "geo/all.h");
        assert_eq!(m.lookup("geo::Q").unwrap().header, "geo/Q.h");
    }
}
