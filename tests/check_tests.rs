//! Type classification tests

use wrapidl::hir::{ClassOrigin, Member, Primitive, TypeKind, TypeRef, Wrapping};
use wrapidl::{CompileError, ErrorKind, Module, WrapConfig, parse_and_resolve, parse_and_resolve_with};

fn module(source: &str) -> Module {
    parse_and_resolve(source).unwrap_or_else(|d| panic!("unexpected diagnostics: {:?}", d.records()))
}

fn first_error(source: &str) -> CompileError {
    let diagnostics = parse_and_resolve(source).unwrap_err();
    diagnostics.errors()[0].clone()
}

fn returns(module: &Module, class: &str, method: &str) -> TypeRef {
    let class = module.lookup(class).unwrap();
    if let Some(m) = class.method(method) {
        return m.returns.clone();
    }
    class.static_method(method).unwrap().returns.clone()
}

fn args(module: &Module, class: &str, method: &str) -> Vec<TypeRef> {
    let class = module.lookup(class).unwrap();
    let m = class.method(method).unwrap();
    m.args.iter().map(|a| a.ty.clone()).collect()
}

const SHAPES: &str = "class Point {
  Point();
  double x() const;
};
class Shapes {
  Shapes();
  void byValue(Point p);
  void byRef(const Point& p);
  void shared(boost::shared_ptr<Point> p);
  void sharedRef(const boost::shared_ptr<Point>& p);
  void primitives(string s, bool b, size_t n, int i, double d, char c);
  void constRefPrimitive(const double& d);
  void eigen(Matrix m, const Vector& v);
  Point copyOut() const;
  const Point& refOut() const;
  boost::shared_ptr<Point> sharedOut();
  Point* make();
  Matrix matrixOut();
  Vector vectorOut();
  void nothing();
};
";

#[test]
fn test_class_argument_wrapping() {
    let m = module(SHAPES);
    let value = &args(&m, "Shapes", "byValue")[0];
    assert_eq!((value.kind, value.wrapping), (TypeKind::ClassValue, Wrapping::ByValueCopy));

    let by_ref = &args(&m, "Shapes", "byRef")[0];
    assert_eq!(
        (by_ref.kind, by_ref.wrapping),
        (TypeKind::ClassConstRef, Wrapping::ByConstReference)
    );

    for method in ["shared", "sharedRef"] {
        let shared = &args(&m, "Shapes", method)[0];
        assert_eq!(
            (shared.kind, shared.wrapping),
            (TypeKind::SharedPointer, Wrapping::ByOwnedPointer),
            "{method}"
        );
        assert_eq!(shared.name, "Point");
    }
}

#[test]
fn test_const_ref_wins_per_use_site() {
    // the same class is passed by value in one place and by reference in another
    let m = module(SHAPES);
    assert_eq!(args(&m, "Shapes", "byValue")[0].kind, TypeKind::ClassValue);
    assert_eq!(args(&m, "Shapes", "byRef")[0].kind, TypeKind::ClassConstRef);
}

#[test]
fn test_primitive_arguments() {
    let m = module(SHAPES);
    let kinds: Vec<TypeKind> = args(&m, "Shapes", "primitives").iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TypeKind::Primitive(Primitive::String),
            TypeKind::Primitive(Primitive::Bool),
            TypeKind::Primitive(Primitive::SizeT),
            TypeKind::Primitive(Primitive::Int),
            TypeKind::Primitive(Primitive::Double),
            TypeKind::Primitive(Primitive::Char),
        ]
    );
    assert!(
        args(&m, "Shapes", "primitives")
            .iter()
            .all(|t| t.wrapping == Wrapping::ByRawValue && t.origin.is_none())
    );
    assert_eq!(
        args(&m, "Shapes", "constRefPrimitive")[0].kind,
        TypeKind::Primitive(Primitive::Double)
    );
}

#[test]
fn test_eigen_types() {
    let m = module(SHAPES);
    let eigen = args(&m, "Shapes", "eigen");
    assert_eq!((eigen[0].kind, eigen[0].wrapping), (TypeKind::EigenMatrix, Wrapping::ByMatrix));
    assert_eq!((eigen[1].kind, eigen[1].wrapping), (TypeKind::EigenVector, Wrapping::ByVector));
    assert_eq!(returns(&m, "Shapes", "matrixOut").wrapping, Wrapping::ByMatrix);
    assert_eq!(returns(&m, "Shapes", "vectorOut").wrapping, Wrapping::ByVector);
}

#[test]
fn test_return_wrapping() {
    let m = module(SHAPES);
    assert_eq!(returns(&m, "Shapes", "copyOut").kind, TypeKind::ClassValue);

    let ref_out = returns(&m, "Shapes", "refOut");
    assert_eq!((ref_out.kind, ref_out.wrapping), (TypeKind::ClassValue, Wrapping::ByValueCopy));

    let shared = returns(&m, "Shapes", "sharedOut");
    assert_eq!(shared.kind, TypeKind::SharedPointer);
    assert!(!shared.transfers_ownership);

    let made = returns(&m, "Shapes", "make");
    assert_eq!((made.kind, made.wrapping), (TypeKind::RawPointer, Wrapping::ByOwnedPointer));
    assert!(made.transfers_ownership);

    let nothing = returns(&m, "Shapes", "nothing");
    assert_eq!(nothing.kind, TypeKind::Primitive(Primitive::Void));
}

#[test]
fn test_shared_pointer_around_eigen_rejected() {
    for ty in ["boost::shared_ptr<Matrix>", "boost::shared_ptr<Vector>", "const boost::shared_ptr<Matrix>&"] {
        let src = format!("class A {{\n  A();\n  void f({ty} m);\n}};");
        let err = first_error(&src);
        assert_eq!(err.kind(), ErrorKind::InvalidWrapping, "{ty}");
        assert_eq!(err.line(), 3);
    }
    let err = first_error("class A {\n  boost::shared_ptr<Vector> f();\n};");
    assert_eq!(err.kind(), ErrorKind::InvalidWrapping);
}

#[test]
fn test_illegal_builtin_combinations() {
    let cases = [
        "void f(void v);",
        "const void f();",
        "void* f();",
        "double* f();",
        "Matrix* f();",
        "void f(double& d);",
        "boost::shared_ptr<int> f();",
    ];
    for case in cases {
        let src = format!("class A {{\n  {case}\n}};");
        let err = first_error(&src);
        assert!(
            matches!(err, CompileError::InvalidWrapping { .. }),
            "{case}: {err:?}"
        );
    }
}

#[test]
fn test_non_const_class_reference_rejected() {
    let err = first_error("class P { P(); };\nclass A {\n  void f(P& p);\n};");
    match err {
        CompileError::InvalidWrapping { ty, signature, line, .. } => {
            assert_eq!(ty, "P&");
            assert_eq!(signature, "A::f(P& p)");
            assert_eq!(line, 3);
        }
        other => panic!("Expected invalid wrapping, got {other:?}"),
    }
}

#[test]
fn test_duplicate_method() {
    let src = "class A {\n  A();\n  double x();\n  double x() const;\n};";
    let diagnostics = parse_and_resolve(src).unwrap_err();
    assert_eq!(diagnostics.error_count(), 1);
    match &diagnostics.errors()[0] {
        CompileError::DuplicateMethod { class, name, line, .. } => {
            assert_eq!(class, "A");
            assert_eq!(name, "x");
            assert_eq!(*line, 4);
        }
        other => panic!("Expected duplicate method, got {other:?}"),
    }
}

#[test]
fn test_static_and_instance_method_may_share_a_name() {
    let src = "class Rot3 {\n  Rot3();\n  static Rot3 ypr(double y, double p, double r);\n  Vector ypr() const;\n};";
    let m = module(src);
    let rot = m.lookup("Rot3").unwrap();
    assert_eq!(rot.static_methods().count(), 1);
    assert_eq!(rot.methods().count(), 1);
    assert_eq!(returns(&m, "Rot3", "ypr").kind, TypeKind::EigenVector);
}

#[test]
fn test_duplicate_static_method() {
    let err = first_error("class A {\n  static A create();\n  static A create(int n);\n};");
    assert_eq!(err.kind(), ErrorKind::DuplicateMethod);
    assert_eq!(err.line(), 3);
}

#[test]
fn test_same_method_name_in_different_classes() {
    let m = module("class A {\n  int f();\n};\nclass B {\n  int f();\n};");
    assert_eq!(m.classes().len(), 2);
}

#[test]
fn test_constructor_overloads_by_arity() {
    let m = module("class P {\n  P();\n  P(double x);\n  P(double x, double y);\n  P(Vector v);\n};");
    assert_eq!(m.lookup("P").unwrap().constructors().count(), 4);
}

#[test]
fn test_identical_constructors_rejected() {
    let err = first_error("class P {\n  P(double x);\n  P(double y);\n};");
    assert!(matches!(err, CompileError::DuplicateMethod { line: 3, .. }));
}

#[test]
fn test_first_letter_collision_allowed_by_default() {
    let src = "class GaussianConditional { GaussianConditional(); };\nclass GaussianFactor { GaussianFactor(); };\nclass HessianFactor {\n  HessianFactor(const GaussianConditional& cg);\n  HessianFactor(const GaussianFactor& factor);\n};";
    let m = module(src);
    assert_eq!(m.lookup("HessianFactor").unwrap().constructors().count(), 2);
}

#[test]
fn test_ambiguous_constructor_initials_when_strict() {
    let src = "class Point { Point(); };\nclass Pose { Pose(); };\nclass P {\n  P(const Point& a);\n  P(const Pose& b);\n};";
    let mut strict = WrapConfig::default();
    strict.check.reject_ambiguous_constructors = true;
    let err = parse_and_resolve_with("strict.h", src, &strict).unwrap_err().errors()[0].clone();
    match err {
        CompileError::AmbiguousConstructor { class, key, line, .. } => {
            assert_eq!(class, "P");
            assert_eq!(key, "1:P");
            assert_eq!(line, 5);
        }
        other => panic!("Expected ambiguous constructor, got {other:?}"),
    }

    assert_eq!(module(src).lookup("P").unwrap().constructors().count(), 2);
}

#[test]
fn test_external_origin() {
    let m = module("class Ext;\nclass A {\n  A(const Ext& e);\n  Ext* make();\n};");
    let ctor_arg = match &m.lookup("A").unwrap().members[0] {
        Member::Constructor(c) => c.args[0].ty.clone(),
        other => panic!("Expected constructor, got {other:?}"),
    };
    assert_eq!(ctor_arg.origin, Some(ClassOrigin::External));
    assert_eq!(returns(&m, "A", "make").origin, Some(ClassOrigin::External));
    assert_eq!(m.forward_declarations().len(), 1);
}

#[test]
fn test_declared_origin_and_qualified_name() {
    let m = module("namespace geo {\nclass P {\n  P();\n};\nclass Q {\n  Q();\n  P get() const;\n};\n}///\\namespace geo");
    let ret = returns(&m, "geo::Q", "get");
    assert_eq!(ret.origin, Some(ClassOrigin::Declared));
    assert_eq!(ret.qualified_name(), "geo::P");
}

#[test]
fn test_classification_stops_at_first_error() {
    let src = "class A {\n  void f(double* d);\n  int g();\n  int g();\n};";
    let diagnostics = parse_and_resolve(src).unwrap_err();
    // duplicate names are checked before signatures
    assert_eq!(diagnostics.error_count(), 1);
    assert_eq!(diagnostics.first_kind(), Some(ErrorKind::DuplicateMethod));
}
