//! Canonical interface-file text for a module tree
//!
//! Types are printed fully qualified, so parsing the output again yields the
//! same tree.

use super::*;
use std::fmt::{self, Display, Formatter};

const INDENT: &str = "  ";

impl Display for Module {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for class in &self.classes {
            write!(f, "{class}")?;
        }
        for ns in &self.namespaces {
            write!(f, "{ns}")?;
        }
        Ok(())
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(include) = &self.include {
            writeln!(f, "#include <{include}>")?;
        }
        match &self.name {
            Some(name) => writeln!(f, "namespace {name} {{")?,
            None => writeln!(f, "namespace {{")?,
        }
        for class in &self.classes {
            write!(f, "{class}")?;
        }
        for ns in &self.namespaces {
            write!(f, "{ns}")?;
        }
        match &self.name {
            Some(name) => writeln!(f, "}}///\\namespace {name}"),
            None => writeln!(f, "}}///\\namespace"),
        }
    }
}

impl Display for Class {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.forward_only {
            return writeln!(f, "class {};", self.name);
        }
        if let Some(include) = &self.include {
            writeln!(f, "#include <{include}>")?;
        }
        writeln!(f, "class {} {{", self.name)?;
        for member in &self.members {
            f.write_str(INDENT)?;
            match member {
                Member::Constructor(c) => writeln!(f, "{}({});", self.name, Args(&c.args))?,
                Member::Method(m) => {
                    write!(f, "{} {}({})", m.returns, m.name, Args(&m.args))?;
                    if m.is_const {
                        f.write_str(" const")?;
                    }
                    writeln!(f, ";")?;
                }
                Member::StaticMethod(m) => {
                    writeln!(f, "static {} {}({});", m.returns, m.name, Args(&m.args))?
                }
            }
        }
        writeln!(f, "}};")
    }
}

struct Args<'a>(&'a [Argument]);

impl Display for Args<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} {}", arg.ty, arg.name)?;
        }
        Ok(())
    }
}

impl Display for TypeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = self.qualified_name();
        match self.kind {
            TypeKind::Primitive(p) => f.write_str(p.as_str()),
            TypeKind::EigenMatrix => f.write_str("Matrix"),
            TypeKind::EigenVector => f.write_str("Vector"),
            TypeKind::ClassValue => f.write_str(&name),
            TypeKind::ClassConstRef => write!(f, "const {name}&"),
            TypeKind::SharedPointer => write!(f, "boost::shared_ptr<{name}>"),
            TypeKind::RawPointer => write!(f, "{name}*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class_ref(kind: TypeKind, wrapping: Wrapping) -> TypeRef {
        TypeRef {
            kind,
            wrapping,
            namespaces: vec!["gtsam".into()],
            name: "Pose2".into(),
            origin: Some(ClassOrigin::Declared),
            transfers_ownership: false,
        }
    }

    #[test]
    fn test_type_ref_text() {
        assert_eq!(
            class_ref(TypeKind::ClassConstRef, Wrapping::ByConstReference).to_string(),
            "const gtsam::Pose2&"
        );
        assert_eq!(
            class_ref(TypeKind::SharedPointer, Wrapping::ByOwnedPointer).to_string(),
            "boost::shared_ptr<gtsam::Pose2>"
        );
        assert_eq!(
            class_ref(TypeKind::RawPointer, Wrapping::ByOwnedPointer).to_string(),
            "gtsam::Pose2*"
        );
    }

    #[test]
    fn test_class_text() {
        let class = Class {
            name: "Point2".into(),
            namespaces: vec!["gtsam".into()],
            include: Some("gtsam/geometry/Point2.h".into()),
            header: "gtsam/geometry/Point2.h".into(),
            forward_only: false,
            members: vec![
                Member::Constructor(Constructor { args: Vec::new() }),
                Member::Method(Method {
                    name: "x".into(),
                    args: Vec::new(),
                    returns: TypeRef {
                        kind: TypeKind::Primitive(Primitive::Double),
                        wrapping: Wrapping::ByRawValue,
                        namespaces: Vec::new(),
                        name: "double".into(),
                        origin: None,
                        transfers_ownership: false,
                    },
                    is_const: true,
                }),
            ],
        };
        assert_eq!(
            class.to_string(),
            "#include <gtsam/geometry/Point2.h>\nclass Point2 {\n  Point2();\n  double x() const;\n};\n"
        );
    }
}
