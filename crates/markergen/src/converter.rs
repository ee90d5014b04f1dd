//! Declaration text paired with a cast template.

use crate::marker::Marker;
use std::sync::Arc;

/// Imports every standalone snippet carries.
const STANDARD_IMPORTS: &[&str] = &[
    "import org.jetbrains.kotlinx.dataframe.ColumnsContainer",
    "import org.jetbrains.kotlinx.dataframe.DataColumn",
    "import org.jetbrains.kotlinx.dataframe.DataFrame",
    "import org.jetbrains.kotlinx.dataframe.DataRow",
    "import org.jetbrains.kotlinx.dataframe.columns.ColumnGroup",
    "import org.jetbrains.kotlinx.dataframe.annotations.ColumnName",
    "import org.jetbrains.kotlinx.dataframe.annotations.DataSchema",
    "import org.jetbrains.kotlinx.dataframe.api.cast",
];

/// How a value expression is asserted to the generated type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TypeCast {
    /// The expression is left untouched.
    #[default]
    None,
    /// `expr.cast<A>()` or `expr.cast<A, B>()`.
    Markers(Vec<String>),
}

impl TypeCast {
    pub fn to(marker_name: impl Into<String>) -> Self {
        TypeCast::Markers(vec![marker_name.into()])
    }

    pub fn apply(&self, expr: &str) -> String {
        match self {
            TypeCast::Markers(types) if !types.is_empty() => {
                format!("{expr}.cast<{}>()", types.join(", "))
            }
            _ => expr.to_string(),
        }
    }

    pub fn is_none(&self) -> bool {
        match self {
            TypeCast::None => true,
            TypeCast::Markers(types) => types.is_empty(),
        }
    }
}

/// Generated declarations plus the cast that puts a value under them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CodeWithConverter {
    pub declarations: String,
    pub converter: TypeCast,
}

impl CodeWithConverter {
    pub fn new(declarations: impl Into<String>, marker_name: impl Into<String>) -> Self {
        Self {
            declarations: declarations.into(),
            converter: TypeCast::to(marker_name),
        }
    }

    /// Nothing to declare and nothing to cast.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn cast(&self, expr: &str) -> String {
        self.converter.apply(expr)
    }

    pub fn has_declarations(&self) -> bool {
        !self.declarations.trim().is_empty()
    }

    pub fn has_converter(&self) -> bool {
        !self.converter.is_none()
    }

    /// Declarations followed by the cast of `expr`, or whichever of the two exists.
    pub fn with_converter(&self, expr: &str) -> String {
        match (self.has_declarations(), self.has_converter()) {
            (_, false) => self.declarations.clone(),
            (false, true) => self.cast(expr),
            (true, true) => format!("{}\n{}", self.declarations, self.cast(expr)),
        }
    }

    /// A complete source file: package line, imports, declarations.
    pub fn to_standalone_snippet(&self, package: &str, additional_imports: &[String]) -> String {
        let mut out = String::new();
        if !package.is_empty() {
            out.push_str("package ");
            out.push_str(package);
            out.push_str("\n\n");
        }
        for import in STANDARD_IMPORTS {
            out.push_str(import);
            out.push('\n');
        }
        for import in additional_imports {
            out.push_str(import);
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.declarations);
        out.push('\n');
        out
    }
}

/// Result of a schema-driven generation call.
#[derive(Debug, Clone)]
pub struct CodeGenResult {
    pub code: CodeWithConverter,
    /// Markers synthesized by the call, in declaration order.
    pub new_markers: Vec<Arc<Marker>>,
}

impl CodeGenResult {
    pub fn to_standalone_snippet(&self, package: &str, additional_imports: &[String]) -> String {
        self.code.to_standalone_snippet(package, additional_imports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composition() {
        let both = CodeWithConverter::new("interface A", "A");
        assert_eq!(both.with_converter("df"), "interface A\ndf.cast<A>()");

        let cast_only = CodeWithConverter::new("", "A");
        assert!(!cast_only.has_declarations());
        assert_eq!(cast_only.with_converter("df"), "df.cast<A>()");

        let decl_only = CodeWithConverter {
            declarations: "interface B".into(),
            converter: TypeCast::None,
        };
        assert!(!decl_only.has_converter());
        assert_eq!(decl_only.with_converter("df"), "interface B");

        assert_eq!(CodeWithConverter::empty().with_converter("df"), "");
    }

    #[test]
    fn test_two_type_cast() {
        let cast = TypeCast::Markers(vec!["K".into(), "G".into()]);
        assert_eq!(cast.apply("it"), "it.cast<K, G>()");
        assert_eq!(TypeCast::None.apply("it"), "it");
    }

    #[test]
    fn test_standalone_snippet_layout() {
        let code = CodeWithConverter::new("@DataSchema\ninterface A", "A");
        let snippet = code.to_standalone_snippet("org.example", &["import foo.bar".to_string()]);
        assert!(snippet.starts_with("package org.example\n\nimport org.jetbrains.kotlinx.dataframe.ColumnsContainer\n"));
        assert!(snippet.contains("import org.jetbrains.kotlinx.dataframe.api.cast\nimport foo.bar\n\n@DataSchema"));
        assert!(snippet.ends_with("interface A\n"));

        let bare = code.to_standalone_snippet("", &[]);
        assert!(bare.starts_with("import "));
    }
}
