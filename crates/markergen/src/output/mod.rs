//! Declaration rendering.
//!
//! [`CodeGenerator`] turns markers into Kotlin DataFrame declarations. Type
//! spelling is delegated to a [`TypeRendering`] strategy so the same
//! generator serves both fully qualified output and REPL-style short names.

mod kotlin;

pub use crate::traits::{ApiClass, TypeRendering};
pub use kotlin::{BindingTable, CodeGenerator, ReceiverKind};
pub(crate) use kotlin::string_literal;

use crate::options::TypeNames;
use std::borrow::Cow;

/// Fully qualified API classes, value types as given.
#[derive(Debug, Clone, Copy, Default)]
pub struct FqNames;

impl TypeRendering for FqNames {
    fn class_name(&self, class: ApiClass) -> &'static str {
        class.qualified_name()
    }

    fn type_name<'a>(&self, name: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(name)
    }
}

/// Simple API class names; `kotlin.X` shortened to `X`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortNames;

impl TypeRendering for ShortNames {
    fn class_name(&self, class: ApiClass) -> &'static str {
        class.simple_name()
    }

    fn type_name<'a>(&self, name: &'a str) -> Cow<'a, str> {
        match name.strip_prefix("kotlin.") {
            Some(rest) if !rest.is_empty() && !rest.contains('.') => Cow::Borrowed(rest),
            _ => Cow::Borrowed(name),
        }
    }
}

static FQ_NAMES: FqNames = FqNames;
static SHORT_NAMES: ShortNames = ShortNames;

impl TypeNames {
    pub fn renderer(self) -> &'static dyn TypeRendering {
        match self {
            TypeNames::Fq => &FQ_NAMES,
            TypeNames::Short => &SHORT_NAMES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::FieldType;

    #[test]
    fn test_short_names_strip_only_two_part_kotlin_names() {
        assert_eq!(ShortNames.type_name("kotlin.Int"), "Int");
        assert_eq!(ShortNames.type_name("kotlin.collections.List"), "kotlin.collections.List");
        assert_eq!(ShortNames.type_name("java.time.Instant"), "java.time.Instant");
        assert_eq!(FqNames.type_name("kotlin.Int"), "kotlin.Int");
    }

    #[test]
    fn test_composite_types() {
        let frame = FieldType::Frame {
            marker_name: "Tag".into(),
            nullable: true,
        };
        assert_eq!(
            FqNames.column_type(&frame),
            "org.jetbrains.kotlinx.dataframe.DataColumn<org.jetbrains.kotlinx.dataframe.DataFrame<Tag>?>"
        );
        assert_eq!(ShortNames.field_type(&frame), "DataFrame<Tag>?");

        let value = FieldType::Value {
            type_name: "kotlin.String".into(),
            nullable: true,
        };
        assert_eq!(ShortNames.column_type(&value), "DataColumn<String?>");
        assert_eq!(FqNames.field_type(&value), "kotlin.String?");

        let group = FieldType::Group {
            marker_name: "Owner".into(),
            nullable: false,
        };
        assert_eq!(ShortNames.column_type(&group), "ColumnGroup<Owner>");
        assert_eq!(ShortNames.row_type("Owner"), "DataRow<Owner>");
        assert_eq!(
            FqNames.container_type("Owner"),
            "org.jetbrains.kotlinx.dataframe.ColumnsContainer<Owner>"
        );
    }
}
