//! Extension points of the declaration renderer.

use crate::marker::{FieldType, Marker};
use std::borrow::Cow;
use std::fmt;

/// Runtime API types that appear in generated declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiClass {
    ColumnsContainer,
    DataColumn,
    DataFrame,
    DataRow,
    ColumnGroup,
}

impl ApiClass {
    pub fn simple_name(self) -> &'static str {
        match self {
            ApiClass::ColumnsContainer => "ColumnsContainer",
            ApiClass::DataColumn => "DataColumn",
            ApiClass::DataFrame => "DataFrame",
            ApiClass::DataRow => "DataRow",
            ApiClass::ColumnGroup => "ColumnGroup",
        }
    }

    pub fn qualified_name(self) -> &'static str {
        match self {
            ApiClass::ColumnsContainer => "org.jetbrains.kotlinx.dataframe.ColumnsContainer",
            ApiClass::DataColumn => "org.jetbrains.kotlinx.dataframe.DataColumn",
            ApiClass::DataFrame => "org.jetbrains.kotlinx.dataframe.DataFrame",
            ApiClass::DataRow => "org.jetbrains.kotlinx.dataframe.DataRow",
            ApiClass::ColumnGroup => "org.jetbrains.kotlinx.dataframe.columns.ColumnGroup",
        }
    }
}

fn nullability(nullable: bool) -> &'static str {
    if nullable { "?" } else { "" }
}

/// How type names are spelled in generated code.
///
/// Implementors choose the spelling of API classes and value types; the
/// composite types are built by the provided methods.
pub trait TypeRendering: Send + Sync {
    fn class_name(&self, class: ApiClass) -> &'static str;

    /// Spelling of a value type or marker name.
    fn type_name<'a>(&self, name: &'a str) -> Cow<'a, str>;

    /// `ColumnsContainer<M>` receiver.
    fn container_type(&self, marker: &str) -> String {
        format!(
            "{}<{}>",
            self.class_name(ApiClass::ColumnsContainer),
            self.type_name(marker)
        )
    }

    /// `DataRow<M>` receiver.
    fn row_type(&self, marker: &str) -> String {
        format!(
            "{}<{}>",
            self.class_name(ApiClass::DataRow),
            self.type_name(marker)
        )
    }

    /// Result type of the container accessor.
    fn column_type(&self, field_type: &FieldType) -> String {
        match field_type {
            FieldType::Value {
                type_name,
                nullable,
            } => format!(
                "{}<{}{}>",
                self.class_name(ApiClass::DataColumn),
                self.type_name(type_name),
                nullability(*nullable)
            ),
            FieldType::Group { marker_name, .. } => format!(
                "{}<{}>",
                self.class_name(ApiClass::ColumnGroup),
                marker_name
            ),
            FieldType::Frame {
                marker_name,
                nullable,
            } => format!(
                "{}<{}<{}>{}>",
                self.class_name(ApiClass::DataColumn),
                self.class_name(ApiClass::DataFrame),
                marker_name,
                nullability(*nullable)
            ),
        }
    }

    /// Result type of the row accessor and of interface properties.
    fn field_type(&self, field_type: &FieldType) -> String {
        match field_type {
            FieldType::Value {
                type_name,
                nullable,
            } => format!("{}{}", self.type_name(type_name), nullability(*nullable)),
            FieldType::Group { marker_name, .. } => {
                format!("{}<{}>", self.class_name(ApiClass::DataRow), marker_name)
            }
            FieldType::Frame {
                marker_name,
                nullable,
            } => format!(
                "{}<{}>{}",
                self.class_name(ApiClass::DataFrame),
                marker_name,
                nullability(*nullable)
            ),
        }
    }
}

/// Factory method attached to the root marker's interface body.
pub trait ReadMethod: fmt::Debug + Send + Sync {
    /// Member declarations (usually a companion object), unindented.
    fn to_declaration(&self, marker: &Marker, visibility: &str) -> String;

    /// Import lines the declaration needs.
    fn additional_imports(&self) -> Vec<String>;
}
