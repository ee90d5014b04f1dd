//! Structural schema model.
//!
//! A [`Schema`] maps column names to [`ColumnSchema`] values. Equality and
//! hashing are purely structural, so two schemas built in different column
//! orders compare equal and share one memoization slot.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::collections::btree_map;

/// Name of the top type; `kotlin.Any?` accepts every value.
pub const ANY_TYPE: &str = "kotlin.Any";

/// A scalar column type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueType {
    /// Fully qualified type name without a nullability marker.
    pub name: String,
    #[serde(default)]
    pub nullable: bool,
}

impl ValueType {
    /// Parse a type name; a trailing `?` marks it nullable.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        match name.strip_suffix('?') {
            Some(base) => Self {
                name: base.to_string(),
                nullable: true,
            },
            None => Self {
                name,
                nullable: false,
            },
        }
    }

    pub fn nullable(name: impl Into<String>) -> Self {
        Self {
            nullable: true,
            ..Self::new(name)
        }
    }

    pub fn to_nullable(&self) -> Self {
        Self {
            name: self.name.clone(),
            nullable: true,
        }
    }

    /// `kotlin.Int?` style rendering.
    pub fn render(&self) -> String {
        if self.nullable {
            format!("{}?", self.name)
        } else {
            self.name.clone()
        }
    }

    /// Whether a value of type `other` can be viewed as `self`.
    pub fn is_super_or_equal(&self, other: &ValueType) -> bool {
        let nullability_ok = self.nullable || !other.nullable;
        nullability_ok && (self.name == ANY_TYPE || self.name == other.name)
    }
}

/// The shape of one column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ColumnSchema {
    /// A scalar column.
    Value(ValueType),
    /// One nested record per row.
    Group {
        schema: Schema,
        /// The whole record may be absent.
        #[serde(default)]
        nullable: bool,
    },
    /// One nested table per row.
    Frame {
        schema: Schema,
        /// The nested table itself may be absent for a row.
        #[serde(default)]
        nullable: bool,
        /// Every column inside the nested table is nullable.
        #[serde(default)]
        elements_nullable: bool,
    },
}

impl ColumnSchema {
    pub fn value(type_name: impl Into<String>) -> Self {
        ColumnSchema::Value(ValueType::new(type_name))
    }

    pub fn nullable_value(type_name: impl Into<String>) -> Self {
        ColumnSchema::Value(ValueType::nullable(type_name))
    }

    pub fn group(schema: Schema) -> Self {
        ColumnSchema::Group {
            schema,
            nullable: false,
        }
    }

    pub fn frame(schema: Schema) -> Self {
        ColumnSchema::Frame {
            schema,
            nullable: false,
            elements_nullable: false,
        }
    }

    /// The column-level nullability bit (value, group, or frame absence).
    pub fn is_nullable(&self) -> bool {
        match self {
            ColumnSchema::Value(ty) => ty.nullable,
            ColumnSchema::Group { nullable, .. } | ColumnSchema::Frame { nullable, .. } => {
                *nullable
            }
        }
    }

    /// Same shape with the column-level nullability bit set.
    pub fn to_nullable(&self) -> Self {
        match self {
            ColumnSchema::Value(ty) => ColumnSchema::Value(ty.to_nullable()),
            ColumnSchema::Group { schema, .. } => ColumnSchema::Group {
                schema: schema.clone(),
                nullable: true,
            },
            ColumnSchema::Frame {
                schema,
                elements_nullable,
                ..
            } => ColumnSchema::Frame {
                schema: schema.clone(),
                nullable: true,
                elements_nullable: *elements_nullable,
            },
        }
    }

    /// The schema the nested marker is synthesized from.
    ///
    /// For frames with nullable elements every nested column is made nullable.
    pub fn nested_schema(&self) -> Option<Cow<'_, Schema>> {
        match self {
            ColumnSchema::Value(_) => None,
            ColumnSchema::Group { schema, .. } => Some(Cow::Borrowed(schema)),
            ColumnSchema::Frame {
                schema,
                elements_nullable,
                ..
            } => Some(if *elements_nullable {
                Cow::Owned(schema.with_nullable_columns())
            } else {
                Cow::Borrowed(schema)
            }),
        }
    }

    /// Structural subtype test: can a column shaped like `other` be viewed as `self`?
    pub fn is_super_or_equal(&self, other: &ColumnSchema) -> bool {
        match (self, other) {
            (ColumnSchema::Value(a), ColumnSchema::Value(b)) => a.is_super_or_equal(b),
            (ColumnSchema::Group { nullable: n1, .. }, ColumnSchema::Group { nullable: n2, .. })
            | (ColumnSchema::Frame { nullable: n1, .. }, ColumnSchema::Frame { nullable: n2, .. }) => {
                (*n1 || !*n2)
                    && match (self.nested_schema(), other.nested_schema()) {
                        (Some(a), Some(b)) => a.is_super_or_equal(&b),
                        _ => false,
                    }
            }
            _ => false,
        }
    }
}

/// Column name to column shape, iterated in column-name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    columns: BTreeMap<String, ColumnSchema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, column: ColumnSchema) -> Self {
        self.insert(name, column);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, column: ColumnSchema) -> Option<ColumnSchema> {
        self.columns.insert(name.into(), column)
    }

    pub fn get(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.get(name)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, ColumnSchema> {
        self.columns.iter()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// One level of nullable mode: every column gets its nullability bit set.
    pub fn with_nullable_columns(&self) -> Schema {
        Schema {
            columns: self
                .columns
                .iter()
                .map(|(name, column)| (name.clone(), column.to_nullable()))
                .collect(),
        }
    }

    /// Every column of `self` exists in `other` with a compatible shape.
    pub fn is_super_or_equal(&self, other: &Schema) -> bool {
        self.columns.iter().all(|(name, column)| {
            other
                .columns
                .get(name)
                .is_some_and(|candidate| column.is_super_or_equal(candidate))
        })
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = (&'a String, &'a ColumnSchema);
    type IntoIter = btree_map::Iter<'a, String, ColumnSchema>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, ColumnSchema)> for Schema {
    fn from_iter<T: IntoIterator<Item = (K, ColumnSchema)>>(iter: T) -> Self {
        Schema {
            columns: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> Schema {
        Schema::new()
            .with("name", ColumnSchema::value("kotlin.String"))
            .with("age", ColumnSchema::value("kotlin.Int"))
            .with("city", ColumnSchema::nullable_value("kotlin.String"))
    }

    #[test]
    fn test_equality_ignores_insertion_order() {
        let reordered = Schema::new()
            .with("city", ColumnSchema::value("kotlin.String?"))
            .with("age", ColumnSchema::value("kotlin.Int"))
            .with("name", ColumnSchema::value("kotlin.String"));
        assert_eq!(person(), reordered);
        assert_eq!(
            person().column_names().collect::<Vec<_>>(),
            ["age", "city", "name"]
        );
    }

    #[test]
    fn test_value_type_parsing() {
        let ty = ValueType::new("kotlin.Int?");
        assert_eq!(ty.name, "kotlin.Int");
        assert!(ty.nullable);
        assert_eq!(ty.render(), "kotlin.Int?");
    }

    #[test]
    fn test_structural_subtyping() {
        let base = Schema::new()
            .with("name", ColumnSchema::value("kotlin.String"))
            .with("city", ColumnSchema::nullable_value("kotlin.String"));
        assert!(base.is_super_or_equal(&person()));
        assert!(!person().is_super_or_equal(&base));

        let not_null_city = person().with("city", ColumnSchema::value("kotlin.String"));
        assert!(base.is_super_or_equal(&not_null_city));

        let strict = Schema::new().with("city", ColumnSchema::value("kotlin.String"));
        assert!(!strict.is_super_or_equal(&person()));

        let any = Schema::new().with("age", ColumnSchema::nullable_value(ANY_TYPE));
        assert!(any.is_super_or_equal(&person()));
    }

    #[test]
    fn test_nested_subtyping_respects_frame_absence() {
        let inner = Schema::new().with("tag", ColumnSchema::value("kotlin.String"));
        let required = Schema::new().with("tags", ColumnSchema::frame(inner.clone()));
        let optional = Schema::new().with(
            "tags",
            ColumnSchema::Frame {
                schema: inner,
                nullable: true,
                elements_nullable: false,
            },
        );
        assert!(optional.is_super_or_equal(&required));
        assert!(!required.is_super_or_equal(&optional));
    }

    #[test]
    fn test_elements_nullable_changes_nested_shape() {
        let inner = Schema::new().with("tag", ColumnSchema::value("kotlin.String"));
        let column = ColumnSchema::Frame {
            schema: inner,
            nullable: false,
            elements_nullable: true,
        };
        let nested = column.nested_schema().unwrap();
        assert_eq!(
            nested.get("tag"),
            Some(&ColumnSchema::nullable_value("kotlin.String"))
        );
        assert!(!column.is_nullable());
    }

    #[test]
    fn test_json_shape() {
        let schema = Schema::new().with(
            "profile",
            ColumnSchema::group(Schema::new().with("name", ColumnSchema::value("kotlin.String"))),
        );
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["profile"]["kind"], "group");
        assert_eq!(json["profile"]["schema"]["name"]["kind"], "value");
        let back: Schema = serde_json::from_value(json).unwrap();
        assert_eq!(back, schema);
    }
}
