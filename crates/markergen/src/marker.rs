//! Markers: named structural types with fields and super-markers.

use crate::error::{GenerateError, Result};
use crate::naming::ValidFieldName;
use crate::schema::{ColumnSchema, Schema, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Marker name meaning "any nested shape".
pub const WILDCARD: &str = "*";

/// Visibility of generated top-level declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerVisibility {
    Internal,
    #[default]
    ImplicitPublic,
    ExplicitPublic,
}

impl MarkerVisibility {
    /// Keyword prefix for top-level declarations.
    pub fn top_level_keyword(self) -> &'static str {
        match self {
            MarkerVisibility::Internal => "internal ",
            MarkerVisibility::ImplicitPublic => "",
            MarkerVisibility::ExplicitPublic => "public ",
        }
    }

    /// Keyword prefix for members of a declared interface.
    pub fn member_keyword(self) -> &'static str {
        match self {
            MarkerVisibility::ExplicitPublic => "public ",
            MarkerVisibility::Internal | MarkerVisibility::ImplicitPublic => "",
        }
    }
}

/// The declared type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldType {
    Value {
        type_name: String,
        #[serde(default)]
        nullable: bool,
    },
    Group {
        marker_name: String,
        #[serde(default)]
        nullable: bool,
    },
    Frame {
        marker_name: String,
        #[serde(default)]
        nullable: bool,
    },
}

impl FieldType {
    pub fn value(ty: &ValueType) -> Self {
        FieldType::Value {
            type_name: ty.name.clone(),
            nullable: ty.nullable,
        }
    }

    pub fn is_nullable(&self) -> bool {
        match self {
            FieldType::Value { nullable, .. }
            | FieldType::Group { nullable, .. }
            | FieldType::Frame { nullable, .. } => *nullable,
        }
    }

    /// Referenced marker for group and frame fields.
    pub fn marker_name(&self) -> Option<&str> {
        match self {
            FieldType::Value { .. } => None,
            FieldType::Group { marker_name, .. } | FieldType::Frame { marker_name, .. } => {
                Some(marker_name)
            }
        }
    }

    pub fn to_nullable(&self) -> Self {
        self.with_nullability(true)
    }

    pub fn to_not_nullable(&self) -> Self {
        self.with_nullability(false)
    }

    fn with_nullability(&self, nullable: bool) -> Self {
        if self.marker_name() == Some(WILDCARD) {
            return self.clone();
        }
        let mut ty = self.clone();
        match &mut ty {
            FieldType::Value { nullable: n, .. }
            | FieldType::Group { nullable: n, .. }
            | FieldType::Frame { nullable: n, .. } => *n = nullable,
        }
        ty
    }

    /// Value type name with its `?` suffix.
    pub fn value_type_name(&self) -> Option<String> {
        match self {
            FieldType::Value {
                type_name,
                nullable,
            } => Some(if *nullable {
                format!("{type_name}?")
            } else {
                type_name.clone()
            }),
            _ => None,
        }
    }
}

/// One field of a marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub field_name: ValidFieldName,
    /// Raw column name in the data.
    pub column_name: String,
    pub field_type: FieldType,
    /// Re-declares an inherited field with a narrower type.
    #[serde(default)]
    pub overrides: bool,
    /// Shape of the column this field was synthesized from.
    pub column_schema: ColumnSchema,
}

impl Field {
    /// A scalar field whose identifier is the column name.
    pub fn value(column_name: impl Into<String>, ty: ValueType) -> Self {
        let column_name = column_name.into();
        Self {
            field_name: ValidFieldName::of(&column_name),
            column_name,
            field_type: FieldType::value(&ty),
            overrides: false,
            column_schema: ColumnSchema::Value(ty),
        }
    }

    /// A group field typed by `marker`.
    pub fn group(column_name: impl Into<String>, marker: &Marker, nullable: bool) -> Self {
        let column_name = column_name.into();
        Self {
            field_name: ValidFieldName::of(&column_name),
            column_name,
            field_type: FieldType::Group {
                marker_name: marker.name().to_string(),
                nullable,
            },
            overrides: false,
            column_schema: ColumnSchema::Group {
                schema: marker.schema(),
                nullable,
            },
        }
    }

    /// A frame field typed by `marker`.
    pub fn frame(column_name: impl Into<String>, marker: &Marker, nullable: bool) -> Self {
        let column_name = column_name.into();
        Self {
            field_name: ValidFieldName::of(&column_name),
            column_name,
            field_type: FieldType::Frame {
                marker_name: marker.name().to_string(),
                nullable,
            },
            overrides: false,
            column_schema: ColumnSchema::Frame {
                schema: marker.schema(),
                nullable,
                elements_nullable: false,
            },
        }
    }

    /// A group field accepting any nested shape.
    pub fn any_group(column_name: impl Into<String>, nullable: bool) -> Self {
        let column_name = column_name.into();
        Self {
            field_name: ValidFieldName::of(&column_name),
            column_name,
            field_type: FieldType::Group {
                marker_name: WILDCARD.to_string(),
                nullable,
            },
            overrides: false,
            column_schema: ColumnSchema::Group {
                schema: Schema::new(),
                nullable,
            },
        }
    }

    /// Builder-style identifier override.
    pub fn named(mut self, field_name: ValidFieldName) -> Self {
        self.field_name = field_name;
        self
    }

    pub fn is_wildcard(&self) -> bool {
        self.field_type.marker_name() == Some(WILDCARD)
    }

    /// Whether a column shaped like `column` can be viewed through this field.
    pub fn accepts(&self, column: &ColumnSchema) -> bool {
        if self.is_wildcard() {
            let nullability_ok = self.field_type.is_nullable() || !column.is_nullable();
            let kind_ok = matches!(
                (&self.field_type, column),
                (FieldType::Group { .. }, ColumnSchema::Group { .. })
                    | (FieldType::Frame { .. }, ColumnSchema::Frame { .. })
            );
            return nullability_ok && kind_ok;
        }
        self.column_schema.is_super_or_equal(column)
    }
}

fn default_open() -> bool {
    true
}

/// A named structural type.
///
/// Markers form a DAG through `super_markers`; fields are inherited from
/// every ancestor and an own field shadows an inherited one with the same
/// identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    name: String,
    #[serde(default)]
    own_fields: Vec<Field>,
    #[serde(default)]
    super_markers: Vec<Arc<Marker>>,
    #[serde(default = "default_open")]
    is_open: bool,
    #[serde(default)]
    visibility: MarkerVisibility,
}

impl Marker {
    /// Build and validate a marker.
    pub fn new(
        name: impl Into<String>,
        own_fields: Vec<Field>,
        super_markers: Vec<Arc<Marker>>,
        is_open: bool,
        visibility: MarkerVisibility,
    ) -> Result<Self> {
        let marker = Self {
            name: name.into(),
            own_fields,
            super_markers,
            is_open,
            visibility,
        };
        marker.validate()?;
        Ok(marker)
    }

    /// Check acyclicity and identifier uniqueness.
    ///
    /// Deserialized markers are not validated until this is called.
    pub fn validate(&self) -> Result<()> {
        let mut path = vec![self.name.as_str()];
        check_acyclic(self, &mut path)?;

        let mut own = HashSet::new();
        for field in &self.own_fields {
            if !own.insert(field.field_name.identifier()) {
                return Err(self.conflict(field));
            }
        }
        let mut inherited = HashSet::new();
        for parent in &self.super_markers {
            for field in parent.all_fields() {
                inherited.insert(field.field_name.identifier().to_string());
            }
        }
        for field in &self.own_fields {
            if !field.overrides && inherited.contains(field.field_name.identifier()) {
                return Err(self.conflict(field));
            }
        }
        Ok(())
    }

    fn conflict(&self, field: &Field) -> GenerateError {
        GenerateError::NamingConflict {
            scope: self.name.clone(),
            identifier: field.field_name.identifier().to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last segment of a qualified name.
    pub fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn own_fields(&self) -> &[Field] {
        &self.own_fields
    }

    pub fn super_markers(&self) -> &[Arc<Marker>] {
        &self.super_markers
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn visibility(&self) -> MarkerVisibility {
        self.visibility
    }

    /// Own fields followed by inherited ones, one per identifier.
    pub fn all_fields(&self) -> Vec<&Field> {
        let mut seen = HashSet::new();
        let mut fields = Vec::new();
        self.collect_fields(&mut seen, &mut fields);
        fields
    }

    fn collect_fields<'a>(&'a self, seen: &mut HashSet<&'a str>, out: &mut Vec<&'a Field>) {
        for field in &self.own_fields {
            if seen.insert(field.field_name.identifier()) {
                out.push(field);
            }
        }
        for parent in &self.super_markers {
            parent.collect_fields(seen, out);
        }
    }

    /// Field bound to the given column, own or inherited.
    pub fn get_field(&self, column_name: &str) -> Option<&Field> {
        self.all_fields()
            .into_iter()
            .find(|field| field.column_name == column_name)
    }

    /// The column shapes this marker describes.
    pub fn schema(&self) -> Schema {
        self.all_fields()
            .into_iter()
            .map(|field| (field.column_name.clone(), field.column_schema.clone()))
            .collect()
    }

    /// Every ancestor, nearest first, without duplicates.
    pub fn all_super_markers(&self) -> Vec<Arc<Marker>> {
        let mut visited: HashSet<&str> = HashSet::from([self.name.as_str()]);
        let mut out: Vec<Arc<Marker>> = Vec::new();
        let mut queue: Vec<&Arc<Marker>> = self.super_markers.iter().collect();
        let mut next = 0;
        while next < queue.len() {
            let marker = queue[next];
            next += 1;
            if !visited.insert(marker.name()) {
                continue;
            }
            out.push(Arc::clone(marker));
            queue.extend(marker.super_markers.iter());
        }
        out
    }

    /// `self` is `other` or one of its descendants, compared by name.
    pub fn implements(&self, other: &Marker) -> bool {
        self.name == other.name
            || self
                .all_super_markers()
                .iter()
                .any(|parent| parent.name == other.name)
    }

    /// Every field has an accepting column in `schema`.
    pub fn accepts(&self, schema: &Schema) -> bool {
        self.all_fields().into_iter().all(|field| {
            schema
                .get(&field.column_name)
                .is_some_and(|column| field.accepts(column))
        })
    }
}

fn check_acyclic<'a>(marker: &'a Marker, path: &mut Vec<&'a str>) -> Result<()> {
    for parent in &marker.super_markers {
        if path.contains(&parent.name()) {
            return Err(GenerateError::CycleDetected {
                marker: parent.name.clone(),
            });
        }
        path.push(parent.name());
        check_acyclic(parent, path)?;
        path.pop();
    }
    Ok(())
}
