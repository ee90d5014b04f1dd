//! Marker synthesis: schema tree in, deduplicated marker graph out.

use crate::error::{GenerateError, Result};
use crate::marker::{Field, FieldType, Marker, MarkerVisibility};
use crate::naming::{NameNormalizer, UniqueNameGenerator, ValidFieldName};
use crate::options::{GenerateOptions, NameConflictPolicy};
use crate::registry::MarkerRegistry;
use crate::schema::{ColumnSchema, Schema};
use std::collections::HashMap;
use std::sync::Arc;

/// One synthesis session.
///
/// Every schema processed through the same session shares its registry, so
/// structurally equal subtrees map to one marker and generated names never
/// collide.
#[derive(Debug)]
pub struct SchemaProcessor {
    registry: MarkerRegistry,
    normalizer: NameNormalizer,
    policy: NameConflictPolicy,
}

impl SchemaProcessor {
    pub fn new(known_markers: &[Arc<Marker>]) -> Result<Self> {
        Ok(Self {
            registry: MarkerRegistry::new(known_markers)?,
            normalizer: NameNormalizer::identity(),
            policy: NameConflictPolicy::default(),
        })
    }

    pub fn from_options(options: &GenerateOptions) -> Result<Self> {
        Ok(Self::new(&options.known_markers)?
            .with_normalizer(options.field_name_normalizer.clone())
            .with_policy(options.name_conflict_policy))
    }

    pub fn with_normalizer(mut self, normalizer: NameNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_policy(mut self, policy: NameConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn registry(&self) -> &MarkerRegistry {
        &self.registry
    }

    /// Markers created so far, referenced markers before referrers.
    pub fn generated_markers(&self) -> &[Arc<Marker>] {
        self.registry.generated()
    }

    pub fn into_generated(self) -> Vec<Arc<Marker>> {
        self.registry.into_generated()
    }

    /// Find or synthesize the marker for `schema`.
    ///
    /// `name` is the proposed marker name; it is also the prefix for markers
    /// of nested groups and frames.
    pub fn process(
        &mut self,
        schema: &Schema,
        name: &str,
        is_open: bool,
        visibility: MarkerVisibility,
    ) -> Result<Arc<Marker>> {
        if let Some(marker) = self.registry.lookup_signature(schema) {
            tracing::debug!(marker = marker.name(), "schema seen before in this session");
            return Ok(Arc::clone(marker));
        }

        let required = self.required_markers(schema);
        if let Some(existing) = self.find_existing(schema, &required, is_open) {
            tracing::debug!(marker = existing.name(), "reusing existing marker");
            self.registry.remember(schema.clone(), Arc::clone(&existing));
            return Ok(existing);
        }

        let marker_name = self.registry.allocate_name(name);
        let supers = only_leaves(required);
        if !supers.is_empty() {
            tracing::debug!(
                marker = %marker_name,
                supers = ?supers.iter().map(|m| m.name()).collect::<Vec<_>>(),
                "linking to super markers"
            );
        }
        let fields = self.generate_fields(&marker_name, schema, &supers, name, is_open, visibility)?;
        let marker = Arc::new(Marker::new(
            marker_name,
            fields,
            supers,
            is_open,
            visibility,
        )?);
        tracing::debug!(
            marker = marker.name(),
            own_fields = marker.own_fields().len(),
            "synthesized marker"
        );
        self.registry.register(Arc::clone(&marker));
        self.registry.remember(schema.clone(), Arc::clone(&marker));
        Ok(marker)
    }

    /// Open markers whose every field accepts the matching column, most
    /// specific first, ties in registry order.
    fn required_markers(&self, schema: &Schema) -> Vec<Arc<Marker>> {
        let mut required: Vec<Arc<Marker>> = self
            .registry
            .markers()
            .iter()
            .filter(|marker| marker.is_open() && marker.accepts(schema))
            .cloned()
            .collect();
        required.sort_by_key(|marker| std::cmp::Reverse(marker.all_fields().len()));
        required
    }

    fn find_existing(
        &self,
        schema: &Schema,
        required: &[Arc<Marker>],
        is_open: bool,
    ) -> Option<Arc<Marker>> {
        self.registry
            .markers()
            .iter()
            .find(|marker| {
                (marker.is_open() || !is_open)
                    && required.iter().all(|r| marker.implements(r))
                    && marker.schema() == *schema
            })
            .cloned()
    }

    /// The type of a column, synthesizing nested markers as needed.
    pub fn resolve(
        &mut self,
        column: &ColumnSchema,
        name: &str,
        is_open: bool,
        visibility: MarkerVisibility,
    ) -> Result<FieldType> {
        Ok(match column {
            ColumnSchema::Value(ty) => FieldType::value(ty),
            ColumnSchema::Group { schema, nullable } => {
                let nested = self.process(schema, name, is_open, visibility)?;
                FieldType::Group {
                    marker_name: nested.name().to_string(),
                    nullable: *nullable,
                }
            }
            ColumnSchema::Frame { nullable, .. } => {
                let nested_schema = column
                    .nested_schema()
                    .map(|schema| schema.into_owned())
                    .unwrap_or_default();
                let nested = self.process(&nested_schema, name, is_open, visibility)?;
                FieldType::Frame {
                    marker_name: nested.name().to_string(),
                    nullable: *nullable,
                }
            }
        })
    }

    fn generate_fields(
        &mut self,
        scope: &str,
        schema: &Schema,
        supers: &[Arc<Marker>],
        name: &str,
        is_open: bool,
        visibility: MarkerVisibility,
    ) -> Result<Vec<Field>> {
        let mut inherited: HashMap<&str, &Field> = HashMap::new();
        for parent in supers {
            for field in parent.all_fields() {
                inherited.entry(field.column_name.as_str()).or_insert(field);
            }
        }
        let mut identifiers = UniqueNameGenerator::with_reserved(
            inherited
                .values()
                .map(|field| field.field_name.identifier().to_string()),
        );

        let mut fields = Vec::new();
        for (column_name, column) in schema {
            let field_type = self.resolve(column, name, is_open, visibility)?;
            let (field_name, overrides) = match inherited.get(column_name.as_str()) {
                Some(parent) if parent.field_type == field_type => continue,
                Some(parent) => (parent.field_name.clone(), true),
                None => (self.field_name(scope, column_name, &mut identifiers)?, false),
            };
            fields.push(Field {
                field_name,
                column_name: column_name.clone(),
                field_type,
                overrides,
                column_schema: column.clone(),
            });
        }
        Ok(fields)
    }

    fn field_name(
        &self,
        scope: &str,
        column_name: &str,
        identifiers: &mut UniqueNameGenerator,
    ) -> Result<ValidFieldName> {
        let normalized = self.normalizer.normalize(column_name);
        let source = if normalized.trim().is_empty() {
            column_name
        } else {
            normalized.as_str()
        };
        if source.trim().is_empty() {
            return Err(GenerateError::EmptyIdentifier {
                column: column_name.to_string(),
            });
        }

        let name = ValidFieldName::of(source);
        if identifiers.reserve(name.identifier()) {
            return Ok(name);
        }
        match self.policy {
            NameConflictPolicy::Fail => Err(GenerateError::NamingConflict {
                scope: scope.to_string(),
                identifier: name.identifier().to_string(),
            }),
            NameConflictPolicy::Suffix => {
                let unique = identifiers.add_unique(name.identifier());
                Ok(name.with_identifier(unique))
            }
        }
    }
}

/// Drop markers that another candidate already implements.
fn only_leaves(candidates: Vec<Arc<Marker>>) -> Vec<Arc<Marker>> {
    candidates
        .iter()
        .filter(|marker| {
            !candidates
                .iter()
                .any(|other| other.name() != marker.name() && other.implements(marker))
        })
        .cloned()
        .collect()
}
