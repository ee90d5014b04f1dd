//! Incremental generation for interactive sessions.
//!
//! Each evaluated cell may produce a frame whose shape needs declarations.
//! The generator remembers markers the user has compiled (via
//! [`ReplCodeGenerator::register`]) and passes them as known markers to every
//! later cell, so derived frames extend existing types instead of
//! duplicating them.

use crate::converter::{CodeWithConverter, TypeCast};
use crate::error::Result;
use crate::marker::{Marker, MarkerVisibility};
use crate::options::{GenerateOptions, GenerationMode, TypeNames};
use crate::output::CodeGenerator;
use crate::schema::{ColumnSchema, Schema};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Name prefix of markers generated for cell results.
pub const MARKER_PREFIX: &str = "_DataFrameType";

const INSTANT_TYPE: &str = "kotlin.time.Instant";
const INSTANT_OPT_IN: &str = "@file:OptIn(kotlin.time.ExperimentalTime::class)";

/// A session variable a frame is assigned to.
#[derive(Debug, Clone)]
pub struct PropertyBinding {
    pub name: String,
    /// Marker the variable is declared with, if any.
    pub marker: Option<Arc<Marker>>,
}

impl PropertyBinding {
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            marker: None,
        }
    }

    pub fn typed(name: impl Into<String>, marker: Arc<Marker>) -> Self {
        Self {
            name: name.into(),
            marker: Some(marker),
        }
    }
}

/// Keeps markers across cells of one interactive session.
#[derive(Debug)]
pub struct ReplCodeGenerator {
    registered_properties: HashSet<String>,
    registered_markers: Vec<Arc<Marker>>,
    /// Markers emitted by earlier cells that the user has not compiled yet.
    generated_markers: HashMap<String, Arc<Marker>>,
    generator: CodeGenerator,
}

impl Default for ReplCodeGenerator {
    fn default() -> Self {
        Self {
            registered_properties: HashSet::new(),
            registered_markers: Vec::new(),
            generated_markers: HashMap::new(),
            generator: CodeGenerator::new(TypeNames::Short),
        }
    }
}

impl ReplCodeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registered_markers(&self) -> &[Arc<Marker>] {
        &self.registered_markers
    }

    fn find_registered(&self, name: &str) -> Option<Arc<Marker>> {
        self.registered_markers
            .iter()
            .find(|marker| marker.name() == name)
            .cloned()
    }

    /// Declarations and cast for a cell result assigned to `property`.
    ///
    /// Returns empty code when the property is already typed with an open
    /// marker that matches the frame.
    pub fn process(
        &mut self,
        schema: &Schema,
        property: Option<&PropertyBinding>,
    ) -> Result<CodeWithConverter> {
        let mut target = Cow::Borrowed(schema);

        if let Some(property) = property {
            let processed_before = !self.registered_properties.insert(property.name.clone());
            let current = property
                .marker
                .as_ref()
                .map(|marker| self.find_registered(marker.name()).unwrap_or_else(|| Arc::clone(marker)));
            if let Some(current) = current.filter(|marker| marker.is_open()) {
                let marker_schema = current.schema();
                // After the first assignment the variable may hold a more general type.
                if processed_before || marker_schema == *schema {
                    let required: Vec<&Arc<Marker>> = self
                        .registered_markers
                        .iter()
                        .filter(|marker| marker.is_open() && marker.accepts(&marker_schema))
                        .collect();
                    if !required.is_empty() && required.iter().all(|r| current.implements(r)) {
                        tracing::debug!(
                            property = %property.name,
                            marker = current.name(),
                            "property already typed"
                        );
                        return Ok(CodeWithConverter::empty());
                    }
                    target = Cow::Owned(marker_schema);
                }
            }
        }

        self.generate(&target, MARKER_PREFIX, true)
    }

    /// Closed key and group markers for a grouped frame.
    pub fn process_group_by(&mut self, keys: &Schema, groups: &Schema) -> Result<CodeWithConverter> {
        let keys = self.generate(keys, &format!("{MARKER_PREFIX}Keys"), false)?;
        let groups = self.generate(groups, &format!("{MARKER_PREFIX}Groups"), false)?;

        let mut types = cast_targets(&keys.converter);
        types.extend(cast_targets(&groups.converter));
        Ok(CodeWithConverter {
            declarations: format!("{}\n{}", keys.declarations, groups.declarations),
            converter: TypeCast::Markers(types),
        })
    }

    fn generate(&mut self, schema: &Schema, name: &str, is_open: bool) -> Result<CodeWithConverter> {
        let options = GenerateOptions {
            name_prefix: name.to_string(),
            known_markers: self.registered_markers.clone(),
            is_open,
            visibility: MarkerVisibility::ImplicitPublic,
            mode: GenerationMode::WithFields,
            include_accessors: true,
            type_rendering: TypeNames::Short,
            ..GenerateOptions::default()
        };
        let result = self.generator.generate(schema, &options)?;
        for marker in &result.new_markers {
            self.generated_markers
                .insert(marker.name().to_string(), Arc::clone(marker));
        }

        let mut code = result.code;
        if has_instant(schema) {
            code.declarations = format!("{INSTANT_OPT_IN}\n{}", code.declarations);
        }
        Ok(code)
    }

    /// Register a marker the user declared and compiled.
    ///
    /// A marker that replaces a generated one (same short name, same super
    /// markers) adopts its fields silently. Otherwise the marker and any new
    /// ancestors are registered and their accessors returned.
    pub fn register(&mut self, marker: &Arc<Marker>) -> Result<String> {
        let mut new_markers = Vec::new();
        self.resolve(marker, &mut new_markers)?;
        self.generator
            .generate_markers(&new_markers, GenerationMode::None, true)
    }

    fn resolve(&mut self, marker: &Arc<Marker>, new_markers: &mut Vec<Arc<Marker>>) -> Result<Arc<Marker>> {
        if let Some(existing) = self.find_registered(marker.name()) {
            return Ok(existing);
        }

        if let Some(temp) = self.generated_markers.get(marker.short_name()).cloned() {
            let mut declared: Vec<&str> =
                marker.super_markers().iter().map(|m| m.short_name()).collect();
            declared.sort_unstable();
            let mut generated: Vec<&str> =
                temp.super_markers().iter().map(|m| m.short_name()).collect();
            generated.sort_unstable();

            if declared == generated {
                let supers = marker
                    .super_markers()
                    .iter()
                    .map(|parent| self.resolve(parent, new_markers))
                    .collect::<Result<Vec<_>>>()?;
                let adopted = Arc::new(Marker::new(
                    marker.name(),
                    temp.own_fields().to_vec(),
                    supers,
                    temp.is_open(),
                    MarkerVisibility::ImplicitPublic,
                )?);
                tracing::debug!(marker = adopted.name(), replaces = temp.name(), "adopted generated marker");
                self.generated_markers.remove(temp.name());
                self.registered_markers.push(Arc::clone(&adopted));
                return Ok(adopted);
            }
        }

        marker.validate()?;
        tracing::debug!(marker = marker.name(), "registered declared marker");
        self.registered_markers.push(Arc::clone(marker));
        new_markers.push(Arc::clone(marker));
        Ok(Arc::clone(marker))
    }
}

fn cast_targets(cast: &TypeCast) -> Vec<String> {
    match cast {
        TypeCast::Markers(types) => types.clone(),
        TypeCast::None => Vec::new(),
    }
}

fn has_instant(schema: &Schema) -> bool {
    schema.iter().any(|(_, column)| match column {
        ColumnSchema::Value(ty) => ty.name == INSTANT_TYPE,
        ColumnSchema::Group { schema, .. } | ColumnSchema::Frame { schema, .. } => has_instant(schema),
    })
}
