//! Session store of markers available for reuse and inheritance.

use crate::error::Result;
use crate::marker::Marker;
use crate::naming::UniqueNameGenerator;
use crate::schema::Schema;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Markers visible to one generation session.
///
/// Iteration order is the tie-break order: known markers as supplied, then
/// their ancestors, then markers synthesized in this session.
#[derive(Debug, Default)]
pub struct MarkerRegistry {
    markers: Vec<Arc<Marker>>,
    generated: Vec<Arc<Marker>>,
    by_signature: HashMap<Schema, Arc<Marker>>,
    names: UniqueNameGenerator,
}

impl MarkerRegistry {
    /// Validate `known` and register it together with its ancestor closure.
    pub fn new(known: &[Arc<Marker>]) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut markers = Vec::new();
        for marker in known {
            marker.validate()?;
            if seen.insert(marker.name().to_string()) {
                markers.push(Arc::clone(marker));
            }
        }
        for marker in known {
            for parent in marker.all_super_markers() {
                if seen.insert(parent.name().to_string()) {
                    markers.push(parent);
                }
            }
        }
        let names = UniqueNameGenerator::with_reserved(markers.iter().map(|m| m.short_name()));
        tracing::debug!(known = markers.len(), "marker registry initialized");
        Ok(Self {
            markers,
            generated: Vec::new(),
            by_signature: HashMap::new(),
            names,
        })
    }

    /// Every registered marker in tie-break order.
    pub fn markers(&self) -> &[Arc<Marker>] {
        &self.markers
    }

    /// Markers synthesized in this session, in declaration order.
    pub fn generated(&self) -> &[Arc<Marker>] {
        &self.generated
    }

    pub fn find(&self, name: &str) -> Option<&Arc<Marker>> {
        self.markers.iter().find(|m| m.name() == name)
    }

    /// Marker previously produced for exactly this schema.
    pub fn lookup_signature(&self, schema: &Schema) -> Option<&Arc<Marker>> {
        self.by_signature.get(schema)
    }

    pub fn allocate_name(&mut self, prefix: &str) -> String {
        self.names.add_unique(prefix)
    }

    /// Add a freshly synthesized marker.
    pub fn register(&mut self, marker: Arc<Marker>) {
        self.generated.push(Arc::clone(&marker));
        self.markers.push(marker);
    }

    /// Memoize the marker chosen for `schema`.
    pub fn remember(&mut self, schema: Schema, marker: Arc<Marker>) {
        self.by_signature.insert(schema, marker);
    }

    pub fn into_generated(self) -> Vec<Arc<Marker>> {
        self.generated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::{Field, MarkerVisibility};
    use crate::schema::ValueType;

    fn marker(name: &str, supers: Vec<Arc<Marker>>) -> Arc<Marker> {
        Arc::new(
            Marker::new(
                name,
                vec![Field::value(name.to_lowercase(), ValueType::new("kotlin.Int"))],
                supers,
                true,
                MarkerVisibility::ImplicitPublic,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_closure_follows_supplied_order() {
        let base = marker("Base", vec![]);
        let child = marker("Child", vec![Arc::clone(&base)]);
        let other = marker("Other", vec![]);
        let registry = MarkerRegistry::new(&[child, other]).unwrap();
        let names: Vec<_> = registry.markers().iter().map(|m| m.name()).collect();
        assert_eq!(names, ["Child", "Other", "Base"]);
        assert!(registry.find("Base").is_some());
        assert!(registry.generated().is_empty());
    }

    #[test]
    fn test_known_short_names_are_reserved() {
        let known = marker("org.example.Type", vec![]);
        let mut registry = MarkerRegistry::new(&[known]).unwrap();
        assert_eq!(registry.allocate_name("Type"), "Type1");
        assert_eq!(registry.allocate_name("Other"), "Other");
    }
}
