//! Options of a single generation call.

use crate::marker::{Marker, MarkerVisibility};
use crate::naming::NameNormalizer;
use crate::traits::ReadMethod;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What gets declared for each marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Interface header only.
    NoFields,
    /// Interface with one property per own field.
    #[default]
    WithFields,
    /// `enum class` whose entries are the field identifiers.
    Enum,
    /// `typealias` to the single super marker.
    TypeAlias,
    /// No declaration, accessors only.
    None,
}

impl GenerationMode {
    /// Modes usable when markers are synthesized from a schema.
    pub fn supports_schemas(self) -> bool {
        matches!(
            self,
            GenerationMode::NoFields | GenerationMode::WithFields | GenerationMode::None
        )
    }
}

/// What to do when two sibling columns normalize to the same identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameConflictPolicy {
    /// Append the smallest free numeric suffix.
    #[default]
    Suffix,
    /// Fail with `NamingConflict`.
    Fail,
}

/// Type spelling strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeNames {
    /// `org.jetbrains.kotlinx.dataframe.DataColumn<kotlin.Int>`
    #[default]
    Fq,
    /// `DataColumn<Int>`
    Short,
}

/// Inputs of [`generate`](crate::generate) besides the schema.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Proposed name of the root marker; nested markers get numeric suffixes.
    pub name_prefix: String,
    /// Markers that may be reused or extended.
    pub known_markers: Vec<Arc<Marker>>,
    pub field_name_normalizer: NameNormalizer,
    pub is_open: bool,
    pub visibility: MarkerVisibility,
    pub mode: GenerationMode,
    /// Emit container and row accessors.
    pub include_accessors: bool,
    /// Factory attached to the root interface body.
    pub read_method: Option<Arc<dyn ReadMethod>>,
    pub type_rendering: TypeNames,
    pub name_conflict_policy: NameConflictPolicy,
    /// Emit nullable-receiver accessors for every marker, not just those
    /// referenced nullably.
    pub always_nullable_accessors: bool,
}

impl GenerateOptions {
    pub fn new(name_prefix: impl Into<String>) -> Self {
        Self {
            name_prefix: name_prefix.into(),
            ..Self::default()
        }
    }

    pub fn with_known_markers(mut self, markers: impl IntoIterator<Item = Arc<Marker>>) -> Self {
        self.known_markers.extend(markers);
        self
    }
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            name_prefix: "DataType".to_string(),
            known_markers: Vec::new(),
            field_name_normalizer: NameNormalizer::identity(),
            is_open: true,
            visibility: MarkerVisibility::ImplicitPublic,
            mode: GenerationMode::WithFields,
            include_accessors: true,
            read_method: None,
            type_rendering: TypeNames::Fq,
            name_conflict_policy: NameConflictPolicy::Suffix,
            always_nullable_accessors: false,
        }
    }
}
