//! Marker type and accessor synthesis for typed data frames.
//!
//! `markergen` turns a tree of named columns into a minimal set of named
//! structural types ("markers"), renders them as Kotlin DataFrame
//! declarations, and produces the cast that puts a value under the root type.
//!
//! # Architecture
//!
//! ```text
//! Input                 Synthesis                     Output
//! ─────────────     ─────────────────────     ─────────────────────────
//! Schema        ─┐                          ┌─> @DataSchema interfaces
//! known markers ─┼─> SchemaProcessor ───────┼─> extension accessors
//! options       ─┘   (registry + naming)    └─> cast<Marker>() template
//! ```
//!
//! Structurally equal subtrees share one marker, known open markers that
//! accept a shape become its super markers, and every generated name is
//! unique within the call.
//!
//! # Example
//!
//! ```
//! use markergen::{ColumnSchema, GenerateOptions, Schema, generate};
//!
//! let schema = Schema::new()
//!     .with("name", ColumnSchema::value("kotlin.String"))
//!     .with("age", ColumnSchema::value("kotlin.Int"));
//!
//! let result = generate(&schema, &GenerateOptions::new("Person")).unwrap();
//! assert!(result.code.declarations.contains("interface Person {"));
//! assert_eq!(result.code.cast("df"), "df.cast<Person>()");
//! ```

pub mod cache;
pub mod converter;
pub mod error;
pub mod keywords;
pub mod marker;
pub mod naming;
pub mod options;
pub mod output;
pub mod processor;
pub mod read_method;
pub mod registry;
pub mod repl;
pub mod schema;
pub mod traits;

pub use cache::MarkerCache;
pub use converter::{CodeGenResult, CodeWithConverter, TypeCast};
pub use error::{GenerateError, Result};
pub use marker::{Field, FieldType, Marker, MarkerVisibility, WILDCARD};
pub use naming::{NameNormalizer, UniqueNameGenerator, ValidFieldName};
pub use options::{GenerateOptions, GenerationMode, NameConflictPolicy, TypeNames};
pub use output::{CodeGenerator, FqNames, ShortNames};
pub use processor::SchemaProcessor;
pub use read_method::{DefaultReadMethod, MethodArguments};
pub use registry::MarkerRegistry;
pub use repl::{PropertyBinding, ReplCodeGenerator};
pub use schema::{ColumnSchema, Schema, ValueType};
pub use traits::{ReadMethod, TypeRendering};

/// Synthesize and render markers for `schema` in a fresh session.
pub fn generate(schema: &Schema, options: &GenerateOptions) -> Result<CodeGenResult> {
    CodeGenerator::new(options.type_rendering).generate(schema, options)
}
