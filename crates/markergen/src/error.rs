//! Errors raised while synthesizing markers and rendering declarations.

use crate::options::GenerationMode;

/// Result alias used throughout the crate.
pub type Result<T, E = GenerateError> = std::result::Result<T, E>;

/// Fatal errors of a single `generate` call.
///
/// No partial output is produced when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    /// A super-marker chain leads back to the marker itself.
    #[error("marker `{marker}` is its own ancestor")]
    CycleDetected { marker: String },

    /// Two fields (or two accessor bindings) of the same scope share an identifier.
    #[error("identifier `{identifier}` is declared more than once in `{scope}`")]
    NamingConflict { scope: String, identifier: String },

    /// The column name and its normalized form are both blank.
    #[error("column {column:?} normalizes to an empty identifier")]
    EmptyIdentifier { column: String },

    /// The requested generation mode cannot be applied.
    #[error("{mode:?} mode is not supported: {reason}")]
    UnsupportedMode {
        mode: GenerationMode,
        reason: String,
    },
}
