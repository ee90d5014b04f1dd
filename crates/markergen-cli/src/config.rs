//! Configuration system for markergen.
//!
//! Loads config from:
//! 1. Global: ~/.config/markergen/config.toml
//! 2. Per-project: .markergen/config.toml (overrides global)
//!
//! Example config.toml:
//! ```toml
//! [generate]
//! name_prefix = "Row"
//! visibility = "internal"
//! type_names = "short"
//! name_delimiters = "_ -"
//! package = "org.example.schema"
//! ```

use markergen::{GenerationMode, MarkerVisibility, NameConflictPolicy, TypeNames};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Defaults for `markergen generate`. Unset keys fall through to the
/// next layer (global config, then built-in defaults).
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct GenerateConfig {
    pub name_prefix: Option<String>,
    pub open: Option<bool>,
    pub visibility: Option<MarkerVisibility>,
    pub mode: Option<GenerationMode>,
    pub accessors: Option<bool>,
    /// Emit nullable-receiver accessors for every marker.
    pub nullable_accessors: Option<bool>,
    pub type_names: Option<TypeNames>,
    /// Characters that split column names before camelCasing.
    pub name_delimiters: Option<String>,
    pub on_name_conflict: Option<NameConflictPolicy>,
    pub package: Option<String>,
    /// Extra import lines appended to the standalone snippet.
    pub imports: Option<Vec<String>>,
    /// Reader function for the generated companion factory, e.g. `readCsv`.
    pub read_method: Option<String>,
    pub default_path: Option<String>,
}

impl GenerateConfig {
    fn merge(self, other: Self) -> Self {
        Self {
            name_prefix: other.name_prefix.or(self.name_prefix),
            open: other.open.or(self.open),
            visibility: other.visibility.or(self.visibility),
            mode: other.mode.or(self.mode),
            accessors: other.accessors.or(self.accessors),
            nullable_accessors: other.nullable_accessors.or(self.nullable_accessors),
            type_names: other.type_names.or(self.type_names),
            name_delimiters: other.name_delimiters.or(self.name_delimiters),
            on_name_conflict: other.on_name_conflict.or(self.on_name_conflict),
            package: other.package.or(self.package),
            imports: other.imports.or(self.imports),
            read_method: other.read_method.or(self.read_method),
            default_path: other.default_path.or(self.default_path),
        }
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct MarkergenConfig {
    pub generate: GenerateConfig,
}

impl MarkergenConfig {
    /// Load configuration for a project.
    ///
    /// Loads global config from ~/.config/markergen/config.toml,
    /// then merges with per-project config from .markergen/config.toml.
    pub fn load(root: &Path) -> Self {
        Self::load_layers(Self::global_config_path().as_deref(), root)
    }

    fn load_layers(global: Option<&Path>, root: &Path) -> Self {
        let mut config = Self::default();

        if let Some(global) = global.and_then(Self::load_file) {
            config = config.merge(global);
        }

        let project_path = root.join(".markergen").join("config.toml");
        if let Some(project) = Self::load_file(&project_path) {
            config = config.merge(project);
        }

        config
    }

    /// Get the global config path.
    fn global_config_path() -> Option<PathBuf> {
        let config_home = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))?;
        Some(config_home.join("markergen").join("config.toml"))
    }

    /// Load config from a file path. Missing files are skipped silently,
    /// malformed ones with a warning.
    fn load_file(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded config");
                Some(config)
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), "ignoring invalid config: {err}");
                None
            }
        }
    }

    /// Keys set in `other` win; unset keys keep the value from `self`.
    fn merge(self, other: Self) -> Self {
        Self {
            generate: self.generate.merge(other.generate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(path: &Path, body: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut file = std::fs::File::create(path).unwrap();
        writeln!(file, "{body}").unwrap();
    }

    #[test]
    fn test_missing_files_give_defaults() {
        let dir = TempDir::new().unwrap();
        let config = MarkergenConfig::load_layers(None, dir.path());
        assert_eq!(config, MarkergenConfig::default());
    }

    #[test]
    fn test_load_project_config() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir.path().join(".markergen").join("config.toml"),
            r#"
[generate]
name_prefix = "Row"
visibility = "internal"
mode = "no_fields"
type_names = "short"
on_name_conflict = "fail"
imports = ["import org.example.Extra"]
"#,
        );

        let config = MarkergenConfig::load_layers(None, dir.path()).generate;
        assert_eq!(config.name_prefix.as_deref(), Some("Row"));
        assert_eq!(config.visibility, Some(MarkerVisibility::Internal));
        assert_eq!(config.mode, Some(GenerationMode::NoFields));
        assert_eq!(config.type_names, Some(TypeNames::Short));
        assert_eq!(config.on_name_conflict, Some(NameConflictPolicy::Fail));
        assert_eq!(config.imports, Some(vec!["import org.example.Extra".to_string()]));
        assert_eq!(config.open, None);
    }

    #[test]
    fn test_project_overrides_global_per_key() {
        let dir = TempDir::new().unwrap();
        let global = dir.path().join("global").join("config.toml");
        write_config(
            &global,
            r#"
[generate]
name_prefix = "Global"
package = "org.example"
open = false
"#,
        );
        let project = dir.path().join("project");
        write_config(
            &project.join(".markergen").join("config.toml"),
            r#"
[generate]
name_prefix = "Local"
"#,
        );

        let config = MarkergenConfig::load_layers(Some(&global), &project).generate;
        assert_eq!(config.name_prefix.as_deref(), Some("Local"));
        assert_eq!(config.package.as_deref(), Some("org.example"));
        assert_eq!(config.open, Some(false));
    }

    #[test]
    fn test_invalid_config_is_ignored() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir.path().join(".markergen").join("config.toml"),
            "[generate]\nvisibility = \"protected\"",
        );
        let config = MarkergenConfig::load_layers(None, dir.path());
        assert_eq!(config, MarkergenConfig::default());
    }
}
