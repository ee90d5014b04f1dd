//! `markergen generate`: one generation call from serialized inputs.

use crate::config::{GenerateConfig, MarkergenConfig};
use anyhow::{Context, Result};
use clap::Args;
use markergen::{
    DefaultReadMethod, GenerateOptions, GenerationMode, Marker, MarkerVisibility,
    NameConflictPolicy, NameNormalizer, ReadMethod, Schema, TypeNames,
};
use serde::de::DeserializeOwned;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    /// Schema JSON file, or `-` for stdin
    pub schema: PathBuf,

    /// Name of the root marker
    #[arg(long)]
    pub name: Option<String>,

    /// JSON file with an array of known markers (repeatable)
    #[arg(long)]
    pub known: Vec<PathBuf>,

    /// Declare a property per field
    #[arg(long, overrides_with = "no_fields")]
    pub fields: bool,

    /// Declare interface headers only
    #[arg(long)]
    pub no_fields: bool,

    /// Emit only accessors, no interfaces
    #[arg(long, conflicts_with_all = ["fields", "no_fields"])]
    pub accessors_only: bool,

    /// Emit extension accessors
    #[arg(long, overrides_with = "no_accessors")]
    pub accessors: bool,

    #[arg(long)]
    pub no_accessors: bool,

    /// Generate open markers (`@DataSchema`)
    #[arg(long, overrides_with = "closed")]
    pub open: bool,

    /// Generate closed markers (`@DataSchema(isOpen = false)`)
    #[arg(long)]
    pub closed: bool,

    /// internal | implicit_public | explicit_public
    #[arg(long, value_parser = parse_keyword::<MarkerVisibility>)]
    pub visibility: Option<MarkerVisibility>,

    /// fq | short
    #[arg(long, value_parser = parse_keyword::<TypeNames>)]
    pub type_names: Option<TypeNames>,

    /// suffix | fail
    #[arg(long, value_parser = parse_keyword::<NameConflictPolicy>)]
    pub on_name_conflict: Option<NameConflictPolicy>,

    /// Characters that split column names before camelCasing, e.g. "_ -"
    #[arg(long)]
    pub delimiters: Option<String>,

    /// Emit nullable-receiver accessors for every marker
    #[arg(long)]
    pub nullable_accessors: bool,

    /// Attach a companion factory calling this reader, e.g. readCsv
    #[arg(long)]
    pub read_method: Option<String>,

    /// Default path argument of the companion factory
    #[arg(long)]
    pub default_path: Option<String>,

    /// Package of the generated file
    #[arg(long)]
    pub package: Option<String>,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Project root used to find .markergen/config.toml
    #[arg(long)]
    pub root: Option<PathBuf>,
}

/// Parse a CLI keyword with the same spelling the config file uses.
fn parse_keyword<T: DeserializeOwned>(s: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(s.to_string())).map_err(|e| e.to_string())
}

pub fn run(args: &GenerateArgs) -> Result<()> {
    let root = match &args.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("failed to determine current directory")?,
    };
    let config = MarkergenConfig::load(&root).generate;

    let schema: Schema = read_json(&args.schema)?;
    let mut known = Vec::new();
    for path in &args.known {
        let markers: Vec<Marker> = read_json(path)?;
        known.extend(markers.into_iter().map(Arc::new));
    }

    let options = build_options(args, &config, known);
    let result = markergen::generate(&schema, &options)
        .with_context(|| format!("failed to generate markers for {}", args.schema.display()))?;
    info!(markers = result.new_markers.len(), "generated markers");

    let mut imports = config.imports.clone().unwrap_or_default();
    if let Some(read_method) = &options.read_method {
        imports.extend(read_method.additional_imports());
    }
    let package = args
        .package
        .as_deref()
        .or(config.package.as_deref())
        .unwrap_or_default();
    let snippet = result.to_standalone_snippet(package, &imports);

    match &args.output {
        Some(path) => {
            std::fs::write(path, snippet)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "wrote declarations");
        }
        None => print!("{snippet}"),
    }
    Ok(())
}

/// Flags win over config, config wins over built-in defaults.
fn build_options(args: &GenerateArgs, config: &GenerateConfig, known: Vec<Arc<Marker>>) -> GenerateOptions {
    let defaults = GenerateOptions::default();

    let mode = if args.accessors_only {
        GenerationMode::None
    } else if args.no_fields {
        GenerationMode::NoFields
    } else if args.fields {
        GenerationMode::WithFields
    } else {
        config.mode.unwrap_or(defaults.mode)
    };

    let delimiters = args.delimiters.as_ref().or(config.name_delimiters.as_ref());
    let field_name_normalizer = match delimiters {
        Some(chars) => NameNormalizer::from_delimiters(chars.chars()),
        None => defaults.field_name_normalizer.clone(),
    };

    let read_method = args
        .read_method
        .as_ref()
        .or(config.read_method.as_ref())
        .map(|method| {
            let mut reader = DefaultReadMethod::new(method.as_str());
            if let Some(path) = args.default_path.as_ref().or(config.default_path.as_ref()) {
                reader = reader.with_default_path(path.as_str());
            }
            Arc::new(reader) as Arc<dyn ReadMethod>
        });

    GenerateOptions {
        name_prefix: args
            .name
            .clone()
            .or_else(|| config.name_prefix.clone())
            .unwrap_or(defaults.name_prefix),
        known_markers: known,
        field_name_normalizer,
        is_open: flag(args.open, args.closed).or(config.open).unwrap_or(defaults.is_open),
        visibility: args
            .visibility
            .or(config.visibility)
            .unwrap_or(defaults.visibility),
        mode,
        include_accessors: flag(args.accessors, args.no_accessors)
            .or(config.accessors)
            .unwrap_or(defaults.include_accessors),
        read_method,
        type_rendering: args
            .type_names
            .or(config.type_names)
            .unwrap_or(defaults.type_rendering),
        name_conflict_policy: args
            .on_name_conflict
            .or(config.on_name_conflict)
            .unwrap_or(defaults.name_conflict_policy),
        always_nullable_accessors: args.nullable_accessors
            || config.nullable_accessors.unwrap_or(defaults.always_nullable_accessors),
    }
}

/// Tri-state from a `--x` / `--no-x` pair.
fn flag(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (_, true) => Some(false),
        (true, false) => Some(true),
        (false, false) => None,
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    };
    serde_json::from_str(&content).with_context(|| format!("invalid JSON in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use markergen::ColumnSchema;
    use tempfile::TempDir;

    fn args(schema: &Path) -> GenerateArgs {
        GenerateArgs {
            schema: schema.to_path_buf(),
            ..GenerateArgs::default()
        }
    }

    #[test]
    fn test_flags_override_config() {
        let config = GenerateConfig {
            name_prefix: Some("FromConfig".into()),
            visibility: Some(MarkerVisibility::Internal),
            open: Some(true),
            mode: Some(GenerationMode::NoFields),
            ..GenerateConfig::default()
        };
        let mut args = args(Path::new("schema.json"));
        args.name = Some("FromFlag".into());
        args.closed = true;
        args.fields = true;

        let options = build_options(&args, &config, Vec::new());
        assert_eq!(options.name_prefix, "FromFlag");
        assert_eq!(options.visibility, MarkerVisibility::Internal);
        assert!(!options.is_open);
        assert_eq!(options.mode, GenerationMode::WithFields);
    }

    #[test]
    fn test_defaults_without_flags_or_config() {
        let options = build_options(&args(Path::new("-")), &GenerateConfig::default(), Vec::new());
        assert_eq!(options.name_prefix, "DataType");
        assert!(options.is_open);
        assert!(options.include_accessors);
        assert!(options.read_method.is_none());
        assert_eq!(options.type_rendering, TypeNames::Fq);
    }

    #[test]
    fn test_delimiters_build_normalizer() {
        let config = GenerateConfig {
            name_delimiters: Some("_".into()),
            ..GenerateConfig::default()
        };
        let options = build_options(&args(Path::new("-")), &config, Vec::new());
        assert_eq!(options.field_name_normalizer.normalize("first_name"), "firstName");
    }

    #[test]
    fn test_parse_keyword() {
        assert_eq!(
            parse_keyword::<MarkerVisibility>("explicit_public"),
            Ok(MarkerVisibility::ExplicitPublic)
        );
        assert!(parse_keyword::<TypeNames>("long").is_err());
    }

    #[test]
    fn test_run_writes_snippet() {
        let dir = TempDir::new().unwrap();
        let schema_path = dir.path().join("schema.json");
        let schema = Schema::new()
            .with("name", ColumnSchema::value("kotlin.String"))
            .with("age", ColumnSchema::value("kotlin.Int"));
        std::fs::write(&schema_path, serde_json::to_string(&schema).unwrap()).unwrap();

        let output = dir.path().join("Person.kt");
        let mut args = args(&schema_path);
        args.name = Some("Person".into());
        args.package = Some("org.example".into());
        args.type_names = Some(TypeNames::Short);
        args.output = Some(output.clone());
        args.root = Some(dir.path().to_path_buf());

        run(&args).unwrap();
        let written = std::fs::read_to_string(output).unwrap();
        assert!(written.starts_with("package org.example\n\n"));
        assert!(written.contains("@DataSchema\ninterface Person {\n    val age: Int\n    val name: String\n}"));
    }

    #[test]
    fn test_run_reports_missing_schema() {
        let dir = TempDir::new().unwrap();
        let mut args = args(&dir.path().join("missing.json"));
        args.root = Some(dir.path().to_path_buf());
        let err = run(&args).unwrap_err();
        assert!(format!("{err:#}").contains("missing.json"));
    }
}
