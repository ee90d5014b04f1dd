//! Kotlin DataFrame declaration syntax.

use crate::converter::{CodeGenResult, CodeWithConverter};
use crate::error::{GenerateError, Result};
use crate::marker::{Field, FieldType, Marker, WILDCARD};
use crate::options::{GenerateOptions, GenerationMode, TypeNames};
use crate::processor::SchemaProcessor;
use crate::schema::Schema;
use crate::traits::{ApiClass, ReadMethod, TypeRendering};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Which receiver an accessor is declared on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReceiverKind {
    Container,
    Row,
}

/// `@JvmName` bindings claimed during one rendering pass.
#[derive(Debug, Default)]
pub struct BindingTable {
    claimed: HashMap<(ReceiverKind, String), String>,
}

impl BindingTable {
    /// Claim `binding` for `owner`; a second claim of the same binding fails.
    pub fn claim(&mut self, kind: ReceiverKind, binding: &str, owner: &str) -> Result<()> {
        let key = (kind, binding.to_string());
        if let Some(previous) = self.claimed.get(&key) {
            tracing::debug!(binding, previous = %previous, owner, "accessor binding collision");
            return Err(GenerateError::NamingConflict {
                scope: owner.to_string(),
                identifier: binding.to_string(),
            });
        }
        self.claimed.insert(key, owner.to_string());
        Ok(())
    }
}

/// Renders markers as `@DataSchema` interfaces and extension accessors.
#[derive(Clone, Copy)]
pub struct CodeGenerator {
    rendering: &'static dyn TypeRendering,
    always_nullable_accessors: bool,
}

impl std::fmt::Debug for CodeGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeGenerator")
            .field("always_nullable_accessors", &self.always_nullable_accessors)
            .finish_non_exhaustive()
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new(TypeNames::Fq)
    }
}

impl CodeGenerator {
    pub fn new(type_names: TypeNames) -> Self {
        Self::with_rendering(type_names.renderer())
    }

    pub fn with_rendering(rendering: &'static dyn TypeRendering) -> Self {
        Self {
            rendering,
            always_nullable_accessors: false,
        }
    }

    /// Emit nullable-receiver accessors for every rendered marker.
    pub fn with_nullable_accessors(mut self, always: bool) -> Self {
        self.always_nullable_accessors = always;
        self
    }

    /// Synthesize markers for `schema` and render everything that was created.
    pub fn generate(&self, schema: &Schema, options: &GenerateOptions) -> Result<CodeGenResult> {
        if !options.mode.supports_schemas() {
            return Err(GenerateError::UnsupportedMode {
                mode: options.mode,
                reason: "synthesized markers render as interfaces or accessors only".to_string(),
            });
        }

        let mut processor = SchemaProcessor::from_options(options)?;
        let root = processor.process(
            schema,
            &options.name_prefix,
            options.is_open,
            options.visibility,
        )?;
        let generated = processor.into_generated();

        let always_nullable = self.always_nullable_accessors || options.always_nullable_accessors;
        let nullable_refs = nullable_references(&generated);
        let mut bindings = BindingTable::default();
        let mut declarations = Vec::new();
        for marker in &generated {
            if options.mode != GenerationMode::None {
                let read_method = options
                    .read_method
                    .as_deref()
                    .filter(|_| Arc::ptr_eq(marker, &root));
                declarations.push(self.render_interface(
                    marker,
                    options.mode == GenerationMode::WithFields,
                    read_method,
                ));
            }
            if options.include_accessors {
                let nullable = always_nullable || nullable_refs.contains(marker.name());
                let accessors = self.render_accessors(marker, nullable, &mut bindings)?;
                if !accessors.is_empty() {
                    declarations.push(accessors);
                }
            }
        }
        tracing::debug!(
            root = root.name(),
            new_markers = generated.len(),
            "rendered declarations"
        );

        Ok(CodeGenResult {
            code: CodeWithConverter::new(declarations.join("\n\n"), root.name()),
            new_markers: generated,
        })
    }

    /// Render one existing marker.
    pub fn generate_marker(
        &self,
        marker: &Marker,
        mode: GenerationMode,
        include_accessors: bool,
        read_method: Option<&dyn ReadMethod>,
    ) -> Result<CodeWithConverter> {
        let mut bindings = BindingTable::default();
        let declarations =
            self.render_marker(marker, mode, include_accessors, read_method, &mut bindings)?;
        Ok(CodeWithConverter::new(declarations, marker.name()))
    }

    /// Render several markers in one pass, sharing one binding table.
    pub fn generate_markers(
        &self,
        markers: &[Arc<Marker>],
        mode: GenerationMode,
        include_accessors: bool,
    ) -> Result<String> {
        let mut bindings = BindingTable::default();
        let mut out = Vec::with_capacity(markers.len());
        for marker in markers {
            let code = self.render_marker(marker, mode, include_accessors, None, &mut bindings)?;
            if !code.is_empty() {
                out.push(code);
            }
        }
        Ok(out.join("\n"))
    }

    fn render_marker(
        &self,
        marker: &Marker,
        mode: GenerationMode,
        include_accessors: bool,
        read_method: Option<&dyn ReadMethod>,
        bindings: &mut BindingTable,
    ) -> Result<String> {
        let nullable = self.always_nullable_accessors;
        let accessors = |bindings: &mut BindingTable| -> Result<String> {
            if include_accessors {
                self.render_accessors(marker, nullable, bindings)
            } else {
                Ok(String::new())
            }
        };
        Ok(match mode {
            GenerationMode::NoFields | GenerationMode::WithFields => {
                let interface =
                    self.render_interface(marker, mode == GenerationMode::WithFields, read_method);
                let accessors = accessors(bindings)?;
                if accessors.is_empty() {
                    interface
                } else {
                    format!("{interface}\n{accessors}")
                }
            }
            GenerationMode::Enum => render_enum(marker),
            GenerationMode::TypeAlias => render_type_alias(marker)?,
            GenerationMode::None => accessors(bindings)?,
        })
    }

    fn render_interface(
        &self,
        marker: &Marker,
        with_fields: bool,
        read_method: Option<&dyn ReadMethod>,
    ) -> String {
        let visibility = marker.visibility();
        let mut out = String::from("@DataSchema");
        if !marker.is_open() {
            out.push_str("(isOpen = false)");
        }
        out.push('\n');
        out.push_str(visibility.top_level_keyword());
        out.push_str("interface ");
        out.push_str(marker.name());
        if !marker.super_markers().is_empty() {
            let supers: Vec<&str> = marker.super_markers().iter().map(|m| m.name()).collect();
            out.push_str(" : ");
            out.push_str(&supers.join(", "));
        }

        let mut members: Vec<String> = Vec::new();
        if with_fields {
            for field in marker.own_fields() {
                members.push(self.render_property(field, visibility.member_keyword()));
            }
        }
        if let Some(method) = read_method {
            members.push(indent(
                &method.to_declaration(marker, visibility.member_keyword()),
                "    ",
            ));
        }
        if !members.is_empty() {
            out.push_str(" {\n");
            out.push_str(&members.join("\n"));
            out.push_str("\n}");
        }
        out
    }

    fn render_property(&self, field: &Field, member_visibility: &str) -> String {
        let identifier = field.field_name.quoted_if_needed();
        let mut out = String::new();
        if field.column_name != identifier {
            out.push_str("    @ColumnName(\"");
            out.push_str(&string_literal(&field.column_name));
            out.push_str("\")\n");
        }
        out.push_str("    ");
        out.push_str(member_visibility);
        if field.overrides {
            out.push_str("override ");
        }
        out.push_str("val ");
        out.push_str(&identifier);
        out.push_str(": ");
        out.push_str(&self.rendering.field_type(&field.field_type));
        out
    }

    /// Container and row accessors for every field, sorted by identifier.
    fn render_accessors(
        &self,
        marker: &Marker,
        nullable: bool,
        bindings: &mut BindingTable,
    ) -> Result<String> {
        let mut fields = marker.all_fields();
        if fields.is_empty() {
            return Ok(String::new());
        }
        fields.sort_by_cached_key(|field| field.field_name.quoted_if_needed());

        let visibility = marker.visibility().top_level_keyword();
        let short = marker.short_name();
        let container = self.rendering.container_type(marker.name());
        let row = self.rendering.row_type(marker.name());

        let mut lines = Vec::with_capacity(fields.len() * if nullable { 4 } else { 2 });
        for field in &fields {
            let binding = format!("{short}_{}", field.field_name.identifier());
            bindings.claim(ReceiverKind::Container, &binding, marker.name())?;
            lines.push(accessor(
                visibility,
                &container,
                field,
                &self.rendering.column_type(&field.field_type),
                &binding,
            ));
            bindings.claim(ReceiverKind::Row, &binding, marker.name())?;
            lines.push(accessor(
                visibility,
                &row,
                field,
                &self.rendering.field_type(&field.field_type),
                &binding,
            ));
        }

        if nullable {
            let marker_type = format!("{}?", self.rendering.type_name(marker.name()));
            let container = format!(
                "{}<{marker_type}>",
                self.rendering.class_name(ApiClass::ColumnsContainer)
            );
            let row = format!("{}<{marker_type}>", self.rendering.class_name(ApiClass::DataRow));
            for field in &fields {
                let binding = format!("Nullable{short}_{}", field.field_name.identifier());
                bindings.claim(ReceiverKind::Container, &binding, marker.name())?;
                lines.push(accessor(
                    visibility,
                    &container,
                    field,
                    &self.nullable_column_type(&field.field_type),
                    &binding,
                ));
                bindings.claim(ReceiverKind::Row, &binding, marker.name())?;
                lines.push(accessor(
                    visibility,
                    &row,
                    field,
                    &self.nullable_field_type(&field.field_type),
                    &binding,
                ));
            }
        }
        Ok(lines.join("\n"))
    }

    fn nullable_column_type(&self, field_type: &FieldType) -> String {
        match field_type {
            FieldType::Group { marker_name, .. } if marker_name != WILDCARD => format!(
                "{}<{marker_name}?>",
                self.rendering.class_name(ApiClass::ColumnGroup)
            ),
            other => self.rendering.column_type(&other.to_nullable()),
        }
    }

    fn nullable_field_type(&self, field_type: &FieldType) -> String {
        match field_type {
            FieldType::Group { marker_name, .. } if marker_name != WILDCARD => {
                format!("{}<{marker_name}?>", self.rendering.class_name(ApiClass::DataRow))
            }
            other => self.rendering.field_type(&other.to_nullable()),
        }
    }
}

fn accessor(visibility: &str, receiver: &str, field: &Field, result: &str, binding: &str) -> String {
    format!(
        "{visibility}val {receiver}.{name}: {result} @JvmName(\"{binding}\") get() = this[\"{column}\"] as {result}",
        name = field.field_name.quoted_if_needed(),
        binding = string_literal(binding),
        column = string_literal(&field.column_name),
    )
}

fn render_enum(marker: &Marker) -> String {
    let mut out = format!(
        "{}enum class {}",
        marker.visibility().top_level_keyword(),
        marker.name()
    );
    let fields = marker.all_fields();
    if let Some((last, rest)) = fields.split_last() {
        out.push_str(" {\n");
        for field in rest {
            out.push_str("    ");
            out.push_str(&field.field_name.quoted_if_needed());
            out.push_str(",\n");
        }
        out.push_str("    ");
        out.push_str(&last.field_name.quoted_if_needed());
        out.push_str(";\n}");
    }
    out
}

fn render_type_alias(marker: &Marker) -> Result<String> {
    match marker.super_markers() {
        [target] => Ok(format!(
            "{}typealias {} = {}",
            marker.visibility().top_level_keyword(),
            marker.name(),
            target.name()
        )),
        supers => Err(GenerateError::UnsupportedMode {
            mode: GenerationMode::TypeAlias,
            reason: format!(
                "`{}` has {} super markers, a type alias needs exactly one",
                marker.name(),
                supers.len()
            ),
        }),
    }
}

/// Markers referenced through a nullable group field.
fn nullable_references(markers: &[Arc<Marker>]) -> HashSet<String> {
    markers
        .iter()
        .flat_map(|marker| marker.all_fields())
        .filter_map(|field| match &field.field_type {
            FieldType::Group {
                marker_name,
                nullable: true,
            } => Some(marker_name.clone()),
            _ => None,
        })
        .collect()
}

/// Escape text for a Kotlin string literal.
pub(crate) fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '$' => out.push_str("\\$"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::MarkerVisibility;
    use crate::schema::ValueType;

    fn marker(name: &str, fields: Vec<Field>, supers: Vec<Arc<Marker>>) -> Arc<Marker> {
        Arc::new(Marker::new(name, fields, supers, true, MarkerVisibility::ImplicitPublic).unwrap())
    }

    #[test]
    fn test_string_literals_are_escaped() {
        assert_eq!(string_literal(r#"a"b$c\d"#), r#"a\"b\$c\\d"#);
        assert_eq!(string_literal("x\ny"), "x\\ny");
    }

    #[test]
    fn test_enum_rendering() {
        let m = marker(
            "Color",
            vec![
                Field::value("red", ValueType::new("kotlin.Int")),
                Field::value("green", ValueType::new("kotlin.Int")),
            ],
            vec![],
        );
        assert_eq!(render_enum(&m), "enum class Color {\n    red,\n    green;\n}");
        assert_eq!(render_enum(&marker("Empty", vec![], vec![])), "enum class Empty");
    }

    #[test]
    fn test_type_alias_needs_one_super() {
        let base = marker("Base", vec![], vec![]);
        let alias = marker("Alias", vec![], vec![Arc::clone(&base)]);
        assert_eq!(render_type_alias(&alias).unwrap(), "typealias Alias = Base");
        assert!(matches!(
            render_type_alias(&base),
            Err(GenerateError::UnsupportedMode {
                mode: GenerationMode::TypeAlias,
                ..
            })
        ));
    }

    #[test]
    fn test_duplicate_binding_fails() {
        let mut table = BindingTable::default();
        table.claim(ReceiverKind::Container, "A_x", "A").unwrap();
        table.claim(ReceiverKind::Row, "A_x", "A").unwrap();
        let err = table.claim(ReceiverKind::Container, "A_x", "other.A").unwrap_err();
        assert_eq!(
            err,
            GenerateError::NamingConflict {
                scope: "other.A".into(),
                identifier: "A_x".into()
            }
        );
    }

    #[test]
    fn test_indent_skips_blank_lines() {
        assert_eq!(indent("a\n\nb", "    "), "    a\n\n    b");
    }
}
