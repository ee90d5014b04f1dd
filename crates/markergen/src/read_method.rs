//! Companion factory methods attached to the root interface.

use crate::marker::Marker;
use crate::output::string_literal;
use serde::{Deserialize, Serialize};

pub use crate::traits::ReadMethod;

const DATA_FRAME: &str = "org.jetbrains.kotlinx.dataframe.DataFrame";

/// A named parameter with a default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodArgument {
    pub name: String,
    pub type_name: String,
    /// Default value, as source text.
    pub default: String,
}

/// Ordered extra parameters of a read method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodArguments(Vec<MethodArgument>);

impl MethodArguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        mut self,
        name: impl Into<String>,
        type_name: impl Into<String>,
        default: impl Into<String>,
    ) -> Self {
        self.0.push(MethodArgument {
            name: name.into(),
            type_name: type_name.into(),
            default: default.into(),
        });
        self
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MethodArgument> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Reads a frame with `DataFrame.<method_name>` and casts it to the marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultReadMethod {
    pub method_name: String,
    #[serde(default)]
    pub default_path: Option<String>,
    #[serde(default)]
    pub arguments: MethodArguments,
}

impl DefaultReadMethod {
    pub fn new(method_name: impl Into<String>) -> Self {
        Self {
            method_name: method_name.into(),
            default_path: None,
            arguments: MethodArguments::new(),
        }
    }

    pub fn with_default_path(mut self, path: impl Into<String>) -> Self {
        self.default_path = Some(path.into());
        self
    }

    pub fn with_arguments(mut self, arguments: MethodArguments) -> Self {
        self.arguments = arguments;
        self
    }
}

impl ReadMethod for DefaultReadMethod {
    fn to_declaration(&self, marker: &Marker, visibility: &str) -> String {
        let method = &self.method_name;
        let mut params = vec![match self.default_path {
            Some(_) => "path: String = defaultPath".to_string(),
            None => "path: String".to_string(),
        }];
        let mut call = vec!["path".to_string()];
        for arg in self.arguments.iter() {
            params.push(format!("{}: {} = {}", arg.name, arg.type_name, arg.default));
            call.push(format!("{0} = {0}", arg.name));
        }

        let mut out = format!("{visibility}companion object {{\n");
        if let Some(path) = &self.default_path {
            out.push_str(&format!(
                "    {visibility}const val defaultPath: String = \"{}\"\n\n",
                string_literal(path)
            ));
        }
        out.push_str(&format!(
            "    {visibility}fun {method}({}): {DATA_FRAME}<{}> {{\n",
            params.join(", "),
            marker.short_name()
        ));
        out.push_str(&format!(
            "        val df = {DATA_FRAME}.{method}({})\n",
            call.join(", ")
        ));
        out.push_str("        return df.cast(verify = true)\n");
        out.push_str("    }\n}");
        out
    }

    fn additional_imports(&self) -> Vec<String> {
        vec![format!(
            "import org.jetbrains.kotlinx.dataframe.io.{}",
            self.method_name
        )]
    }
}
