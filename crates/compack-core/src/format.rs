//! Serialization formats for recipe documents
//!
//! Only the I/O boundary knows about formats; everything past `read` works on
//! [`crate::RecipeDocument`].

use serde::Serialize;
use serde_json::Value as JsonValue;
use std::path::Path;

use crate::document::Node;
use crate::error::{CoreError, Result};

/// Recipe serialization, selected by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// `.json`
    Json,
    /// `.yaml` / `.yml`
    Yaml,
}

/// Parse failure with a 1-based location (0 when the parser gave none)
#[derive(Debug, Clone)]
pub struct ParseFailure {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl DocumentFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(CoreError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }

    /// Parse text into a document tree
    pub fn parse(&self, content: &str) -> std::result::Result<Node, ParseFailure> {
        match self {
            Self::Json => serde_json::from_str::<JsonValue>(content)
                .map(Node::from_plain)
                .map_err(|e| ParseFailure {
                    line: e.line(),
                    column: e.column(),
                    message: strip_location(&e.to_string()),
                }),
            Self::Yaml => serde_yaml::from_str::<serde_yaml::Value>(content)
                .map(Node::from_yaml)
                .map_err(|e| {
                    let (line, column) = e
                        .location()
                        .map(|loc| (loc.line(), loc.column()))
                        .unwrap_or((0, 0));
                    ParseFailure {
                        line,
                        column,
                        message: strip_location(&e.to_string()),
                    }
                }),
        }
    }

    /// Serialize a plain value
    ///
    /// JSON is indented with four spaces; both formats end with a newline.
    pub fn render(&self, value: &JsonValue) -> Result<String> {
        match self {
            Self::Json => {
                let mut buf = Vec::new();
                let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
                let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
                value.serialize(&mut ser)?;
                buf.push(b'\n');
                // serde_json only ever emits UTF-8
                Ok(String::from_utf8_lossy(&buf).into_owned())
            }
            Self::Yaml => Ok(serde_yaml::to_string(value)?),
        }
    }
}

/// Parsers append "at line X column Y"; the location is reported separately.
fn strip_location(message: &str) -> String {
    match message.find(" at line ") {
        Some(idx) => message[..idx].to_string(),
        None => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn test_from_path() {
        assert_eq!(
            DocumentFormat::from_path(&PathBuf::from("recipe.json")).unwrap(),
            DocumentFormat::Json
        );
        assert_eq!(
            DocumentFormat::from_path(&PathBuf::from("recipe.YAML")).unwrap(),
            DocumentFormat::Yaml
        );
        assert_eq!(
            DocumentFormat::from_path(&PathBuf::from("dir/recipe.yml")).unwrap(),
            DocumentFormat::Yaml
        );
        assert!(DocumentFormat::from_path(&PathBuf::from("recipe")).is_err());
        assert!(DocumentFormat::from_path(&PathBuf::from("recipe.txt")).is_err());
    }

    #[test]
    fn test_render_json_four_space_indent() {
        let rendered = DocumentFormat::Json
            .render(&json!({"ComponentName": "hello"}))
            .unwrap();
        insta::assert_snapshot!(rendered.trim_end(), @r#"
        {
            "ComponentName": "hello"
        }
        "#);
    }

    #[test]
    fn test_render_yaml_keeps_order() {
        let rendered = DocumentFormat::Yaml
            .render(&json!({"b": 1, "a": "x"}))
            .unwrap();
        assert_eq!(rendered, "b: 1\na: x\n");
    }

    #[test]
    fn test_parse_failure_message_has_no_location_suffix() {
        let failure = DocumentFormat::Json.parse("{\"a\": }").unwrap_err();
        assert_eq!(failure.line, 1);
        assert!(!failure.message.contains("at line"));
    }
}
