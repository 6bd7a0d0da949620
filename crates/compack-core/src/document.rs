//! Case-insensitive recipe document model
//!
//! Recipes are matched by key without regard to case (`Manifests`, `manifests`
//! and `MANIFESTS` are the same key) but are always written back with the
//! casing the key had when it was first inserted.

use indexmap::IndexMap;
use indexmap::map::Entry;
use serde_json::{Map as JsonMap, Number, Value as JsonValue};
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result, RECIPE_DOCS_URL};
use crate::format::DocumentFormat;

/// Mapping keyed case-insensitively that remembers the original key casing
///
/// Entries are stored under their lower-cased key as `(original_key, value)`
/// pairs, in insertion order.
#[derive(Debug, Clone)]
pub struct CaseInsensitiveMap<V> {
    entries: IndexMap<String, (String, V)>,
}

impl<V> CaseInsensitiveMap<V> {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    #[inline]
    fn normalize(key: &str) -> String {
        key.to_lowercase()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(&Self::normalize(key)).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.entries.get_mut(&Self::normalize(key)).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&Self::normalize(key))
    }

    /// Insert a value, returning the previous one if the key existed
    ///
    /// Updating an existing key keeps the casing it was first stored with.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        match self.entries.entry(Self::normalize(&key)) {
            Entry::Occupied(mut slot) => Some(std::mem::replace(&mut slot.get_mut().1, value)),
            Entry::Vacant(slot) => {
                slot.insert((key, value));
                None
            }
        }
    }

    /// Remove a key, keeping the order of the remaining entries
    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.entries
            .shift_remove(&Self::normalize(key))
            .map(|(_, v)| v)
    }

    /// The casing a key was stored with
    pub fn original_key(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&Self::normalize(key))
            .map(|(k, _)| k.as_str())
    }

    /// Iterate in insertion order with the stored key casing
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.values().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for CaseInsensitiveMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Equal when both hold the same keys (ignoring case) with equal values.
/// Key order and stored casing do not matter.
impl<V: PartialEq> PartialEq for CaseInsensitiveMap<V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(norm, (_, v))| other.entries.get(norm).is_some_and(|(_, ov)| ov == v))
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for CaseInsensitiveMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// A value inside a recipe document
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Vec<Node>),
    Mapping(CaseInsensitiveMap<Node>),
}

impl Node {
    /// Wrap a plain value, converting every nested mapping depth-first
    pub fn from_plain(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Node::Null,
            JsonValue::Bool(b) => Node::Bool(b),
            JsonValue::Number(n) => Node::Number(n),
            JsonValue::String(s) => Node::String(s),
            JsonValue::Array(items) => {
                Node::Sequence(items.into_iter().map(Node::from_plain).collect())
            }
            JsonValue::Object(map) => Node::Mapping(
                map.into_iter()
                    .map(|(k, v)| (k, Node::from_plain(v)))
                    .collect(),
            ),
        }
    }

    /// Convert a YAML value
    ///
    /// Non-string mapping keys are stringified and tags are dropped.
    pub fn from_yaml(value: serde_yaml::Value) -> Self {
        use serde_yaml::Value as Yaml;

        match value {
            Yaml::Null => Node::Null,
            Yaml::Bool(b) => Node::Bool(b),
            Yaml::Number(n) => yaml_number(&n),
            Yaml::String(s) => Node::String(s),
            Yaml::Sequence(items) => {
                Node::Sequence(items.into_iter().map(Node::from_yaml).collect())
            }
            Yaml::Mapping(map) => Node::Mapping(
                map.into_iter()
                    .map(|(k, v)| (yaml_key(k), Node::from_yaml(v)))
                    .collect(),
            ),
            Yaml::Tagged(tagged) => Node::from_yaml(tagged.value),
        }
    }

    /// Undo the case-insensitive wrapper at every level
    pub fn to_plain(&self) -> JsonValue {
        match self {
            Node::Null => JsonValue::Null,
            Node::Bool(b) => JsonValue::Bool(*b),
            Node::Number(n) => JsonValue::Number(n.clone()),
            Node::String(s) => JsonValue::String(s.clone()),
            Node::Sequence(items) => JsonValue::Array(items.iter().map(Node::to_plain).collect()),
            Node::Mapping(map) => JsonValue::Object(mapping_to_plain(map)),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Node::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_sequence_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&CaseInsensitiveMap<Node>> {
        match self {
            Node::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut CaseInsensitiveMap<Node>> {
        match self {
            Node::Mapping(map) => Some(map),
            _ => None,
        }
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::String(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::String(s)
    }
}

fn mapping_to_plain(map: &CaseInsensitiveMap<Node>) -> JsonMap<String, JsonValue> {
    map.iter()
        .map(|(k, v)| (k.to_string(), v.to_plain()))
        .collect()
}

fn yaml_number(n: &serde_yaml::Number) -> Node {
    if let Some(i) = n.as_i64() {
        Node::Number(i.into())
    } else if let Some(u) = n.as_u64() {
        Node::Number(u.into())
    } else {
        // .inf and .nan have no JSON representation
        n.as_f64()
            .and_then(Number::from_f64)
            .map(Node::Number)
            .unwrap_or_else(|| Node::String(n.to_string()))
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => s,
        Yaml::Number(n) => n.to_string(),
        Yaml::Bool(b) => b.to_string(),
        Yaml::Null => "null".to_string(),
        Yaml::Tagged(tagged) => yaml_key(tagged.value),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// A component recipe
///
/// The root is always a mapping. Lookups and updates on the document and on
/// every nested mapping are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeDocument {
    root: CaseInsensitiveMap<Node>,
}

impl RecipeDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a recipe, choosing the format from the file extension
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = DocumentFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;

        Self::parse_from(&content, format, path)
    }

    /// Parse a recipe from a string
    pub fn parse(content: &str, format: DocumentFormat) -> Result<Self> {
        let origin = PathBuf::from(format!("<{}>", format.extension()));
        Self::parse_from(content, format, &origin)
    }

    /// Parse `content`, logging and reporting failures against `origin`
    fn parse_from(content: &str, format: DocumentFormat, origin: &Path) -> Result<Self> {
        let node = format.parse(content).map_err(|failure| {
            let offending = content
                .lines()
                .nth(failure.line.saturating_sub(1))
                .unwrap_or_default();
            tracing::error!(
                path = %origin.display(),
                line = failure.line,
                column = failure.column,
                "malformed recipe near `{}` (see {})",
                offending.trim(),
                RECIPE_DOCS_URL
            );
            CoreError::MalformedDocument {
                path: origin.to_path_buf(),
                line: failure.line,
                column: failure.column,
                message: failure.message,
            }
        })?;

        match node {
            Node::Mapping(root) => Ok(Self { root }),
            _ => {
                tracing::error!(path = %origin.display(), "recipe root is not a mapping");
                Err(CoreError::MalformedDocument {
                    path: origin.to_path_buf(),
                    line: 1,
                    column: 1,
                    message: "the recipe must be a mapping at the top level".to_string(),
                })
            }
        }
    }

    /// Write the recipe in the format matching the destination extension
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let format = DocumentFormat::from_path(path)?;
        let rendered = format.render(&self.to_plain())?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, rendered)?;
        Ok(())
    }

    /// Render the recipe as a string in the given format
    pub fn render(&self, format: DocumentFormat) -> Result<String> {
        format.render(&self.to_plain())
    }

    pub fn from_plain(value: JsonValue) -> Result<Self> {
        Self::from_node(Node::from_plain(value))
    }

    fn from_node(node: Node) -> Result<Self> {
        match node {
            Node::Mapping(root) => Ok(Self { root }),
            _ => Err(CoreError::InvalidDocument {
                message: "the recipe must be a mapping at the top level".to_string(),
            }),
        }
    }

    pub fn to_plain(&self) -> JsonValue {
        JsonValue::Object(mapping_to_plain(&self.root))
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.root.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.root.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.root.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Node>) -> Option<Node> {
        self.root.insert(key, value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Node> {
        self.root.remove(key)
    }

    pub fn root(&self) -> &CaseInsensitiveMap<Node> {
        &self.root
    }
}
