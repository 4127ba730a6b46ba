use crate::error::DocumentError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;

/// Declared shape of a block: the inputs and credentials a task of that block expects.
///
/// Tasks are matched to blocks by their `name`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub input: Vec<BlockProperty>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub credentials: Vec<BlockCredential>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BlockDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_property(mut self, property: BlockProperty) -> Self {
        self.input.push(property);
        self
    }

    pub fn with_credential(mut self, name: impl Into<String>, required: bool) -> Self {
        self.credentials.push(BlockCredential {
            name: name.into(),
            required,
        });
        self
    }

    /// Parses a JSON array of block definitions.
    pub fn list_from_json(json: &str) -> Result<Vec<Self>, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn list_from_file(path: &str) -> Result<Vec<Self>, DocumentError> {
        let content = fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::list_from_json(&content)
    }
}

/// One declared input of a block.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockProperty {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(rename = "type", default)]
    pub kind: PropertyType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<PropertyOption>,
    #[serde(default)]
    pub type_options: TypeOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_options: Option<DisplayOptions>,
}

impl BlockProperty {
    pub fn new(name: impl Into<String>, kind: PropertyType) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            kind,
            ..Default::default()
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_options<I: IntoIterator<Item = Value>>(mut self, values: I) -> Self {
        self.options = values
            .into_iter()
            .map(|value| PropertyOption { name: None, value })
            .collect();
        self
    }

    pub fn with_display_options(mut self, display_options: DisplayOptions) -> Self {
        self.display_options = Some(display_options);
        self
    }

    pub fn multiple_values(mut self) -> Self {
        self.type_options.multiple_values = true;
        self
    }
}

/// Value type a property expects. Open set; unknown types accept any value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PropertyType {
    Boolean,
    #[default]
    String,
    Number,
    Json,
    Options,
    /// Informational text shown in the editor; carries no value.
    Notice,
    Other(String),
}

impl PropertyType {
    pub fn as_str(&self) -> &str {
        match self {
            PropertyType::Boolean => "boolean",
            PropertyType::String => "string",
            PropertyType::Number => "number",
            PropertyType::Json => "json",
            PropertyType::Options => "options",
            PropertyType::Notice => "notice",
            PropertyType::Other(kind) => kind,
        }
    }
}

impl From<&str> for PropertyType {
    fn from(kind: &str) -> Self {
        match kind {
            "boolean" => PropertyType::Boolean,
            "string" => PropertyType::String,
            "number" => PropertyType::Number,
            "json" => PropertyType::Json,
            "options" => PropertyType::Options,
            "notice" => PropertyType::Notice,
            other => PropertyType::Other(other.to_string()),
        }
    }
}

impl From<String> for PropertyType {
    fn from(kind: String) -> Self {
        PropertyType::from(kind.as_str())
    }
}

impl From<PropertyType> for String {
    fn from(kind: PropertyType) -> Self {
        match kind {
            PropertyType::Other(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyOption {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeOptions {
    #[serde(default)]
    pub multiple_values: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Conditions on sibling values under which a property is shown or hidden.
///
/// Each map goes from a sibling property name to the values that satisfy it; all
/// entries must be satisfied for the condition to hold.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplayOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show: Option<BTreeMap<String, Vec<Value>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide: Option<BTreeMap<String, Vec<Value>>>,
}

impl DisplayOptions {
    pub fn show_when(property: impl Into<String>, values: Vec<Value>) -> Self {
        let mut show = BTreeMap::new();
        show.insert(property.into(), values);
        Self {
            show: Some(show),
            hide: None,
        }
    }

    pub fn hide_when(property: impl Into<String>, values: Vec<Value>) -> Self {
        let mut hide = BTreeMap::new();
        hide.insert(property.into(), values);
        Self {
            show: None,
            hide: Some(hide),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockCredential {
    pub name: String,
    #[serde(default)]
    pub required: bool,
}
