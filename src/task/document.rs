use super::definition::TaskDefinition;
use crate::error::DocumentError;
use serde::{Deserialize, Serialize};
use std::fs;

/// One entry of a workflow's declared output, e.g. `{ "key": "result", "value": "${llm.output.text}" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowOutputValue {
    pub key: String,
    pub value: serde_json::Value,
}

/// A workflow version as stored by the workflow-metadata API: tasks plus declared output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub tasks: Vec<TaskDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output: Vec<WorkflowOutputValue>,
}

impl WorkflowDocument {
    pub fn new(tasks: Vec<TaskDefinition>) -> Self {
        Self {
            tasks,
            ..Default::default()
        }
    }

    /// Parses a document. A bare JSON array is accepted as a task list.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if value.is_array() {
            return Ok(Self::new(serde_json::from_value(value)?));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Loads a document from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, DocumentError> {
        let content = fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Saves the document as pretty-printed JSON.
    pub fn save(&self, path: &str) -> Result<(), DocumentError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| DocumentError::Io {
            path: path.to_string(),
            source,
        })
    }
}
