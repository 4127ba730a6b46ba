use crate::graph::NodeHandle;
use crate::task::TaskKind;
use thiserror::Error;

/// Errors raised by the node registry and by structural graph operations.
///
/// Every mutating graph operation that returns one of these leaves the graph
/// exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("Task '{reference_name}' has kind '{kind}', which has no registered node factory")]
    UnknownKind {
        kind: TaskKind,
        reference_name: String,
    },

    #[error("A node factory for kind '{kind}' is already registered")]
    DuplicateRegistration { kind: TaskKind },

    #[error("Node '{target_id}' was not found along path [{}]", path.join(" > "))]
    NodeNotFound {
        target_id: String,
        path: Vec<String>,
    },

    #[error("Node handle {handle} refers to a node that has been deleted")]
    DetachedNode { handle: NodeHandle },

    #[error("Reference name '{reference_name}' is already used in this workflow")]
    DuplicateReference { reference_name: String },

    #[error("Cannot move node '{source_id}' next to '{target_id}': target lies inside the moved subtree")]
    InvalidMove {
        source_id: String,
        target_id: String,
    },

    #[error("Case '{case}' of node '{node_id}' cannot be changed: {reason}")]
    InvalidCase {
        node_id: String,
        case: String,
        reason: String,
    },

    #[error("Node '{node_id}' of kind '{kind}' does not hold decision cases")]
    NotAContainer { node_id: String, kind: TaskKind },
}

/// Errors that can occur while reading or writing workflow documents and block schemas.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Could not access '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse workflow JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur when converting a custom user format into task definitions.
#[derive(Error, Debug, Clone)]
pub enum ConversionError {
    #[error("Invalid custom data: {0}")]
    ValidationError(String),
}
