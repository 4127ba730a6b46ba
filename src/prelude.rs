//! Prelude module for convenient imports
//!
//! Re-exports the types most callers need to load, edit, flatten and validate a
//! workflow.
//!
//! # Example
//!
//! ```rust,no_run
//! use vines_flow::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let document = WorkflowDocument::from_file("path/to/workflow.json")?;
//! let blocks = BlockDefinition::list_from_file("path/to/blocks.json")?;
//!
//! let graph = Graph::from_tasks(document.tasks.clone());
//! println!("{}", Outline::render(&graph));
//!
//! let result = Validator::new(blocks).validate_workflow(&document.tasks, &document.output);
//! for issue in &result.validation_issues {
//!     println!("{}", issue);
//! }
//! # Ok(())
//! # }
//! ```

// Task model
pub use crate::task::{
    DecisionCases, IntoTasks, SubWorkflowParam, TaskDefinition, TaskKind, WorkflowDocument,
    WorkflowOutputValue,
};

// Flattening
pub use crate::flatten::{find_task, flatten};

// Registry and graph
pub use crate::graph::{
    ChildSlot, ExecutionStatus, Graph, GraphBuilder, GraphEvent, InsertRequest, Node, NodeHandle,
    Outline, SubscriptionId, TaskExecutionUpdate,
};
pub use crate::registry::{NodeBehavior, NodeFactory, NodeRegistry};

// Validation
pub use crate::validation::{
    BlockDefinition, BlockProperty, IssueType, PropertyType, ReasonCode, ValidationIssue,
    ValidationResult, Validator,
};

// Error types
pub use crate::error::{ConversionError, DocumentError, FlowError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
