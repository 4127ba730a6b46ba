use super::definition::TaskDefinition;
use crate::error::ConversionError;

/// A trait for custom data models that can be converted into a list of task definitions.
///
/// Workflows do not always arrive in the execution engine's own JSON shape. By
/// implementing this trait on your own structs you provide the translation layer the
/// graph and validator need.
///
/// # Example
///
/// ```rust,no_run
/// use vines_flow::prelude::*;
/// use vines_flow::error::ConversionError;
///
/// struct Step { id: String, block: String }
/// struct Pipeline { steps: Vec<Step> }
///
/// impl IntoTasks for Pipeline {
///     fn into_tasks(self) -> std::result::Result<Vec<TaskDefinition>, ConversionError> {
///         self.steps
///             .into_iter()
///             .map(|step| {
///                 if step.id.is_empty() {
///                     return Err(ConversionError::ValidationError("empty step id".into()));
///                 }
///                 Ok(TaskDefinition::new(step.id, TaskKind::Simple).with_name(step.block))
///             })
///             .collect()
///     }
/// }
/// ```
pub trait IntoTasks {
    /// Consumes the object and converts it into the top-level task list of a workflow.
    fn into_tasks(self) -> Result<Vec<TaskDefinition>, ConversionError>;
}

impl IntoTasks for Vec<TaskDefinition> {
    fn into_tasks(self) -> Result<Vec<TaskDefinition>, ConversionError> {
        Ok(self)
    }
}
