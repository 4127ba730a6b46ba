use super::Graph;
use super::events::GraphEvent;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Status of one task in a running workflow, as reported by the execution engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Scheduled,
    InProgress,
    Completed,
    Failed,
    FailedWithTerminalError,
    TimedOut,
    Canceled,
    Skipped,
}

impl ExecutionStatus {
    /// Whether the task will not change state any more.
    pub fn is_terminal(self) -> bool {
        !matches!(self, ExecutionStatus::Scheduled | ExecutionStatus::InProgress)
    }
}

/// One status report for one task, keyed by reference name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskExecutionUpdate {
    pub task_reference_name: String,
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
}

impl TaskExecutionUpdate {
    pub fn new(task_reference_name: impl Into<String>, status: ExecutionStatus) -> Self {
        Self {
            task_reference_name: task_reference_name.into(),
            status,
            output: None,
        }
    }
}

/// Execution state attached to a node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeExecution {
    pub status: ExecutionStatus,
    pub output: Option<serde_json::Value>,
}

impl Graph {
    /// Correlates execution reports with nodes by reference name.
    ///
    /// Reports for unknown reference names are ignored. Emits one `execution` event
    /// naming the nodes whose state changed, if any did, and returns those names.
    pub fn apply_execution(&mut self, updates: &[TaskExecutionUpdate]) -> Vec<String> {
        let mut changed: Vec<String> = Vec::new();

        for update in updates {
            let Some(handle) = self.index.get(&update.task_reference_name).copied() else {
                continue;
            };
            let Some(node) = self.slot_mut(handle) else {
                continue;
            };
            let next = NodeExecution {
                status: update.status,
                output: update.output.clone(),
            };
            if node.execution.as_ref() != Some(&next) {
                node.execution = Some(next);
                if !changed.contains(&update.task_reference_name) {
                    changed.push(update.task_reference_name.clone());
                }
            }
        }

        if !changed.is_empty() {
            debug!(count = changed.len(), "applied execution status");
            let revision = self.events.next_revision();
            self.events.emit(GraphEvent::Execution {
                revision,
                task_reference_names: changed.clone(),
            });
        }
        changed
    }

    /// Forgets all execution state and asks subscribers to re-sync.
    pub fn reset_execution(&mut self) {
        for entry in self.entries.iter_mut() {
            if let Some(node) = entry.node.as_mut() {
                node.execution = None;
            }
        }
        self.refresh();
    }
}
