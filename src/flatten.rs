//! Linear view of a nested task tree.
//!
//! The traversal is breadth-first across nesting boundaries: a task is emitted, then
//! its fork branches (in declared order), then its decision cases (in declared order,
//! `default` included like any other case), then its loop body are queued behind
//! everything already waiting. Search, validation and execution-status correlation all
//! rely on this exact order, so it must not be changed to a depth-first walk.

use crate::task::TaskDefinition;
use std::collections::VecDeque;

/// Returns every task reachable from `tasks`, in breadth-first order.
///
/// The input is never modified and the output only borrows from it, so calling this
/// twice on the same tree yields identical results.
pub fn flatten(tasks: &[TaskDefinition]) -> Vec<&TaskDefinition> {
    let mut queue: VecDeque<&TaskDefinition> = tasks.iter().collect();
    let mut output = Vec::with_capacity(queue.len());

    while let Some(task) = queue.pop_front() {
        output.push(task);
        queue.extend(task.nested_tasks());
    }

    output
}

/// Flattens the subtree rooted at `current`. Nothing to expand yields an empty list.
pub fn flatten_from(current: Option<&TaskDefinition>) -> Vec<&TaskDefinition> {
    match current {
        Some(task) => flatten(std::slice::from_ref(task)),
        None => Vec::new(),
    }
}

/// Owned variant of [`flatten`], for callers that need to keep the list past the tree.
pub fn flatten_owned(tasks: &[TaskDefinition]) -> Vec<TaskDefinition> {
    flatten(tasks).into_iter().cloned().collect()
}

/// Reference names of every task in flattened order.
pub fn reference_names(tasks: &[TaskDefinition]) -> Vec<&str> {
    flatten(tasks).into_iter().map(TaskDefinition::id).collect()
}

/// Finds a task anywhere in the tree by its reference name.
pub fn find_task<'a>(tasks: &'a [TaskDefinition], reference_name: &str) -> Option<&'a TaskDefinition> {
    flatten(tasks)
        .into_iter()
        .find(|task| task.task_reference_name == reference_name)
}
