//! Validation engine.
//!
//! Checks run against the flattened task list, so every nested task is checked
//! exactly once whatever its depth. Problems are returned as [`ValidationIssue`]s,
//! never as errors: a missing required value is an everyday state of a workflow
//! being edited, not a failure.

use crate::flatten::flatten;
use crate::graph::Graph;
use crate::task::{TaskDefinition, TaskKind, WorkflowOutputValue};
use ahash::{AHashMap, AHashSet};
use tracing::debug;

pub mod expression;
mod issue;
mod rules;
mod schema;

pub use issue::*;
pub use rules::WORKFLOW_END;
pub use schema::*;

pub struct ValidatorBuilder {
    blocks: Vec<BlockDefinition>,
    ignored_property_types: Vec<PropertyType>,
}

impl ValidatorBuilder {
    pub fn new(blocks: Vec<BlockDefinition>) -> Self {
        Self {
            blocks,
            ignored_property_types: vec![PropertyType::Notice],
        }
    }

    pub fn with_block(mut self, block: BlockDefinition) -> Self {
        self.blocks.push(block);
        self
    }

    /// Skips properties of `kind` entirely. `notice` is skipped by default.
    pub fn ignore_property_type(mut self, kind: PropertyType) -> Self {
        if !self.ignored_property_types.contains(&kind) {
            self.ignored_property_types.push(kind);
        }
        self
    }

    pub fn build(self) -> Validator {
        let mut blocks = AHashMap::with_capacity(self.blocks.len());
        for block in self.blocks {
            // The first definition of a name wins.
            blocks.entry(block.name.clone()).or_insert(block);
        }
        Validator {
            blocks,
            ignored_property_types: self.ignored_property_types,
        }
    }
}

/// Checks task trees against a catalog of block definitions.
#[derive(Debug, Clone)]
pub struct Validator {
    blocks: AHashMap<String, BlockDefinition>,
    ignored_property_types: Vec<PropertyType>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Validator {
    pub fn new(blocks: Vec<BlockDefinition>) -> Self {
        ValidatorBuilder::new(blocks).build()
    }

    pub fn builder(blocks: Vec<BlockDefinition>) -> ValidatorBuilder {
        ValidatorBuilder::new(blocks)
    }

    /// The block definition tasks named `name` are checked against.
    pub fn block(&self, name: &str) -> Option<&BlockDefinition> {
        self.blocks.get(name)
    }

    pub fn validate(&self, tasks: &[TaskDefinition]) -> ValidationResult {
        self.validate_workflow(tasks, &[])
    }

    /// Validates the tasks and the references made by the workflow's declared output.
    pub fn validate_workflow(&self, tasks: &[TaskDefinition], output: &[WorkflowOutputValue]) -> ValidationResult {
        let flattened = flatten(tasks);
        let known: AHashSet<&str> = flattened.iter().map(|task| task.id()).collect();

        let mut issues = Vec::new();
        for task in &flattened {
            issues.extend(self.check_task(task, &known));
        }
        issues.extend(rules::workflow_output(output, &known));

        let result = ValidationResult::from_issues(issues);
        debug!(
            tasks = flattened.len(),
            issues = result.validation_issues.len(),
            validated = result.validated,
            "validated workflow"
        );
        result
    }

    /// Validates the current state of `graph`.
    pub fn validate_graph(&self, graph: &Graph) -> ValidationResult {
        self.validate(&graph.to_tasks())
    }

    fn check_task(&self, task: &TaskDefinition, known: &AHashSet<&str>) -> Vec<ValidationIssue> {
        match task.kind {
            TaskKind::SubWorkflow => return rules::sub_workflow(task),
            TaskKind::ForkJoin | TaskKind::Join => return Vec::new(),
            _ => {}
        }

        // Input parameters, then structure, then credentials.
        let Some(block) = self.blocks.get(&task.name) else {
            return rules::structure(task);
        };
        let mut issues = Vec::new();
        if task.kind != TaskKind::Switch {
            issues.extend(rules::input_parameters(
                task,
                block,
                known,
                &self.ignored_property_types,
            ));
        }
        issues.extend(rules::structure(task));
        issues.extend(rules::credentials(task, block));
        issues
    }
}
