use super::kind::TaskKind;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Name given to the filler tasks that keep control-flow lists non-empty.
pub const STUB_TASK_NAME: &str = "fake_node";

/// Declarative description of one workflow step, as exchanged with the execution engine.
///
/// Nested control flow lives in `fork_tasks`, `decision_cases` and `loop_over`.
/// Field names on the wire are the engine's camelCase names; fields this crate does
/// not model are kept in `extra` so that a parse/serialize cycle is lossless.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    #[serde(default)]
    pub name: String,
    pub task_reference_name: String,
    #[serde(rename = "type", default)]
    pub kind: TaskKind,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub input_parameters: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fork_tasks: Vec<Vec<TaskDefinition>>,
    #[serde(default, skip_serializing_if = "DecisionCases::is_empty")]
    pub decision_cases: DecisionCases,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loop_over: Vec<TaskDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub join_on: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_workflow_param: Option<SubWorkflowParam>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskDefinition {
    /// Creates a task whose block name equals its reference name.
    pub fn new(reference_name: impl Into<String>, kind: TaskKind) -> Self {
        let reference_name = reference_name.into();
        Self {
            name: reference_name.clone(),
            task_reference_name: reference_name,
            kind,
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_input(mut self, key: impl Into<String>, value: Value) -> Self {
        self.input_parameters.insert(key.into(), value);
        self
    }

    pub fn with_fork_tasks(mut self, branches: Vec<Vec<TaskDefinition>>) -> Self {
        self.fork_tasks = branches;
        self
    }

    pub fn with_case(mut self, case: impl Into<String>, tasks: Vec<TaskDefinition>) -> Self {
        self.decision_cases.insert(case, tasks);
        self
    }

    pub fn with_loop_over(mut self, tasks: Vec<TaskDefinition>) -> Self {
        self.loop_over = tasks;
        self
    }

    pub fn with_join_on<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.join_on = names.into_iter().map(Into::into).collect();
        self
    }

    /// The reference name, which doubles as the node id in a graph.
    pub fn id(&self) -> &str {
        &self.task_reference_name
    }

    /// Whether this task is a filler inserted to keep a branch, case or loop body non-empty.
    pub fn is_stub(&self) -> bool {
        self.name == STUB_TASK_NAME || self.task_reference_name.starts_with(STUB_TASK_NAME)
    }

    /// Direct nested tasks in traversal order: fork branches, then decision cases, then the loop body.
    pub fn nested_tasks(&self) -> impl Iterator<Item = &TaskDefinition> {
        self.fork_tasks
            .iter()
            .flatten()
            .chain(self.decision_cases.iter().flat_map(|(_, tasks)| tasks.iter()))
            .chain(self.loop_over.iter())
    }

    /// Number of tasks in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.nested_tasks().map(TaskDefinition::subtree_len).sum::<usize>()
    }
}

/// Parameters of a `SUB_WORKFLOW` task.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubWorkflowParam {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_definition: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The cases of a `SWITCH` task, in declaration order.
///
/// Order matters for display and for flattening, so this is a list of pairs rather
/// than a hash map. On the wire it is a JSON object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecisionCases(Vec<(String, Vec<TaskDefinition>)>);

impl DecisionCases {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Vec<TaskDefinition>)> {
        self.0.iter().map(|(case, tasks)| (case.as_str(), tasks))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(case, _)| case.as_str())
    }

    pub fn get(&self, case: &str) -> Option<&Vec<TaskDefinition>> {
        self.0.iter().find(|(c, _)| c == case).map(|(_, tasks)| tasks)
    }

    pub fn contains(&self, case: &str) -> bool {
        self.get(case).is_some()
    }

    /// Replaces the tasks of an existing case in place, or appends a new case.
    pub fn insert(&mut self, case: impl Into<String>, tasks: Vec<TaskDefinition>) {
        let case = case.into();
        match self.0.iter_mut().find(|(c, _)| *c == case) {
            Some((_, existing)) => *existing = tasks,
            None => self.0.push((case, tasks)),
        }
    }

    pub fn remove(&mut self, case: &str) -> Option<Vec<TaskDefinition>> {
        let index = self.0.iter().position(|(c, _)| c == case)?;
        Some(self.0.remove(index).1)
    }
}

impl IntoIterator for DecisionCases {
    type Item = (String, Vec<TaskDefinition>);
    type IntoIter = std::vec::IntoIter<(String, Vec<TaskDefinition>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<(String, Vec<TaskDefinition>)> for DecisionCases {
    fn from_iter<T: IntoIterator<Item = (String, Vec<TaskDefinition>)>>(iter: T) -> Self {
        let mut cases = DecisionCases::new();
        for (case, tasks) in iter {
            cases.insert(case, tasks);
        }
        cases
    }
}

impl Serialize for DecisionCases {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (case, tasks) in &self.0 {
            map.serialize_entry(case, tasks)?;
        }
        map.end()
    }
}

struct DecisionCasesVisitor;

impl<'de> Visitor<'de> for DecisionCasesVisitor {
    type Value = DecisionCases;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of case values to task lists")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut cases = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((case, tasks)) = access.next_entry::<String, Vec<TaskDefinition>>()? {
            cases.push((case, tasks));
        }
        Ok(cases.into_iter().collect())
    }

    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(DecisionCases::new())
    }
}

impl<'de> Deserialize<'de> for DecisionCases {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DecisionCasesVisitor)
    }
}
