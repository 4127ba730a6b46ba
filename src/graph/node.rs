use super::execution::NodeExecution;
use crate::registry::{NodeBehavior, PlaceholderBehavior};
use crate::task::{TaskDefinition, TaskKind};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Non-owning reference to a node in a [`Graph`](super::Graph).
///
/// Handles carry a generation, so a handle kept across a delete stops resolving
/// instead of silently pointing at whatever reused the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.index, self.generation)
    }
}

/// Which of a composite node's child lists a child belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "slot", content = "key", rename_all = "camelCase")]
pub enum ChildSlot {
    /// A parallel branch of a fork, by position.
    Branch(usize),
    /// A named case of a switch.
    Case(String),
    /// The body of a loop.
    LoopBody,
}

impl fmt::Display for ChildSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildSlot::Branch(index) => write!(f, "branch {}", index),
            ChildSlot::Case(case) => write!(f, "case {}", case),
            ChildSlot::LoopBody => write!(f, "loop body"),
        }
    }
}

/// One ordered child list of a composite node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildList {
    pub slot: ChildSlot,
    pub nodes: Vec<NodeHandle>,
}

/// Graph element wrapping one task definition.
///
/// The node owns its task payload, minus the nested lists: those are owned by the
/// child nodes and are stitched back together by [`Graph::to_tasks`](super::Graph::to_tasks).
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) task: TaskDefinition,
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) lists: Vec<ChildList>,
    pub(crate) behavior: Arc<dyn NodeBehavior>,
    pub(crate) execution: Option<NodeExecution>,
    /// Stubs replaced by inserts, per child list. A list emptied later gets its stub back.
    pub(crate) spare_stubs: AHashMap<ChildSlot, TaskDefinition>,
}

impl Node {
    /// Wraps `task` in a node driven by `behavior`. Used by node factories.
    pub fn new(task: TaskDefinition, behavior: Arc<dyn NodeBehavior>) -> Self {
        Self {
            task,
            parent: None,
            lists: Vec::new(),
            behavior,
            execution: None,
            spare_stubs: AHashMap::new(),
        }
    }

    /// An opaque node for a kind nobody registered.
    pub fn placeholder(task: TaskDefinition) -> Self {
        Self::new(task, Arc::new(PlaceholderBehavior))
    }

    pub fn id(&self) -> &str {
        &self.task.task_reference_name
    }

    pub fn kind(&self) -> &TaskKind {
        &self.task.kind
    }

    /// The node's own payload. Nested task lists are empty here.
    pub fn task(&self) -> &TaskDefinition {
        &self.task
    }

    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    pub fn lists(&self) -> &[ChildList] {
        &self.lists
    }

    pub fn list(&self, slot: &ChildSlot) -> Option<&ChildList> {
        self.lists.iter().find(|list| &list.slot == slot)
    }

    /// Direct children across all child lists, in slot order.
    pub fn children(&self) -> Vec<NodeHandle> {
        self.lists
            .iter()
            .flat_map(|list| list.nodes.iter().copied())
            .collect()
    }

    pub fn behavior(&self) -> &dyn NodeBehavior {
        self.behavior.as_ref()
    }

    pub fn is_placeholder(&self) -> bool {
        self.behavior.is_placeholder()
    }

    pub fn is_composite(&self) -> bool {
        self.behavior.is_composite()
    }

    pub fn is_stub(&self) -> bool {
        self.task.is_stub()
    }

    /// Latest execution state reported for this node, if any.
    pub fn execution(&self) -> Option<&NodeExecution> {
        self.execution.as_ref()
    }

    /// Position of `child` as (list index, position within list).
    pub(crate) fn locate_child(&self, child: NodeHandle) -> Option<(usize, usize)> {
        self.lists.iter().enumerate().find_map(|(list_index, list)| {
            list.nodes
                .iter()
                .position(|handle| *handle == child)
                .map(|position| (list_index, position))
        })
    }
}
