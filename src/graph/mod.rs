//! Mutable, renderable mirror of a workflow's task tree.
//!
//! The [`Graph`] owns every [`Node`] in a single arena. Parent and child relations
//! are stored as [`NodeHandle`]s into that arena, never as ownership edges, so
//! deleting a subtree cannot leave a cycle behind. Handles are generational: once a
//! node is deleted every handle to it fails with [`FlowError::DetachedNode`].

use crate::error::FlowError;
use crate::registry::{GraphContext, NodeRegistry};
use crate::task::{TaskDefinition, factory};
use ahash::AHashMap;
use std::collections::VecDeque;
use std::sync::{Arc, mpsc};
use tracing::{debug, warn};

mod events;
mod execution;
mod mutation;
mod node;
mod outline;

pub use events::{GraphEvent, SubscriptionId};
pub use execution::{ExecutionStatus, NodeExecution, TaskExecutionUpdate};
pub use mutation::InsertRequest;
pub use node::{ChildList, ChildSlot, Node, NodeHandle};
pub use outline::Outline;

use events::EventBus;

/// Tunables of a graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphConfig {
    /// Id of the workflow this graph edits, passed on to node factories.
    pub workflow_id: Option<String>,
    /// Upper bound on the number of cases a switch node may hold.
    pub max_switch_cases: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            workflow_id: None,
            max_switch_cases: 20,
        }
    }
}

pub struct GraphBuilder {
    config: GraphConfig,
    registry: Option<Arc<NodeRegistry>>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            config: GraphConfig::default(),
            registry: None,
        }
    }

    /// Uses `registry` instead of the shared default registry.
    pub fn registry(mut self, registry: Arc<NodeRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn workflow_id(mut self, workflow_id: impl Into<String>) -> Self {
        self.config.workflow_id = Some(workflow_id.into());
        self
    }

    pub fn max_switch_cases(mut self, max: usize) -> Self {
        self.config.max_switch_cases = max;
        self
    }

    pub fn build(self) -> Graph {
        Graph {
            config: self.config,
            registry: self.registry.unwrap_or_else(NodeRegistry::shared),
            entries: Vec::new(),
            free: Vec::new(),
            live: 0,
            roots: Vec::new(),
            index: AHashMap::new(),
            events: EventBus::default(),
        }
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct Entry {
    generation: u32,
    node: Option<Node>,
}

/// The node tree of one workflow version, with structural edits and change events.
///
/// A graph is driven from a single thread. Every mutating call emits exactly one
/// `update` event once the change is fully applied, and a call that fails changes
/// nothing.
#[derive(Debug)]
pub struct Graph {
    config: GraphConfig,
    registry: Arc<NodeRegistry>,
    entries: Vec<Entry>,
    free: Vec<u32>,
    live: usize,
    roots: Vec<NodeHandle>,
    index: AHashMap<String, NodeHandle>,
    events: EventBus,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// Creates an empty graph backed by the shared default registry.
    pub fn new() -> Self {
        GraphBuilder::new().build()
    }

    pub fn builder() -> GraphBuilder {
        GraphBuilder::new()
    }

    /// Creates a graph and loads `tasks` into it.
    pub fn from_tasks(tasks: Vec<TaskDefinition>) -> Self {
        let mut graph = Self::new();
        graph.load(tasks);
        graph
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    // --- Loading ---

    /// Replaces the whole tree with `tasks`.
    ///
    /// Every nested task gets a node from the registry. A task whose kind has no
    /// registered factory becomes a placeholder node; its siblings and ancestors load
    /// normally. Handles from before the call are invalidated.
    pub fn load(&mut self, tasks: Vec<TaskDefinition>) {
        self.clear_nodes();
        let roots = tasks
            .into_iter()
            .map(|task| self.materialize(task, None))
            .collect();
        self.roots = roots;
        debug!(nodes = self.live, roots = self.roots.len(), "loaded workflow graph");
        self.emit_update();
    }

    fn clear_nodes(&mut self) {
        for (index, entry) in self.entries.iter_mut().enumerate() {
            if entry.node.take().is_some() {
                entry.generation = entry.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.live = 0;
        self.roots.clear();
        self.index.clear();
    }

    fn create_node(&self, task: TaskDefinition) -> Node {
        let context = GraphContext {
            workflow_id: self.config.workflow_id.as_deref(),
            config: &self.config,
        };
        match self.registry.factory_for(&task) {
            Ok(factory) => factory.create(task, &context),
            Err(err) => {
                warn!(error = %err, "substituting placeholder node");
                Node::placeholder(task)
            }
        }
    }

    /// Builds the node subtree for `task` under `parent` and returns its root handle.
    pub(crate) fn materialize(&mut self, task: TaskDefinition, parent: Option<NodeHandle>) -> NodeHandle {
        let mut node = self.create_node(task);
        node.parent = parent;
        let pending = node.behavior.split_children(&mut node.task);
        let reference_name = node.id().to_string();
        let handle = self.alloc(node);

        if self.index.contains_key(&reference_name) {
            warn!(reference_name = %reference_name, "duplicate reference name; keeping the first node");
        } else {
            self.index.insert(reference_name, handle);
        }

        let lists = pending
            .into_iter()
            .map(|(slot, tasks)| ChildList {
                slot,
                nodes: tasks
                    .into_iter()
                    .map(|child| self.materialize(child, Some(handle)))
                    .collect(),
            })
            .collect();
        if let Some(node) = self.slot_mut(handle) {
            node.lists = lists;
        }
        handle
    }

    /// A stub task whose reference name is not yet used in this graph.
    pub(crate) fn fresh_stub(&self) -> TaskDefinition {
        loop {
            let stub = factory::stub_task();
            if !self.index.contains_key(stub.id()) {
                return stub;
            }
        }
    }

    // --- Arena ---

    fn alloc(&mut self, node: Node) -> NodeHandle {
        self.live += 1;
        match self.free.pop() {
            Some(index) => {
                let entry = &mut self.entries[index as usize];
                entry.node = Some(node);
                NodeHandle {
                    index,
                    generation: entry.generation,
                }
            }
            None => {
                self.entries.push(Entry {
                    generation: 0,
                    node: Some(node),
                });
                NodeHandle {
                    index: (self.entries.len() - 1) as u32,
                    generation: 0,
                }
            }
        }
    }

    fn release(&mut self, handle: NodeHandle) -> Option<Node> {
        let entry = self.entries.get_mut(handle.index as usize)?;
        if entry.generation != handle.generation {
            return None;
        }
        let node = entry.node.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.live -= 1;
        if self.index.get(node.id()) == Some(&handle) {
            self.index.remove(node.id());
        }
        Some(node)
    }

    /// Frees `handle` and everything below it. Parent lists are left alone.
    pub(crate) fn release_subtree(&mut self, handle: NodeHandle) {
        for descendant in self.subtree(handle) {
            self.release(descendant);
        }
    }

    pub(crate) fn slot(&self, handle: NodeHandle) -> Option<&Node> {
        self.entries
            .get(handle.index as usize)
            .filter(|entry| entry.generation == handle.generation)
            .and_then(|entry| entry.node.as_ref())
    }

    pub(crate) fn slot_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.entries
            .get_mut(handle.index as usize)
            .filter(|entry| entry.generation == handle.generation)
            .and_then(|entry| entry.node.as_mut())
    }

    // --- Lookup ---

    /// Resolves a handle. Fails with [`FlowError::DetachedNode`] once the node was deleted.
    pub fn node(&self, handle: NodeHandle) -> Result<&Node, FlowError> {
        self.slot(handle).ok_or(FlowError::DetachedNode { handle })
    }

    pub fn parent(&self, handle: NodeHandle) -> Result<Option<NodeHandle>, FlowError> {
        self.node(handle).map(Node::parent)
    }

    pub fn children(&self, handle: NodeHandle) -> Result<Vec<NodeHandle>, FlowError> {
        self.node(handle).map(Node::children)
    }

    /// Whether `handle` still refers to a live node.
    pub fn is_attached(&self, handle: NodeHandle) -> bool {
        self.slot(handle).is_some()
    }

    pub fn handle_of(&self, reference_name: &str) -> Option<NodeHandle> {
        self.index.get(reference_name).copied()
    }

    /// Finds a node anywhere in the tree by its reference name.
    pub fn find_by_reference_name(&self, reference_name: &str) -> Option<&Node> {
        self.handle_of(reference_name).and_then(|handle| self.slot(handle))
    }

    pub fn contains(&self, reference_name: &str) -> bool {
        self.index.contains_key(reference_name)
    }

    pub fn roots(&self) -> &[NodeHandle] {
        &self.roots
    }

    /// Number of live nodes, nested ones included.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Ids of the ancestors of `reference_name`, root first, excluding the node itself.
    ///
    /// This is the `path` an [`InsertRequest`] next to that node needs.
    pub fn path_to(&self, reference_name: &str) -> Option<Vec<String>> {
        let handle = self.handle_of(reference_name)?;
        let mut path = Vec::new();
        let mut current = self.slot(handle)?.parent;
        while let Some(ancestor) = current {
            let node = self.slot(ancestor)?;
            path.push(node.id().to_string());
            current = node.parent;
        }
        path.reverse();
        Some(path)
    }

    /// The composite node and child slot that directly hold `reference_name`,
    /// e.g. the fork branch a task sits in. `None` for top-level nodes.
    pub fn enclosing_slot(&self, reference_name: &str) -> Option<(NodeHandle, ChildSlot)> {
        let handle = self.handle_of(reference_name)?;
        let parent = self.slot(handle)?.parent?;
        let parent_node = self.slot(parent)?;
        let (list, _) = parent_node.locate_child(handle)?;
        Some((parent, parent_node.lists[list].slot.clone()))
    }

    /// `handle` and all its descendants, pre-order.
    pub fn subtree(&self, handle: NodeHandle) -> Vec<NodeHandle> {
        let mut output = Vec::new();
        let mut stack = vec![handle];
        while let Some(current) = stack.pop() {
            let Some(node) = self.slot(current) else {
                continue;
            };
            output.push(current);
            let children = node.children();
            stack.extend(children.into_iter().rev());
        }
        output
    }

    /// Node handles in the same breadth-first order as [`crate::flatten::flatten`].
    pub fn linear_view(&self) -> Vec<NodeHandle> {
        let mut queue: VecDeque<NodeHandle> = self.roots.iter().copied().collect();
        let mut output = Vec::with_capacity(self.live);
        while let Some(handle) = queue.pop_front() {
            let Some(node) = self.slot(handle) else {
                continue;
            };
            output.push(handle);
            queue.extend(node.children());
        }
        output
    }

    /// Every live node, in breadth-first order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeHandle, &Node)> {
        self.linear_view()
            .into_iter()
            .filter_map(|handle| self.slot(handle).map(|node| (handle, node)))
    }

    // --- Reconstruction ---

    /// Rebuilds the task definition tree from the current nodes.
    pub fn to_tasks(&self) -> Vec<TaskDefinition> {
        self.roots
            .iter()
            .filter_map(|handle| self.rebuild(*handle))
            .collect()
    }

    /// Rebuilds the task definition subtree rooted at `handle`.
    pub fn task_tree(&self, handle: NodeHandle) -> Result<TaskDefinition, FlowError> {
        self.rebuild(handle).ok_or(FlowError::DetachedNode { handle })
    }

    fn rebuild(&self, handle: NodeHandle) -> Option<TaskDefinition> {
        let node = self.slot(handle)?;
        let mut task = node.task.clone();
        let children = node
            .lists
            .iter()
            .map(|list| {
                let tasks = list
                    .nodes
                    .iter()
                    .filter_map(|child| self.rebuild(*child))
                    .collect();
                (list.slot.clone(), tasks)
            })
            .collect();
        node.behavior.join_children(&mut task, children);
        Some(task)
    }

    // --- Events ---

    /// Registers a callback that receives every event, synchronously and in order.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&GraphEvent) + Send + 'static,
    {
        self.events.subscribe(Box::new(callback))
    }

    /// Registers a channel subscriber, for consumers living on another thread.
    pub fn subscribe_channel(&mut self) -> (SubscriptionId, mpsc::Receiver<GraphEvent>) {
        self.events.subscribe_channel()
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Revision of the last emitted event; `0` before any event.
    pub fn revision(&self) -> u64 {
        self.events.revision()
    }

    /// Asks subscribers to re-sync their view without changing the graph.
    pub fn refresh(&mut self) {
        let revision = self.events.next_revision();
        self.events.emit(GraphEvent::Refresh { revision });
    }

    pub(crate) fn emit_update(&mut self) {
        let tasks = self.to_tasks();
        let revision = self.events.next_revision();
        self.events.emit(GraphEvent::Update { revision, tasks });
    }
}
