use super::{ChildList, ChildSlot, Graph, Node, NodeHandle};
use crate::error::FlowError;
use crate::flatten::flatten;
use crate::task::TaskDefinition;
use ahash::AHashSet;
use tracing::debug;

/// Where to put new tasks: next to `target_id`, inside the container reached via `path`.
///
/// `path` lists the ids of the containers from the top level down to the list holding
/// the target, and is empty for a top-level target. [`Graph::path_to`] computes it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InsertRequest {
    pub target_id: String,
    pub tasks: Vec<TaskDefinition>,
    pub path: Vec<String>,
    pub insert_before: bool,
}

impl InsertRequest {
    /// Inserts `tasks` right after the top-level task `target_id`.
    pub fn after(target_id: impl Into<String>, tasks: Vec<TaskDefinition>) -> Self {
        Self {
            target_id: target_id.into(),
            tasks,
            path: Vec::new(),
            insert_before: false,
        }
    }

    /// Inserts `tasks` right before the top-level task `target_id`.
    pub fn before(target_id: impl Into<String>, tasks: Vec<TaskDefinition>) -> Self {
        Self {
            insert_before: true,
            ..Self::after(target_id, tasks)
        }
    }

    pub fn with_path<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path = path.into_iter().map(Into::into).collect();
        self
    }
}

/// Position of a node: owning container (`None` for the top level), list index, index in list.
#[derive(Debug, Clone, Copy)]
struct Location {
    parent: Option<NodeHandle>,
    list: usize,
    position: usize,
}

fn valid_case_name(case: &str) -> bool {
    let mut chars = case.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic()) && chars.all(|c| c.is_ascii_alphanumeric())
}

impl Graph {
    // --- Positions ---

    fn locate(&self, handle: NodeHandle) -> Option<Location> {
        let node = self.slot(handle)?;
        match node.parent {
            None => {
                let position = self.roots.iter().position(|root| *root == handle)?;
                Some(Location {
                    parent: None,
                    list: 0,
                    position,
                })
            }
            Some(parent) => {
                let (list, position) = self.slot(parent)?.locate_child(handle)?;
                Some(Location {
                    parent: Some(parent),
                    list,
                    position,
                })
            }
        }
    }

    fn list_mut(&mut self, parent: Option<NodeHandle>, list: usize) -> Option<&mut Vec<NodeHandle>> {
        match parent {
            None => Some(&mut self.roots),
            Some(parent) => self
                .slot_mut(parent)?
                .lists
                .get_mut(list)
                .map(|list| &mut list.nodes),
        }
    }

    fn direct_children(&self, container: Option<NodeHandle>) -> Vec<NodeHandle> {
        match container {
            None => self.roots.clone(),
            Some(handle) => self.slot(handle).map(Node::children).unwrap_or_default(),
        }
    }

    /// Walks `path` from the top level and checks that `target_id` sits in the last container.
    fn resolve_target(&self, path: &[String], target_id: &str) -> Result<(NodeHandle, Location), FlowError> {
        let not_found = || FlowError::NodeNotFound {
            target_id: target_id.to_string(),
            path: path.to_vec(),
        };

        let mut container = None;
        for id in path {
            let next = self
                .direct_children(container)
                .into_iter()
                .find(|handle| self.slot(*handle).is_some_and(|node| node.id() == id))
                .ok_or_else(not_found)?;
            container = Some(next);
        }

        let target = self.handle_of(target_id).ok_or_else(not_found)?;
        let location = self.locate(target).ok_or_else(not_found)?;
        if location.parent != container {
            return Err(not_found());
        }
        Ok((target, location))
    }

    fn node_not_found(&self, target_id: &str) -> FlowError {
        FlowError::NodeNotFound {
            target_id: target_id.to_string(),
            path: Vec::new(),
        }
    }

    /// Rejects `tasks` if any reference name in them is already taken, or repeated.
    /// `replaced` is the name of a node the insert will remove.
    fn check_unique(&self, tasks: &[TaskDefinition], replaced: Option<&str>) -> Result<(), FlowError> {
        let mut seen = AHashSet::new();
        for task in flatten(tasks) {
            let name = task.id();
            let taken = self.index.contains_key(name) && Some(name) != replaced;
            if taken || !seen.insert(name) {
                return Err(FlowError::DuplicateReference {
                    reference_name: name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Splices `handles` into the list at `location`, replacing the node there if
    /// `replace` is set, else next to it.
    fn splice_at(&mut self, location: Location, handles: &[NodeHandle], before: bool, replace: bool) {
        let at = if before || replace {
            location.position
        } else {
            location.position + 1
        };
        let removed = usize::from(replace);
        if let Some(list) = self.list_mut(location.parent, location.list) {
            let end = (at + removed).min(list.len());
            let at = at.min(list.len());
            list.splice(at..end, handles.iter().copied());
        }
        for handle in handles {
            if let Some(node) = self.slot_mut(*handle) {
                node.parent = location.parent;
            }
        }
    }

    /// Removes `handle` from its list. A composite parent whose list ends up empty
    /// gets a fresh stub so the list stays renderable.
    fn detach(&mut self, handle: NodeHandle, location: Location) {
        if let Some(list) = self.list_mut(location.parent, location.list) {
            list.retain(|existing| *existing != handle);
        }
        let Some(parent) = location.parent else {
            return;
        };
        let refill = self.slot(parent).is_some_and(|node| {
            node.behavior.refills_empty_lists()
                && node.lists.get(location.list).is_some_and(|list| list.nodes.is_empty())
        });
        if refill {
            let stub = self
                .slot_mut(parent)
                .and_then(|node| {
                    let slot = node.lists.get(location.list)?.slot.clone();
                    node.spare_stubs.remove(&slot)
                })
                .filter(|stub| !self.index.contains_key(stub.id()))
                .unwrap_or_else(|| self.fresh_stub());
            let stub = self.materialize(stub, Some(parent));
            if let Some(list) = self.list_mut(Some(parent), location.list) {
                list.push(stub);
            }
        }
    }

    /// Frees the stub `target` that an insert or move is about to replace, keeping its
    /// payload on the parent so the list gets the same stub back if it empties again.
    fn retire_stub(&mut self, target: NodeHandle, location: Location) {
        let stub = self.rebuild(target);
        self.release_subtree(target);
        let (Some(parent), Some(stub)) = (location.parent, stub) else {
            return;
        };
        if let Some(node) = self.slot_mut(parent) {
            if let Some(slot) = node.lists.get(location.list).map(|list| list.slot.clone()) {
                node.spare_stubs.insert(slot, stub);
            }
        }
    }

    // --- Structural edits ---

    /// Inserts new tasks before or after an existing node.
    ///
    /// The target must be found by walking `path`; otherwise the call fails with
    /// [`FlowError::NodeNotFound`] and nothing changes. A stub target is replaced by
    /// the new tasks instead of being kept next to them. Returns the handles of the
    /// inserted top-most nodes.
    pub fn insert(&mut self, request: InsertRequest) -> Result<Vec<NodeHandle>, FlowError> {
        let InsertRequest {
            target_id,
            tasks,
            path,
            insert_before,
        } = request;

        let (target, location) = self.resolve_target(&path, &target_id)?;
        let replace_stub = self.slot(target).is_some_and(Node::is_stub);
        self.check_unique(&tasks, replace_stub.then_some(target_id.as_str()))?;
        if tasks.is_empty() {
            return Ok(Vec::new());
        }

        if replace_stub {
            self.retire_stub(target, location);
        }
        let handles: Vec<NodeHandle> = tasks
            .into_iter()
            .map(|task| self.materialize(task, location.parent))
            .collect();
        self.splice_at(location, &handles, insert_before, replace_stub);

        debug!(
            target = %target_id,
            count = handles.len(),
            before = insert_before,
            replaced_stub = replace_stub,
            "inserted tasks"
        );
        self.emit_update();
        Ok(handles)
    }

    /// Like [`Graph::insert`], computing the path to `target_id` itself.
    pub fn insert_at(
        &mut self,
        target_id: &str,
        tasks: Vec<TaskDefinition>,
        insert_before: bool,
    ) -> Result<Vec<NodeHandle>, FlowError> {
        let path = self
            .path_to(target_id)
            .ok_or_else(|| self.node_not_found(target_id))?;
        self.insert(InsertRequest {
            target_id: target_id.to_string(),
            tasks,
            path,
            insert_before,
        })
    }

    /// Appends tasks at the end of the top level.
    pub fn append(&mut self, tasks: Vec<TaskDefinition>) -> Result<Vec<NodeHandle>, FlowError> {
        self.check_unique(&tasks, None)?;
        if tasks.is_empty() {
            return Ok(Vec::new());
        }
        let handles: Vec<NodeHandle> = tasks
            .into_iter()
            .map(|task| self.materialize(task, None))
            .collect();
        self.roots.extend(handles.iter().copied());
        debug!(count = handles.len(), "appended tasks");
        self.emit_update();
        Ok(handles)
    }

    /// Removes the node `node_id` and its whole subtree.
    ///
    /// Returns `false` and emits nothing if no such node exists. A branch, case or
    /// loop body left empty is refilled with a stub.
    pub fn delete(&mut self, node_id: &str) -> bool {
        let Some(handle) = self.handle_of(node_id) else {
            return false;
        };
        let Some(location) = self.locate(handle) else {
            return false;
        };
        self.detach(handle, location);
        self.release_subtree(handle);
        debug!(node = %node_id, "deleted node");
        self.emit_update();
        true
    }

    /// Moves `source_id` with its subtree next to `target_id`.
    ///
    /// Fails with [`FlowError::InvalidMove`] when the target is the source or lies
    /// inside it.
    pub fn move_node(&mut self, source_id: &str, target_id: &str, insert_before: bool) -> Result<(), FlowError> {
        let source = self
            .handle_of(source_id)
            .ok_or_else(|| self.node_not_found(source_id))?;
        let target = self
            .handle_of(target_id)
            .ok_or_else(|| self.node_not_found(target_id))?;
        if self.subtree(source).contains(&target) {
            return Err(FlowError::InvalidMove {
                source_id: source_id.to_string(),
                target_id: target_id.to_string(),
            });
        }
        let source_location = self
            .locate(source)
            .ok_or_else(|| self.node_not_found(source_id))?;
        if self.locate(target).is_none() {
            return Err(self.node_not_found(target_id));
        }

        self.detach(source, source_location);
        let Some(target_location) = self.locate(target) else {
            return Err(self.node_not_found(target_id));
        };
        let replace_stub = self.slot(target).is_some_and(Node::is_stub);
        if replace_stub {
            self.retire_stub(target, target_location);
        }
        self.splice_at(target_location, &[source], insert_before, replace_stub);

        debug!(source = %source_id, target = %target_id, "moved node");
        self.emit_update();
        Ok(())
    }

    /// Edits the payload of `node_id` in place.
    ///
    /// The edit runs on a copy and is committed only if it is valid: the kind cannot
    /// change, nested task lists are owned by the child nodes and are left as they
    /// are, and a renamed reference must stay unique.
    pub fn configure<F>(&mut self, node_id: &str, edit: F) -> Result<(), FlowError>
    where
        F: FnOnce(&mut TaskDefinition),
    {
        let handle = self
            .handle_of(node_id)
            .ok_or_else(|| self.node_not_found(node_id))?;
        let node = self.node(handle)?;
        let mut task = node.task.clone();
        edit(&mut task);

        task.kind = node.task.kind.clone();
        task.fork_tasks = node.task.fork_tasks.clone();
        task.decision_cases = node.task.decision_cases.clone();
        task.loop_over = node.task.loop_over.clone();

        let renamed = task.task_reference_name != node_id;
        if renamed && self.index.contains_key(&task.task_reference_name) {
            return Err(FlowError::DuplicateReference {
                reference_name: task.task_reference_name,
            });
        }
        if renamed {
            self.index.remove(node_id);
            self.index.insert(task.task_reference_name.clone(), handle);
        }
        if let Some(node) = self.slot_mut(handle) {
            node.task = task;
        }

        debug!(node = %node_id, renamed, "configured node");
        self.emit_update();
        Ok(())
    }

    // --- Switch cases ---

    fn case_holder(&self, node_id: &str) -> Result<NodeHandle, FlowError> {
        let handle = self
            .handle_of(node_id)
            .ok_or_else(|| self.node_not_found(node_id))?;
        let node = self.node(handle)?;
        if !node.behavior.holds_cases() {
            return Err(FlowError::NotAContainer {
                node_id: node_id.to_string(),
                kind: node.kind().clone(),
            });
        }
        Ok(handle)
    }

    fn invalid_case(node_id: &str, case: &str, reason: &str) -> FlowError {
        FlowError::InvalidCase {
            node_id: node_id.to_string(),
            case: case.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Adds a case holding one stub to the switch `node_id`. Returns the stub's handle.
    ///
    /// Case names start with a letter and contain only letters and digits. A switch
    /// holds at most [`GraphConfig::max_switch_cases`](super::GraphConfig) cases.
    pub fn add_case(&mut self, node_id: &str, case: &str) -> Result<NodeHandle, FlowError> {
        let handle = self.case_holder(node_id)?;
        if !valid_case_name(case) {
            return Err(Self::invalid_case(
                node_id,
                case,
                "must start with a letter and contain only letters and digits",
            ));
        }
        let node = self.node(handle)?;
        let slot = ChildSlot::Case(case.to_string());
        if node.list(&slot).is_some() {
            return Err(Self::invalid_case(node_id, case, "case already exists"));
        }
        if node.lists.len() >= self.config.max_switch_cases {
            return Err(Self::invalid_case(node_id, case, "too many cases"));
        }

        let stub = self.fresh_stub();
        let stub = self.materialize(stub, Some(handle));
        if let Some(node) = self.slot_mut(handle) {
            node.lists.push(ChildList {
                slot,
                nodes: vec![stub],
            });
        }
        debug!(node = %node_id, case, "added case");
        self.emit_update();
        Ok(stub)
    }

    /// Adds the next free case named `branch<N>` and returns its name.
    pub fn add_case_incrementally(&mut self, node_id: &str) -> Result<String, FlowError> {
        let handle = self.case_holder(node_id)?;
        let node = self.node(handle)?;
        let case = (1..)
            .map(|n| format!("branch{}", n))
            .find(|name| node.list(&ChildSlot::Case(name.clone())).is_none())
            .unwrap_or_default();
        self.add_case(node_id, &case)?;
        Ok(case)
    }

    /// Removes the case `case` and every node in it. A switch keeps at least two cases.
    pub fn remove_case(&mut self, node_id: &str, case: &str) -> Result<(), FlowError> {
        let handle = self.case_holder(node_id)?;
        let node = self.node(handle)?;
        let slot = ChildSlot::Case(case.to_string());
        let Some(list_index) = node.lists.iter().position(|list| list.slot == slot) else {
            return Err(Self::invalid_case(node_id, case, "no such case"));
        };
        if node.lists.len() <= 2 {
            return Err(Self::invalid_case(node_id, case, "a switch needs at least two cases"));
        }

        let removed = match self.slot_mut(handle) {
            Some(node) => {
                node.spare_stubs.remove(&slot);
                node.lists.remove(list_index)
            }
            None => return Err(FlowError::DetachedNode { handle }),
        };
        for child in removed.nodes {
            self.release_subtree(child);
        }
        debug!(node = %node_id, case, "removed case");
        self.emit_update();
        Ok(())
    }

    /// Case names of the switch `node_id`, in order.
    pub fn cases(&self, node_id: &str) -> Result<Vec<String>, FlowError> {
        let handle = self.case_holder(node_id)?;
        let node = self.node(handle)?;
        Ok(node
            .lists
            .iter()
            .filter_map(|list| match &list.slot {
                ChildSlot::Case(case) => Some(case.clone()),
                _ => None,
            })
            .collect())
    }
}
