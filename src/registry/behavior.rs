use crate::graph::ChildSlot;
use crate::task::{DecisionCases, TaskDefinition};
use std::fmt::Debug;

/// Child task lists split out of a payload, tagged with the slot they belong to.
pub type ChildTasks = Vec<(ChildSlot, Vec<TaskDefinition>)>;

/// Defines how a node of one task kind owns its nested tasks.
///
/// The graph never matches on task kinds itself: it asks the node's behaviour to
/// split nested lists out of the payload on load and to put them back when the
/// tree is reconstructed.
pub trait NodeBehavior: Send + Sync + Debug {
    /// Moves the nested task lists out of `task`, in traversal order.
    ///
    /// By default every non-empty list the payload carries is moved out, so that
    /// nested tasks get nodes whatever the kind.
    fn split_children(&self, task: &mut TaskDefinition) -> ChildTasks {
        split_present_lists(task)
    }

    /// Writes reconstructed child lists back into `task`.
    fn join_children(&self, task: &mut TaskDefinition, children: ChildTasks) {
        join_present_lists(task, children)
    }

    /// Whether nodes of this kind hold nested task lists.
    fn is_composite(&self) -> bool {
        false
    }

    /// Whether a child list emptied by a delete gets a fresh stub task.
    fn refills_empty_lists(&self) -> bool {
        self.is_composite()
    }

    /// Whether child lists are named decision cases that can be added and removed.
    fn holds_cases(&self) -> bool {
        false
    }

    /// Whether this node stands in for a kind nobody registered.
    fn is_placeholder(&self) -> bool {
        false
    }
}

/// Fork branches, then decision cases, then the loop body, skipping absent lists.
fn split_present_lists(task: &mut TaskDefinition) -> ChildTasks {
    let mut children: ChildTasks = std::mem::take(&mut task.fork_tasks)
        .into_iter()
        .enumerate()
        .map(|(index, branch)| (ChildSlot::Branch(index), branch))
        .collect();
    children.extend(
        std::mem::take(&mut task.decision_cases)
            .into_iter()
            .map(|(case, tasks)| (ChildSlot::Case(case), tasks)),
    );
    let body = std::mem::take(&mut task.loop_over);
    if !body.is_empty() {
        children.push((ChildSlot::LoopBody, body));
    }
    children
}

fn join_present_lists(task: &mut TaskDefinition, children: ChildTasks) {
    let mut cases = DecisionCases::new();
    for (slot, tasks) in children {
        match slot {
            ChildSlot::Branch(_) => task.fork_tasks.push(tasks),
            ChildSlot::Case(case) => cases.insert(case, tasks),
            ChildSlot::LoopBody => task.loop_over.extend(tasks),
        }
    }
    if !cases.is_empty() {
        task.decision_cases = cases;
    }
}

/// A plain step with no nested tasks: `SIMPLE`, `HTTP`, `JOIN`, `SUB_WORKFLOW`, ...
#[derive(Debug, Default)]
pub struct LeafBehavior;

impl NodeBehavior for LeafBehavior {}

/// `FORK_JOIN`: one child list per parallel branch.
#[derive(Debug, Default)]
pub struct ForkJoinBehavior;

impl NodeBehavior for ForkJoinBehavior {
    fn split_children(&self, task: &mut TaskDefinition) -> ChildTasks {
        std::mem::take(&mut task.fork_tasks)
            .into_iter()
            .enumerate()
            .map(|(index, branch)| (ChildSlot::Branch(index), branch))
            .collect()
    }

    fn join_children(&self, task: &mut TaskDefinition, children: ChildTasks) {
        task.fork_tasks = children.into_iter().map(|(_, branch)| branch).collect();
    }

    fn is_composite(&self) -> bool {
        true
    }
}

/// `SWITCH` / `DECISION`: one child list per case, in declaration order.
#[derive(Debug, Default)]
pub struct SwitchBehavior;

impl NodeBehavior for SwitchBehavior {
    fn split_children(&self, task: &mut TaskDefinition) -> ChildTasks {
        std::mem::take(&mut task.decision_cases)
            .into_iter()
            .map(|(case, tasks)| (ChildSlot::Case(case), tasks))
            .collect()
    }

    fn join_children(&self, task: &mut TaskDefinition, children: ChildTasks) {
        task.decision_cases = children
            .into_iter()
            .filter_map(|(slot, tasks)| match slot {
                ChildSlot::Case(case) => Some((case, tasks)),
                _ => None,
            })
            .collect::<DecisionCases>();
    }

    fn is_composite(&self) -> bool {
        true
    }

    fn holds_cases(&self) -> bool {
        true
    }
}

/// `DO_WHILE`: a single child list holding the loop body.
#[derive(Debug, Default)]
pub struct DoWhileBehavior;

impl NodeBehavior for DoWhileBehavior {
    fn split_children(&self, task: &mut TaskDefinition) -> ChildTasks {
        vec![(ChildSlot::LoopBody, std::mem::take(&mut task.loop_over))]
    }

    fn join_children(&self, task: &mut TaskDefinition, children: ChildTasks) {
        task.loop_over = children.into_iter().flat_map(|(_, tasks)| tasks).collect();
    }

    fn is_composite(&self) -> bool {
        true
    }
}

/// Stand-in for a kind with no registered factory.
///
/// Whatever nested lists the payload carries become child nodes, resolved through
/// the registry like any other task. Emptied lists are not refilled with stubs.
#[derive(Debug, Default)]
pub struct PlaceholderBehavior;

impl NodeBehavior for PlaceholderBehavior {
    fn is_placeholder(&self) -> bool {
        true
    }
}
