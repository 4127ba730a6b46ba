use super::{Graph, NodeHandle};
use itertools::Itertools;
use serde::Serialize;

const INDENT: &str = "  ";

/// Renders a graph as an indented text tree, for terminals and logs.
pub struct Outline;

impl Outline {
    /// Formats every node as `[KIND] reference_name`, with child lists as labelled
    /// sub-blocks and the latest execution status appended when one was reported.
    pub fn render(graph: &Graph) -> String {
        let mut lines = Vec::new();
        for root in graph.roots() {
            Self::render_node(graph, *root, 0, &mut lines);
        }
        lines.into_iter().join("\n")
    }

    /// Single-line summary of one node.
    pub fn describe(graph: &Graph, handle: NodeHandle) -> Option<String> {
        let node = graph.slot(handle)?;
        let mut line = format!("[{}] {}", node.kind(), node.id());
        if node.name_differs() {
            line.push_str(&format!(" ({})", node.task.name));
        }
        if node.is_placeholder() {
            line.push_str(" (unsupported)");
        } else if node.is_stub() {
            line.push_str(" (empty)");
        }
        if let Some(execution) = node.execution() {
            line.push_str(&format!("  {}", Self::status_label(&execution.status)));
        }
        Some(line)
    }

    fn render_node(graph: &Graph, handle: NodeHandle, depth: usize, lines: &mut Vec<String>) {
        let Some(node) = graph.slot(handle) else {
            return;
        };
        let pad = INDENT.repeat(depth);
        if let Some(line) = Self::describe(graph, handle) {
            lines.push(format!("{}{}", pad, line));
        }
        for list in node.lists() {
            lines.push(format!("{}{}{}:", pad, INDENT, list.slot));
            for child in &list.nodes {
                Self::render_node(graph, *child, depth + 2, lines);
            }
        }
    }

    fn status_label<T: Serialize>(status: &T) -> String {
        serde_json::to_value(status)
            .ok()
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_default()
    }
}

impl super::Node {
    fn name_differs(&self) -> bool {
        !self.task.name.is_empty() && self.task.name != self.task.task_reference_name && !self.is_stub()
    }
}
