//! Change notifications emitted by a graph.
//!
//! Events are delivered synchronously, in the order the mutations were applied,
//! one event per completed operation. Nothing is batched or coalesced.

use crate::task::TaskDefinition;
use serde::Serialize;
use std::sync::mpsc;
use tracing::trace;

/// Observable transitions of a graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GraphEvent {
    /// A structural or configuration change was applied. Carries the reconstructed tree.
    #[serde(rename_all = "camelCase")]
    Update {
        revision: u64,
        tasks: Vec<TaskDefinition>,
    },

    /// Subscribers should re-sync their view, e.g. after an execution finished.
    #[serde(rename_all = "camelCase")]
    Refresh { revision: u64 },

    /// Execution status arrived for the named nodes.
    #[serde(rename_all = "camelCase")]
    Execution {
        revision: u64,
        task_reference_names: Vec<String>,
    },
}

impl GraphEvent {
    /// Monotonic sequence number, unique per graph.
    pub fn revision(&self) -> u64 {
        match self {
            GraphEvent::Update { revision, .. }
            | GraphEvent::Refresh { revision }
            | GraphEvent::Execution { revision, .. } => *revision,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GraphEvent::Update { .. } => "update",
            GraphEvent::Refresh { .. } => "refresh",
            GraphEvent::Execution { .. } => "execution",
        }
    }
}

/// Token returned by [`Graph::subscribe`](super::Graph::subscribe), used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&GraphEvent) + Send>;

#[derive(Default)]
pub(crate) struct EventBus {
    subscribers: Vec<(SubscriptionId, Callback)>,
    next_id: u64,
    revision: u64,
}

impl EventBus {
    pub(crate) fn subscribe(&mut self, callback: Callback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, callback));
        id
    }

    pub(crate) fn subscribe_channel(&mut self) -> (SubscriptionId, mpsc::Receiver<GraphEvent>) {
        let (sender, receiver) = mpsc::channel();
        let id = self.subscribe(Box::new(move |event: &GraphEvent| {
            // A dropped receiver only means nobody listens any more.
            let _ = sender.send(event.clone());
        }));
        (id, receiver)
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    pub(crate) fn next_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn emit(&mut self, event: GraphEvent) {
        trace!(event = event.name(), revision = event.revision(), "emitting graph event");
        for (_, callback) in self.subscribers.iter_mut() {
            callback(&event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .field("revision", &self.revision)
            .finish()
    }
}
