//! Node type registry.
//!
//! Maps a task kind to the factory that builds nodes for it. Callers resolve
//! behaviour once, by table lookup, and never need to know the concrete node type.
//! New kinds are added by registering a factory; the graph and the flattener stay
//! untouched.

use crate::error::FlowError;
use crate::graph::{GraphConfig, Node};
use crate::task::{TaskDefinition, TaskKind};
use ahash::AHashMap;
use std::sync::{Arc, OnceLock};

mod behavior;

pub use behavior::*;

/// What a factory gets to see of the graph it is building nodes for.
#[derive(Debug, Clone, Copy)]
pub struct GraphContext<'a> {
    pub workflow_id: Option<&'a str>,
    pub config: &'a GraphConfig,
}

/// Builds the node for one task of a registered kind.
pub trait NodeFactory: Send + Sync {
    fn create(&self, task: TaskDefinition, context: &GraphContext<'_>) -> Node;
}

impl<F> NodeFactory for F
where
    F: Fn(TaskDefinition, &GraphContext<'_>) -> Node + Send + Sync,
{
    fn create(&self, task: TaskDefinition, context: &GraphContext<'_>) -> Node {
        self(task, context)
    }
}

/// Factory that wraps every task in a node sharing one behaviour instance.
#[derive(Debug, Clone)]
pub struct BehaviorFactory {
    behavior: Arc<dyn NodeBehavior>,
}

impl BehaviorFactory {
    pub fn new(behavior: impl NodeBehavior + 'static) -> Self {
        Self {
            behavior: Arc::new(behavior),
        }
    }
}

impl NodeFactory for BehaviorFactory {
    fn create(&self, task: TaskDefinition, _context: &GraphContext<'_>) -> Node {
        Node::new(task, Arc::clone(&self.behavior))
    }
}

/// Table of task kind to node factory.
///
/// Registration happens once, at start-up. Registering the same kind twice is a
/// programming error and is reported instead of silently replacing the factory.
#[derive(Clone, Default)]
pub struct NodeRegistry {
    factories: AHashMap<TaskKind, Arc<dyn NodeFactory>>,
}

macro_rules! register_default_kinds {
    ( $registry:expr; $( $behavior:ident => [ $( $kind:ident ),* $(,)? ] ),* $(,)? ) => {
        $(
            let factory = Arc::new(BehaviorFactory::new($behavior));
            $(
                $registry
                    .factories
                    .insert(TaskKind::$kind, factory.clone() as Arc<dyn NodeFactory>);
            )*
        )*
    };
}

impl NodeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in control-flow and leaf kinds.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        register_default_kinds! {
            registry;
            LeafBehavior => [
                Simple, Human, Dynamic, Join, ExclusiveJoin, SubWorkflow, Event, Wait, Http,
                Lambda, Inline, Terminate, KafkaPublish, JsonJqTransform, SetVariable,
            ],
            ForkJoinBehavior => [ForkJoin],
            SwitchBehavior => [Switch, Decision],
            DoWhileBehavior => [DoWhile],
        }
        registry
    }

    /// The process-wide default registry, built on first use.
    pub fn shared() -> Arc<NodeRegistry> {
        static SHARED: OnceLock<Arc<NodeRegistry>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(NodeRegistry::with_defaults())))
    }

    /// Registers a factory for `kind`.
    pub fn register(
        &mut self,
        kind: impl Into<TaskKind>,
        factory: impl NodeFactory + 'static,
    ) -> Result<(), FlowError> {
        let kind = kind.into();
        if self.factories.contains_key(&kind) {
            return Err(FlowError::DuplicateRegistration { kind });
        }
        self.factories.insert(kind, Arc::new(factory));
        Ok(())
    }

    /// Registers `behavior` for `kind` through a [`BehaviorFactory`].
    pub fn register_behavior(
        &mut self,
        kind: impl Into<TaskKind>,
        behavior: impl NodeBehavior + 'static,
    ) -> Result<(), FlowError> {
        self.register(kind, BehaviorFactory::new(behavior))
    }

    /// Looks up the factory responsible for `task`.
    pub fn factory_for(&self, task: &TaskDefinition) -> Result<&dyn NodeFactory, FlowError> {
        self.factories
            .get(&task.kind)
            .map(|factory| factory.as_ref())
            .ok_or_else(|| FlowError::UnknownKind {
                kind: task.kind.clone(),
                reference_name: task.task_reference_name.clone(),
            })
    }

    /// Builds the node for `task`. Fails with [`FlowError::UnknownKind`] when the kind is not registered.
    pub fn create(&self, task: TaskDefinition, context: &GraphContext<'_>) -> Result<Node, FlowError> {
        let factory = self.factory_for(&task)?;
        Ok(factory.create(task, context))
    }

    pub fn contains(&self, kind: &TaskKind) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered kinds, sorted by wire name.
    pub fn kinds(&self) -> Vec<&TaskKind> {
        let mut kinds: Vec<_> = self.factories.keys().collect();
        kinds.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        kinds
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
