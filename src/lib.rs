//! # vines-flow - Workflow Control-Flow Graph Engine
//!
//! **vines-flow** turns a workflow's nested task definition (sequential steps, parallel
//! forks, switches, loops and sub-workflows, in the execution engine's own JSON shape)
//! into an editable node graph, flattens it back into a linear task list, and checks it
//! for problems before it is submitted for execution.
//!
//! ## Core Workflow
//!
//! 1.  **Load Your Tasks**: Parse the engine JSON into [`task::TaskDefinition`]s, or
//!     implement [`task::IntoTasks`] for your own format.
//! 2.  **Build a Graph**: [`graph::Graph::load`] materializes one node per task through the
//!     [`registry::NodeRegistry`]. Kinds nobody registered become placeholder nodes.
//! 3.  **Edit**: insert, delete, move and configure nodes. Every completed edit emits
//!     exactly one event to subscribers, in order.
//! 4.  **Flatten and Validate**: [`flatten::flatten`] produces the breadth-first linear
//!     view used for search and execution correlation, and [`validation::Validator`]
//!     reports issues against a catalog of block definitions.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vines_flow::prelude::*;
//! use serde_json::json;
//!
//! fn main() -> Result<()> {
//!     let tasks = vec![
//!         TaskDefinition::new("t1", TaskKind::Simple),
//!         TaskDefinition::new("t2", TaskKind::ForkJoin)
//!             .with_fork_tasks(vec![
//!                 vec![TaskDefinition::new("t3", TaskKind::Simple)],
//!                 vec![TaskDefinition::new("t4", TaskKind::Simple)],
//!             ])
//!             .with_join_on(["t3", "t4"]),
//!     ];
//!
//!     // Breadth-first: t1, t2, t3, t4
//!     let names: Vec<_> = flatten(&tasks).into_iter().map(TaskDefinition::id).collect();
//!     println!("{:?}", names);
//!
//!     let mut graph = Graph::new();
//!     graph.subscribe(|event| println!("{} #{}", event.name(), event.revision()));
//!     graph.load(tasks);
//!
//!     graph.insert(
//!         InsertRequest::after("t3", vec![TaskDefinition::new("t5", TaskKind::Http)]).with_path(["t2"]),
//!     )?;
//!     println!("{}", Outline::render(&graph));
//!
//!     let validator = Validator::builder(vec![])
//!         .with_block(
//!             BlockDefinition::new("t5").with_property(BlockProperty::new("url", PropertyType::String).required()),
//!         )
//!         .build();
//!     let result = validator.validate_graph(&graph);
//!     println!("{}", serde_json::to_string_pretty(&result)?);
//!     assert!(!result.validated);
//!
//!     graph.configure("t5", |task| {
//!         task.input_parameters.insert("url".into(), json!("https://example.com"));
//!     })?;
//!     assert!(validator.validate_graph(&graph).validated);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod flatten;
pub mod graph;
pub mod prelude;
pub mod registry;
pub mod task;
pub mod validation;
