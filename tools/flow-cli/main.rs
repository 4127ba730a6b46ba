use clap::{Parser, Subcommand};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vines_flow::prelude::*;

/// Inspect and validate Conductor-style workflow definitions
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every task of the workflow in breadth-first order
    Flatten {
        /// Path to the workflow JSON document (or a bare task array)
        workflow: String,
    },
    /// Print the node tree of the workflow
    Outline {
        /// Path to the workflow JSON document (or a bare task array)
        workflow: String,
    },
    /// Validate the workflow against a catalog of block definitions
    Validate {
        /// Path to the workflow JSON document (or a bare task array)
        workflow: String,
        /// Path to a JSON array of block definitions
        #[arg(short, long)]
        blocks: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Flatten { workflow } => run_flatten(&workflow, cli.json),
        Command::Outline { workflow } => run_outline(&workflow, cli.json),
        Command::Validate { workflow, blocks } => run_validate(&workflow, blocks.as_deref(), cli.json),
    }
}

fn load_document(path: &str) -> WorkflowDocument {
    let start = Instant::now();
    let document = WorkflowDocument::from_file(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load workflow '{}': {}", path, e)));
    info!(
        path,
        tasks = document.tasks.len(),
        elapsed = ?start.elapsed(),
        "loaded workflow document"
    );
    document
}

fn run_flatten(path: &str, json: bool) {
    let document = load_document(path);
    let flattened = flatten(&document.tasks);

    if json {
        print_json(&flattened.iter().map(|task| task.id()).collect::<Vec<_>>());
        return;
    }
    for (position, task) in flattened.iter().enumerate() {
        println!("{:>4}  {:<20} {}", position, task.kind.as_str(), task.id());
    }
    println!("\n{} tasks", flattened.len());
}

fn run_outline(path: &str, json: bool) {
    let document = load_document(path);
    let mut graph = Graph::builder();
    if let Some(workflow_id) = &document.workflow_id {
        graph = graph.workflow_id(workflow_id.clone());
    }
    let mut graph = graph.build();
    graph.load(document.tasks);

    if json {
        print_json(&graph.to_tasks());
        return;
    }
    println!("{}", Outline::render(&graph));
    let unsupported = graph.nodes().filter(|(_, node)| node.is_placeholder()).count();
    println!("\n{} nodes, {} unsupported", graph.len(), unsupported);
}

fn run_validate(path: &str, blocks_path: Option<&str>, json: bool) {
    let document = load_document(path);
    let blocks = match blocks_path {
        Some(blocks_path) => BlockDefinition::list_from_file(blocks_path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load blocks '{}': {}", blocks_path, e))),
        None => Vec::new(),
    };

    let start = Instant::now();
    let result = Validator::new(blocks).validate_workflow(&document.tasks, &document.output);
    info!(elapsed = ?start.elapsed(), "validation finished");

    if json {
        print_json(&result);
    } else if result.is_empty() {
        println!("No issues found.");
    } else {
        for issue in &result.validation_issues {
            println!("{}", issue);
        }
        println!(
            "\n{} errors, {} wanting",
            result.errors().count(),
            result.wanting().count()
        );
    }

    if !result.validated {
        std::process::exit(2);
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => exit_with_error(&format!("Failed to serialize output: {}", e)),
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}
