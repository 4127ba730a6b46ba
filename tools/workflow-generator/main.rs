use clap::Parser;
use rand::Rng;
use rand::rngs::ThreadRng;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vines_flow::prelude::*;
use vines_flow::task::factory;

/// Generates random, deeply nested workflow documents for exercising the flattener,
/// the graph and the validator
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated JSON file to
    #[arg(short, long, default_value = "generated_workflow.json")]
    output: String,

    /// Number of top-level tasks
    #[arg(long, default_value_t = 8)]
    tasks: usize,

    /// Maximum nesting depth of control-flow tasks
    #[arg(long, default_value_t = 3)]
    depth: usize,

    /// Maximum number of tasks in one branch, case or loop body
    #[arg(long, default_value_t = 4)]
    width: usize,
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    if cli.width == 0 {
        eprintln!("Error: --width must be at least 1");
        std::process::exit(1);
    }

    let mut rng = rand::rng();
    let tasks: Vec<TaskDefinition> = (0..cli.tasks)
        .map(|_| generate_task(&mut rng, cli.depth, cli.width))
        .collect();

    let flattened = flatten(&tasks);
    let output = flattened
        .iter()
        .rev()
        .find(|task| task.kind == TaskKind::Simple && !task.is_stub())
        .map(|task| {
            vec![WorkflowOutputValue {
                key: "result".to_string(),
                value: json!(format!("${{{}.output}}", task.id())),
            }]
        })
        .unwrap_or_default();
    info!(top_level = tasks.len(), total = flattened.len(), "generated workflow");

    let document = WorkflowDocument {
        workflow_id: Some(factory::reference_name("workflow")),
        version: 1,
        tasks,
        output,
    };
    document.save(&cli.output)?;

    println!("Successfully generated and saved workflow to '{}'", cli.output);
    Ok(())
}

fn generate_branch(rng: &mut ThreadRng, depth: usize, width: usize) -> Vec<TaskDefinition> {
    let len = rng.random_range(1..=width);
    (0..len).map(|_| generate_task(rng, depth, width)).collect()
}

/// Picks a leaf task, or below the depth limit sometimes a control-flow task whose
/// children are generated recursively.
fn generate_task(rng: &mut ThreadRng, depth: usize, width: usize) -> TaskDefinition {
    let roll = if depth == 0 { 0 } else { rng.random_range(0..10) };
    match roll {
        7 => {
            let branches = rng.random_range(2..=3);
            let branches: Vec<Vec<TaskDefinition>> = (0..branches)
                .map(|_| generate_branch(rng, depth - 1, width))
                .collect();
            let join_on: Vec<String> = branches
                .iter()
                .filter_map(|branch| branch.last().map(|task| task.id().to_string()))
                .collect();
            factory::control_flow_task(TaskKind::ForkJoin, "fork")
                .with_fork_tasks(branches)
                .with_join_on(join_on)
        }
        8 => {
            let mut task = factory::control_flow_task(TaskKind::Switch, "switch")
                .with_input("switchCaseValue", json!("${workflow.input.choice}"));
            task.decision_cases = ["switchTrue", "switchFalse", "default"]
                .into_iter()
                .map(|case| (case.to_string(), generate_branch(rng, depth - 1, width)))
                .collect();
            task
        }
        9 => factory::control_flow_task(TaskKind::DoWhile, "loop")
            .with_loop_over(generate_branch(rng, depth - 1, width)),
        _ => generate_leaf(rng),
    }
}

fn generate_leaf(rng: &mut ThreadRng) -> TaskDefinition {
    let (kind, name) = match rng.random_range(0..4) {
        0 => (TaskKind::Http, "http_request"),
        1 => (TaskKind::Inline, "javascript"),
        2 => (TaskKind::SetVariable, "set_variable"),
        _ => (TaskKind::Simple, "llm_chat"),
    };
    TaskDefinition::new(factory::reference_name(name), kind)
        .with_name(name)
        .with_input("timeout", json!(rng.random_range(1..=60) * 1000))
}
