use super::definition::{STUB_TASK_NAME, TaskDefinition};
use super::kind::TaskKind;
use rand::Rng;

/// Alphabet used for generated reference-name suffixes. Avoids look-alike characters.
const ID_ALPHABET: &[u8] = b"6789BCDFGHJKLMNPQRTWbcdfghjkmnpqrtwz";
const ID_LENGTH: usize = 8;

/// Generates a short random identifier suitable as a reference-name suffix.
pub fn short_id() -> String {
    let mut rng = rand::rng();
    (0..ID_LENGTH)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Builds a fresh reference name of the form `<prefix>_<random>`.
pub fn reference_name(prefix: &str) -> String {
    format!("{}_{}", prefix, short_id())
}

/// Creates a filler task that keeps a branch, case or loop body from being empty.
pub fn stub_task() -> TaskDefinition {
    TaskDefinition::new(reference_name(STUB_TASK_NAME), TaskKind::Simple).with_name(STUB_TASK_NAME)
}

/// Creates a new task for the block `name`, seeding control-flow kinds with stub children.
///
/// * `FORK_JOIN` gets two branches holding one stub each.
/// * `SWITCH` gets the cases `switchTrue` and `switchFalse`, one stub each.
/// * `DO_WHILE` gets a loop body holding one stub.
pub fn control_flow_task(kind: TaskKind, name: &str) -> TaskDefinition {
    let task = TaskDefinition::new(reference_name(name), kind.clone()).with_name(name);
    match kind {
        TaskKind::ForkJoin => task.with_fork_tasks(vec![vec![stub_task()], vec![stub_task()]]),
        TaskKind::Switch | TaskKind::Decision => task
            .with_case("switchTrue", vec![stub_task()])
            .with_case("switchFalse", vec![stub_task()]),
        TaskKind::DoWhile => task.with_loop_over(vec![stub_task()]),
        _ => task,
    }
}
