//! Common test utilities for building task trees, block catalogs and event recorders.
use serde_json::json;
use std::sync::{Arc, Mutex};
use vines_flow::prelude::*;

#[allow(dead_code)]
pub fn simple(reference_name: &str) -> TaskDefinition {
    TaskDefinition::new(reference_name, TaskKind::Simple)
}

#[allow(dead_code)]
pub fn fork(reference_name: &str, branches: Vec<Vec<TaskDefinition>>) -> TaskDefinition {
    let join_on: Vec<String> = branches
        .iter()
        .filter_map(|branch| branch.last().map(|task| task.id().to_string()))
        .collect();
    TaskDefinition::new(reference_name, TaskKind::ForkJoin)
        .with_fork_tasks(branches)
        .with_join_on(join_on)
}

#[allow(dead_code)]
pub fn switch(reference_name: &str, cases: Vec<(&str, Vec<TaskDefinition>)>) -> TaskDefinition {
    let mut task = TaskDefinition::new(reference_name, TaskKind::Switch);
    for (case, tasks) in cases {
        task = task.with_case(case, tasks);
    }
    task
}

#[allow(dead_code)]
pub fn do_while(reference_name: &str, body: Vec<TaskDefinition>) -> TaskDefinition {
    TaskDefinition::new(reference_name, TaskKind::DoWhile).with_loop_over(body)
}

/// The fork example: `[t1, t2 = FORK_JOIN[[t3], [t4]]]`.
#[allow(dead_code)]
pub fn create_fork_workflow() -> Vec<TaskDefinition> {
    vec![
        simple("t1"),
        fork("t2", vec![vec![simple("t3")], vec![simple("t4")]]),
    ]
}

/// A workflow mixing every composite kind, three levels deep.
///
/// ```text
/// a
/// fork [[b1, b2], [c1]]
/// sw { yes: [loop [l1, l2]], default: [d1] }
/// z
/// ```
#[allow(dead_code)]
pub fn create_nested_workflow() -> Vec<TaskDefinition> {
    vec![
        simple("a"),
        fork("fork", vec![vec![simple("b1"), simple("b2")], vec![simple("c1")]]),
        switch(
            "sw",
            vec![
                ("yes", vec![do_while("loop", vec![simple("l1"), simple("l2")])]),
                ("default", vec![simple("d1")]),
            ],
        ),
        simple("z"),
    ]
}

#[allow(dead_code)]
pub fn reference_names(tasks: &[TaskDefinition]) -> Vec<String> {
    flatten(tasks)
        .into_iter()
        .map(|task| task.id().to_string())
        .collect()
}

#[allow(dead_code)]
pub fn graph_names(graph: &Graph) -> Vec<String> {
    reference_names(&graph.to_tasks())
}

/// Subscribes to `graph` and collects every event it emits.
#[allow(dead_code)]
pub fn record_events(graph: &mut Graph) -> Arc<Mutex<Vec<GraphEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    graph.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
    events
}

/// A `SIMPLE` block `llm_chat` with a required `prompt` string and an optional
/// `temperature` number.
#[allow(dead_code)]
pub fn create_llm_block() -> BlockDefinition {
    BlockDefinition::new("llm_chat")
        .with_property(BlockProperty::new("prompt", PropertyType::String).required())
        .with_property(BlockProperty::new("temperature", PropertyType::Number))
}

#[allow(dead_code)]
pub fn llm_task(reference_name: &str, prompt: serde_json::Value) -> TaskDefinition {
    simple(reference_name)
        .with_name("llm_chat")
        .with_input("prompt", prompt)
}

#[allow(dead_code)]
pub const SAMPLE_WORKFLOW_JSON: &str = r#"{
    "workflowId": "wf_demo",
    "version": 3,
    "tasks": [
        { "name": "llm_chat", "taskReferenceName": "chat_1", "type": "SIMPLE",
          "inputParameters": { "prompt": "Hello" } },
        { "name": "switch", "taskReferenceName": "route", "type": "SWITCH",
          "inputParameters": { "switchCaseValue": "${chat_1.output.kind}" },
          "decisionCases": {
            "short": [{ "name": "http", "taskReferenceName": "http_1", "type": "HTTP" }],
            "long": [{ "name": "fake_node", "taskReferenceName": "fake_node_7bcd9FGH", "type": "SIMPLE" }]
          },
          "defaultCase": [] },
        { "name": "custom", "taskReferenceName": "custom_1", "type": "VENDOR_THING",
          "loopOver": [{ "name": "x", "taskReferenceName": "inner_x", "type": "SIMPLE" }] }
    ],
    "output": [{ "key": "answer", "value": "${chat_1.output.text}" }]
}"#;

#[allow(dead_code)]
pub fn sample_prompt() -> serde_json::Value {
    json!("Summarize ${workflow.input.text}")
}
