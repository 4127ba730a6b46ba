//! Unit tests for the task model, documents and error messages.
mod common;
use common::*;
use serde_json::json;
use vines_flow::prelude::*;
use vines_flow::task::factory;

#[test]
fn test_task_kind_display_and_parse() {
    assert_eq!(format!("{}", TaskKind::ForkJoin), "FORK_JOIN");
    assert_eq!(TaskKind::from("SWITCH"), TaskKind::Switch);
    assert_eq!(TaskKind::from("VENDOR_THING"), TaskKind::Other("VENDOR_THING".to_string()));

    let parsed: TaskKind = serde_json::from_value(json!("DO_WHILE")).unwrap();
    assert_eq!(parsed, TaskKind::DoWhile);
}

#[test]
fn test_document_accepts_a_bare_task_list() {
    let document = WorkflowDocument::from_json(
        r#"[{ "name": "a", "taskReferenceName": "a_1", "type": "SIMPLE" }]"#,
    )
    .unwrap();
    assert_eq!(document.tasks.len(), 1);
    assert_eq!(document.version, 0);
    assert!(document.workflow_id.is_none());
}

#[test]
fn test_document_parses_engine_json() {
    let document = WorkflowDocument::from_json(SAMPLE_WORKFLOW_JSON).unwrap();
    assert_eq!(document.workflow_id.as_deref(), Some("wf_demo"));
    assert_eq!(document.version, 3);
    assert_eq!(document.output[0].key, "answer");

    let route = &document.tasks[1];
    assert_eq!(route.kind, TaskKind::Switch);
    assert_eq!(route.decision_cases.keys().collect::<Vec<_>>(), vec!["short", "long"]);
    assert_eq!(route.extra.get("defaultCase"), Some(&json!([])));
}

#[test]
fn test_invalid_document_reports_json_error() {
    let err = WorkflowDocument::from_json("{ not json").unwrap_err();
    assert!(matches!(err, DocumentError::Json(_)));
    assert!(err.to_string().starts_with("Failed to parse workflow JSON"));
}

#[test]
fn test_missing_file_reports_path() {
    let err = WorkflowDocument::from_file("/nonexistent/workflow.json").unwrap_err();
    assert!(err.to_string().contains("/nonexistent/workflow.json"));
}

#[test]
fn test_into_tasks_for_task_list() {
    let tasks = create_fork_workflow().into_tasks().unwrap();
    assert_eq!(tasks.len(), 2);
}

#[test]
fn test_flow_error_messages() {
    let err = FlowError::NodeNotFound {
        target_id: "x".to_string(),
        path: vec!["fork".to_string(), "sw".to_string()],
    };
    assert_eq!(err.to_string(), "Node 'x' was not found along path [fork > sw]");

    let err = FlowError::UnknownKind {
        kind: TaskKind::from("ODD"),
        reference_name: "odd_1".to_string(),
    };
    assert!(err.to_string().contains("'ODD'"));
    assert!(err.to_string().contains("odd_1"));
}

#[test]
fn test_stub_tasks_are_recognized() {
    let stub = factory::stub_task();
    assert!(stub.is_stub());
    assert!(stub.task_reference_name.starts_with("fake_node_"));
    assert_ne!(stub.task_reference_name, factory::stub_task().task_reference_name);
}

#[test]
fn test_subtree_len_counts_every_nested_task() {
    let tasks = create_nested_workflow();
    let total: usize = tasks.iter().map(TaskDefinition::subtree_len).sum();
    assert_eq!(total, 11);
}
