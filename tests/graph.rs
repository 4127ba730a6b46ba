//! Tests for graph loading, structural edits, events and execution correlation.
mod common;
use common::*;
use serde_json::json;
use vines_flow::prelude::*;
use vines_flow::task::factory;

#[cfg(test)]
mod load_tests {
    use super::*;

    #[test]
    fn test_load_materializes_nested_nodes_with_parents() {
        let graph = Graph::from_tasks(create_fork_workflow());
        assert_eq!(graph.len(), 4);
        assert_eq!(graph.roots().len(), 2);

        let t2 = graph.handle_of("t2").unwrap();
        let t3 = graph.handle_of("t3").unwrap();
        assert_eq!(graph.parent(t3).unwrap(), Some(t2));
        assert_eq!(graph.parent(t2).unwrap(), None);
        assert_eq!(graph.children(t2).unwrap().len(), 2);
        assert_eq!(graph.path_to("t4"), Some(vec!["t2".to_string()]));
        assert_eq!(graph.enclosing_slot("t4"), Some((t2, ChildSlot::Branch(1))));
    }

    #[test]
    fn test_to_tasks_reproduces_the_input() {
        let tasks = create_nested_workflow();
        let graph = Graph::from_tasks(tasks.clone());
        assert_eq!(graph.to_tasks(), tasks);
    }

    #[test]
    fn test_unknown_kind_degrades_to_a_placeholder() {
        let document = WorkflowDocument::from_json(SAMPLE_WORKFLOW_JSON).unwrap();
        let graph = Graph::from_tasks(document.tasks.clone());

        let custom = graph.find_by_reference_name("custom_1").unwrap();
        assert!(custom.is_placeholder());
        assert!(graph.find_by_reference_name("chat_1").is_some());
        assert!(graph.find_by_reference_name("http_1").is_some());

        // Tasks nested in the placeholder still get nodes of their own.
        let inner = graph.handle_of("inner_x").unwrap();
        assert_eq!(graph.parent(inner).unwrap(), graph.handle_of("custom_1"));
        assert!(!graph.node(inner).unwrap().is_placeholder());
        assert_eq!(graph.path_to("inner_x"), Some(vec!["custom_1".to_string()]));

        assert_eq!(graph.to_tasks(), document.tasks);
        assert!(Outline::render(&graph).contains("[VENDOR_THING] custom_1 (custom) (unsupported)"));
    }

    #[test]
    fn test_placeholder_children_follow_the_flattened_order() {
        let document = WorkflowDocument::from_json(SAMPLE_WORKFLOW_JSON).unwrap();
        let graph = Graph::from_tasks(document.tasks.clone());
        let linear: Vec<String> = graph
            .linear_view()
            .into_iter()
            .map(|handle| graph.node(handle).unwrap().id().to_string())
            .collect();
        assert_eq!(linear, reference_names(&document.tasks));
    }

    #[test]
    fn test_names_inside_a_placeholder_stay_unique() {
        let custom = TaskDefinition::new("custom", TaskKind::from("VENDOR")).with_loop_over(vec![simple("inner")]);
        let mut graph = Graph::from_tasks(vec![simple("t1"), custom]);
        assert!(graph.find_by_reference_name("inner").is_some());

        let err = graph.append(vec![simple("inner")]).unwrap_err();
        assert_eq!(
            err,
            FlowError::DuplicateReference {
                reference_name: "inner".to_string()
            }
        );
        assert!(matches!(
            graph.configure("t1", |task| task.task_reference_name = "inner".to_string()),
            Err(FlowError::DuplicateReference { .. })
        ));
        assert_eq!(graph_names(&graph), vec!["t1", "custom", "inner"]);
    }

    #[test]
    fn test_emptied_placeholder_list_is_not_refilled() {
        let custom = TaskDefinition::new("custom", TaskKind::from("VENDOR")).with_loop_over(vec![simple("inner")]);
        let mut graph = Graph::from_tasks(vec![custom]);
        assert!(graph.delete("inner"));
        assert_eq!(graph_names(&graph), vec!["custom"]);
        assert!(graph.to_tasks()[0].loop_over.is_empty());
    }

    #[test]
    fn test_reload_detaches_previous_handles() {
        let mut graph = Graph::from_tasks(create_fork_workflow());
        let old = graph.handle_of("t1").unwrap();
        graph.load(vec![simple("t1")]);

        assert_eq!(graph.node(old).unwrap_err(), FlowError::DetachedNode { handle: old });
        assert!(graph.node(graph.handle_of("t1").unwrap()).is_ok());
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_outline_lists_slots_and_nodes() {
        let graph = Graph::from_tasks(create_fork_workflow());
        let outline = Outline::render(&graph);
        let expected = [
            "[SIMPLE] t1",
            "[FORK_JOIN] t2",
            "  branch 0:",
            "    [SIMPLE] t3",
            "  branch 1:",
            "    [SIMPLE] t4",
        ]
        .join("\n");
        assert_eq!(outline, expected);
    }
}

#[cfg(test)]
mod insert_tests {
    use super::*;

    #[test]
    fn test_insert_after_and_before_inside_a_branch() {
        let mut graph = Graph::from_tasks(create_fork_workflow());
        graph
            .insert(InsertRequest::after("t3", vec![simple("t3b")]).with_path(["t2"]))
            .unwrap();
        graph
            .insert(InsertRequest::before("t3", vec![simple("t3a")]).with_path(["t2"]))
            .unwrap();

        let tasks = graph.to_tasks();
        let branch: Vec<&str> = tasks[1].fork_tasks[0].iter().map(|task| task.id()).collect();
        assert_eq!(branch, vec!["t3a", "t3", "t3b"]);
        assert_eq!(graph.path_to("t3b"), Some(vec!["t2".to_string()]));
    }

    #[test]
    fn test_insert_at_top_level_with_empty_path() {
        let mut graph = Graph::from_tasks(create_fork_workflow());
        let handles = graph
            .insert(InsertRequest::before("t1", vec![simple("t0"), simple("t0b")]))
            .unwrap();
        assert_eq!(handles.len(), 2);
        assert_eq!(graph_names(&graph), vec!["t0", "t0b", "t1", "t2", "t3", "t4"]);
    }

    #[test]
    fn test_insert_with_wrong_path_fails_and_changes_nothing() {
        let mut graph = Graph::from_tasks(create_fork_workflow());
        let events = record_events(&mut graph);
        let before = graph.to_tasks();

        // t3 exists, but not at the top level.
        let err = graph
            .insert(InsertRequest::after("t3", vec![simple("new")]))
            .unwrap_err();
        assert_eq!(
            err,
            FlowError::NodeNotFound {
                target_id: "t3".to_string(),
                path: vec![],
            }
        );

        let err = graph
            .insert(InsertRequest::after("t3", vec![simple("new")]).with_path(["t1"]))
            .unwrap_err();
        assert!(matches!(err, FlowError::NodeNotFound { .. }));
        assert!(err.to_string().contains("t1"));

        let err = graph
            .insert(InsertRequest::after("ghost", vec![simple("new")]).with_path(["t2"]))
            .unwrap_err();
        assert!(matches!(err, FlowError::NodeNotFound { .. }));

        assert_eq!(graph.to_tasks(), before);
        assert!(!graph.contains("new"));
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_insert_rejects_duplicate_reference_names() {
        let mut graph = Graph::from_tasks(create_fork_workflow());
        let err = graph
            .insert(InsertRequest::after("t1", vec![simple("t4")]))
            .unwrap_err();
        assert_eq!(
            err,
            FlowError::DuplicateReference {
                reference_name: "t4".to_string()
            }
        );

        let err = graph
            .insert(InsertRequest::after("t1", vec![simple("x"), fork("f", vec![vec![simple("x")]])]))
            .unwrap_err();
        assert!(matches!(err, FlowError::DuplicateReference { .. }));
        assert_eq!(graph.len(), 4);
    }

    #[test]
    fn test_insert_then_delete_round_trips() {
        let mut graph = Graph::from_tasks(create_nested_workflow());
        let before = graph_names(&graph);

        graph
            .insert(InsertRequest::after("l1", vec![do_while("inner", vec![simple("deep")])]).with_path(["sw", "loop"]))
            .unwrap();
        assert!(graph.contains("deep"));
        assert!(graph.delete("inner"));

        assert_eq!(graph_names(&graph), before);
        assert!(!graph.contains("deep"));
    }

    #[test]
    fn test_insert_on_a_stub_then_delete_round_trips() {
        let mut graph = Graph::new();
        graph.load(vec![factory::control_flow_task(TaskKind::ForkJoin, "fork")]);
        let before = graph_names(&graph);
        let (fork_id, stub_id) = (before[0].clone(), before[1].clone());

        graph
            .insert(InsertRequest::after(stub_id.clone(), vec![simple("x")]).with_path([fork_id.clone()]))
            .unwrap();
        assert!(!graph.contains(&stub_id));
        assert!(graph.delete("x"));

        assert_eq!(graph_names(&graph), before);
        assert!(graph.contains(&stub_id));
    }

    #[test]
    fn test_stub_returns_once_its_branch_empties_again() {
        let mut graph = Graph::new();
        graph.load(vec![factory::control_flow_task(TaskKind::ForkJoin, "fork")]);
        let before = graph_names(&graph);
        let (fork_id, first_stub) = (before[0].clone(), before[1].clone());

        graph
            .insert(InsertRequest::after(first_stub.clone(), vec![simple("x")]).with_path([fork_id.clone()]))
            .unwrap();
        graph.insert_at("x", vec![simple("y")], false).unwrap();
        assert!(graph.delete("x"));
        assert!(!graph.contains(&first_stub));
        assert!(graph.delete("y"));

        assert_eq!(graph_names(&graph), before);
    }

    #[test]
    fn test_insert_on_a_stub_replaces_it() {
        let mut graph = Graph::new();
        graph.load(vec![factory::control_flow_task(TaskKind::DoWhile, "loop")]);
        let loop_id = graph.roots().first().map(|root| graph.node(*root).unwrap().id().to_string()).unwrap();
        let stub_id = graph_names(&graph)[1].clone();
        assert!(stub_id.starts_with("fake_node_"));

        graph
            .insert(InsertRequest::after(stub_id.clone(), vec![simple("body")]).with_path([loop_id.clone()]))
            .unwrap();

        assert_eq!(graph_names(&graph), vec![loop_id, "body".to_string()]);
        assert!(!graph.contains(&stub_id));
    }

    #[test]
    fn test_insert_at_computes_the_path() {
        let mut graph = Graph::from_tasks(create_nested_workflow());
        graph.insert_at("d1", vec![simple("d0")], true).unwrap();
        let tasks = graph.to_tasks();
        let default_case: Vec<&str> = tasks[2]
            .decision_cases
            .get("default")
            .unwrap()
            .iter()
            .map(|task| task.id())
            .collect();
        assert_eq!(default_case, vec!["d0", "d1"]);

        assert!(matches!(
            graph.insert_at("ghost", vec![simple("x")], false),
            Err(FlowError::NodeNotFound { .. })
        ));
    }

    #[test]
    fn test_empty_insert_is_a_silent_no_op() {
        let mut graph = Graph::from_tasks(create_fork_workflow());
        let events = record_events(&mut graph);
        assert!(graph.insert(InsertRequest::after("t1", vec![])).unwrap().is_empty());
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_append_adds_top_level_tasks() {
        let mut graph = Graph::new();
        graph.append(vec![simple("a")]).unwrap();
        graph.append(vec![simple("b")]).unwrap();
        assert_eq!(graph_names(&graph), vec!["a", "b"]);
        assert!(graph.append(vec![simple("a")]).is_err());
    }
}

#[cfg(test)]
mod delete_tests {
    use super::*;

    #[test]
    fn test_delete_composite_removes_the_subtree() {
        let mut graph = Graph::from_tasks(create_nested_workflow());
        let l1 = graph.handle_of("l1").unwrap();
        assert!(graph.delete("sw"));

        assert_eq!(graph_names(&graph), vec!["a", "fork", "z", "b1", "b2", "c1"]);
        for name in ["sw", "loop", "l1", "l2", "d1"] {
            assert!(graph.find_by_reference_name(name).is_none());
        }
        assert!(matches!(graph.node(l1), Err(FlowError::DetachedNode { .. })));
        assert_eq!(graph.len(), 6);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut graph = Graph::from_tasks(create_fork_workflow());
        let events = record_events(&mut graph);
        assert!(graph.delete("t1"));
        assert!(!graph.delete("t1"));
        assert!(!graph.delete("never_existed"));
        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_emptied_branch_is_refilled_with_a_stub() {
        let mut graph = Graph::from_tasks(create_fork_workflow());
        assert!(graph.delete("t3"));

        let tasks = graph.to_tasks();
        assert_eq!(tasks[1].fork_tasks.len(), 2);
        assert_eq!(tasks[1].fork_tasks[0].len(), 1);
        assert!(tasks[1].fork_tasks[0][0].is_stub());
        assert_eq!(graph.len(), 4);
    }

    #[test]
    fn test_top_level_delete_does_not_add_stubs() {
        let mut graph = Graph::from_tasks(vec![simple("only")]);
        assert!(graph.delete("only"));
        assert!(graph.is_empty());
        assert!(graph.to_tasks().is_empty());
    }
}

#[cfg(test)]
mod edit_tests {
    use super::*;

    #[test]
    fn test_move_node_between_branches() {
        let mut graph = Graph::from_tasks(create_nested_workflow());
        let b2 = graph.handle_of("b2").unwrap();
        graph.move_node("b2", "c1", false).unwrap();

        let tasks = graph.to_tasks();
        let branches: Vec<Vec<&str>> = tasks[1]
            .fork_tasks
            .iter()
            .map(|branch| branch.iter().map(|task| task.id()).collect())
            .collect();
        assert_eq!(branches, vec![vec!["b1"], vec!["c1", "b2"]]);
        // Moving keeps the node, and its handle, alive.
        assert!(graph.node(b2).is_ok());
        assert_eq!(graph.enclosing_slot("b2").unwrap().1, ChildSlot::Branch(1));
    }

    #[test]
    fn test_move_into_own_subtree_is_rejected() {
        let mut graph = Graph::from_tasks(create_nested_workflow());
        let before = graph.to_tasks();
        let err = graph.move_node("sw", "l2", true).unwrap_err();
        assert!(matches!(err, FlowError::InvalidMove { .. }));
        assert!(matches!(graph.move_node("sw", "sw", true), Err(FlowError::InvalidMove { .. })));
        assert_eq!(graph.to_tasks(), before);
    }

    #[test]
    fn test_configure_edits_payload_in_place() {
        let mut graph = Graph::from_tasks(create_nested_workflow());
        graph
            .configure("l1", |task| {
                task.input_parameters.insert("prompt".into(), json!("hi"));
            })
            .unwrap();
        let l1 = graph.find_by_reference_name("l1").unwrap();
        assert_eq!(l1.task().input_parameters["prompt"], json!("hi"));
    }

    #[test]
    fn test_configure_cannot_change_kind_or_children() {
        let mut graph = Graph::from_tasks(create_nested_workflow());
        graph
            .configure("loop", |task| {
                task.kind = TaskKind::Simple;
                task.loop_over.clear();
                task.loop_condition = Some("$.loop['iteration'] < 3".to_string());
            })
            .unwrap();

        let node = graph.find_by_reference_name("loop").unwrap();
        assert_eq!(node.kind(), &TaskKind::DoWhile);
        assert!(graph.contains("l1"));
        assert_eq!(
            flatten(&graph.to_tasks())
                .into_iter()
                .find(|task| task.id() == "loop")
                .unwrap()
                .loop_over
                .len(),
            2
        );
    }

    #[test]
    fn test_configure_rename_keeps_references_unique() {
        let mut graph = Graph::from_tasks(create_fork_workflow());
        let err = graph
            .configure("t1", |task| task.task_reference_name = "t3".to_string())
            .unwrap_err();
        assert!(matches!(err, FlowError::DuplicateReference { .. }));

        graph
            .configure("t1", |task| task.task_reference_name = "first".to_string())
            .unwrap();
        assert!(graph.contains("first"));
        assert!(!graph.contains("t1"));
    }

    #[test]
    fn test_switch_case_management() {
        let mut graph = Graph::from_tasks(create_nested_workflow());
        let stub = graph.add_case("sw", "maybe").unwrap();
        assert!(graph.node(stub).unwrap().is_stub());
        assert_eq!(graph.cases("sw").unwrap(), vec!["yes", "default", "maybe"]);

        assert_eq!(graph.add_case_incrementally("sw").unwrap(), "branch1");
        assert_eq!(graph.add_case_incrementally("sw").unwrap(), "branch2");

        assert!(matches!(graph.add_case("sw", "yes"), Err(FlowError::InvalidCase { .. })));
        assert!(matches!(graph.add_case("sw", "9lives"), Err(FlowError::InvalidCase { .. })));
        assert!(matches!(graph.add_case("fork", "x"), Err(FlowError::NotAContainer { .. })));

        graph.remove_case("sw", "yes").unwrap();
        assert!(!graph.contains("loop"));
        graph.remove_case("sw", "maybe").unwrap();
        graph.remove_case("sw", "branch1").unwrap();
        assert!(matches!(graph.remove_case("sw", "default"), Err(FlowError::InvalidCase { .. })));
        assert_eq!(graph.cases("sw").unwrap(), vec!["default", "branch2"]);
    }

    #[test]
    fn test_switch_case_limit_comes_from_config() {
        let mut graph = Graph::builder().max_switch_cases(3).build();
        graph.load(create_nested_workflow());
        graph.add_case("sw", "third").unwrap();
        assert!(matches!(graph.add_case("sw", "fourth"), Err(FlowError::InvalidCase { .. })));
    }
}

#[cfg(test)]
mod event_tests {
    use super::*;

    #[test]
    fn test_each_mutation_emits_exactly_one_update_in_order() {
        let mut graph = Graph::new();
        let events = record_events(&mut graph);

        graph.load(create_fork_workflow());
        graph
            .insert(InsertRequest::after("t1", vec![simple("t1b")]))
            .unwrap();
        graph.delete("t4");
        graph.refresh();

        let events = events.lock().unwrap();
        let names: Vec<&str> = events.iter().map(GraphEvent::name).collect();
        assert_eq!(names, vec!["update", "update", "update", "refresh"]);
        let revisions: Vec<u64> = events.iter().map(GraphEvent::revision).collect();
        assert_eq!(revisions, vec![1, 2, 3, 4]);

        // The update carries the tree as it is after the mutation.
        match &events[1] {
            GraphEvent::Update { tasks, .. } => {
                assert_eq!(reference_names(tasks), vec!["t1", "t1b", "t2", "t3", "t4"]);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_channel_subscription_and_unsubscribe() {
        let mut graph = Graph::new();
        let (id, receiver) = graph.subscribe_channel();
        graph.load(vec![simple("a")]);
        assert_eq!(receiver.try_recv().unwrap().name(), "update");

        assert!(graph.unsubscribe(id));
        assert!(!graph.unsubscribe(id));
        graph.delete("a");
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_events_serialize_with_a_type_tag() {
        let event = GraphEvent::Execution {
            revision: 7,
            task_reference_names: vec!["t1".to_string()],
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({ "type": "execution", "revision": 7, "taskReferenceNames": ["t1"] })
        );
    }
}

#[cfg(test)]
mod execution_tests {
    use super::*;

    #[test]
    fn test_execution_updates_are_correlated_by_reference_name() {
        let mut graph = Graph::from_tasks(create_nested_workflow());
        let events = record_events(&mut graph);

        let changed = graph.apply_execution(&[
            TaskExecutionUpdate::new("l1", ExecutionStatus::Completed),
            TaskExecutionUpdate::new("unknown", ExecutionStatus::Failed),
            TaskExecutionUpdate::new("b2", ExecutionStatus::InProgress),
        ]);
        assert_eq!(changed, vec!["l1", "b2"]);

        let l1 = graph.find_by_reference_name("l1").unwrap();
        assert_eq!(l1.execution().unwrap().status, ExecutionStatus::Completed);
        assert!(graph.find_by_reference_name("a").unwrap().execution().is_none());

        // Re-applying the same state changes nothing and emits nothing.
        assert!(graph
            .apply_execution(&[TaskExecutionUpdate::new("l1", ExecutionStatus::Completed)])
            .is_empty());

        graph.reset_execution();
        assert!(graph.find_by_reference_name("l1").unwrap().execution().is_none());

        let names: Vec<&str> = events.lock().unwrap().iter().map(GraphEvent::name).collect();
        assert_eq!(names, vec!["execution", "refresh"]);
        assert!(Outline::render(&graph).contains("[SIMPLE] b2"));
    }

    #[test]
    fn test_outline_shows_execution_status() {
        let mut graph = Graph::from_tasks(vec![simple("a")]);
        graph.apply_execution(&[TaskExecutionUpdate::new("a", ExecutionStatus::TimedOut)]);
        assert_eq!(Outline::render(&graph), "[SIMPLE] a  TIMED_OUT");
        assert!(ExecutionStatus::TimedOut.is_terminal());
        assert!(!ExecutionStatus::Scheduled.is_terminal());
    }
}
