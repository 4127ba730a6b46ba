//! Tests for the breadth-first control-flow flattener.
mod common;
use common::*;
use proptest::prelude::*;
use vines_flow::flatten::{find_task, flatten_from, flatten_owned};
use vines_flow::prelude::*;

#[cfg(test)]
mod flatten_tests {
    use super::*;

    #[test]
    fn test_fork_scenario_yields_breadth_first_order() {
        let tasks = create_fork_workflow();
        assert_eq!(reference_names(&tasks), vec!["t1", "t2", "t3", "t4"]);
    }

    #[test]
    fn test_fork_branches_are_emitted_before_following_nested_levels() {
        let tasks = create_nested_workflow();
        assert_eq!(
            reference_names(&tasks),
            vec!["a", "fork", "sw", "z", "b1", "b2", "c1", "loop", "d1", "l1", "l2"]
        );
    }

    #[test]
    fn test_forks_then_cases_then_loop_for_a_single_task() {
        // A task carrying all three nested lists enqueues them in that fixed order.
        let odd = TaskDefinition::new("odd", TaskKind::Other("CUSTOM".to_string()))
            .with_loop_over(vec![simple("loop_child")])
            .with_case("default", vec![simple("case_child")])
            .with_fork_tasks(vec![vec![simple("fork_child")]]);
        assert_eq!(
            reference_names(&[odd]),
            vec!["odd", "fork_child", "case_child", "loop_child"]
        );
    }

    #[test]
    fn test_default_case_is_not_prioritized() {
        let tasks = vec![switch(
            "sw",
            vec![
                ("b", vec![simple("in_b")]),
                ("default", vec![simple("in_default")]),
                ("a", vec![simple("in_a")]),
            ],
        )];
        assert_eq!(reference_names(&tasks), vec!["sw", "in_b", "in_default", "in_a"]);
    }

    #[test]
    fn test_empty_loop_and_empty_branches_terminate() {
        let tasks = vec![
            do_while("loop", vec![]),
            fork("fork", vec![vec![], vec![]]),
            switch("sw", vec![]),
        ];
        assert_eq!(reference_names(&tasks), vec!["loop", "fork", "sw"]);
    }

    #[test]
    fn test_flatten_from_nothing_is_a_no_op() {
        assert!(flatten_from(None).is_empty());
        assert!(flatten(&[]).is_empty());

        let tasks = create_fork_workflow();
        let names: Vec<_> = flatten_from(tasks.get(1)).iter().map(|task| task.id()).collect();
        assert_eq!(names, vec!["t2", "t3", "t4"]);
    }

    #[test]
    fn test_find_task_searches_nested_lists() {
        let tasks = create_nested_workflow();
        assert_eq!(find_task(&tasks, "l2").map(|task| task.id()), Some("l2"));
        assert!(find_task(&tasks, "missing").is_none());
    }

    #[test]
    fn test_owned_flatten_matches_borrowed() {
        let tasks = create_nested_workflow();
        let owned = flatten_owned(&tasks);
        let borrowed: Vec<TaskDefinition> = flatten(&tasks).into_iter().cloned().collect();
        assert_eq!(owned, borrowed);
    }

    #[test]
    fn test_flatten_parses_engine_json() {
        let document = WorkflowDocument::from_json(SAMPLE_WORKFLOW_JSON).expect("valid document");
        assert_eq!(
            reference_names(&document.tasks),
            vec!["chat_1", "route", "custom_1", "http_1", "fake_node_7bcd9FGH", "inner_x"]
        );
    }
}

fn arb_task() -> impl Strategy<Value = TaskDefinition> {
    let leaf = Just(()).prop_map(|_| TaskDefinition::new(String::new(), TaskKind::Simple));
    leaf.prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            prop::collection::vec(prop::collection::vec(inner.clone(), 0..3), 0..3)
                .prop_map(|branches| TaskDefinition::new(String::new(), TaskKind::ForkJoin).with_fork_tasks(branches)),
            prop::collection::vec(prop::collection::vec(inner.clone(), 0..3), 0..3).prop_map(|cases| {
                let mut task = TaskDefinition::new(String::new(), TaskKind::Switch);
                for (index, tasks) in cases.into_iter().enumerate() {
                    task = task.with_case(format!("case{}", index), tasks);
                }
                task
            }),
            prop::collection::vec(inner, 0..3)
                .prop_map(|body| TaskDefinition::new(String::new(), TaskKind::DoWhile).with_loop_over(body)),
        ]
    })
}

/// Gives every task in the tree a unique reference name, depth-first.
fn number_tasks(tasks: &mut [TaskDefinition], next: &mut usize) {
    for task in tasks {
        task.task_reference_name = format!("task_{}", next);
        *next += 1;
        for branch in task.fork_tasks.iter_mut() {
            number_tasks(branch, next);
        }
        let cases: Vec<String> = task.decision_cases.keys().map(str::to_string).collect();
        for case in cases {
            let mut tasks = task.decision_cases.remove(&case).unwrap_or_default();
            number_tasks(&mut tasks, next);
            task.decision_cases.insert(case, tasks);
        }
        number_tasks(&mut task.loop_over, next);
    }
}

fn arb_workflow() -> impl Strategy<Value = Vec<TaskDefinition>> {
    prop::collection::vec(arb_task(), 0..5).prop_map(|mut tasks| {
        let mut next = 0;
        number_tasks(&mut tasks, &mut next);
        tasks
    })
}

proptest! {
    #[test]
    fn prop_flatten_is_complete_without_duplicates(tasks in arb_workflow()) {
        let total: usize = tasks.iter().map(TaskDefinition::subtree_len).sum();
        let names = reference_names(&tasks);
        prop_assert_eq!(names.len(), total);

        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        prop_assert_eq!(unique.len(), total);
    }

    #[test]
    fn prop_flatten_is_idempotent_and_pure(tasks in arb_workflow()) {
        let before = tasks.clone();
        let first = flatten_owned(&tasks);
        let second = flatten_owned(&tasks);
        prop_assert_eq!(first, second);
        prop_assert_eq!(tasks, before);
    }

    #[test]
    fn prop_graph_linear_view_matches_flatten(tasks in arb_workflow()) {
        let expected = reference_names(&tasks);
        let graph = Graph::from_tasks(tasks);
        let linear: Vec<String> = graph
            .linear_view()
            .into_iter()
            .map(|handle| graph.node(handle).unwrap().id().to_string())
            .collect();
        prop_assert_eq!(linear, expected);
    }
}
