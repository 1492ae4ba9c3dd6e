//! Integration tests for step-graph extraction
//!
//! Each test builds a small workflow tree and checks the steps, levels and
//! edges that come out of it.

use tracery::{
    extract::MAIN_STEP_ID,
    extract_step_graph,
    step::{BranchType, EdgeType, StepEdge, StepGraph},
    workflow::{
        BubbleInfo, BubbleTable, FunctionCallNode, IfNode, Location, LoopNode, ParallelNode,
        TransformationNode, TryCatchNode, WorkflowNode,
    },
};

/// A call whose definition spans lines 100-200, away from every bubble used
/// in these tests unless stated otherwise.
fn call(name: &str) -> WorkflowNode {
    call_with(name, vec![])
}

fn call_with(name: &str, children: Vec<WorkflowNode>) -> WorkflowNode {
    WorkflowNode::FunctionCall(
        FunctionCallNode::new(name, Location::new(100, 200)).with_children(children),
    )
}

fn if_node(
    condition: &str,
    then: Vec<WorkflowNode>,
    else_branch: Option<Vec<WorkflowNode>>,
) -> WorkflowNode {
    WorkflowNode::If(IfNode {
        condition: condition.to_string(),
        children: then,
        else_branch,
        ..IfNode::default()
    })
}

fn bubbles(entries: &[(i64, u32)]) -> BubbleTable {
    entries
        .iter()
        .map(|&(id, line)| (id, BubbleInfo::new(id, Location::new(line, line))))
        .collect()
}

fn extract(root: &[WorkflowNode]) -> StepGraph {
    extract_step_graph(Some(root), &BubbleTable::new())
}

/// Id of the step created for `function_name`.
fn id_of<'a>(graph: &'a StepGraph, function_name: &str) -> &'a str {
    graph
        .steps
        .iter()
        .find(|step| step.function_name == function_name)
        .map(|step| step.id.as_str())
        .unwrap_or_else(|| panic!("No step for {function_name}"))
}

fn level_of(graph: &StepGraph, function_name: &str) -> u32 {
    graph.step(id_of(graph, function_name)).unwrap().level
}

fn incoming<'a>(graph: &'a StepGraph, function_name: &str) -> Vec<&'a StepEdge> {
    let id = id_of(graph, function_name);
    graph
        .edges
        .iter()
        .filter(|edge| edge.target_step_id == id)
        .collect()
}

fn sources(graph: &StepGraph, function_name: &str) -> Vec<String> {
    incoming(graph, function_name)
        .iter()
        .map(|edge| {
            graph
                .step(&edge.source_step_id)
                .map(|step| step.function_name.clone())
                .unwrap_or_default()
        })
        .collect()
}

#[test]
fn test_absent_or_empty_root_yields_empty_graph() {
    let table = bubbles(&[(1, 1)]);

    assert!(extract_step_graph(None, &table).is_empty());
    assert!(extract_step_graph(Some(&[][..]), &table).is_empty());
    assert!(extract_step_graph(None, &table).edges.is_empty());
}

#[test]
fn test_if_without_else_continues_from_then_end() {
    let graph = extract(&[
        call("a"),
        if_node("ready", vec![call("b")], None),
        call("d"),
    ]);

    assert_eq!(graph.steps.len(), 3);
    assert_eq!(level_of(&graph, "b"), 1);
    assert_eq!(level_of(&graph, "d"), 2);

    let into_b = incoming(&graph, "b");
    assert_eq!(into_b.len(), 1);
    assert_eq!(into_b[0].edge_type, EdgeType::Conditional);
    assert_eq!(into_b[0].label.as_deref(), Some("if ready"));
    assert_eq!(into_b[0].branch_type, BranchType::Then);

    assert_eq!(sources(&graph, "d"), vec!["b"]);
    assert_eq!(incoming(&graph, "d")[0].edge_type, EdgeType::Sequential);
}

#[test]
fn test_if_else_branches_converge() {
    let graph = extract(&[
        call("a"),
        if_node("ok", vec![call("b")], Some(vec![call("e")])),
        call("d"),
    ]);

    assert_eq!(level_of(&graph, "b"), 1);
    assert_eq!(level_of(&graph, "e"), 1);
    assert_eq!(level_of(&graph, "d"), 2);

    let into_e = incoming(&graph, "e");
    assert_eq!(into_e[0].label.as_deref(), Some("else"));
    assert_eq!(into_e[0].branch_type, BranchType::Else);
    assert_eq!(into_e[0].edge_type, EdgeType::Conditional);

    let e = graph.step(id_of(&graph, "e")).unwrap();
    assert_eq!(e.branch_type, BranchType::Else);
    assert_eq!(e.branch_label.as_deref(), Some("else"));

    assert_eq!(sources(&graph, "d"), vec!["b", "e"]);
    let d = graph.step(id_of(&graph, "d")).unwrap();
    assert_eq!(d.parent_step_id.as_deref(), Some(id_of(&graph, "b")));
}

#[test]
fn test_else_if_chain_stays_on_one_level() {
    let chain = if_node(
        "c1",
        vec![call("x1")],
        Some(vec![if_node(
            "c2",
            vec![call("x2")],
            Some(vec![if_node("c3", vec![call("x3")], None)]),
        )]),
    );
    let graph = extract(&[call("a"), chain, call("z")]);

    let labels: Vec<Option<String>> = ["x1", "x2", "x3"]
        .iter()
        .map(|name| incoming(&graph, name)[0].label.clone())
        .collect();
    assert_eq!(
        labels,
        vec![
            Some("if c1".to_string()),
            Some("else if c2".to_string()),
            Some("else if c3".to_string()),
        ]
    );

    for name in ["x1", "x2", "x3"] {
        assert_eq!(level_of(&graph, name), 1, "{name}");
        assert_eq!(sources(&graph, name), vec!["a"], "{name}");
    }
    assert_eq!(level_of(&graph, "z"), 2);
    assert_eq!(sources(&graph, "z"), vec!["x1", "x2", "x3"]);
}

#[test]
fn test_else_if_with_final_else() {
    let chain = if_node(
        "c1",
        vec![call("x1")],
        Some(vec![if_node("c2", vec![call("x2")], Some(vec![call("fallback")]))]),
    );
    let graph = extract(&[chain, call("z")]);

    let into_fallback = incoming(&graph, "fallback");
    assert!(into_fallback.is_empty(), "first steps have no parents");
    let fallback = graph.step(id_of(&graph, "fallback")).unwrap();
    assert_eq!(fallback.branch_label.as_deref(), Some("else"));
    assert_eq!(fallback.level, 0);

    assert_eq!(sources(&graph, "z"), vec!["x1", "x2", "fallback"]);
}

#[test]
fn test_parallel_fans_out_and_merges() {
    let graph = extract(&[
        call("a"),
        WorkflowNode::Parallel(ParallelNode {
            children: vec![
                call("p1"),
                call("p2"),
                WorkflowNode::bubble(9, Location::default()),
                call("p3"),
            ],
            ..ParallelNode::default()
        }),
        call("z"),
    ]);

    for name in ["p1", "p2", "p3"] {
        assert_eq!(level_of(&graph, name), 1, "{name}");
        assert_eq!(sources(&graph, name), vec!["a"], "{name}");
    }
    assert_eq!(incoming(&graph, "z").len(), 3);
    assert_eq!(level_of(&graph, "z"), 2);
}

#[test]
fn test_parallel_ignores_non_call_children() {
    let graph = extract(&[
        call("a"),
        WorkflowNode::Parallel(ParallelNode {
            children: vec![if_node("x", vec![call("hidden")], None)],
            ..ParallelNode::default()
        }),
        call("z"),
    ]);

    assert!(graph.steps.iter().all(|step| step.function_name != "hidden"));
    assert_eq!(sources(&graph, "z"), vec!["a"]);
}

#[test]
fn test_loop_exit_merges_pre_loop_frontier() {
    let graph = extract(&[
        call("a"),
        WorkflowNode::For(LoopNode {
            condition: Some("item of items".to_string()),
            children: vec![call("body")],
            ..LoopNode::default()
        }),
        call("z"),
    ]);

    assert_eq!(level_of(&graph, "body"), 1);
    assert_eq!(level_of(&graph, "z"), 2);
    assert_eq!(sources(&graph, "z"), vec!["a", "body"]);
}

#[test]
fn test_empty_while_loop_is_transparent() {
    let graph = extract(&[
        call("a"),
        WorkflowNode::While(LoopNode::default()),
        call("z"),
    ]);

    assert_eq!(sources(&graph, "z"), vec!["a"]);
    assert_eq!(level_of(&graph, "z"), 1);
}

#[test]
fn test_call_without_definition_is_skipped_with_subtree() {
    let unresolved = WorkflowNode::FunctionCall(FunctionCallNode {
        function_name: "external".to_string(),
        method_definition: None,
        children: vec![call("inner")],
        ..FunctionCallNode::default()
    });
    let graph = extract(&[call("a"), unresolved, call("z")]);

    let names: Vec<&str> = graph
        .steps
        .iter()
        .map(|step| step.function_name.as_str())
        .collect();
    assert_eq!(names, vec!["a", "z"]);
    assert_eq!(sources(&graph, "z"), vec!["a"]);
}

#[test]
fn test_call_children_continue_from_call_step() {
    let graph = extract(&[call_with("outer", vec![call("inner")]), call("next")]);

    assert_eq!(sources(&graph, "inner"), vec!["outer"]);
    assert_eq!(sources(&graph, "next"), vec!["inner"]);
    assert_eq!(level_of(&graph, "next"), 2);
}

#[test]
fn test_branch_label_applies_to_first_step_only() {
    let graph = extract(&[
        call("a"),
        if_node("ok", vec![call("b1"), call("b2")], None),
    ]);

    let b1 = graph.step(id_of(&graph, "b1")).unwrap();
    assert_eq!(b1.branch_type, BranchType::Then);
    assert_eq!(b1.branch_label.as_deref(), Some("if ok"));

    let b2 = graph.step(id_of(&graph, "b2")).unwrap();
    assert_eq!(b2.branch_type, BranchType::Sequential);
    assert!(b2.branch_label.is_none());
    assert_eq!(incoming(&graph, "b2")[0].edge_type, EdgeType::Sequential);
}

#[test]
fn test_empty_branches_leave_no_trace() {
    let graph = extract(&[
        call("a"),
        if_node("never", vec![], Some(vec![])),
        call("z"),
    ]);

    // Both branches empty: the conditional vanishes from the edge list.
    let into_z = incoming(&graph, "z");
    assert_eq!(into_z.len(), 1);
    assert_eq!(into_z[0].edge_type, EdgeType::Sequential);
    assert!(into_z[0].label.is_none());
    assert_eq!(level_of(&graph, "z"), 1);
}

#[test]
fn test_try_catch_flows_through_catch() {
    let graph = extract(&[
        call("a"),
        WorkflowNode::TryCatch(TryCatchNode {
            children: vec![call("attempt")],
            catch_block: Some(vec![call("recover")]),
            ..TryCatchNode::default()
        }),
        call("z"),
    ]);

    assert_eq!(sources(&graph, "attempt"), vec!["a"]);
    assert_eq!(incoming(&graph, "attempt")[0].edge_type, EdgeType::Sequential);

    let into_recover = incoming(&graph, "recover");
    assert_eq!(sources(&graph, "recover"), vec!["attempt"]);
    assert_eq!(into_recover[0].edge_type, EdgeType::Conditional);
    assert_eq!(into_recover[0].label.as_deref(), Some("catch"));

    assert_eq!(sources(&graph, "z"), vec!["attempt", "recover"]);
    assert_eq!(level_of(&graph, "z"), 3);
}

#[test]
fn test_transformation_becomes_step() {
    let graph = extract(&[
        call("a"),
        WorkflowNode::Transformation(TransformationNode {
            function_name: "shape".to_string(),
            code: "return rows.map(r => r.id);".to_string(),
            arguments: "rows".to_string(),
            variable_id: 42,
            variable_name: Some("ids".to_string()),
            ..TransformationNode::default()
        }),
    ]);

    let step = graph.step(id_of(&graph, "shape")).unwrap();
    assert!(step.is_transformation);
    assert!(step.bubble_ids.is_empty());
    let data = step.transformation_data.as_ref().unwrap();
    assert_eq!(data.variable_id, 42);
    assert_eq!(data.arguments, "rows");
    assert_eq!(data.variable_name.as_deref(), Some("ids"));
}

#[test]
fn test_nested_bubbles_belong_to_call() {
    let table = bubbles(&[(1, 3), (2, 5)]);
    let root = vec![call_with(
        "f",
        vec![if_node(
            "x > 0",
            vec![WorkflowNode::bubble(1, Location::new(3, 3))],
            Some(vec![WorkflowNode::bubble(2, Location::new(5, 5))]),
        )],
    )];

    let graph = extract_step_graph(Some(root.as_slice()), &table);

    assert_eq!(graph.steps.len(), 1);
    assert_eq!(graph.steps[0].function_name, "f");
    assert_eq!(graph.steps[0].bubble_ids, vec![1, 2]);
    assert!(graph.step(MAIN_STEP_ID).is_none());
    assert!(graph.edges.is_empty());
}

#[test]
fn test_containment_attribution_and_method_calls() {
    let table = bubbles(&[(1, 12), (2, 14)]);
    let mut method_call = FunctionCallNode::new("helper", Location::new(13, 15));
    method_call.is_method_call = true;
    let root = vec![
        WorkflowNode::FunctionCall(FunctionCallNode::new("owner", Location::new(10, 12))),
        WorkflowNode::FunctionCall(method_call),
    ];

    let graph = extract_step_graph(Some(root.as_slice()), &table);

    let owner = graph.step(id_of(&graph, "owner")).unwrap();
    assert_eq!(owner.bubble_ids, vec![1]);
    let helper = graph.step(id_of(&graph, "helper")).unwrap();
    assert!(helper.bubble_ids.is_empty());

    // Bubble 2 sits inside `helper`, but method calls never claim by containment.
    let main = graph.step(MAIN_STEP_ID).unwrap();
    assert_eq!(main.bubble_ids, vec![2]);
}

#[test]
fn test_main_step_collects_top_level_bubbles() {
    let mut table = bubbles(&[(1, 1), (3, 4)]);
    table.insert(
        2,
        BubbleInfo {
            cloned_from_variable_id: Some(1),
            ..BubbleInfo::new(2, Location::new(2, 2))
        },
    );
    let root = vec![
        WorkflowNode::bubble(1, Location::new(1, 1)),
        call("a"),
        call("b"),
    ];

    let graph = extract_step_graph(Some(root.as_slice()), &table);

    let main = &graph.steps[0];
    assert_eq!(main.id, MAIN_STEP_ID);
    assert_eq!(main.function_name, "main");
    assert_eq!(main.bubble_ids, vec![1, 3]);
    assert_eq!(main.location, Location::new(1, 4));
    assert_eq!(main.level, 0);

    assert_eq!(level_of(&graph, "a"), 1);
    assert_eq!(level_of(&graph, "b"), 2);
    assert_eq!(
        graph.step(id_of(&graph, "a")).unwrap().parent_step_id.as_deref(),
        Some(MAIN_STEP_ID)
    );
    assert_eq!(graph.edges[0].source_step_id, MAIN_STEP_ID);
    assert_eq!(graph.edges[0].target_step_id, id_of(&graph, "a"));
}

#[test]
fn test_main_step_alone_when_no_steps() {
    let table = bubbles(&[(1, 1)]);
    let root = vec![WorkflowNode::bubble(1, Location::new(1, 1))];

    let graph = extract_step_graph(Some(root.as_slice()), &table);

    assert_eq!(graph.steps.len(), 1);
    assert_eq!(graph.steps[0].id, MAIN_STEP_ID);
    assert!(graph.edges.is_empty());
}

#[test]
fn test_extraction_is_repeatable() {
    let root = vec![
        call("a"),
        if_node("ok", vec![call("b")], Some(vec![call("c")])),
        call("d"),
    ];

    assert_eq!(extract(&root), extract(&root));
}
