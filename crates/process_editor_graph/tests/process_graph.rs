// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end behaviour of the process graph through its public API.

use process_editor_graph::{
    ActionOutcome, EditorAction, GraphDocument, NodeId, NodeView, PortLayout, ProcessEditor,
    ProcessGraph,
};
use proptest::prelude::*;

#[test]
fn mix_and_bottle_edge_pruned_on_output_decrement() {
    let mut graph = ProcessGraph::new("Bottling");

    let mix = graph.add_node("Mix").unwrap();
    graph.increment_outputs(mix).unwrap();
    assert_eq!(graph.increment_outputs(mix), Ok(2));

    let bottle = graph.add_node("Bottle").unwrap();
    assert_eq!(graph.increment_inputs(bottle), Ok(1));

    graph.connect(mix, 1, bottle, 0).unwrap();
    assert_eq!(graph.edge_count(), 1);

    assert_eq!(graph.decrement_outputs(mix), Ok(1));
    assert_eq!(graph.edge_count(), 0);
    graph.check_consistency().unwrap();
}

#[test]
fn removing_unconnected_node_leaves_edges_alone() {
    let mut graph = ProcessGraph::default();
    let a = graph.add_node("A").unwrap();
    graph.increment_inputs(a).unwrap();
    graph.increment_inputs(a).unwrap();
    graph.increment_outputs(a).unwrap();

    let src = graph.add_node("Source").unwrap();
    let dst = graph.add_node("Sink").unwrap();
    graph.increment_outputs(src).unwrap();
    graph.increment_inputs(dst).unwrap();
    let edge = graph.connect(src, 0, dst, 0).unwrap();

    graph.remove_node(a).unwrap();
    assert!(graph.node(a).is_none());
    assert_eq!(graph.edge_count(), 1);
    assert!(graph.edge(edge).is_some());
}

#[test]
fn removing_connected_node_empties_its_edges() {
    let mut graph = ProcessGraph::default();
    let a = graph.add_node("A").unwrap();
    graph.increment_inputs(a).unwrap();
    graph.increment_inputs(a).unwrap();
    graph.increment_outputs(a).unwrap();
    let b = graph.add_node("B").unwrap();
    graph.increment_inputs(b).unwrap();
    graph.increment_outputs(b).unwrap();

    graph.connect(a, 0, b, 0).unwrap();
    graph.connect(b, 0, a, 1).unwrap();

    graph.remove_node(a).unwrap();
    assert_eq!(graph.edge_count(), 0);
    assert_eq!(graph.node_count(), 1);
}

#[test]
fn identical_connect_twice_yields_one_edge() {
    let mut editor = ProcessEditor::default();
    let Some(ActionOutcome::NodeAdded(a)) = editor.apply(EditorAction::AddNode {
        label: "A".into(),
        position: [0.0, 0.0],
    }) else {
        panic!("node not added");
    };
    let Some(ActionOutcome::NodeAdded(b)) = editor.apply(EditorAction::AddNode {
        label: "B".into(),
        position: [300.0, 0.0],
    }) else {
        panic!("node not added");
    };
    editor.apply(EditorAction::IncrementOutputs(a));
    editor.apply(EditorAction::IncrementInputs(b));

    let connect = EditorAction::Connect {
        source: a,
        source_port: 0,
        target: b,
        target_port: 0,
    };
    assert!(editor.apply(connect.clone()).is_some());
    assert!(editor.apply(connect).is_none());
    assert_eq!(editor.graph().edge_count(), 1);
}

#[test]
fn render_model_matches_port_counts() {
    let mut graph = ProcessGraph::default();
    let id = graph.add_node("Fill").unwrap();
    for _ in 0..3 {
        graph.increment_inputs(id).unwrap();
    }
    graph.increment_outputs(id).unwrap();

    let view = NodeView::build(graph.node(id).unwrap(), &PortLayout::new(20.0, 20.0));
    assert_eq!(view.inputs.len(), 3);
    assert_eq!(view.outputs.len(), 1);
    assert_eq!(
        view.inputs.iter().map(|p| p.offset).collect::<Vec<_>>(),
        vec![20.0, 40.0, 60.0]
    );
}

#[test]
fn exported_document_reimports() {
    let mut graph = ProcessGraph::new("Line");
    let a = graph.add_node("Mix").unwrap();
    let b = graph.add_node("Bottle").unwrap();
    graph.increment_outputs(a).unwrap();
    graph.increment_inputs(b).unwrap();
    graph.connect(a, 0, b, 0).unwrap();

    let json = GraphDocument::from_graph(&graph).to_json().unwrap();
    let restored = GraphDocument::from_json(&json)
        .unwrap()
        .into_graph(ProcessGraph::default())
        .unwrap();

    assert_eq!(restored.node_count(), 2);
    assert_eq!(restored.edge_count(), 1);
    assert_eq!(restored.node(b).unwrap().label, "Bottle");
}

#[derive(Debug, Clone)]
enum Op {
    Add,
    Remove(usize),
    IncInputs(usize),
    DecInputs(usize),
    IncOutputs(usize),
    DecOutputs(usize),
    Connect(usize, usize, usize, usize),
}

fn op() -> impl Strategy<Value = Op> {
    let idx = 0usize..6;
    let port = 0usize..4;
    prop_oneof![
        Just(Op::Add),
        idx.clone().prop_map(Op::Remove),
        idx.clone().prop_map(Op::IncInputs),
        idx.clone().prop_map(Op::DecInputs),
        idx.clone().prop_map(Op::IncOutputs),
        idx.clone().prop_map(Op::DecOutputs),
        (idx.clone(), port.clone(), idx, port)
            .prop_map(|(a, pa, b, pb)| Op::Connect(a, pa, b, pb)),
    ]
}

proptest! {
    #[test]
    fn edges_never_reference_missing_ports(ops in prop::collection::vec(op(), 1..80)) {
        let mut graph = ProcessGraph::default();
        let mut ids: Vec<NodeId> = Vec::new();
        let pick = |ids: &[NodeId], i: usize| ids.get(i % ids.len().max(1)).copied();

        for op in ops {
            match op {
                Op::Add => ids.push(graph.add_node("Step").unwrap()),
                Op::Remove(i) => {
                    if let Some(id) = pick(&ids, i) {
                        let attached: Vec<_> = graph.edges_for_node(id).map(|e| e.id).collect();
                        let others = graph.edge_count() - attached.len();
                        graph.remove_node(id).unwrap();
                        ids.retain(|n| *n != id);
                        prop_assert_eq!(graph.edge_count(), others);
                        for edge in attached {
                            prop_assert!(graph.edge(edge).is_none());
                        }
                    }
                }
                Op::IncInputs(i) => {
                    if let Some(id) = pick(&ids, i) {
                        graph.increment_inputs(id).unwrap();
                    }
                }
                Op::DecInputs(i) => {
                    if let Some(id) = pick(&ids, i) {
                        graph.decrement_inputs(id).unwrap();
                    }
                }
                Op::IncOutputs(i) => {
                    if let Some(id) = pick(&ids, i) {
                        graph.increment_outputs(id).unwrap();
                    }
                }
                Op::DecOutputs(i) => {
                    if let Some(id) = pick(&ids, i) {
                        graph.decrement_outputs(id).unwrap();
                    }
                }
                Op::Connect(a, pa, b, pb) => {
                    if let (Some(src), Some(dst)) = (pick(&ids, a), pick(&ids, b)) {
                        let before = graph.edge_count();
                        if graph.connect(src, pa, dst, pb).is_ok() {
                            prop_assert_eq!(graph.edge_count(), before + 1);
                        } else {
                            prop_assert_eq!(graph.edge_count(), before);
                        }
                    }
                }
            }

            prop_assert!(graph.check_consistency().is_ok());
            for edge in graph.edges() {
                let src = graph.node(edge.source_node).unwrap();
                let dst = graph.node(edge.target_node).unwrap();
                prop_assert!(edge.source_port < src.output_count());
                prop_assert!(edge.target_port < dst.input_count());
            }
            let mut pairs: Vec<_> = graph.edges().map(|e| (e.source(), e.target())).collect();
            let total = pairs.len();
            pairs.sort_by_key(|(s, t)| (s.to_string(), t.to_string()));
            pairs.dedup();
            prop_assert_eq!(pairs.len(), total);
        }
    }
}
