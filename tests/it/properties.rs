// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Universal structural properties a successful parse must hold, exercised over one scene with
//! chains, a group, and a clone family all present at once.

use std::collections::HashSet;

use scene_graph::graph::SceneGraph;
use scene_graph::arena::Handle;
use scene_graph::graph::Node;

use crate::support::parse_fragment;

fn sample_graph() -> (SceneGraph, Handle<Node>) {
    parse_fragment(
        r#"
Read {
name R1
}
set K [stack 0]
clone $K {
name R1_clone
}
Group {
name G
}
Merge2 {
inputs 2
name M1
}
push $K
Blur {
inputs 1
name B1
}
end_group
"#,
    )
}

#[test]
fn arity_matches_declared_inputs_knob_for_every_node() {
    let (graph, root) = sample_graph();
    for node in root.all_nodes(&graph, &[]) {
        let declared = node
            .knob(&graph, "inputs", &scene_graph::knob::KnobValue::Int(1))
            .as_i64()
            .unwrap_or(1) as usize;
        assert_eq!(node.input_slots(&graph).len(), declared, "node {:?}", node.path(&graph));
    }
}

#[test]
fn input_output_relationships_are_symmetric() {
    let (graph, root) = sample_graph();
    let mut nodes = root.all_nodes(&graph, &[]);
    nodes.push(root);
    for &u in &nodes {
        for v in u.outputs(&graph) {
            assert!(
                v.input_slots(&graph).iter().any(|slot| *slot == Some(u)),
                "{:?} claims {:?} as an output but is not in any of its input slots",
                u.path(&graph),
                v.path(&graph)
            );
        }
    }
}

#[test]
fn every_non_root_node_appears_exactly_once_in_its_parents_children() {
    let (graph, root) = sample_graph();
    for node in root.all_nodes(&graph, &[]) {
        let Some(parent) = node.parent(&graph) else {
            continue;
        };
        let count = parent.children(&graph).iter().filter(|c| **c == node).count();
        assert_eq!(count, 1, "{:?} should appear exactly once under its parent", node.path(&graph));
    }
}

#[test]
fn clone_family_mirrors_class_and_back_references() {
    let (graph, root) = sample_graph();
    let source = root
        .all_nodes(&graph, &[])
        .into_iter()
        .find(|n| n.name(&graph) == "R1")
        .unwrap();
    let clone = root
        .all_nodes(&graph, &[])
        .into_iter()
        .find(|n| n.name(&graph) == "R1_clone")
        .unwrap();

    assert_eq!(clone.source(&graph), Some(source));
    assert!(source.clones(&graph).contains(&clone));
    assert_eq!(clone.class(&graph), source.class(&graph));
}

#[test]
fn every_node_has_a_unique_path() {
    let (graph, root) = sample_graph();
    let mut seen = HashSet::new();
    for node in root.all_nodes(&graph, &[]) {
        assert!(seen.insert(node.path(&graph)), "duplicate path {:?}", node.path(&graph));
    }
}

#[test]
fn group_scope_closes_leaving_a_single_top_root() {
    let (graph, root) = sample_graph();
    // A single top root with no parent of its own.
    assert!(root.parent(&graph).is_none());
    // The Group opened once and end_group closed it exactly once, so its children
    // (Merge2, Blur) live under it rather than under the top root.
    let group = root
        .all_nodes(&graph, &[])
        .into_iter()
        .find(|n| n.class(&graph) == "Group")
        .unwrap();
    let names: Vec<&str> = group.children(&graph).iter().map(|c| c.name(&graph)).collect();
    assert_eq!(names, vec!["M1", "B1"]);
}
