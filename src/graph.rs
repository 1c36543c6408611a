// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Defines the structure of a scene graph.
//!
//! This module contains all of the types you need to define and navigate the DAG that a scene
//! script parses into.
//!
//! The scene as a whole lives in an instance of [`SceneGraph`][], which owns an [`Arena`][] of
//! [`Node`][]s. A scene graph is intrinsically cyclic — inputs point forward to the nodes that
//! feed them, outputs point backward to whatever they feed, clones point at their source and
//! sources track their clones — so every cross-reference ([`Node::inputs`][],
//! [`Node::outputs`][], [`Node::parent`][], [`Node::source`][], [`Node::clones`][]) is a
//! [`Handle<Node>`][`Handle`], a plain index into the arena, rather than an owning pointer.
//! Dropping the [`SceneGraph`][] drops the arena, which drops every node in one pass.
//!
//! [`Arena`]: ../arena/struct.Arena.html
//! [`Handle`]: ../arena/struct.Handle.html

use std::collections::HashMap;

use crate::arena::Arena;
use crate::arena::Handle;
use crate::knob::KnobValue;

/// Node classes that open an implicit scope on the scope stack (see [`crate::parser`]).
pub const ROOT_CLASSES: [&str; 2] = ["Root", "LiveGroupInfo"];

/// Node classes that, once closed, keep collecting subsequent siblings as children (in addition
/// to `LiveGroup` nodes with a truthy `modified` knob, which is not a fixed class name and so is
/// checked separately by the parser).
pub const GROUP_CLASSES: [&str; 2] = ["Group", "Gizmo"];

/// One entry in a scene's node DAG.
///
/// See the [module documentation][crate::graph] for how cross-references between nodes are
/// represented. All fields are private; use the accessor methods on [`Handle<Node>`][Handle]
/// (which all take the owning [`SceneGraph`][] as a parameter) to read or mutate a node.
#[derive(Debug, Clone)]
pub struct Node {
    class: String,
    knobs: HashMap<String, KnobValue>,
    inputs: Vec<Option<Handle<Node>>>,
    outputs: Vec<Option<Handle<Node>>>,
    children: Vec<Handle<Node>>,
    parent: Option<Handle<Node>>,
    clone_suffix: String,
    source: Option<Handle<Node>>,
    clones: Vec<Handle<Node>>,
    is_gizmo: bool,
}

impl Node {
    /// Creates a fresh, unlinked node of the given class, with the given decoded knobs. The
    /// `inputs` knob always defaults to `1` if it isn't present in `knobs`, matching the source
    /// format's default arity.
    pub(crate) fn new(class: String, mut knobs: HashMap<String, KnobValue>, arity: usize) -> Node {
        knobs
            .entry("inputs".to_string())
            .or_insert(KnobValue::Int(arity as i64));
        Node {
            class,
            knobs,
            inputs: vec![None; arity],
            outputs: Vec::new(),
            children: Vec::new(),
            parent: None,
            clone_suffix: String::new(),
            source: None,
            clones: Vec::new(),
            is_gizmo: false,
        }
    }

    pub(crate) fn set_clone_suffix(&mut self, suffix: String) {
        self.clone_suffix = suffix;
    }

    pub(crate) fn set_source(&mut self, source: Handle<Node>) {
        self.source = Some(source);
    }

    pub(crate) fn add_clone(&mut self, clone: Handle<Node>) {
        self.clones.push(clone);
    }

    pub(crate) fn mark_gizmo(&mut self) {
        self.is_gizmo = true;
    }

    pub(crate) fn add_child(&mut self, child: Handle<Node>) {
        self.children.push(child);
    }

    pub(crate) fn set_parent(&mut self, parent: Handle<Node>) {
        self.parent = Some(parent);
    }

    pub(crate) fn insert_knob(&mut self, key: String, value: KnobValue) {
        self.knobs.insert(key, value);
    }
}

/// An owning collection of [`Node`][]s, addressed by [`Handle<Node>`][Handle].
///
/// Parsing a scene script produces one `SceneGraph`. Dropping it frees every node it contains in
/// a single pass; there is no way to remove an individual node.
#[derive(Debug)]
pub struct SceneGraph {
    nodes: Arena<Node>,
}

impl SceneGraph {
    pub(crate) fn new() -> SceneGraph {
        SceneGraph {
            nodes: Arena::new(),
        }
    }

    pub(crate) fn add_node(&mut self, node: Node) -> Handle<Node> {
        self.nodes.add(node)
    }

    /// Attaches `child` to `parent`'s children and points `child`'s `parent` back at it.
    pub(crate) fn add_child(&mut self, parent: Handle<Node>, child: Handle<Node>) {
        self.nodes[child].set_parent(parent);
        self.nodes[parent].add_child(child);
    }

    /// Marks `handle` as materialised from a gizmo prototype (see [`Node::is_gizmo`][Handle::is_gizmo]).
    pub(crate) fn mark_gizmo(&mut self, handle: Handle<Node>) {
        self.nodes[handle].mark_gizmo();
    }

    /// Links `clone` onto `source`'s clone list. The reverse link (`clone.source = source`) is set
    /// directly on the node before it is added to the arena, since it never changes afterwards.
    pub(crate) fn register_clone(&mut self, source: Handle<Node>, clone: Handle<Node>) {
        self.nodes[source].add_clone(clone);
    }

    /// Wires input slot `i` of `target` to `source` (or disconnects it, if `source` is `None`).
    ///
    /// If the slot was already connected, `target` is first removed from the old input's output
    /// list — the slot is overwritten in place, not appended, so the output list grows only when
    /// a genuinely new connection is made.
    pub(crate) fn set_input(&mut self, target: Handle<Node>, i: usize, source: Option<Handle<Node>>) {
        if let Some(old) = self.nodes[target].inputs[i] {
            if let Some(slot) = self.nodes[old]
                .outputs
                .iter_mut()
                .find(|out| **out == Some(target))
            {
                *slot = None;
            }
        }
        self.nodes[target].inputs[i] = source;
        if let Some(source) = source {
            self.nodes[source].outputs.push(Some(target));
        }
    }

    /// Deep-copies the subtree rooted at each of `roots` (following `children` transitively) into
    /// this graph and returns the handles of the copied top-level nodes, in the same order as
    /// `roots`, with their `parent` left unset.
    ///
    /// This is the shared remapping step behind both [`graft`][SceneGraph::graft] (which attaches
    /// the copies under a consuming node) and the gizmo registry (which keeps copies standalone,
    /// as addressable prototypes). Every handle internal to the subtree (children, parent, inputs,
    /// outputs, source, clones) is remapped into this graph's arena; a reference that escapes the
    /// subtree — which a self-contained gizmo or live group fragment should never produce — is
    /// dropped rather than left dangling.
    pub(crate) fn adopt(&mut self, src: &SceneGraph, roots: &[Handle<Node>]) -> Vec<Handle<Node>> {
        let mut old_to_new: HashMap<Handle<Node>, Handle<Node>> = HashMap::new();
        let mut order = Vec::new();
        let mut stack: Vec<Handle<Node>> = roots.to_vec();
        while let Some(old) = stack.pop() {
            if old_to_new.contains_key(&old) {
                continue;
            }
            let old_node = &src.nodes[old];
            let mut copy = old_node.clone();
            copy.parent = None;
            copy.outputs.clear();
            let new = self.nodes.add(copy);
            old_to_new.insert(old, new);
            order.push(old);
            stack.extend(old_node.children.iter().copied());
        }

        let remap = |h: Handle<Node>| old_to_new.get(&h).copied();
        let remap_opt = |h: Option<Handle<Node>>| h.and_then(remap);

        for &old in &order {
            let old_node = &src.nodes[old];
            let new = old_to_new[&old];
            let new_children: Vec<Handle<Node>> =
                old_node.children.iter().filter_map(|c| remap(*c)).collect();
            let new_inputs: Vec<Option<Handle<Node>>> =
                old_node.inputs.iter().map(|i| remap_opt(*i)).collect();
            let new_outputs: Vec<Option<Handle<Node>>> =
                old_node.outputs.iter().map(|o| remap_opt(*o)).collect();
            let new_source = remap_opt(old_node.source);
            let new_clones: Vec<Handle<Node>> =
                old_node.clones.iter().filter_map(|c| remap(*c)).collect();
            let new_parent_handle = remap_opt(old_node.parent);

            let entry = &mut self.nodes[new];
            entry.children = new_children;
            entry.inputs = new_inputs;
            entry.outputs = new_outputs;
            entry.source = new_source;
            entry.clones = new_clones;
            entry.parent = new_parent_handle;
        }

        roots.iter().map(|old_root| old_to_new[old_root]).collect()
    }

    /// Like [`adopt`][SceneGraph::adopt], but reparents the copied top-level nodes under
    /// `new_parent` and appends them to its children, in order.
    pub(crate) fn graft(
        &mut self,
        src: &SceneGraph,
        roots: &[Handle<Node>],
        new_parent: Handle<Node>,
    ) -> Vec<Handle<Node>> {
        let top_level = self.adopt(src, roots);
        for &new_root in &top_level {
            self.nodes[new_root].parent = Some(new_parent);
            self.nodes[new_parent].children.push(new_root);
        }
        top_level
    }
}

impl std::ops::Index<Handle<Node>> for SceneGraph {
    type Output = Node;
    fn index(&self, handle: Handle<Node>) -> &Node {
        &self.nodes[handle]
    }
}

fn node_name(node: &Node) -> &str {
    if node.class == "Root" {
        "Root"
    } else {
        match node.knobs.get("name") {
            Some(KnobValue::String(s)) | Some(KnobValue::Raw(s)) => s.as_str(),
            _ => "",
        }
    }
}

impl Handle<Node> {
    /// The node's class tag, e.g. `Merge2`, `Group`, `Root`, `LiveGroup`, `Gizmo`.
    pub fn class(self, graph: &SceneGraph) -> &str {
        &graph[self].class
    }

    /// The `name` knob, or an empty string if it isn't set.
    pub fn name(self, graph: &SceneGraph) -> &str {
        match graph[self].knobs.get("name") {
            Some(KnobValue::String(s)) | Some(KnobValue::Raw(s)) => s.as_str(),
            _ => "",
        }
    }

    /// The dot-joined path from the nearest enclosing `Root`, used by GUI consumers that want a
    /// human path without the leading synthetic roots. Distinct from [`path`][Handle::path], which
    /// is slash-delimited, absolute, and clone-suffixed.
    pub fn full_name(self, graph: &SceneGraph) -> String {
        let mut segments = Vec::new();
        let mut current = Some(self);
        while let Some(handle) = current {
            let node = &graph[handle];
            if node.class == "Root" {
                break;
            }
            segments.insert(0, handle.name(graph).to_string());
            current = node.parent;
        }
        segments.join(".")
    }

    /// The slash-delimited, clone-suffixed path from the top root. No two nodes in a successful
    /// parse share the same path.
    pub fn path(self, graph: &SceneGraph) -> String {
        let mut segments = Vec::new();
        let mut current = Some(self);
        while let Some(handle) = current {
            let node = &graph[handle];
            segments.push(node_name(node).to_string());
            current = node.parent;
        }
        segments.reverse();
        let mut path = String::new();
        for segment in segments {
            path.push('/');
            path.push_str(&segment);
        }
        path.push_str(&graph[self].clone_suffix);
        path
    }

    /// The node's parent, or `None` for the top root.
    pub fn parent(self, graph: &SceneGraph) -> Option<Handle<Node>> {
        graph[self].parent
    }

    /// Ascends parents until one with no parent is found.
    pub fn root(self, graph: &SceneGraph) -> Handle<Node> {
        let mut current = self;
        while let Some(parent) = graph[current].parent {
            current = parent;
        }
        current
    }

    /// The node's children, in parse order.
    pub fn children(self, graph: &SceneGraph) -> &[Handle<Node>] {
        &graph[self].children
    }

    /// The node's connected inputs, in slot order, skipping unconnected slots. Use
    /// [`input_slots`][Handle::input_slots] if slot positions matter.
    pub fn inputs(self, graph: &SceneGraph) -> Vec<Handle<Node>> {
        graph[self].inputs.iter().filter_map(|i| *i).collect()
    }

    /// The node's input slots, including unconnected (`None`) ones, in declared-arity order.
    pub fn input_slots(self, graph: &SceneGraph) -> &[Option<Handle<Node>>] {
        &graph[self].inputs
    }

    /// The nodes that list this node in any of their input slots.
    pub fn outputs(self, graph: &SceneGraph) -> Vec<Handle<Node>> {
        graph[self].outputs.iter().filter_map(|o| *o).collect()
    }

    /// Looks up a knob by name, returning `default` if it isn't set.
    pub fn knob<'a>(self, graph: &'a SceneGraph, name: &str, default: &'a KnobValue) -> &'a KnobValue {
        graph[self].knobs.get(name).unwrap_or(default)
    }

    pub fn has_knob(self, graph: &SceneGraph, name: &str) -> bool {
        graph[self].knobs.contains_key(name)
    }

    /// A deep copy of every knob set on this node.
    pub fn knobs(self, graph: &SceneGraph) -> HashMap<String, KnobValue> {
        graph[self].knobs.clone()
    }

    pub fn xpos(self, graph: &SceneGraph) -> Option<i64> {
        graph[self].knobs.get("xpos").and_then(KnobValue::as_i64)
    }

    pub fn ypos(self, graph: &SceneGraph) -> Option<i64> {
        graph[self].knobs.get("ypos").and_then(KnobValue::as_i64)
    }

    pub fn set_xpos(self, graph: &mut SceneGraph, value: i64) {
        graph.nodes[self].knobs.insert("xpos".to_string(), KnobValue::Int(value));
    }

    pub fn set_ypos(self, graph: &mut SceneGraph, value: i64) {
        graph.nodes[self].knobs.insert("ypos".to_string(), KnobValue::Int(value));
    }

    pub fn disable(self, graph: &SceneGraph) -> bool {
        graph[self]
            .knobs
            .get("disable")
            .map(KnobValue::is_truthy)
            .unwrap_or(false)
    }

    /// Sets the `disable` knob, propagating the same value to every member of this node's clone
    /// family (its source, if it has one, and then every clone of that source).
    pub fn set_disable(self, graph: &mut SceneGraph, value: bool) {
        graph.nodes[self]
            .knobs
            .insert("disable".to_string(), KnobValue::Int(value as i64));
        if let Some(source) = graph.nodes[self].source {
            graph.nodes[source]
                .knobs
                .insert("disable".to_string(), KnobValue::Int(value as i64));
            let clones = graph.nodes[source].clones.clone();
            for clone in clones {
                graph.nodes[clone]
                    .knobs
                    .insert("disable".to_string(), KnobValue::Int(value as i64));
            }
        } else {
            let clones = graph.nodes[self].clones.clone();
            for clone in clones {
                graph.nodes[clone]
                    .knobs
                    .insert("disable".to_string(), KnobValue::Int(value as i64));
            }
        }
    }

    /// True if this node is a clone, or is the source of at least one clone.
    pub fn is_clone(self, graph: &SceneGraph) -> bool {
        let node = &graph[self];
        node.source.is_some() || !node.clones.is_empty()
    }

    /// For a clone instance, its source node.
    pub fn source(self, graph: &SceneGraph) -> Option<Handle<Node>> {
        graph[self].source
    }

    /// For a node that has been cloned, its clone instances.
    pub fn clones(self, graph: &SceneGraph) -> &[Handle<Node>] {
        &graph[self].clones
    }

    pub fn is_gizmo(self, graph: &SceneGraph) -> bool {
        let node = &graph[self];
        node.is_gizmo || node.class == "gizmo"
    }

    /// Depth-first flattened enumeration of every descendant (not including `self`), optionally
    /// restricted to classes in `filter`. An empty filter matches every class.
    pub fn all_nodes(self, graph: &SceneGraph, filter: &[&str]) -> Vec<Handle<Node>> {
        fn walk(node: Handle<Node>, graph: &SceneGraph, filter: &[&str], out: &mut Vec<Handle<Node>>) {
            for &child in node.children(graph) {
                if filter.is_empty() || filter.contains(&child.class(graph)) {
                    out.push(child);
                }
                walk(child, graph, filter, out);
            }
        }
        let mut out = Vec::new();
        walk(self, graph, filter, &mut out);
        out
    }
}
