// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! The single-pass, line-oriented stack machine that turns scene-script text into a
//! [`SceneGraph`][].
//!
//! The machine owns two stacks ([`State::value_stack`], [`State::scope_stack`]), a branch table,
//! and a per-branch clone counter, as described in the [module-level data model][crate::graph].
//! It consumes lines classified by [`crate::lexer`] and decodes knob tokens with [`crate::knob`].

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use crate::arena::Handle;
use crate::error::{ParseError, Result};
use crate::gizmo::GizmoRegistry;
use crate::graph::{Node, SceneGraph, GROUP_CLASSES, ROOT_CLASSES};
use crate::knob::{self, KnobValue};
use crate::lexer::{self, Line};

/// Environment variable gating the `addUserKnob` sub-grammar's experimental user-knob mode.
/// Unset or empty means `addUserKnob` lines are silently ignored.
pub const EXPERIMENTAL_USER_KNOBS_VAR: &str = "SCENE_PARSER_EXPERIMENTAL";

/// Parses a scene script file on disk.
///
/// The file's extension determines whether an implicit top-level `Root` scope is pushed before
/// the first line (`.gizmo` files get one; scene scripts don't, since their first node block
/// establishes the root itself). Any `LiveGroup` node whose `file` knob is set is expanded
/// in-place by recursively parsing that file, using the same process-wide gizmo registry.
pub fn parse(path: impl AsRef<Path>) -> Result<(SceneGraph, Handle<Node>)> {
    parse_path_with_registry(path.as_ref(), crate::gizmo::registry())
}

/// Parses scene script text that doesn't necessarily live on disk, against the process-wide
/// gizmo registry (ensuring it is populated first).
///
/// `origin` supplies the logical file name used for `Gizmo` node name synthesis; `is_gizmo`
/// controls whether an implicit top-level `Root` scope is pushed, mirroring the `.gizmo`
/// extension check [`parse`][] performs for on-disk files.
pub fn parse_str(source: &str, origin: &str, is_gizmo: bool) -> Result<(SceneGraph, Handle<Node>)> {
    parse_with_registry(source, origin, is_gizmo, crate::gizmo::registry())
}

fn parse_path_with_registry(path: &Path, gizmos: &GizmoRegistry) -> Result<(SceneGraph, Handle<Node>)> {
    let source = fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let is_gizmo = path.extension().and_then(|ext| ext.to_str()) == Some("gizmo");
    let origin = path.to_string_lossy().into_owned();
    parse_with_registry(&source, &origin, is_gizmo, gizmos)
}

/// Parses scene script text against a caller-supplied gizmo registry, instead of the process-wide
/// one. Exposed crate-internally so the gizmo registry builder can parse each `.gizmo` file
/// without forcing (or recursing into) the registry it is itself constructing, and so a
/// `LiveGroup`'s referenced file is expanded against the same registry as its enclosing scene.
pub(crate) fn parse_with_registry(
    source: &str,
    origin: &str,
    is_gizmo: bool,
    gizmos: &GizmoRegistry,
) -> Result<(SceneGraph, Handle<Node>)> {
    let mut graph = SceneGraph::new();
    let mut state = State::new(gizmos, origin);

    if is_gizmo {
        let root = graph.add_node(Node::new("Root".to_string(), HashMap::new(), 0));
        state.scope_stack.push(root);
        state.value_stack.push(Some(root));
    }

    let mut lines = source.lines();
    while let Some(line) = lines.next() {
        state.consume_line(&mut graph, line, &mut lines)?;
    }

    let root = state
        .scope_stack
        .first()
        .copied()
        .unwrap_or_else(|| graph.add_node(Node::new("Root".to_string(), HashMap::new(), 0)));
    Ok((graph, root))
}

/// Parser-scoped state: the two stacks, branch table, and clone counters from the data model,
/// plus the in-progress node block (if any) being accumulated. Everything here is discarded at
/// the end of a single parse.
struct State<'g> {
    class: Option<String>,
    knobs: HashMap<String, KnobValue>,
    /// Set while accumulating a `clone $KEY { ... }` block: the source node being cloned, and
    /// the `_<n>` suffix this instance will carry.
    pending_clone: Option<(Handle<Node>, String)>,
    value_stack: Vec<Option<Handle<Node>>>,
    scope_stack: Vec<Handle<Node>>,
    branch_table: HashMap<String, Option<Handle<Node>>>,
    clone_counts: HashMap<String, u32>,
    gizmos: &'g GizmoRegistry,
    origin_stem: String,
}

impl<'g> State<'g> {
    fn new(gizmos: &'g GizmoRegistry, origin: &str) -> State<'g> {
        let origin_stem = Path::new(origin)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        State {
            class: None,
            knobs: HashMap::new(),
            pending_clone: None,
            value_stack: Vec::new(),
            scope_stack: Vec::new(),
            branch_table: HashMap::new(),
            clone_counts: HashMap::new(),
            gizmos,
            origin_stem,
        }
    }

    fn consume_line<'a, I>(&mut self, graph: &mut SceneGraph, line: &'a str, lines: &mut I) -> Result<()>
    where
        I: Iterator<Item = &'a str>,
    {
        let node_open_allowed = self.class.is_none();
        match lexer::classify(line, node_open_allowed) {
            Line::PushNull => {
                self.value_stack.push(None);
            }
            Line::CutPasteInput => {
                let root = graph.add_node(Node::new("Root".to_string(), HashMap::new(), 0));
                self.scope_stack.push(root);
            }
            Line::BranchSave(key) => {
                let top = self.value_stack.last().copied().flatten();
                self.branch_table.insert(key.to_string(), top);
            }
            Line::PushBranch(key) => {
                let target = self.branch_table.get(key).copied().flatten();
                if !self.branch_table.contains_key(key) {
                    log::trace!("push $\"{key}\" references a branch that was never saved; pushing no connection");
                }
                self.value_stack.push(target);
            }
            Line::EndGroup => self.end_group(),
            Line::CloneOpen(key) => self.open_clone(graph, key)?,
            Line::NodeOpen(class) => self.open_node(class),
            Line::Knob { key, value } => self.assign_knob(key, value, lines),
            Line::NodeClose => {
                if self.class.is_some() {
                    self.close_node(graph)?;
                }
            }
            Line::Ignored => {}
        }
        Ok(())
    }

    /// Pops the value stack until its top matches the current scope-stack top, re-pushes that
    /// scope top, and pops the scope stack once. A well-formed scene balances every `end_group`
    /// against exactly one `Group`/`Gizmo`/modified-`LiveGroup` scope push.
    fn end_group(&mut self) {
        let Some(&scope_top) = self.scope_stack.last() else {
            return;
        };
        let target = Some(scope_top);
        while let Some(node) = self.value_stack.pop() {
            if node == target {
                break;
            }
        }
        self.value_stack.push(target);
        self.scope_stack.pop();
    }

    /// Begins a `clone $KEY { ... }` block: inherits class and a deep copy of knobs (minus
    /// `inputs`, which a clone always re-reads from its own file block) from the branch-table
    /// entry for `key`.
    fn open_clone(&mut self, graph: &SceneGraph, key: &str) -> Result<()> {
        let source = self
            .branch_table
            .get(key)
            .copied()
            .flatten()
            .ok_or_else(|| ParseError::UnknownBranch {
                key: key.to_string(),
            })?;
        let mut knobs = source.knobs(graph);
        knobs.remove("inputs");
        self.class = Some(source.class(graph).to_string());
        self.knobs = knobs;

        let count = self.clone_counts.entry(key.to_string()).or_insert(0);
        *count += 1;
        self.pending_clone = Some((source, format!("_{count}")));
        Ok(())
    }

    fn open_node(&mut self, class: &str) {
        self.knobs = HashMap::new();
        if let Some(prototype) = self.gizmos.lookup(class) {
            self.knobs.extend(prototype.knobs(self.gizmos.graph()));
        }
        if class == "Gizmo" {
            self.knobs
                .insert("name".to_string(), KnobValue::String(self.origin_stem.clone()));
        }
        self.class = Some(class.to_string());
    }

    fn assign_knob<'a, I>(&mut self, key: &str, value: &'a str, lines: &mut I)
    where
        I: Iterator<Item = &'a str>,
    {
        let (content, raw) = match value.chars().next() {
            Some('"') => extend_quoted(value, lines),
            Some('{') => extend_braced(value, lines),
            _ => (value.to_string(), value.to_string()),
        };

        if key == "addUserKnob" && experimental_user_knobs_enabled() {
            knob::parse_user_knob(&mut self.knobs, &raw);
            return;
        }
        self.knobs.insert(key.to_string(), knob::decode(&content));
    }

    fn close_node(&mut self, graph: &mut SceneGraph) -> Result<()> {
        let class = self.class.take().expect("close_node called with no open block");
        let knobs = std::mem::take(&mut self.knobs);
        let arity = knob::input_arity(knobs.get("inputs"));
        let mut node = Node::new(class.clone(), knobs, arity);

        let clone_info = self.pending_clone.take();
        if let Some((source, suffix)) = &clone_info {
            node.set_clone_suffix(suffix.clone());
            node.set_source(*source);
        }

        let handle = graph.add_node(node);

        if let Some((source, _)) = clone_info {
            graph.register_clone(source, handle);
        }

        for i in 0..arity {
            let input = self.value_stack.pop().unwrap_or(None);
            graph.set_input(handle, i, input);
        }

        if let Some(prototype) = self.gizmos.lookup(&class) {
            let children = prototype.children(self.gizmos.graph()).to_vec();
            graph.graft(self.gizmos.graph(), &children, handle);
            graph.mark_gizmo(handle);
        }

        if class == "LiveGroup" {
            let file = handle
                .knob(graph, "file", &KnobValue::Raw(String::new()))
                .as_str()
                .filter(|f| !f.is_empty())
                .map(|f| f.to_string());
            if let Some(file) = file {
                let (sub_graph, sub_root) = parse_path_with_registry(Path::new(&file), self.gizmos)?;
                let children = sub_root.children(&sub_graph).to_vec();
                graph.graft(&sub_graph, &children, handle);
            }
        }

        self.value_stack.push(Some(handle));

        if ROOT_CLASSES.contains(&class.as_str()) {
            self.scope_stack.push(handle);
            return Ok(());
        }

        if let Some(&parent) = self.scope_stack.last() {
            graph.add_child(parent, handle);
        }

        let modified_live_group = class == "LiveGroup"
            && handle
                .knob(graph, "modified", &KnobValue::Int(0))
                .is_truthy();
        if GROUP_CLASSES.contains(&class.as_str()) || modified_live_group {
            self.scope_stack.push(handle);
        }
        Ok(())
    }
}

fn experimental_user_knobs_enabled() -> bool {
    env::var_os(EXPERIMENTAL_USER_KNOBS_VAR)
        .map(|value| !value.is_empty())
        .unwrap_or(false)
}

/// Balances a double-quoted value by pulling further lines out of `lines` until the running
/// count of `"` minus escaped `\"` is even, joining with `\n` to match what the file's own
/// newlines would have produced. Returns `(content, raw)`: `content` has the outer quotes
/// stripped, ready for [`knob::decode`]; `raw` keeps them (unused here, but mirrors
/// [`extend_braced`]'s signature). Running out of input mid-value is truncation, not failure:
/// whatever was accumulated becomes the value.
fn extend_quoted<'a, I>(value: &str, lines: &mut I) -> (String, String)
where
    I: Iterator<Item = &'a str>,
{
    let mut raw = value.to_string();
    let mut count = quote_count(value);
    let mut truncated = false;
    while count % 2 != 0 {
        match lines.next() {
            Some(line) => {
                count += quote_count(line);
                raw.push('\n');
                raw.push_str(line);
            }
            None => {
                log::debug!("quoted knob value truncated at end of file before closing quote");
                truncated = true;
                break;
            }
        }
    }
    (strip_delimiters(&raw, truncated), raw)
}

/// Balances a brace-delimited value the same way [`extend_quoted`] balances a quoted one, tracking
/// `{` minus `}` until it returns to zero instead of a quote parity.
fn extend_braced<'a, I>(value: &str, lines: &mut I) -> (String, String)
where
    I: Iterator<Item = &'a str>,
{
    let mut raw = value.to_string();
    let mut depth = brace_depth(value);
    let mut truncated = false;
    while depth != 0 {
        match lines.next() {
            Some(line) => {
                depth += brace_depth(line);
                raw.push('\n');
                raw.push_str(line);
            }
            None => {
                log::debug!("brace-delimited knob value truncated at end of file before closing brace");
                truncated = true;
                break;
            }
        }
    }
    (strip_delimiters(&raw, truncated), raw)
}

fn quote_count(s: &str) -> i64 {
    let quotes = s.matches('"').count() as i64;
    let escaped = s.matches("\\\"").count() as i64;
    quotes - escaped
}

fn brace_depth(s: &str) -> i64 {
    s.matches('{').count() as i64 - s.matches('}').count() as i64
}

/// Strips the opening delimiter, and (if one was actually found) the closing delimiter, matching
/// the source format's treatment of multi-line quoted and brace-delimited values. A one-character
/// value is left untouched.
///
/// When `truncated` is true, end of file was reached before the value balanced — there is no
/// closing delimiter to strip, so only the opening one is removed; stripping a trailing character
/// anyway would silently drop the last byte of whatever content the file actually contained.
fn strip_delimiters(s: &str, truncated: bool) -> String {
    if s.chars().count() <= 1 {
        return s.to_string();
    }
    let mut chars = s.chars();
    chars.next();
    if !truncated {
        chars.next_back();
    }
    chars.collect()
}
