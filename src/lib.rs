// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Parses a compositing application's stack-oriented scene script — and its companion "gizmo"
//! fragment files — into an in-memory, navigable node DAG.
//!
//! A scene script interleaves node blocks (`TYPE { key value ... }`) with stack-machine
//! directives (`push`, `set KEY [stack N]`, `end_group`) that wire each node's inputs to whatever
//! came before it, including across nested group scopes and shared "clone" nodes. Parsing such a
//! file is a small, single-pass stack VM layered over a line-oriented lexer; see the
//! [`parser`][] module for the machine itself, [`lexer`][] for how a line is classified, and
//! [`knob`][] for how a raw knob token becomes a typed value.
//!
//! The resulting graph is intrinsically cyclic: inputs point forward to whatever feeds them,
//! outputs point back to whatever they feed, and clones point at their source. [`graph`][]
//! represents this with an [`arena::Arena`][] of [`graph::Node`][]s addressed by
//! [`arena::Handle`][], rather than with owning pointers — see that module's documentation for
//! why.
//!
//! A scene may reference reusable subgraphs ("gizmos") stored in companion `.gizmo` files, and a
//! `LiveGroup` node may reference another scene file outright. [`gizmo`][] discovers and
//! memoises gizmo prototypes for the lifetime of the process; [`parser::parse`][] composes
//! gizmo discovery, the main parse, and live-group expansion into the single entry point most
//! callers want.
//!
//! ```no_run
//! let (graph, root) = scene_graph::parser::parse("shot.nk")?;
//! for node in root.all_nodes(&graph, &[]) {
//!     println!("{} ({})", node.path(&graph), node.class(&graph));
//! }
//! # Ok::<(), scene_graph::error::ParseError>(())
//! ```

pub mod arena;
pub mod error;
pub mod gizmo;
pub mod graph;
pub mod knob;
pub mod lexer;
pub mod parser;

pub use error::{ParseError, Result};
pub use graph::{Node, SceneGraph};
pub use parser::parse;
