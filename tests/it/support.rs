// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Shared fixture helper for the scenario and property tests.
//!
//! Every test in this suite builds its graph in-process with [`parse_fragment`] rather than from
//! an on-disk `.nk` file: the scene-script grammar itself has no dependency on the filesystem, and
//! parsing a gizmo-style fragment (with the implicit top-level `Root` scope) is the simplest way
//! to give a bare excerpt — one that doesn't spell out its own enclosing `Root { ... }` block,
//! same as every literal example in the design docs — somewhere to attach its top-level nodes.

use scene_graph::arena::Handle;
use scene_graph::graph::{Node, SceneGraph};
use scene_graph::parser;

pub fn parse_fragment(source: &str) -> (SceneGraph, Handle<Node>) {
    parser::parse_str(source, "fixture.gizmo", true).expect("fixture source should parse")
}
