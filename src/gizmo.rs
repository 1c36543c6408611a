// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Discovery and process-wide memoisation of companion `.gizmo` files.
//!
//! A gizmo is a reusable named subgraph. Scene scripts reference gizmos purely by class name; the
//! [`registry`][] walks every directory on [`SCENE_GIZMO_PATH`][], parses each `.gizmo` file it
//! finds as a scene fragment, and records the root's children under both their bare name and
//! `"<name>.gizmo"`, so either spelling resolves. The walk and parse pass runs once per process —
//! see [`registry`][]'s doc comment for why a `.gizmo` file is never itself gizmo-aware.
//!
//! [`SCENE_GIZMO_PATH`]: constant.SCENE_GIZMO_PATH.html
//! [`registry`]: fn.registry.html

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use walkdir::WalkDir;

use crate::arena::Handle;
use crate::error::{ParseError, Result};
use crate::graph::{Node, SceneGraph};

/// Colon-separated (semicolon on Windows) search path for `.gizmo` files, read once when the
/// registry is first built.
pub const SCENE_GIZMO_PATH: &str = "SCENE_GIZMO_PATH";

/// A process-wide, memoised map from gizmo class name to the prototype node whose children are
/// copied into any scene node of that class.
///
/// Registry entries are owned subgraphs; [`registry`][]'s only consumer, the parser, always goes
/// through [`SceneGraph::adopt`][crate::graph::SceneGraph::adopt] to deep-copy a prototype's
/// children before wiring them into a caller's graph, so mutating a consumer's graph can never
/// reach back into the registry (or any other consumer).
pub struct GizmoRegistry {
    graph: SceneGraph,
    entries: HashMap<String, Handle<Node>>,
}

impl GizmoRegistry {
    pub(crate) fn empty() -> GizmoRegistry {
        GizmoRegistry {
            graph: SceneGraph::new(),
            entries: HashMap::new(),
        }
    }

    pub(crate) fn lookup(&self, class: &str) -> Option<Handle<Node>> {
        self.entries.get(class).copied()
    }

    pub(crate) fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// The prototype node registered for `class`, if any gizmo file on the search path declared
    /// it. Exposed publicly (unlike [`lookup`][GizmoRegistry::lookup]) so callers building a
    /// scoped registry with [`build_from_dirs`][] can inspect what was discovered.
    pub fn prototype(&self, class: &str) -> Option<Handle<Node>> {
        self.lookup(class)
    }

    /// The subgraph that owns every prototype this registry returned from
    /// [`prototype`][GizmoRegistry::prototype].
    pub fn owning_graph(&self) -> &SceneGraph {
        self.graph()
    }
}

static REGISTRY: OnceCell<GizmoRegistry> = OnceCell::new();

/// Returns the process-wide gizmo registry, building it on first call from the directories named
/// in the `SCENE_GIZMO_PATH` environment variable.
///
/// `OnceCell::get_or_init` serialises concurrent first-use callers onto the same build, so every
/// caller observes the same registry for the lifetime of the process. Because the build only
/// happens once, setting `SCENE_GIZMO_PATH` after any other code path in the process has already
/// triggered a parse has no effect; tests that need a registry scoped to a specific directory
/// should call [`build_from_dirs`][] directly instead of going through this memoised singleton.
pub fn registry() -> &'static GizmoRegistry {
    REGISTRY.get_or_init(|| build_from_dirs(&search_dirs()))
}

fn search_dirs() -> Vec<PathBuf> {
    match env::var_os(SCENE_GIZMO_PATH) {
        Some(value) => env::split_paths(&value).collect(),
        None => Vec::new(),
    }
}

/// Walks every directory in `dirs`, looking for files ending in `.gizmo`, and parses each as a
/// scene fragment *without* gizmo substitution of its own — a `.gizmo` file that itself
/// references another gizmo class is parsed literally, matching the one-shot, non-recursive way
/// gizmo discovery works upstream, and sidestepping any question of initialization order between
/// gizmo files. A directory that can't be walked, or a `.gizmo` file that fails to parse, is
/// logged and skipped; it never aborts the rest of the walk.
///
/// This is the pure builder behind the process-wide [`registry`][]; call it directly to build a
/// registry scoped to a specific set of directories (tests, or a caller that wants several
/// independent registries in one process).
pub fn build_from_dirs(dirs: &[PathBuf]) -> GizmoRegistry {
    let mut registry = GizmoRegistry::empty();
    for dir in dirs {
        for entry in WalkDir::new(&dir).into_iter().filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::warn!("could not walk gizmo search directory: {err}");
                None
            }
        }) {
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().and_then(|ext| ext.to_str()) != Some("gizmo") {
                continue;
            }
            if let Err(err) = load_gizmo_file(&mut registry, entry.path()) {
                log::warn!("skipping gizmo file {}: {err}", entry.path().display());
            }
        }
    }
    registry
}


fn load_gizmo_file(registry: &mut GizmoRegistry, path: &Path) -> Result<()> {
    let source = fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let origin = path.to_string_lossy().into_owned();
    let empty = GizmoRegistry::empty();
    let (sub_graph, sub_root) = crate::parser::parse_with_registry(&source, &origin, true, &empty)?;
    let children = sub_root.children(&sub_graph).to_vec();
    let copied = registry.graph.adopt(&sub_graph, &children);
    for handle in copied {
        let name = handle.name(&registry.graph).to_string();
        if name.is_empty() {
            continue;
        }
        registry.entries.insert(format!("{name}.gizmo"), handle);
        registry.entries.insert(name, handle);
    }
    Ok(())
}
