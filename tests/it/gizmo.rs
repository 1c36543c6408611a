// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Gizmo discovery/merging and live-group file expansion.
//!
//! These tests touch the real filesystem, unlike the rest of the suite, so they go through
//! [`scene_graph::gizmo::build_from_dirs`] (a registry scoped to one directory) rather than the
//! process-wide [`scene_graph::gizmo::registry`] singleton — that singleton is built once, from
//! whatever `SCENE_GIZMO_PATH` happens to be set to the first time any test in this binary parses
//! anything, so it can't be pointed at a fixture directory reliably from here.

use std::fs;

use pretty_assertions::assert_eq;
use tempfile::tempdir;

use scene_graph::gizmo::build_from_dirs;
use scene_graph::parser;

#[test]
fn discovers_gizmo_files_under_both_name_spellings() {
    let dir = tempdir().expect("tempdir");
    fs::write(
        dir.path().join("Blurrer.gizmo"),
        "Group {\nname Blurrer\n}\nBlur {\ninputs 1\nname inner\n}\nend_group\n",
    )
    .expect("write gizmo fixture");

    let registry = build_from_dirs(&[dir.path().to_path_buf()]);

    let bare = registry.prototype("Blurrer").expect("bare name registered");
    let suffixed = registry
        .prototype("Blurrer.gizmo")
        .expect("name.gizmo spelling registered");
    assert_eq!(bare, suffixed);
    assert_eq!(bare.class(registry.owning_graph()), "Group");
}

#[test]
fn walks_nested_directories_and_registers_every_gizmo_file() {
    let dir = tempdir().expect("tempdir");
    let nested = dir.path().join("toolsets");
    fs::create_dir(&nested).expect("create nested dir");
    fs::write(dir.path().join("Top.gizmo"), "Blur {\nname Top\n}\n").expect("write top fixture");
    fs::write(nested.join("Nested.gizmo"), "Merge2 {\ninputs 2\nname Nested\n}\n")
        .expect("write nested fixture");

    let registry = build_from_dirs(&[dir.path().to_path_buf()]);

    assert!(registry.prototype("Top").is_some());
    assert!(registry.prototype("Nested").is_some());
}

#[test]
fn non_gizmo_files_in_the_search_path_are_ignored() {
    let dir = tempdir().expect("tempdir");
    fs::write(dir.path().join("notes.txt"), "Blur {\nname ShouldNotAppear\n}\n")
        .expect("write non-gizmo file");

    let registry = build_from_dirs(&[dir.path().to_path_buf()]);

    assert!(registry.prototype("ShouldNotAppear").is_none());
}

#[test]
fn missing_search_directory_is_skipped_rather_than_failing() {
    let dir = tempdir().expect("tempdir");
    let missing = dir.path().join("does-not-exist");

    // Should not panic, and should simply yield an empty registry.
    let registry = build_from_dirs(&[missing]);
    assert!(registry.prototype("Anything").is_none());
}

#[test]
fn two_registries_built_from_the_same_directory_own_independent_arenas() {
    let dir = tempdir().expect("tempdir");
    fs::write(
        dir.path().join("Rig.gizmo"),
        "Group {\nname Rig\n}\nBlur {\ninputs 1\nname inner\nsize 2\n}\nend_group\n",
    )
    .expect("write gizmo fixture");

    // build_from_dirs is the scoped entry point precisely so a consumer isn't stuck sharing the
    // process-wide memoised registry; two calls here must parse and adopt the fixture
    // independently rather than one handing the other a reference into its own arena.
    let first = build_from_dirs(&[dir.path().to_path_buf()]);
    let second = build_from_dirs(&[dir.path().to_path_buf()]);

    let first_proto = first.prototype("Rig").expect("prototype registered");
    let second_proto = second.prototype("Rig").expect("prototype registered");

    assert_eq!(first_proto.class(first.owning_graph()), "Group");
    assert_eq!(second_proto.class(second.owning_graph()), "Group");
    let first_children: Vec<&str> = first_proto
        .children(first.owning_graph())
        .iter()
        .map(|c| c.name(first.owning_graph()))
        .collect();
    let second_children: Vec<&str> = second_proto
        .children(second.owning_graph())
        .iter()
        .map(|c| c.name(second.owning_graph()))
        .collect();
    assert_eq!(first_children, second_children);

    // Dropping one registry's arena must not disturb the other's — they are genuinely separate
    // owning structures, not shared references into the same gizmo parse.
    drop(first);
    assert_eq!(second_proto.class(second.owning_graph()), "Group");
}

#[test]
fn live_group_expands_children_from_referenced_file() {
    let dir = tempdir().expect("tempdir");
    let referenced = dir.path().join("shot.nk");
    fs::write(
        &referenced,
        "Root {\n}\nRead {\nname InnerRead\n}\nBlur {\ninputs 1\nname InnerBlur\n}\n",
    )
    .expect("write referenced scene file");

    let scene = dir.path().join("main.nk");
    fs::write(
        &scene,
        format!(
            "Root {{\n}}\nLiveGroup {{\nname LG\nfile \"{}\"\n}}\n",
            referenced.to_string_lossy().replace('\\', "\\\\")
        ),
    )
    .expect("write main scene file");

    let (graph, root) = parser::parse(&scene).expect("scene with live group should parse");
    let live_group = root.children(&graph)[0];
    assert_eq!(live_group.class(&graph), "LiveGroup");

    let names: Vec<&str> = live_group
        .children(&graph)
        .iter()
        .map(|c| c.name(&graph))
        .collect();
    assert_eq!(names, vec!["InnerRead", "InnerBlur"]);
}

#[test]
fn live_group_without_file_knob_stays_childless() {
    let dir = tempdir().expect("tempdir");
    let scene = dir.path().join("main.nk");
    fs::write(&scene, "Root {\n}\nLiveGroup {\nname LG\n}\n").expect("write main scene file");

    let (graph, root) = parser::parse(&scene).expect("scene should parse");
    let live_group = root.children(&graph)[0];
    assert!(live_group.children(&graph).is_empty());
}

#[test]
fn truncated_brace_value_recovers_and_releases_the_file_handle() {
    let dir = tempdir().expect("tempdir");
    let scene = dir.path().join("truncated.nk");
    // The `message` block never finds its closing brace before end of file: this must recover
    // (per spec, truncation is never a parse error) rather than abort.
    fs::write(&scene, "Root {\n}\nText {\nname T\nmessage {line1\nline2\n").expect("write scene file");

    let (graph, root) = parser::parse(&scene).expect("truncated scene should still parse");
    let text_node = root.children(&graph)[0];
    assert_eq!(
        text_node
            .knob(&graph, "message", &scene_graph::knob::KnobValue::Raw(String::new()))
            .as_str(),
        Some("line1\nline2")
    );

    // parse() returned, so its file handle must already be closed: overwriting the same path
    // immediately afterward must succeed on every platform, including ones where an exclusively
    // held handle would make this fail.
    fs::write(&scene, "replaced").expect("file handle should have been released by parse()");
}
