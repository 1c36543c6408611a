// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! The two ways a parse can abort outright, as opposed to the recovered decode/truncation cases
//! covered in `gizmo.rs`.

use tempfile::tempdir;

use scene_graph::parser;
use scene_graph::ParseError;

#[test]
fn reading_a_missing_scene_file_surfaces_an_io_error() {
    let dir = tempdir().expect("tempdir");
    let missing = dir.path().join("does-not-exist.nk");

    let err = parser::parse(&missing).expect_err("missing file should fail to parse");
    match err {
        ParseError::Io { path, .. } => assert_eq!(path, missing),
        other => panic!("expected ParseError::Io, got {other:?}"),
    }
}

#[test]
fn cloning_an_unknown_branch_key_aborts_the_parse() {
    let err = parser::parse_str(
        "Read {\nname R\n}\nclone $NeverSaved {\nname R_clone\n}\n",
        "fixture.gizmo",
        true,
    )
    .expect_err("cloning an unsaved branch key should fail");

    match err {
        ParseError::UnknownBranch { key } => assert_eq!(key, "NeverSaved"),
        other => panic!("expected ParseError::UnknownBranch, got {other:?}"),
    }
}
