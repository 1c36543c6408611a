// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Line-pattern recognizers.
//!
//! Every input line is classified into exactly one [`Line`][] shape. The classification of
//! `clone $KEY {` and `TYPE {` additionally depends on parser state (whether a node block is
//! already open), which is why [`classify`][] takes a `node_open_allowed` flag rather than being
//! a pure function of the line text alone — the parser is mid-way through collecting a
//! multi-line knob value or a nested child block in that case, and a line that merely *looks*
//! like a node header should fall through to the knob-assignment recognizer instead.
//!
//! [`Line`]: enum.Line.html
//! [`classify`]: fn.classify.html

use once_cell::sync::Lazy;
use regex::Regex;

static NODE_OPEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(?P<type>[\w.]+)\s\{$").unwrap());
static BRANCH_STACK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"set (?P<key>\w+) \[stack \d+\]").unwrap());
static PUSH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"push \$(?P<key>\w+)").unwrap());
static CLONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*clone \$(?P<key>\w+)\s\{").unwrap());
static NODE_KNOB_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*(?P<key>[\w.]+)[ ]+(?P<value>["\w{/-].*)"#).unwrap());

#[derive(Debug, PartialEq)]
pub enum Line<'a> {
    /// `push 0`
    PushNull,
    /// `push $KEY`
    PushBranch(&'a str),
    /// `set KEY [stack N]`, where `KEY` is the literal `cut_paste_input`.
    CutPasteInput,
    /// `set KEY [stack N]`
    BranchSave(&'a str),
    /// `end_group`
    EndGroup,
    /// `clone $KEY {`
    CloneOpen(&'a str),
    /// `TYPE {`
    NodeOpen(&'a str),
    /// a lone `}`
    NodeClose,
    /// `KEY VALUE`
    Knob { key: &'a str, value: &'a str },
    Ignored,
}

pub fn classify(line: &str, node_open_allowed: bool) -> Line<'_> {
    if line.contains("push 0") {
        return Line::PushNull;
    }
    if let Some(captures) = BRANCH_STACK_RE.captures(line) {
        let key = captures.name("key").unwrap().as_str();
        return if key == "cut_paste_input" {
            Line::CutPasteInput
        } else {
            Line::BranchSave(key)
        };
    }
    if let Some(captures) = PUSH_RE.captures(line) {
        return Line::PushBranch(captures.name("key").unwrap().as_str());
    }
    if line.contains("end_group") {
        return Line::EndGroup;
    }
    if node_open_allowed {
        if let Some(captures) = CLONE_RE.captures(line) {
            return Line::CloneOpen(captures.name("key").unwrap().as_str());
        }
        if let Some(captures) = NODE_OPEN_RE.captures(line) {
            return Line::NodeOpen(captures.name("type").unwrap().as_str());
        }
    }
    if let Some(captures) = NODE_KNOB_RE.captures(line) {
        let key = captures.name("key").unwrap().as_str();
        let value = captures.name("value").unwrap().as_str();
        return Line::Knob { key, value };
    }
    if line.trim() == "}" {
        return Line::NodeClose;
    }
    Line::Ignored
}
