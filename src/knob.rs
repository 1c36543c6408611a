// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Decoding of raw knob tokens into typed values, and the `addUserKnob` sub-grammar.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// A decoded knob value.
///
/// The scene script format has no real type system: a knob's raw text is either a bare word, a
/// quoted string, or a brace-delimited block, and [`decode`][] makes a best-effort, JSON-like
/// guess at the most specific shape that fits. Mapping-shaped literals are deliberately excluded
/// (see [`decode`][]'s doc comment) and fall back to [`KnobValue::Raw`][], along with anything
/// else JSON can express that doesn't have a dedicated variant here (booleans, `null`).
///
/// [`decode`]: fn.decode.html
/// [`KnobValue::Raw`]: enum.KnobValue.html#variant.Raw
#[derive(Debug, Clone, PartialEq)]
pub enum KnobValue {
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<KnobValue>),
    /// The cleaned-up source text, kept as-is because it didn't decode into anything more
    /// specific (or decoded into a mapping, which this format never actually uses).
    Raw(String),
}

impl KnobValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            KnobValue::String(s) | KnobValue::Raw(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            KnobValue::Int(n) => Some(*n),
            KnobValue::Float(f) => Some(*f as i64),
            KnobValue::String(s) | KnobValue::Raw(s) => s.trim().parse().ok(),
            KnobValue::List(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            KnobValue::Int(n) => Some(*n as f64),
            KnobValue::Float(f) => Some(*f),
            KnobValue::String(s) | KnobValue::Raw(s) => s.trim().parse().ok(),
            KnobValue::List(_) => None,
        }
    }

    /// True if the knob is truthy in the sense Nuke scripts use for flags like `modified` and
    /// `disable`: a nonzero number, or the literal word `true`.
    pub fn is_truthy(&self) -> bool {
        match self {
            KnobValue::Int(n) => *n != 0,
            KnobValue::Float(f) => *f != 0.0,
            KnobValue::String(s) | KnobValue::Raw(s) => s == "true" || s == "1",
            KnobValue::List(items) => !items.is_empty(),
        }
    }
}

impl std::fmt::Display for KnobValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KnobValue::Int(n) => write!(f, "{n}"),
            KnobValue::Float(x) => write!(f, "{x}"),
            KnobValue::String(s) | KnobValue::Raw(s) => write!(f, "{s}"),
            KnobValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Decodes a raw knob token into a [`KnobValue`][].
///
/// Escaped newlines (`\n`) become real newlines, and any remaining single backslashes are
/// stripped, before a JSON-like parse is attempted. If the parse succeeds and yields a mapping,
/// the scene language has no use for nested mapping knobs — a parsed mapping almost always means
/// the value was actually a brace-delimited block that should stay textual — so the cleaned
/// string is returned instead. If the parse fails outright, the cleaned string is also returned:
/// decode failure is always recovered, never surfaced as an error.
///
/// [`KnobValue`]: enum.KnobValue.html
pub fn decode(raw: &str) -> KnobValue {
    let cleaned = raw.replace("\\n", "\n").replace('\\', "");
    match serde_json::from_str::<serde_json::Value>(&cleaned) {
        Ok(value) => from_json(value, &cleaned),
        Err(err) => {
            log::trace!("knob value {cleaned:?} is not JSON-like ({err}), keeping it raw");
            KnobValue::Raw(cleaned)
        }
    }
}

fn from_json(value: serde_json::Value, cleaned: &str) -> KnobValue {
    use serde_json::Value;
    match value {
        Value::Object(_) => KnobValue::Raw(cleaned.to_string()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                KnobValue::Int(i)
            } else {
                KnobValue::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        Value::String(s) => KnobValue::String(s),
        Value::Array(items) => KnobValue::List(
            items
                .into_iter()
                .map(|item| {
                    let rendered = item.to_string();
                    from_json(item, &rendered)
                })
                .collect(),
        ),
        // Bare JSON booleans and null have no dedicated variant in this format; keep the
        // cleaned text verbatim rather than inventing one.
        Value::Bool(_) | Value::Null => KnobValue::Raw(cleaned.to_string()),
    }
}

/// Reads a decoded knob's `inputs` arity.
///
/// Parses the arity strictly as an integer, falling back to `1` for anything unparseable, and
/// clamping negative values to `0`.
pub fn input_arity(value: Option<&KnobValue>) -> usize {
    match value {
        None => 1,
        Some(KnobValue::Int(n)) => (*n).max(0) as usize,
        Some(KnobValue::Float(f)) => (*f as i64).max(0) as usize,
        Some(KnobValue::String(s)) | Some(KnobValue::Raw(s)) => match s.trim().parse::<i64>() {
            Ok(n) if n >= 0 => n as usize,
            Ok(_) => 0,
            Err(_) => 1,
        },
        Some(KnobValue::List(_)) => 1,
    }
}

// https://learn.foundry.com/nuke/developers/63/ndkdevguide/knobs-and-handles/knobtypes.html#knobs-knobtypes-text-knob
const SUPPORTED_USER_KNOB_TYPES: [u32; 8] = [1, 2, 3, 4, 6, 7, 8, 26];

static USER_KNOB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"\{\s*(?P<type>\d+)\s+(?P<name>[\w_]+)"#,
        r#"(?:\s+l\s+(?P<label>"(?:[^"]+)"|[\w_:;]+))?"#,
        r#"(?:\s+t\s+"(?P<tooltip>[^"]+)")?"#,
        r#"(?:\s+\+DISABLED)?"#,
        r#"(?:\s+\+INVISIBLE)?"#,
        r#"(?:\s+-STARTLINE)?"#,
        r#"(?:\s+M\s+\{\s*(?P<enum_items>[^}]+)\s*\})?"#,
        r#"(?:\s+-STARTLINE)?"#,
        r#"(?:\s+\+INVISIBLE)?"#,
        r#"(?:\s+T\s+(?P<value>[\w_]+))?"#,
        r#"\s*\}"#,
    ))
    .expect("user knob pattern is a fixed, valid regex")
});

/// Parses an `addUserKnob { ... }` block and, if it matches and its type is supported, installs
/// the decoded value into `knobs`. Non-matching blocks and unsupported types are silently
/// skipped.
pub fn parse_user_knob(knobs: &mut HashMap<String, KnobValue>, block: &str) {
    let Some(captures) = USER_KNOB_RE.captures(block) else {
        return;
    };
    let Some(knob_type) = captures
        .name("type")
        .and_then(|m| m.as_str().parse::<u32>().ok())
    else {
        return;
    };
    if !SUPPORTED_USER_KNOB_TYPES.contains(&knob_type) {
        return;
    }
    let Some(name) = captures.name("name").map(|m| m.as_str().to_string()) else {
        return;
    };

    let value = match knob_type {
        1 | 2 | 26 => KnobValue::String(
            captures
                .name("value")
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
        ),
        3 | 6 => KnobValue::Int(
            captures
                .name("value")
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0),
        ),
        4 => {
            let items = captures.name("enum_items").map(|m| m.as_str()).unwrap_or("");
            KnobValue::String(items.split_whitespace().next().unwrap_or("").to_string())
        }
        7 | 8 => KnobValue::Float(
            captures
                .name("value")
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0.0),
        ),
        _ => return,
    };
    knobs.insert(name, value);
}
