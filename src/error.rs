// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, stack-graphs authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can abort a scene parse.
///
/// Decode failures and multi-line truncation are *not* represented here: both are recovered
/// in-band (the cleaned string, or whatever was read before end of file, becomes the value) and
/// never surface to the caller.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("could not read scene file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("clone references unknown branch key {key:?}")]
    UnknownBranch { key: String },
}

pub type Result<T> = std::result::Result<T, ParseError>;
