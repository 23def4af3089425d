//! CLI support for buildscript
//!
//! Provides programmatic access to the `buildscript` commands so other tools
//! can run them without spawning a process.

mod check;
mod convert;
mod edit;
mod merge;

pub use check::{CheckOptions, CheckResult, execute_check};
pub use convert::{json_to_script, script_to_json};
pub use edit::{EditOptions, execute_edit};
pub use merge::{MergeOptions, MergeOutcome, execute_merge};

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::{MergeError, ParseError, RequirementError, TransformError};

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Buildscript(#[from] crate::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No input provided. Pass a file or pipe a build expression to stdin.")]
    NoInput,
}

impl From<ParseError> for CliError {
    fn from(e: ParseError) -> Self {
        CliError::Buildscript(e.into())
    }
}

impl From<TransformError> for CliError {
    fn from(e: TransformError) -> Self {
        CliError::Buildscript(e.into())
    }
}

impl From<RequirementError> for CliError {
    fn from(e: RequirementError) -> Self {
        CliError::Buildscript(e.into())
    }
}

impl From<MergeError> for CliError {
    fn from(e: MergeError) -> Self {
        CliError::Buildscript(e.into())
    }
}

/// Reads a whole file; scripts are never streamed.
pub fn read_file(path: &std::path::Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}
