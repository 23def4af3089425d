//! Add, remove or update a requirement in a build script

use std::str::FromStr;

use super::CliError;
use crate::{Operation, Requirement, parse_script, to_text};

/// Options for the add/remove/update commands
#[derive(Debug, Clone)]
pub struct EditOptions {
    /// Build script text
    pub source: String,
    pub operation: Operation,
    /// `namespace/name[@constraints]`
    pub requirement: String,
}

/// Applies the edit and returns the rewritten script text. Comments and the
/// position of the `at_time` binding are kept.
pub fn execute_edit(options: &EditOptions) -> Result<String, CliError> {
    let requirement = Requirement::from_str(&options.requirement)?;
    let mut script = parse_script(&options.source)?;
    script.update_requirement(options.operation, &requirement)?;
    Ok(to_text(&script))
}
