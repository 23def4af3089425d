//! Validate build scripts and convert them to build expressions

use super::CliError;
use crate::{BuildExpression, Script, parse};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Build script text
    pub source: String,
    /// Only validate syntax, don't transform
    pub syntax_only: bool,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Script transformed to its build expression
    Success(BuildExpression),
}

/// Execute a check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let tree = parse(&options.source)?;
    if options.syntax_only {
        return Ok(CheckResult::SyntaxValid);
    }

    let script = Script::from_tree(&tree)?;
    let expression = script.to_build_expression()?;
    Ok(CheckResult::Success(expression))
}
