//! Script text <-> build expression JSON conversion

use std::str::FromStr;

use super::CliError;
use crate::{BuildExpression, Script, parse_script, to_text};

/// Convert build script text to build expression JSON
pub fn script_to_json(source: &str, pretty: bool) -> Result<String, CliError> {
    let expression = parse_script(source)?.to_build_expression()?;
    let json = if pretty {
        expression.to_json_pretty()?
    } else {
        expression.to_json_string()?
    };
    Ok(json)
}

/// Convert build expression JSON to build script text
pub fn json_to_script(json: &str) -> Result<String, CliError> {
    let expression = BuildExpression::from_str(json)?;
    let script = Script::from_build_expression(&expression)?;
    Ok(to_text(&script))
}
