//! Merge two build expressions, falling back to a conflict-marker diff

use std::str::FromStr;

use tracing::warn;

use super::CliError;
use crate::{
    BuildExpression, MergeError, MergeStrategies, Script, diff, merge,
};

/// Options for the merge command
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Local build expression JSON
    pub local: String,
    /// Remote build expression JSON
    pub remote: String,
    /// Merge strategies JSON
    pub strategies: String,
}

/// Result of a merge operation
#[derive(Debug)]
pub enum MergeOutcome {
    /// The resolutions applied cleanly
    Merged(BuildExpression),
    /// Manual resolution needed; `diff` holds the conflict-marked script
    Conflicted { reason: MergeError, diff: String },
}

/// Execute a merge operation
pub fn execute_merge(options: &MergeOptions) -> Result<MergeOutcome, CliError> {
    let local = BuildExpression::from_str(&options.local)?;
    let remote = BuildExpression::from_str(&options.remote)?;
    let strategies: MergeStrategies = serde_json::from_str(&options.strategies)?;

    match merge(&local, &remote, &strategies.resolutions, strategies.has_conflicts) {
        Ok(merged) => Ok(MergeOutcome::Merged(merged)),
        Err(reason) if reason.needs_manual_resolution() => {
            warn!(%reason, "falling back to manual resolution");
            let local = Script::from_build_expression(&local)?;
            let remote = Script::from_build_expression(&remote)?;
            Ok(MergeOutcome::Conflicted {
                reason,
                diff: diff(&local, &remote),
            })
        }
        Err(e) => Err(e.into()),
    }
}
