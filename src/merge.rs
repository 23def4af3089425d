//! Merging a local and a remote build expression.
//!
//! This module never decides which side wins. The caller supplies the
//! resolutions (computed upstream against the common ancestor) and the
//! merge only checks that applying them is safe:
//!
//! 1. the two expressions must be equal once requirements and timestamps are
//!    removed, otherwise [`MergeError::AutoMergeNotPossible`];
//! 2. flagged conflicts stop the merge with [`MergeError::Conflicts`];
//! 3. resolutions are applied in order to a copy of `remote`; the first one
//!    that fails aborts the merge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    expression::BuildExpression,
    requirement::{Operation, REQUIREMENTS_KEY, Requirement, RequirementError, VersionConstraint},
    transform::AT_TIME,
};

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("cannot merge automatically: the build expressions differ in more than their requirements")]
    AutoMergeNotPossible,

    #[error("cannot merge automatically: the build expressions have unresolved conflicts")]
    Conflicts,

    #[error("failed to {operation} requirement '{name}' in namespace '{namespace}': {source}")]
    Resolution {
        operation: Operation,
        name: String,
        namespace: String,
        #[source]
        source: RequirementError,
    },
}

impl MergeError {
    /// True when the user has to reconcile the two sides by hand.
    pub fn needs_manual_resolution(&self) -> bool {
        matches!(self, MergeError::AutoMergeNotPossible | MergeError::Conflicts)
    }
}

/// One requirement change decided by the merge authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeResolution {
    pub namespace: String,
    #[serde(rename = "requirement")]
    pub requirement_name: String,
    pub operation: Operation,
    #[serde(default, rename = "version_requirements")]
    pub version_constraints: Vec<VersionConstraint>,
}

impl MergeResolution {
    pub fn new(operation: Operation, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        MergeResolution {
            namespace: namespace.into(),
            requirement_name: name.into(),
            operation,
            version_constraints: Vec::new(),
        }
    }

    pub fn requirement(&self) -> Requirement {
        Requirement::new(&self.namespace, &self.requirement_name)
            .with_constraints(self.version_constraints.clone())
    }
}

/// Payload of a merge strategies response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStrategies {
    #[serde(default)]
    pub has_conflicts: bool,
    #[serde(default)]
    pub resolutions: Vec<MergeResolution>,
}

fn strip_volatile_keys(value: &mut Json) {
    match value {
        Json::Object(object) => {
            object.remove(REQUIREMENTS_KEY);
            object.remove(AT_TIME);
            object.values_mut().for_each(strip_volatile_keys);
        }
        Json::Array(items) => items.iter_mut().for_each(strip_volatile_keys),
        _ => {}
    }
}

/// Whether `local` and `remote` differ only in their requirements.
pub fn is_auto_merge_possible(local: &BuildExpression, remote: &BuildExpression) -> bool {
    let mut local = local.as_value().clone();
    let mut remote = remote.as_value().clone();
    strip_volatile_keys(&mut local);
    strip_volatile_keys(&mut remote);
    local == remote
}

/// Merges `local` into `remote`, stamping updated solve calls with the
/// current time.
pub fn merge(
    local: &BuildExpression,
    remote: &BuildExpression,
    resolutions: &[MergeResolution],
    has_conflicts: bool,
) -> Result<BuildExpression, MergeError> {
    merge_at(local, remote, resolutions, has_conflicts, Utc::now())
}

pub fn merge_at(
    local: &BuildExpression,
    remote: &BuildExpression,
    resolutions: &[MergeResolution],
    has_conflicts: bool,
    now: DateTime<Utc>,
) -> Result<BuildExpression, MergeError> {
    if !is_auto_merge_possible(local, remote) {
        debug!("build expressions diverge outside requirements");
        return Err(MergeError::AutoMergeNotPossible);
    }
    if has_conflicts {
        debug!("merge authority reported conflicts");
        return Err(MergeError::Conflicts);
    }

    let mut merged = remote.clone();
    for resolution in resolutions {
        merged
            .update_requirement_at(resolution.operation, &resolution.requirement(), now)
            .map_err(|source| MergeError::Resolution {
                operation: resolution.operation,
                name: resolution.requirement_name.clone(),
                namespace: resolution.namespace.clone(),
                source,
            })?;
    }

    info!(resolutions = resolutions.len(), "merged build expressions");
    Ok(merged)
}
