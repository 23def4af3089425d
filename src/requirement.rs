//! Requirements of the active solve call.
//!
//! A requirement lives in the `requirements` argument of the solve node the
//! build expression's `in` value resolves to:
//!
//! ```text
//! {"name": "DateTime", "namespace": "language/perl",
//!  "version_requirements": [{"comparator": "gte", "version": "1.50"}]}
//! ```
//!
//! Entries may also carry their constraints as a function value under
//! `version`, e.g. `And(left = Gte(value = "1.50"), right = Lt(value = "2"))`.
//! Updates always write the `version_requirements` form.

use std::{fmt, str::FromStr, sync::LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json, json};
use thiserror::Error;
use tracing::debug;

use crate::{
    ast::{InExpr, Script},
    expression::{BuildExpression, IN_KEY, LET_KEY, json_type_name, pointer_segment},
    transform::{AT_TIME, TransformError, decode, format_timestamp},
    value::{Assignment, FuncCall, Value, is_solve_function},
};

pub const REQUIREMENTS_KEY: &str = "requirements";
const VERSION_REQUIREMENTS_KEY: &str = "version_requirements";
const VERSION_KEY: &str = "version";

#[derive(Debug, Error)]
pub enum RequirementError {
    #[error("build expression has no solve node reachable from 'in'")]
    SolveNotFound,

    #[error("solve node at {path} has no requirements")]
    RequirementsNotFound { path: String },

    #[error("requirements at {path} must be a list, found {found}")]
    NotAList { path: String, found: &'static str },

    #[error("malformed requirement at index {index}: {reason}")]
    Malformed { index: usize, reason: String },

    #[error("requirement '{name}' in namespace '{namespace}' not found")]
    NotFound { name: String, namespace: String },

    #[error("unknown version comparator '{0}'")]
    UnknownComparator(String),

    #[error("invalid requirement '{spec}': {reason}")]
    InvalidSpec { spec: String, reason: String },

    #[error(transparent)]
    Transform(#[from] TransformError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparator {
    pub const ALL: [Comparator; 6] = [
        Comparator::Eq,
        Comparator::Ne,
        Comparator::Gt,
        Comparator::Gte,
        Comparator::Lt,
        Comparator::Lte,
    ];

    /// Wire name, e.g. `gte`
    pub fn as_str(self) -> &'static str {
        match self {
            Comparator::Eq => "eq",
            Comparator::Ne => "ne",
            Comparator::Gt => "gt",
            Comparator::Gte => "gte",
            Comparator::Lt => "lt",
            Comparator::Lte => "lte",
        }
    }

    /// Name of the builder function, e.g. `Gte`
    pub fn function_name(self) -> &'static str {
        match self {
            Comparator::Eq => "Eq",
            Comparator::Ne => "Ne",
            Comparator::Gt => "Gt",
            Comparator::Gte => "Gte",
            Comparator::Lt => "Lt",
            Comparator::Lte => "Lte",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Comparator::Eq => "==",
            Comparator::Ne => "!=",
            Comparator::Gt => ">",
            Comparator::Gte => ">=",
            Comparator::Lt => "<",
            Comparator::Lte => "<=",
        }
    }

    fn from_symbol(symbol: &str) -> Option<Comparator> {
        match symbol {
            "" | "=" | "==" => Some(Comparator::Eq),
            _ => Self::ALL.into_iter().find(|c| c.symbol() == symbol),
        }
    }

    fn from_function_name(name: &str) -> Option<Comparator> {
        Self::ALL.into_iter().find(|c| c.function_name() == name)
    }
}

impl FromStr for Comparator {
    type Err = RequirementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| RequirementError::UnknownComparator(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionConstraint {
    pub comparator: Comparator,
    pub version: String,
}

impl VersionConstraint {
    pub fn new(comparator: Comparator, version: impl Into<String>) -> Self {
        VersionConstraint {
            comparator,
            version: version.into(),
        }
    }

    fn to_json(&self) -> Json {
        json!({ "comparator": self.comparator.as_str(), "version": self.version })
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.comparator.symbol(), self.version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: String,
    pub namespace: String,
    pub version_constraints: Vec<VersionConstraint>,
}

impl Requirement {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Requirement {
            name: name.into(),
            namespace: namespace.into(),
            version_constraints: Vec::new(),
        }
    }

    pub fn with_constraints(mut self, constraints: Vec<VersionConstraint>) -> Self {
        self.version_constraints = constraints;
        self
    }

    fn matches(&self, entry: &Json) -> bool {
        entry.get("name").and_then(Json::as_str) == Some(self.name.as_str())
            && entry.get("namespace").and_then(Json::as_str) == Some(self.namespace.as_str())
    }

    fn matches_value(&self, entry: &Value) -> bool {
        let Value::Object(entries) = entry else {
            return false;
        };
        let field = |key: &str| {
            entries
                .iter()
                .find(|e| e.key == key)
                .and_then(|e| e.value.as_str())
        };
        field("name") == Some(self.name.as_str())
            && field("namespace") == Some(self.namespace.as_str())
    }

    fn to_value(&self) -> Value {
        let mut entries = vec![
            Assignment::new("name", Value::String(self.name.clone())),
            Assignment::new("namespace", Value::String(self.namespace.clone())),
        ];
        if !self.version_constraints.is_empty() {
            entries.push(Assignment::new(
                VERSION_REQUIREMENTS_KEY,
                constraints_list(&self.version_constraints),
            ));
        }
        Value::Object(entries)
    }

    fn to_json(&self) -> Json {
        let mut entry = Map::new();
        entry.insert("name".to_string(), Json::String(self.name.clone()));
        entry.insert("namespace".to_string(), Json::String(self.namespace.clone()));
        if !self.version_constraints.is_empty() {
            entry.insert(
                VERSION_REQUIREMENTS_KEY.to_string(),
                constraints_to_json(&self.version_constraints),
            );
        }
        Json::Object(entry)
    }

    fn from_json(entry: &Json, index: usize, path: &str) -> Result<Requirement, RequirementError> {
        let malformed = |reason: String| RequirementError::Malformed { index, reason };

        let Json::Object(object) = entry else {
            return Err(malformed(format!("expected object, found {}", json_type_name(entry))));
        };
        let field = |key: &str| -> Result<String, RequirementError> {
            match object.get(key) {
                Some(Json::String(s)) => Ok(s.clone()),
                Some(other) => Err(malformed(format!(
                    "'{key}' must be a string, found {}",
                    json_type_name(other)
                ))),
                None => Err(malformed(format!("missing '{key}'"))),
            }
        };

        let name = field("name")?;
        let namespace = field("namespace")?;

        let version_constraints = match (
            object.get(VERSION_REQUIREMENTS_KEY),
            object.get(VERSION_KEY),
        ) {
            (Some(Json::Array(items)), _) => items
                .iter()
                .map(|item| constraint_from_json(item).map_err(malformed))
                .collect::<Result<Vec<_>, _>>()?,
            (Some(Json::Null) | None, Some(version)) if !version.is_null() => {
                let value = decode(version, &format!("{path}/{index}/{VERSION_KEY}"))?;
                constraints_from_value(&value).map_err(malformed)?
            }
            (Some(Json::Null) | None, _) => Vec::new(),
            (Some(other), _) => {
                return Err(malformed(format!(
                    "'{VERSION_REQUIREMENTS_KEY}' must be a list, found {}",
                    json_type_name(other)
                )));
            }
        };

        Ok(Requirement {
            name,
            namespace,
            version_constraints,
        })
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)?;
        if !self.version_constraints.is_empty() {
            let constraints: Vec<String> =
                self.version_constraints.iter().map(ToString::to_string).collect();
            write!(f, "@{}", constraints.join(","))?;
        }
        Ok(())
    }
}

static SPEC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<namespace>[^@\s]+)/(?P<name>[^/@\s]+)(?:@(?P<versions>.+))?$")
        .expect("requirement spec pattern is valid")
});

static CONSTRAINT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<op>>=|<=|!=|==|>|<|=)?\s*(?P<version>[^\s,<>=!]+)$")
        .expect("constraint pattern is valid")
});

/// Parses `namespace/name[@<op><version>[,<op><version>]...]`.
///
/// ```
/// use buildscript::requirement::{Comparator, Requirement};
///
/// let req: Requirement = "language/perl/DateTime@>=1.50,<2".parse().unwrap();
/// assert_eq!(req.namespace, "language/perl");
/// assert_eq!(req.name, "DateTime");
/// assert_eq!(req.version_constraints[0].comparator, Comparator::Gte);
/// ```
impl FromStr for Requirement {
    type Err = RequirementError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| RequirementError::InvalidSpec {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };
        let captures = SPEC_PATTERN
            .captures(spec.trim())
            .ok_or_else(|| invalid("expected namespace/name[@constraints]"))?;

        let mut requirement = Requirement::new(&captures["namespace"], &captures["name"]);
        if let Some(versions) = captures.name("versions") {
            for piece in versions.as_str().split(',') {
                let constraint = CONSTRAINT_PATTERN
                    .captures(piece.trim())
                    .ok_or_else(|| invalid("malformed version constraint"))?;
                let op = constraint.name("op").map_or("", |m| m.as_str());
                let comparator =
                    Comparator::from_symbol(op).ok_or_else(|| invalid("unknown comparator"))?;
                requirement
                    .version_constraints
                    .push(VersionConstraint::new(comparator, &constraint["version"]));
            }
        }
        Ok(requirement)
    }
}

fn constraints_to_json(constraints: &[VersionConstraint]) -> Json {
    Json::Array(constraints.iter().map(VersionConstraint::to_json).collect())
}

fn constraint_from_json(item: &Json) -> Result<VersionConstraint, String> {
    let comparator = item
        .get("comparator")
        .and_then(Json::as_str)
        .ok_or("version requirement is missing 'comparator'")?;
    let version = item
        .get(VERSION_KEY)
        .and_then(Json::as_str)
        .ok_or("version requirement is missing 'version'")?;
    let comparator = Comparator::from_str(comparator).map_err(|e| e.to_string())?;
    Ok(VersionConstraint::new(comparator, version))
}

fn constraints_list(constraints: &[VersionConstraint]) -> Value {
    Value::List(
        constraints
            .iter()
            .map(|c| {
                Value::Object(vec![
                    Assignment::new(
                        "comparator",
                        Value::String(c.comparator.as_str().to_string()),
                    ),
                    Assignment::new(VERSION_KEY, Value::String(c.version.clone())),
                ])
            })
            .collect(),
    )
}

/// Flattens a constraint function value into an ordered list.
pub fn constraints_from_value(value: &Value) -> Result<Vec<VersionConstraint>, String> {
    let Value::FuncCall(call) = value else {
        return Err(format!(
            "version must be a constraint function, found {}",
            value.type_name()
        ));
    };
    if call.name == "And" {
        let side = |key: &str| {
            call.argument(key)
                .ok_or_else(|| format!("And is missing '{key}'"))
                .and_then(constraints_from_value)
        };
        let mut constraints = side("left")?;
        constraints.extend(side("right")?);
        return Ok(constraints);
    }
    let comparator = Comparator::from_function_name(&call.name)
        .ok_or_else(|| format!("'{}' is not a version constraint", call.name))?;
    let version = call
        .argument("value")
        .and_then(Value::as_str)
        .ok_or_else(|| format!("{} needs a string 'value'", call.name))?;
    Ok(vec![VersionConstraint::new(comparator, version)])
}

// ============================================================================
// Locating the active solve node
// ============================================================================

/// JSON pointer of the argument object of the solve call reachable from `in`.
fn locate_solve(document: &Json) -> Result<String, RequirementError> {
    let mut resolving = Vec::new();
    let entry = document.get(IN_KEY).ok_or(RequirementError::SolveNotFound)?;
    search_solve(document, entry, format!("/{IN_KEY}"), &mut resolving)
        .ok_or(RequirementError::SolveNotFound)
}

fn search_solve(
    document: &Json,
    value: &Json,
    pointer: String,
    resolving: &mut Vec<String>,
) -> Option<String> {
    match value {
        Json::String(s) => {
            let name = s.strip_prefix('$')?;
            if resolving.iter().any(|n| n == name) {
                return None;
            }
            let bound = document.get(LET_KEY)?.get(name)?;
            resolving.push(name.to_string());
            let found = search_solve(
                document,
                bound,
                format!("/{LET_KEY}/{}", pointer_segment(name)),
                resolving,
            );
            resolving.pop();
            found
        }
        Json::Object(object) => {
            if object.len() == 1
                && let Some((name, Json::Object(_))) = object.iter().next()
                && is_solve_function(name)
            {
                return Some(format!("{pointer}/{}", pointer_segment(name)));
            }
            object.iter().find_map(|(key, child)| {
                search_solve(
                    document,
                    child,
                    format!("{pointer}/{}", pointer_segment(key)),
                    resolving,
                )
            })
        }
        Json::Array(items) => items
            .iter()
            .enumerate()
            .find_map(|(i, item)| search_solve(document, item, format!("{pointer}/{i}"), resolving)),
        _ => None,
    }
}

fn requirements_list<'a>(
    document: &'a Json,
    solve_pointer: &str,
) -> Result<&'a Vec<Json>, RequirementError> {
    let path = format!("{solve_pointer}/{REQUIREMENTS_KEY}");
    match document.pointer(&path) {
        Some(Json::Array(items)) => Ok(items),
        Some(other) => Err(RequirementError::NotAList {
            path,
            found: json_type_name(other),
        }),
        None => Err(RequirementError::RequirementsNotFound {
            path: solve_pointer.to_string(),
        }),
    }
}

/// Which change to make to the requirement list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Remove,
    Update,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Add => "add",
            Operation::Remove => "remove",
            Operation::Update => "update",
        })
    }
}

impl BuildExpression {
    /// Requirements of the active solve call, in list order.
    pub fn requirements(&self) -> Result<Vec<Requirement>, RequirementError> {
        let solve = locate_solve(self.as_value())?;
        let path = format!("{solve}/{REQUIREMENTS_KEY}");
        requirements_list(self.as_value(), &solve)?
            .iter()
            .enumerate()
            .map(|(index, entry)| Requirement::from_json(entry, index, &path))
            .collect()
    }

    /// Applies `operation` to the requirement list and stamps the solve
    /// call's `at_time` with the current instant.
    pub fn update_requirement(
        &mut self,
        operation: Operation,
        requirement: &Requirement,
    ) -> Result<(), RequirementError> {
        self.update_requirement_at(operation, requirement, Utc::now())
    }

    /// Like [`BuildExpression::update_requirement`] with an explicit timestamp.
    pub fn update_requirement_at(
        &mut self,
        operation: Operation,
        requirement: &Requirement,
        now: DateTime<Utc>,
    ) -> Result<(), RequirementError> {
        let solve = locate_solve(self.as_value())?;
        // Validates the list shape before taking the mutable borrow
        requirements_list(self.as_value(), &solve)?;

        let document = self.document_mut();
        let Some(Json::Array(list)) = document.pointer_mut(&format!("{solve}/{REQUIREMENTS_KEY}"))
        else {
            return Err(RequirementError::RequirementsNotFound { path: solve });
        };

        let not_found = || RequirementError::NotFound {
            name: requirement.name.clone(),
            namespace: requirement.namespace.clone(),
        };
        match operation {
            Operation::Add => list.push(requirement.to_json()),
            Operation::Remove => {
                let index = list
                    .iter()
                    .position(|entry| requirement.matches(entry))
                    .ok_or_else(not_found)?;
                list.remove(index);
            }
            Operation::Update => {
                let entry = list
                    .iter_mut()
                    .find(|entry| requirement.matches(entry))
                    .and_then(Json::as_object_mut)
                    .ok_or_else(not_found)?;
                entry.remove(VERSION_KEY);
                if requirement.version_constraints.is_empty() {
                    entry.remove(VERSION_REQUIREMENTS_KEY);
                } else {
                    entry.insert(
                        VERSION_REQUIREMENTS_KEY.to_string(),
                        constraints_to_json(&requirement.version_constraints),
                    );
                }
            }
        }

        // A solve that refers to the `at_time` binding keeps doing so
        let stamp = Json::String(format_timestamp(&now));
        let binding = match document.pointer(&format!("{solve}/{AT_TIME}")) {
            Some(Json::String(s)) => s
                .strip_prefix('$')
                .filter(|name| document.get(LET_KEY).and_then(|l| l.get(*name)).is_some())
                .map(|name| format!("/{LET_KEY}/{}", pointer_segment(name))),
            _ => None,
        };
        let bound = match &binding {
            Some(pointer) => document.pointer_mut(pointer),
            None => None,
        };
        match bound {
            Some(bound) => *bound = stamp,
            None => {
                if let Some(Json::Object(arguments)) = document.pointer_mut(&solve) {
                    arguments.insert(AT_TIME.to_string(), stamp);
                }
            }
        }
        debug!(
            ?operation,
            requirement = %requirement,
            solve = %solve,
            "updated requirements"
        );
        Ok(())
    }
}

// ============================================================================
// Editing a Script in place
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Step {
    /// Function argument or object entry
    Field(usize),
    Element(usize),
}

/// Route from a binding, or from the `in` call, down to a solve call.
#[derive(Debug, Default)]
struct SolvePath {
    binding: Option<usize>,
    steps: Vec<Step>,
}

impl SolvePath {
    fn within(mut self, step: Step) -> Self {
        // Once anchored at a binding the outer steps no longer apply
        if self.binding.is_none() {
            self.steps.insert(0, step);
        }
        self
    }
}

fn find_solve(script: &Script, value: &Value, resolving: &mut Vec<String>) -> Option<SolvePath> {
    match value {
        Value::FuncCall(call) => find_solve_in_call(script, call, resolving),
        Value::Identifier(name) => {
            if resolving.contains(name) {
                return None;
            }
            let index = script.assignments.iter().position(|a| &a.key == name)?;
            resolving.push(name.clone());
            let found = find_solve(script, &script.assignments[index].value, resolving);
            resolving.pop();
            found.map(|mut path| {
                path.binding.get_or_insert(index);
                path
            })
        }
        Value::List(items) => items.iter().enumerate().find_map(|(i, item)| {
            find_solve(script, item, resolving).map(|path| path.within(Step::Element(i)))
        }),
        Value::Object(entries) => find_solve_in_fields(script, entries, resolving),
        _ => None,
    }
}

fn find_solve_in_call(
    script: &Script,
    call: &FuncCall,
    resolving: &mut Vec<String>,
) -> Option<SolvePath> {
    if is_solve_function(&call.name) {
        return Some(SolvePath::default());
    }
    find_solve_in_fields(script, &call.arguments, resolving)
}

fn find_solve_in_fields(
    script: &Script,
    fields: &[Assignment],
    resolving: &mut Vec<String>,
) -> Option<SolvePath> {
    fields.iter().enumerate().find_map(|(i, field)| {
        find_solve(script, &field.value, resolving).map(|path| path.within(Step::Field(i)))
    })
}

fn solve_mut<'a>(script: &'a mut Script, path: &SolvePath) -> Option<&'a mut FuncCall> {
    let mut steps = path.steps.iter();
    let mut value = match path.binding {
        Some(index) => &mut script.assignments.get_mut(index)?.value,
        None => {
            let InExpr::Call(call) = &mut script.in_expr else {
                return None;
            };
            match steps.next() {
                None => return Some(call),
                Some(Step::Field(i)) => &mut call.arguments.get_mut(*i)?.value,
                Some(Step::Element(_)) => return None,
            }
        }
    };
    for step in steps {
        value = match (value, step) {
            (
                Value::FuncCall(FuncCall {
                    arguments: fields, ..
                })
                | Value::Object(fields),
                Step::Field(i),
            ) => &mut fields.get_mut(*i)?.value,
            (Value::List(items), Step::Element(i)) => items.get_mut(*i)?,
            _ => return None,
        };
    }
    match value {
        Value::FuncCall(call) => Some(call),
        _ => None,
    }
}

impl Script {
    /// Requirements of the script's active solve call.
    pub fn requirements(&self) -> Result<Vec<Requirement>, RequirementError> {
        self.to_build_expression()?.requirements()
    }

    /// Applies `operation` to the active solve call's requirement list and
    /// moves the script's `at_time` to the current instant.
    ///
    /// The edit happens on the script itself, so comments and the order of
    /// bindings stay as they were.
    pub fn update_requirement(
        &mut self,
        operation: Operation,
        requirement: &Requirement,
    ) -> Result<(), RequirementError> {
        self.update_requirement_at(operation, requirement, Utc::now())
    }

    /// Like [`Script::update_requirement`] with an explicit timestamp.
    pub fn update_requirement_at(
        &mut self,
        operation: Operation,
        requirement: &Requirement,
        now: DateTime<Utc>,
    ) -> Result<(), RequirementError> {
        let mut resolving = Vec::new();
        let path = match &self.in_expr {
            InExpr::Reference(name) => {
                find_solve(self, &Value::Identifier(name.clone()), &mut resolving)
            }
            InExpr::Call(call) => find_solve_in_call(self, call, &mut resolving),
        }
        .ok_or(RequirementError::SolveNotFound)?;
        let solve = solve_mut(self, &path).ok_or(RequirementError::SolveNotFound)?;
        let solve_name = solve.name.clone();

        let list = match solve.argument_mut(REQUIREMENTS_KEY) {
            Some(Value::List(items)) => items,
            Some(other) => {
                return Err(RequirementError::NotAList {
                    path: format!("{solve_name}({REQUIREMENTS_KEY})"),
                    found: other.type_name(),
                });
            }
            None => return Err(RequirementError::RequirementsNotFound { path: solve_name }),
        };

        let not_found = || RequirementError::NotFound {
            name: requirement.name.clone(),
            namespace: requirement.namespace.clone(),
        };
        match operation {
            Operation::Add => list.push(requirement.to_value()),
            Operation::Remove => {
                let index = list
                    .iter()
                    .position(|entry| requirement.matches_value(entry))
                    .ok_or_else(not_found)?;
                list.remove(index);
            }
            Operation::Update => {
                let Some(Value::Object(entries)) =
                    list.iter_mut().find(|entry| requirement.matches_value(entry))
                else {
                    return Err(not_found());
                };
                entries.retain(|e| e.key != VERSION_KEY);
                let constraints = &requirement.version_constraints;
                if constraints.is_empty() {
                    entries.retain(|e| e.key != VERSION_REQUIREMENTS_KEY);
                } else if let Some(entry) =
                    entries.iter_mut().find(|e| e.key == VERSION_REQUIREMENTS_KEY)
                {
                    entry.value = constraints_list(constraints);
                } else {
                    entries.push(Assignment::new(
                        VERSION_REQUIREMENTS_KEY,
                        constraints_list(constraints),
                    ));
                }
            }
        }

        let reference = Value::Identifier(AT_TIME.to_string());
        match solve.argument_mut(AT_TIME) {
            Some(value) => *value = reference,
            None => solve.arguments.push(Assignment::new(AT_TIME, reference)),
        }
        self.at_time = Some(now);
        debug!(
            ?operation,
            requirement = %requirement,
            solve = %solve_name,
            "updated script requirements"
        );
        Ok(())
    }
}
