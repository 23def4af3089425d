//! Conversions between the syntax tree, the [`Script`] model and the
//! [`BuildExpression`] wire format.
//!
//! Both directions go through [`Value`], so a function or argument the
//! planner adds later is carried through as an ordinary object or list.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value as Json};
use thiserror::Error;
use tracing::debug;

use crate::{
    ast::{InExpr, Node, NodeKind, Position, Script, Tree},
    expression::{BuildExpression, IN_KEY, LET_KEY, pointer_segment},
    value::{Assignment, FuncCall, Value, is_identifier, is_known_function, is_solve_function},
};

pub const AT_TIME: &str = "at_time";

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("invalid build expression JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("build expression is missing required key '{0}'")]
    MissingKey(&'static str),

    #[error("expected {expected} at {path}, found {found}")]
    UnexpectedShape {
        path: String,
        expected: &'static str,
        found: String,
    },

    #[error("invalid number '{literal}' at {position}")]
    InvalidNumber { literal: String, position: Position },

    #[error("number {0} cannot be represented in JSON")]
    UnrepresentableNumber(Decimal),

    #[error("invalid at_time '{value}': {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("string \"{0}\" would be read back as a reference")]
    AmbiguousString(String),

    #[error("object with the single key '{0}' would be read back as a function call")]
    AmbiguousObject(String),

    #[error("malformed syntax tree at {position}: {message}")]
    MalformedTree { position: Position, message: String },
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, TransformError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|source| TransformError::InvalidTimestamp {
            value: value.to_string(),
            source,
        })
}

pub fn format_timestamp(at_time: &DateTime<Utc>) -> String {
    at_time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

// ============================================================================
// Syntax tree -> Script
// ============================================================================

fn malformed(node: &Node, message: impl Into<String>) -> TransformError {
    TransformError::MalformedTree {
        position: node.position,
        message: message.into(),
    }
}

fn literal(node: &Node) -> &str {
    node.literal.as_deref().unwrap_or_default()
}

fn child_of_kind<'a>(tree: &'a Tree, node: &'a Node, kind: NodeKind) -> Option<&'a Node> {
    tree.children(node).find(|child| child.kind == kind)
}

fn is_value_kind(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::FuncCall
            | NodeKind::List
            | NodeKind::Object
            | NodeKind::String
            | NodeKind::Number
            | NodeKind::Bool
            | NodeKind::Null
            | NodeKind::Identifier
    )
}

fn assignment_from_node(tree: &Tree, node: &Node) -> Result<Assignment, TransformError> {
    let mut children = tree.children(node);
    let mut comments = Vec::new();
    let mut key = None;
    for child in children.by_ref() {
        match child.kind {
            NodeKind::Comment => comments.push(literal(child).to_string()),
            NodeKind::Identifier | NodeKind::String => {
                key = Some(literal(child).to_string());
                break;
            }
            _ => return Err(malformed(child, "expected assignment name")),
        }
    }
    let key = key.ok_or_else(|| malformed(node, "assignment without a name"))?;

    // Skip '=' and take the value node
    let value_node = children
        .find(|child| is_value_kind(child.kind))
        .ok_or_else(|| malformed(node, format!("assignment '{key}' has no value")))?;

    Ok(Assignment {
        key,
        value: value_from_node(tree, value_node)?,
        comments,
    })
}

fn func_call_from_node(tree: &Tree, node: &Node) -> Result<FuncCall, TransformError> {
    let name = child_of_kind(tree, node, NodeKind::FuncName)
        .ok_or_else(|| malformed(node, "function call without a name"))?;
    let arguments = tree
        .children(node)
        .filter(|child| child.kind == NodeKind::Argument)
        .map(|arg| assignment_from_node(tree, arg))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FuncCall {
        name: literal(name).to_string(),
        arguments,
    })
}

fn value_from_node(tree: &Tree, node: &Node) -> Result<Value, TransformError> {
    match node.kind {
        NodeKind::FuncCall => Ok(Value::FuncCall(func_call_from_node(tree, node)?)),
        NodeKind::List => tree
            .children(node)
            .filter(|child| child.kind == NodeKind::ListElement)
            .map(|element| {
                let inner = tree
                    .children(element)
                    .find(|child| is_value_kind(child.kind))
                    .ok_or_else(|| malformed(element, "empty list element"))?;
                value_from_node(tree, inner)
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        NodeKind::Object => tree
            .children(node)
            .filter(|child| child.kind == NodeKind::Assignment)
            .map(|entry| assignment_from_node(tree, entry))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Object),
        NodeKind::String => Ok(Value::String(literal(node).to_string())),
        NodeKind::Number => Decimal::from_str(literal(node))
            .map(Value::Number)
            .map_err(|_| TransformError::InvalidNumber {
                literal: literal(node).to_string(),
                position: node.position,
            }),
        NodeKind::Bool => Ok(Value::Bool(literal(node) == "true")),
        NodeKind::Null => Ok(Value::Null),
        NodeKind::Identifier => Ok(Value::Identifier(literal(node).to_string())),
        kind => Err(malformed(node, format!("{kind:?} is not a value"))),
    }
}

impl Script {
    /// Builds the typed document from a parsed syntax tree.
    pub fn from_tree(tree: &Tree) -> Result<Script, TransformError> {
        let file = tree.root();
        let let_node = child_of_kind(tree, file, NodeKind::Let)
            .ok_or_else(|| malformed(file, "missing let section"))?;
        let in_node = child_of_kind(tree, file, NodeKind::In)
            .ok_or_else(|| malformed(file, "missing in section"))?;

        let assignments = tree
            .children(let_node)
            .filter(|child| child.kind == NodeKind::Binding)
            .map(|binding| assignment_from_node(tree, binding))
            .collect::<Result<Vec<_>, _>>()?;

        let in_expr = if let Some(call) = child_of_kind(tree, in_node, NodeKind::FuncCall) {
            InExpr::Call(func_call_from_node(tree, call)?)
        } else if let Some(ident) = child_of_kind(tree, in_node, NodeKind::Identifier) {
            InExpr::Reference(literal(ident).to_string())
        } else {
            return Err(malformed(in_node, "in section has no expression"));
        };

        normalize(assignments, in_expr)
    }
}

// ============================================================================
// at_time handling
// ============================================================================

/// Lifts the `at_time` binding into the typed field and records where it sat.
/// Without a binding, literal solve timestamps are lifted instead, leaving an
/// `at_time` reference in each solve call they came from.
fn normalize(assignments: Vec<Assignment>, mut in_expr: InExpr) -> Result<Script, TransformError> {
    let mut at_time = None;
    let mut at_time_binding = None;
    let mut bindings = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        if assignment.key == AT_TIME {
            let Value::String(raw) = &assignment.value else {
                return Err(TransformError::UnexpectedShape {
                    path: format!("/{LET_KEY}/{AT_TIME}"),
                    expected: "timestamp string",
                    found: assignment.value.type_name().to_string(),
                });
            };
            at_time = Some(parse_timestamp(raw)?);
            at_time_binding = Some(bindings.len());
        } else {
            bindings.push(assignment);
        }
    }

    // With a declared binding, solve literals stay literals
    if at_time_binding.is_none() {
        for binding in &mut bindings {
            lift_solve_at_time(&mut binding.value, &mut at_time)?;
        }
        if let InExpr::Call(call) = &mut in_expr {
            lift_call_at_time(call, &mut at_time)?;
        }
    }

    Ok(Script {
        at_time,
        at_time_binding,
        assignments: bindings,
        in_expr,
    })
}

fn lift_solve_at_time(
    value: &mut Value,
    at_time: &mut Option<DateTime<Utc>>,
) -> Result<(), TransformError> {
    match value {
        Value::FuncCall(call) => lift_call_at_time(call, at_time),
        Value::List(items) => items
            .iter_mut()
            .try_for_each(|item| lift_solve_at_time(item, at_time)),
        Value::Object(entries) => entries
            .iter_mut()
            .try_for_each(|entry| lift_solve_at_time(&mut entry.value, at_time)),
        _ => Ok(()),
    }
}

fn lift_call_at_time(
    call: &mut FuncCall,
    at_time: &mut Option<DateTime<Utc>>,
) -> Result<(), TransformError> {
    if is_solve_function(&call.name) {
        if let Some(arg) = call.argument_mut(AT_TIME) {
            if let Value::String(raw) = &*arg {
                let parsed = parse_timestamp(raw)?;
                match *at_time {
                    None => *at_time = Some(parsed),
                    Some(existing) if existing == parsed => {}
                    // A second, different timestamp stays a literal
                    Some(_) => return Ok(()),
                }
                *arg = Value::Identifier(AT_TIME.to_string());
                return Ok(());
            }
        }
    }
    call.arguments
        .iter_mut()
        .try_for_each(|arg| lift_solve_at_time(&mut arg.value, at_time))
}

// ============================================================================
// Script -> BuildExpression
// ============================================================================

/// Writes [`Value`]s as JSON. With `inline_at_time` set, solve calls get the
/// timestamp literal in place of their `at_time` reference.
struct Encoder<'a> {
    inline_at_time: Option<&'a DateTime<Utc>>,
}

impl Encoder<'_> {
    fn encode(&self, value: &Value, in_solve_at_time: bool) -> Result<Json, TransformError> {
        Ok(match value {
            Value::FuncCall(call) => {
                let mut arguments = Map::new();
                for arg in &call.arguments {
                    let substitute = is_solve_function(&call.name) && arg.key == AT_TIME;
                    arguments.insert(arg.key.clone(), self.encode(&arg.value, substitute)?);
                }
                let mut object = Map::new();
                object.insert(call.name.clone(), Json::Object(arguments));
                Json::Object(object)
            }
            Value::List(items) => Json::Array(
                items
                    .iter()
                    .map(|item| self.encode(item, false))
                    .collect::<Result<_, _>>()?,
            ),
            Value::String(s) => {
                if s.strip_prefix('$').is_some_and(is_identifier) {
                    return Err(TransformError::AmbiguousString(s.clone()));
                }
                Json::String(s.clone())
            }
            Value::Number(n) => Json::Number(
                Number::from_str(&n.to_string())
                    .map_err(|_| TransformError::UnrepresentableNumber(*n))?,
            ),
            Value::Bool(b) => Json::Bool(*b),
            Value::Identifier(name) => match self.inline_at_time {
                Some(at_time) if in_solve_at_time && name == AT_TIME => {
                    Json::String(format_timestamp(at_time))
                }
                _ => Json::String(format!("${name}")),
            },
            Value::Null => Json::Null,
            Value::Object(entries) => {
                let mut object = Map::new();
                for entry in entries {
                    object.insert(entry.key.clone(), self.encode(&entry.value, false)?);
                }
                if let Some((name, _)) = single_function(&object) {
                    return Err(TransformError::AmbiguousObject(name.clone()));
                }
                Json::Object(object)
            }
        })
    }
}

impl Script {
    /// Serializes the script to its wire form. Bindings and object keys keep
    /// their order, so equal scripts always produce identical JSON.
    ///
    /// A declared `at_time` binding is written back at its position and solve
    /// calls keep referring to it; otherwise the timestamp goes inline.
    pub fn to_build_expression(&self) -> Result<BuildExpression, TransformError> {
        let placement = self.at_time_placement();
        let encoder = Encoder {
            inline_at_time: self.at_time.as_ref().filter(|_| placement.is_none()),
        };

        let mut bindings = self
            .assignments
            .iter()
            .map(|a| Ok((a.key.clone(), encoder.encode(&a.value, false)?)))
            .collect::<Result<Vec<_>, TransformError>>()?;
        let in_value = encoder.encode(&self.in_expr.to_value(), false)?;

        if let (Some(index), Some(at_time)) = (placement, &self.at_time) {
            bindings.insert(
                index,
                (AT_TIME.to_string(), Json::String(format_timestamp(at_time))),
            );
        }

        let mut document = Map::new();
        document.insert(LET_KEY.to_string(), Json::Object(bindings.into_iter().collect()));
        document.insert(IN_KEY.to_string(), in_value);
        debug!(bindings = self.assignments.len(), "encoded build expression");
        BuildExpression::from_value(Json::Object(document))
    }

    /// Reads a script back from its wire form.
    pub fn from_build_expression(expr: &BuildExpression) -> Result<Script, TransformError> {
        let bindings = expr.bindings().ok_or(TransformError::MissingKey(LET_KEY))?;
        let assignments = bindings
            .iter()
            .map(|(key, value)| {
                let path = format!("/{LET_KEY}/{}", pointer_segment(key));
                Ok(Assignment::new(key.clone(), decode(value, &path)?))
            })
            .collect::<Result<Vec<_>, TransformError>>()?;

        let in_path = format!("/{IN_KEY}");
        let in_expr = match decode(expr.in_value(), &in_path)? {
            Value::Identifier(name) => InExpr::Reference(name),
            Value::FuncCall(call) => InExpr::Call(call),
            other => {
                return Err(TransformError::UnexpectedShape {
                    path: in_path,
                    expected: "reference or function call",
                    found: other.type_name().to_string(),
                });
            }
        };

        debug!(bindings = assignments.len(), "decoded build expression");
        normalize(assignments, in_expr)
    }
}

// ============================================================================
// BuildExpression -> Value
// ============================================================================

fn decode_entries(object: &Map<String, Json>, path: &str) -> Result<Vec<Assignment>, TransformError> {
    object
        .iter()
        .map(|(key, value)| {
            let path = format!("{path}/{}", pointer_segment(key));
            Ok(Assignment::new(key.clone(), decode(value, &path)?))
        })
        .collect()
}

pub(crate) fn decode(json: &Json, path: &str) -> Result<Value, TransformError> {
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => {
            let text = n.to_string();
            let number = Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .map_err(|_| TransformError::UnexpectedShape {
                    path: path.to_string(),
                    expected: "decimal number",
                    found: text.clone(),
                })?;
            Value::Number(number)
        }
        Json::String(s) => match s.strip_prefix('$') {
            Some(name) if is_identifier(name) => Value::Identifier(name.to_string()),
            _ => Value::String(s.clone()),
        },
        Json::Array(items) => Value::List(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| decode(item, &format!("{path}/{i}")))
                .collect::<Result<_, _>>()?,
        ),
        Json::Object(object) => match single_function(object) {
            Some((name, arguments)) => {
                let path = format!("{path}/{}", pointer_segment(name));
                Value::FuncCall(FuncCall {
                    name: name.clone(),
                    arguments: decode_entries(arguments, &path)?,
                })
            }
            None => Value::Object(decode_entries(object, path)?),
        },
    })
}

/// `{"<known function>": {...}}` is a call; anything else is a plain object.
fn single_function(object: &Map<String, Json>) -> Option<(&String, &Map<String, Json>)> {
    if object.len() != 1 {
        return None;
    }
    let (name, arguments) = object.iter().next()?;
    match arguments {
        Json::Object(arguments) if is_known_function(name) => Some((name, arguments)),
        _ => None,
    }
}
