//! The wire-format build expression.
//!
//! A build expression is kept as JSON data rather than a typed struct: the
//! build planner may add functions or arguments this crate does not know,
//! and those must survive untouched.

use std::str::FromStr;

use serde_json::{Map, Value as Json};

use crate::transform::TransformError;

pub const LET_KEY: &str = "let";
pub const IN_KEY: &str = "in";

/// `{"let": {<name>: <value>, ...}, "in": <value>}` with key order preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildExpression {
    document: Json,
}

impl BuildExpression {
    /// Wraps a JSON document after checking its outer shape.
    pub fn from_value(document: Json) -> Result<Self, TransformError> {
        let Some(object) = document.as_object() else {
            return Err(TransformError::UnexpectedShape {
                path: "/".to_string(),
                expected: "object",
                found: json_type_name(&document).to_string(),
            });
        };
        match object.get(LET_KEY) {
            Some(Json::Object(_)) => {}
            Some(other) => {
                return Err(TransformError::UnexpectedShape {
                    path: format!("/{LET_KEY}"),
                    expected: "object",
                    found: json_type_name(other).to_string(),
                });
            }
            None => return Err(TransformError::MissingKey(LET_KEY)),
        }
        if !object.contains_key(IN_KEY) {
            return Err(TransformError::MissingKey(IN_KEY));
        }
        Ok(BuildExpression { document })
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, TransformError> {
        Self::from_value(serde_json::from_slice(bytes)?)
    }

    pub fn as_value(&self) -> &Json {
        &self.document
    }

    pub fn into_value(self) -> Json {
        self.document
    }

    pub(crate) fn document_mut(&mut self) -> &mut Json {
        &mut self.document
    }

    /// The `let` bindings, in document order.
    pub fn bindings(&self) -> Option<&Map<String, Json>> {
        self.document.get(LET_KEY).and_then(Json::as_object)
    }

    pub fn in_value(&self) -> &Json {
        &self.document[IN_KEY]
    }

    pub fn to_json_string(&self) -> Result<String, TransformError> {
        Ok(serde_json::to_string(&self.document)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, TransformError> {
        Ok(serde_json::to_string_pretty(&self.document)?)
    }
}

impl FromStr for BuildExpression {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_json(s.as_bytes())
    }
}

pub(crate) fn json_type_name(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

/// Escapes a key for use as a JSON pointer segment (RFC 6901).
pub(crate) fn pointer_segment(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}
