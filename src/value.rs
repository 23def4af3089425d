use rust_decimal::Decimal;

/// Functions the build planner understands. Any other function name is
/// rejected by the parser.
pub const KNOWN_FUNCTIONS: &[&str] = &[
    SOLVE,
    SOLVE_LEGACY,
    MERGE,
    "Eq",
    "Ne",
    "Gt",
    "Gte",
    "Lt",
    "Lte",
    "And",
];

pub const SOLVE: &str = "solve";
pub const SOLVE_LEGACY: &str = "solve_legacy";
pub const MERGE: &str = "merge";

pub fn is_known_function(name: &str) -> bool {
    KNOWN_FUNCTIONS.contains(&name)
}

pub fn is_solve_function(name: &str) -> bool {
    name == SOLVE || name == SOLVE_LEGACY
}

/// Words the lexer never reads as an identifier.
pub const RESERVED_WORDS: &[&str] = &["let", "in", "true", "false", "null"];

/// Whether `name` can be written bare, as a binding name, key or reference.
/// Anything else has to be written as a quoted key.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
        && !RESERVED_WORDS.contains(&name)
}

/// A value in a build script.
///
/// This is the shape shared by both directions of the transform: the parser
/// produces it from source text, and the build expression codec produces it
/// from JSON.
///
/// # Examples
///
/// ```
/// use buildscript::value::{Assignment, FuncCall, Value};
///
/// let platforms = Value::List(vec![Value::String("linux-x86_64".to_string())]);
/// let call = Value::FuncCall(FuncCall {
///     name: "solve".to_string(),
///     arguments: vec![Assignment::new("platforms", platforms)],
/// });
/// assert!(call.as_func_call().is_some());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Call of one of the [`KNOWN_FUNCTIONS`]
    FuncCall(FuncCall),

    /// `[a, b, c]`
    List(Vec<Value>),

    /// Double-quoted string, unescaped
    String(String),

    /// Exact decimal number
    Number(Decimal),

    /// `true` / `false`
    Bool(bool),

    /// Reference to a `let` binding
    Identifier(String),

    /// `null`
    Null,

    /// `{ key = value, ... }` with keys in source order
    Object(Vec<Assignment>),
}

impl Value {
    pub fn as_func_call(&self) -> Option<&FuncCall> {
        match self {
            Value::FuncCall(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Name of the variant, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::FuncCall(_) => "function call",
            Value::List(_) => "list",
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Bool(_) => "boolean",
            Value::Identifier(_) => "identifier",
            Value::Null => "null",
            Value::Object(_) => "object",
        }
    }
}

/// `name = value`, used for bindings, object entries and function arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub key: String,
    pub value: Value,
    /// Comment lines that preceded the assignment, without the leading `#`
    pub comments: Vec<String>,
}

impl Assignment {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Assignment {
            key: key.into(),
            value,
            comments: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncCall {
    pub name: String,
    pub arguments: Vec<Assignment>,
}

impl FuncCall {
    pub fn argument(&self, key: &str) -> Option<&Value> {
        self.arguments
            .iter()
            .find(|arg| arg.key == key)
            .map(|arg| &arg.value)
    }

    pub fn argument_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.arguments
            .iter_mut()
            .find(|arg| arg.key == key)
            .map(|arg| &mut arg.value)
    }
}
