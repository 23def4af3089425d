use chrono::{DateTime, Utc};

use crate::{
    transform::AT_TIME,
    value::{Assignment, FuncCall, Value, is_solve_function},
};

/// Expression named by the `in:` section.
#[derive(Debug, Clone, PartialEq)]
pub enum InExpr {
    /// `in: runtime`
    Reference(String),
    /// `in: solve(...)`
    Call(FuncCall),
}

impl InExpr {
    pub fn to_value(&self) -> Value {
        match self {
            InExpr::Reference(name) => Value::Identifier(name.clone()),
            InExpr::Call(call) => Value::FuncCall(call.clone()),
        }
    }
}

/// A whole build script.
///
/// The `at_time` binding is kept out of `assignments`; it is held as a typed
/// timestamp because the merge engine compares it differently from ordinary
/// bindings. Solve calls that use it hold an `at_time` identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub at_time: Option<DateTime<Utc>>,
    /// Index into `assignments` at which the `at_time` binding was declared.
    /// `None` when the timestamp was only written inline in solve calls.
    pub at_time_binding: Option<usize>,
    /// `let:` bindings in source order
    pub assignments: Vec<Assignment>,
    pub in_expr: InExpr,
}

impl Script {
    pub fn binding(&self, name: &str) -> Option<&Value> {
        self.assignments
            .iter()
            .find(|a| a.key == name)
            .map(|a| &a.value)
    }

    /// Where the `at_time` binding is written out, or `None` when the
    /// timestamp goes inline into each solve call that refers to it.
    pub(crate) fn at_time_placement(&self) -> Option<usize> {
        self.at_time?;
        match self.at_time_binding {
            Some(index) => Some(index.min(self.assignments.len())),
            None if self.refers_to_at_time() => None,
            // Nothing would carry it inline
            None => Some(0),
        }
    }

    fn refers_to_at_time(&self) -> bool {
        let in_call = match &self.in_expr {
            InExpr::Call(call) => call_refers_to_at_time(call),
            InExpr::Reference(_) => false,
        };
        in_call
            || self
                .assignments
                .iter()
                .any(|a| refers_to_at_time(&a.value))
    }
}

fn refers_to_at_time(value: &Value) -> bool {
    match value {
        Value::FuncCall(call) => call_refers_to_at_time(call),
        Value::List(items) => items.iter().any(refers_to_at_time),
        Value::Object(entries) => entries.iter().any(|e| refers_to_at_time(&e.value)),
        _ => false,
    }
}

fn call_refers_to_at_time(call: &FuncCall) -> bool {
    let direct = is_solve_function(&call.name)
        && matches!(call.argument(AT_TIME), Some(Value::Identifier(name)) if name == AT_TIME);
    direct || call.arguments.iter().any(|a| refers_to_at_time(&a.value))
}
