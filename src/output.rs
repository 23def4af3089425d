//! Canonical text rendering of a [`Script`].
//!
//! The printer is deterministic: one binding, argument, list element or
//! object entry per line, tab indentation, comments re-emitted above the
//! assignment they belong to, keys that are not identifiers quoted. Parsing
//! the output yields the same script.
//!
//! # Examples
//!
//! ```
//! use buildscript::ast::{InExpr, Script};
//! use buildscript::output::to_text;
//! use buildscript::value::{Assignment, Value};
//!
//! let script = Script {
//!     at_time: None,
//!     at_time_binding: None,
//!     assignments: vec![Assignment::new("platforms", Value::List(vec![]))],
//!     in_expr: InExpr::Reference("platforms".to_string()),
//! };
//! assert_eq!(to_text(&script), "let:\n\tplatforms = []\n\nin: platforms\n");
//! ```

use chrono::{DateTime, Utc};

use crate::{
    ast::{InExpr, Script},
    transform::{AT_TIME, format_timestamp},
    value::{Assignment, FuncCall, Value, is_identifier, is_solve_function},
};

pub struct ScriptPrinter {
    indent_unit: &'static str,
}

impl Default for ScriptPrinter {
    fn default() -> Self {
        ScriptPrinter { indent_unit: "\t" }
    }
}

impl ScriptPrinter {
    pub fn new(indent_unit: &'static str) -> Self {
        ScriptPrinter { indent_unit }
    }

    pub fn print(&self, script: &Script) -> String {
        let placement = script.at_time_placement();
        let writer = Writer {
            indent_unit: self.indent_unit,
            inline_at_time: script.at_time.as_ref().filter(|_| placement.is_none()),
        };
        let at_time_line = |out: &mut String| {
            if let Some(at_time) = &script.at_time {
                out.push_str(&writer.indent(1));
                out.push_str(&format!(
                    "{AT_TIME} = {}\n",
                    quote(&format_timestamp(at_time))
                ));
            }
        };

        let mut out = String::from("let:\n");
        for (index, assignment) in script.assignments.iter().enumerate() {
            if placement == Some(index) {
                at_time_line(&mut out);
            }
            out.push_str(&writer.print_assignment(assignment, 1, false));
            out.push('\n');
        }
        if placement == Some(script.assignments.len()) {
            at_time_line(&mut out);
        }

        out.push_str("\nin: ");
        match &script.in_expr {
            InExpr::Reference(name) => out.push_str(name),
            InExpr::Call(call) => out.push_str(&writer.print_call(call, 0)),
        }
        out.push('\n');
        out
    }
}

/// State for one `print` call.
struct Writer<'a> {
    indent_unit: &'static str,
    /// Written in place of solve `at_time` references when the script has no
    /// `at_time` binding
    inline_at_time: Option<&'a DateTime<Utc>>,
}

impl Writer<'_> {
    fn indent(&self, level: usize) -> String {
        self.indent_unit.repeat(level)
    }

    fn print_assignment(
        &self,
        assignment: &Assignment,
        indent: usize,
        solve_argument: bool,
    ) -> String {
        let mut result = String::new();
        for comment in &assignment.comments {
            result.push_str(&self.indent(indent));
            result.push('#');
            result.push_str(comment);
            result.push('\n');
        }
        result.push_str(&self.indent(indent));
        if is_identifier(&assignment.key) {
            result.push_str(&assignment.key);
        } else {
            result.push_str(&quote(&assignment.key));
        }
        result.push_str(" = ");
        match (&assignment.value, self.inline_at_time) {
            (Value::Identifier(name), Some(at_time))
                if solve_argument && assignment.key == AT_TIME && name == AT_TIME =>
            {
                result.push_str(&quote(&format_timestamp(at_time)));
            }
            (value, _) => result.push_str(&self.print_value(value, indent)),
        }
        result
    }

    fn print_value(&self, value: &Value, indent: usize) -> String {
        match value {
            Value::FuncCall(call) => self.print_call(call, indent),
            Value::List(items) => self.print_list(items, indent),
            Value::Object(entries) => self.print_entries("{", "}", entries, indent, false),
            Value::String(s) => quote(s),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Identifier(name) => name.clone(),
            Value::Null => "null".to_string(),
        }
    }

    fn print_call(&self, call: &FuncCall, indent: usize) -> String {
        format!(
            "{}{}",
            call.name,
            self.print_entries("(", ")", &call.arguments, indent, is_solve_function(&call.name))
        )
    }

    fn print_entries(
        &self,
        open: &str,
        close: &str,
        entries: &[Assignment],
        indent: usize,
        solve_arguments: bool,
    ) -> String {
        if entries.is_empty() {
            return format!("{open}{close}");
        }
        let items: Vec<String> = entries
            .iter()
            .map(|entry| self.print_assignment(entry, indent + 1, solve_arguments))
            .collect();
        format!(
            "{open}\n{}\n{}{close}",
            items.join(",\n"),
            self.indent(indent)
        )
    }

    fn print_list(&self, items: &[Value], indent: usize) -> String {
        if items.is_empty() {
            return "[]".to_string();
        }
        let items: Vec<String> = items
            .iter()
            .map(|item| {
                format!(
                    "{}{}",
                    self.indent(indent + 1),
                    self.print_value(item, indent + 1)
                )
            })
            .collect();
        format!("[\n{}\n{}]", items.join(",\n"), self.indent(indent))
    }
}

fn quote(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 2);
    result.push('"');
    for ch in s.chars() {
        match ch {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\t' => result.push_str("\\t"),
            '\r' => result.push_str("\\r"),
            c => result.push(c),
        }
    }
    result.push('"');
    result
}

/// Renders `script` with the default printer.
pub fn to_text(script: &Script) -> String {
    ScriptPrinter::default().print(script)
}
