// tests/transform_tests.rs

use std::str::FromStr;

use buildscript::ast::{InExpr, Script};
use buildscript::transform::{TransformError, parse_timestamp};
use buildscript::value::{Assignment, FuncCall, Value};
use buildscript::{BuildExpression, parse_script, to_text};
use rust_decimal::Decimal;
use serde_json::json;

const SCRIPT: &str = "\
let:
\tat_time = \"2023-04-27T17:30:05.999Z\"
\t# the runtime
\truntime = solve(
\t\tat_time = at_time,
\t\tplatforms = [
\t\t\t\"78977bc8-0f32-519d-80f3-9043f059398c\",
\t\t\t\"7c998ec2-7491-4e75-be4d-8885800ef5f2\"
\t\t],
\t\trequirements = [
\t\t\t{
\t\t\t\tname = \"perl\",
\t\t\t\tnamespace = \"language\",
\t\t\t\tversion_requirements = [
\t\t\t\t\t{
\t\t\t\t\t\tcomparator = \"eq\",
\t\t\t\t\t\tversion = \"5.36.0\"
\t\t\t\t\t}
\t\t\t\t]
\t\t\t},
\t\t\t{
\t\t\t\tname = \"DateTime\",
\t\t\t\tnamespace = \"language/perl\"
\t\t\t}
\t\t],
\t\tsolver_version = null
\t)

in: runtime
";

const JSON: &str = r#"{"let":{"at_time":"2023-04-27T17:30:05.999Z","runtime":{"solve":{"at_time":"$at_time","platforms":["78977bc8-0f32-519d-80f3-9043f059398c","7c998ec2-7491-4e75-be4d-8885800ef5f2"],"requirements":[{"name":"perl","namespace":"language","version_requirements":[{"comparator":"eq","version":"5.36.0"}]},{"name":"DateTime","namespace":"language/perl"}],"solver_version":null}}},"in":"$runtime"}"#;

fn strip_comments(script: &mut Script) {
    fn strip(value: &mut Value) {
        match value {
            Value::FuncCall(call) => call.arguments.iter_mut().for_each(strip_assignment),
            Value::Object(entries) => entries.iter_mut().for_each(strip_assignment),
            Value::List(items) => items.iter_mut().for_each(strip),
            _ => {}
        }
    }
    fn strip_assignment(assignment: &mut Assignment) {
        assignment.comments.clear();
        strip(&mut assignment.value);
    }
    script.assignments.iter_mut().for_each(strip_assignment);
}

// ============================================================================
// Script -> Script model
// ============================================================================

#[test]
fn test_at_time_is_lifted() {
    let script = parse_script(SCRIPT).unwrap();
    assert_eq!(
        script.at_time,
        Some(parse_timestamp("2023-04-27T17:30:05.999Z").unwrap())
    );
    assert!(script.binding("at_time").is_none());
    assert_eq!(script.at_time_binding, Some(0));
    assert_eq!(script.assignments.len(), 1);

    let solve = script.binding("runtime").and_then(Value::as_func_call).unwrap();
    assert_eq!(solve.name, "solve");
    assert_eq!(
        solve.argument("at_time"),
        Some(&Value::Identifier("at_time".to_string()))
    );
    assert_eq!(script.in_expr, InExpr::Reference("runtime".to_string()));
}

#[test]
fn test_comments_are_kept_on_assignments() {
    let script = parse_script(SCRIPT).unwrap();
    assert_eq!(script.assignments[0].comments, vec![" the runtime".to_string()]);
}

#[test]
fn test_literal_solve_timestamp_becomes_reference() {
    let source = "let:\n r = solve(at_time = \"2024-01-02T03:04:05Z\")\nin: r";
    let script = parse_script(source).unwrap();
    assert_eq!(
        script.at_time,
        Some(parse_timestamp("2024-01-02T03:04:05Z").unwrap())
    );
    assert_eq!(script.at_time_binding, None);
    let solve = script.binding("r").and_then(Value::as_func_call).unwrap();
    assert_eq!(
        solve.argument("at_time"),
        Some(&Value::Identifier("at_time".to_string()))
    );

    // Printed back inline, where it came from
    assert_eq!(
        to_text(&script),
        "let:\n\tr = solve(\n\t\tat_time = \"2024-01-02T03:04:05Z\"\n\t)\n\nin: r\n"
    );
}

#[test]
fn test_literal_next_to_binding_is_left_alone() {
    let source = "\
let:
 at_time = \"2024-01-02T03:04:05Z\"
 r = solve(at_time = \"2024-01-02T03:04:05Z\")
in: r";
    let script = parse_script(source).unwrap();
    let solve = script.binding("r").and_then(Value::as_func_call).unwrap();
    assert_eq!(
        solve.argument("at_time"),
        Some(&Value::String("2024-01-02T03:04:05Z".to_string()))
    );
    assert_eq!(parse_script(&to_text(&script)).unwrap(), script);
}

#[test]
fn test_second_distinct_timestamp_stays_literal() {
    let source = "\
let:
 a = solve(at_time = \"2024-01-02T03:04:05Z\")
 b = solve(at_time = \"2025-01-02T03:04:05Z\")
in: a";
    let script = parse_script(source).unwrap();
    let b = script.binding("b").and_then(Value::as_func_call).unwrap();
    assert_eq!(
        b.argument("at_time"),
        Some(&Value::String("2025-01-02T03:04:05Z".to_string()))
    );
}

#[test]
fn test_invalid_timestamp() {
    let err = parse_script("let:\n at_time = \"yesterday\"\nin: at_time").unwrap_err();
    assert!(err.to_string().contains("invalid at_time 'yesterday'"));
}

#[test]
fn test_scalar_values() {
    let script = parse_script("let:\n x = {n = -1.25, b = true, z = null}\nin: x").unwrap();
    let Some(Value::Object(entries)) = script.binding("x") else {
        panic!("expected object");
    };
    assert_eq!(entries[0].value, Value::Number(Decimal::new(-125, 2)));
    assert_eq!(entries[1].value, Value::Bool(true));
    assert_eq!(entries[2].value, Value::Null);
}

// ============================================================================
// Script -> BuildExpression
// ============================================================================

#[test]
fn test_to_build_expression() {
    let expression = parse_script(SCRIPT).unwrap().to_build_expression().unwrap();
    assert_eq!(expression.to_json_string().unwrap(), JSON);
}

#[test]
fn test_at_time_binding_keeps_its_position() {
    let source = "let:\n x = [1, 2]\n at_time = \"2024-01-02T03:04:05Z\"\nin: x";
    let script = parse_script(source).unwrap();
    assert_eq!(script.at_time_binding, Some(1));

    let expression = script.to_build_expression().unwrap();
    assert_eq!(
        expression.to_json_string().unwrap(),
        r#"{"let":{"x":[1,2],"at_time":"2024-01-02T03:04:05Z"},"in":"$x"}"#
    );
    assert_eq!(
        to_text(&script),
        "let:\n\tx = [\n\t\t1,\n\t\t2\n\t]\n\tat_time = \"2024-01-02T03:04:05Z\"\n\nin: x\n"
    );
}

#[test]
fn test_in_function_call() {
    let expression = parse_script("let:\nin: merge(left = a, right = b)")
        .unwrap()
        .to_build_expression()
        .unwrap();
    assert_eq!(
        expression.as_value(),
        &json!({"let": {}, "in": {"merge": {"left": "$a", "right": "$b"}}})
    );
}

#[test]
fn test_dollar_string_is_ambiguous() {
    let script = parse_script("let:\n x = \"$runtime\"\nin: x").unwrap();
    match script.to_build_expression() {
        Err(TransformError::AmbiguousString(s)) => assert_eq!(s, "$runtime"),
        other => panic!("Expected AmbiguousString, got {:?}", other),
    }
}

#[test]
fn test_object_shaped_like_a_call_is_ambiguous() {
    let script = parse_script("let:\n x = {merge = {a = 1}}\nin: x").unwrap();
    match script.to_build_expression() {
        Err(TransformError::AmbiguousObject(name)) => assert_eq!(name, "merge"),
        other => panic!("Expected AmbiguousObject, got {:?}", other),
    }

    // Two entries, or a name that is not a function, are plain objects
    let script = parse_script("let:\n x = {merge = {a = 1}, b = 2}\n y = {install = {}}\nin: x").unwrap();
    assert!(script.to_build_expression().is_ok());
}

#[test]
fn test_dollar_string_that_is_not_a_name_is_fine() {
    let script = parse_script("let:\n price = \"$5.00\"\nin: price").unwrap();
    let expression = script.to_build_expression().unwrap();
    assert_eq!(expression.as_value()["let"]["price"], json!("$5.00"));
}

// ============================================================================
// BuildExpression -> Script
// ============================================================================

#[test]
fn test_from_build_expression() {
    let expression = BuildExpression::from_str(JSON).unwrap();
    let from_json = Script::from_build_expression(&expression).unwrap();

    let mut from_text = parse_script(SCRIPT).unwrap();
    strip_comments(&mut from_text);
    assert_eq!(from_json, from_text);
}

#[test]
fn test_json_back_to_text() {
    let expression = BuildExpression::from_str(JSON).unwrap();
    let script = Script::from_build_expression(&expression).unwrap();
    assert_eq!(to_text(&script), SCRIPT.replace("\t# the runtime\n", ""));
}

#[test]
fn test_at_time_binding_and_reference_survive() {
    let document = json!({
        "let": {
            "at_time": "2024-01-02T03:04:05Z",
            "runtime": {"solve": {"at_time": "$at_time", "requirements": []}}
        },
        "in": "$runtime"
    });
    let expression = BuildExpression::from_value(document.clone()).unwrap();
    let script = Script::from_build_expression(&expression).unwrap();
    assert!(script.at_time.is_some());
    assert_eq!(script.at_time_binding, Some(0));

    let encoded = script.to_build_expression().unwrap();
    assert_eq!(encoded.to_json_string().unwrap(), expression.to_json_string().unwrap());

    let reparsed = parse_script(&to_text(&script)).unwrap();
    assert_eq!(reparsed.to_build_expression().unwrap().as_value(), &document);
}

#[test]
fn test_inline_solve_timestamp_survives() {
    let document = json!({
        "let": {
            "runtime": {"solve": {"at_time": "2024-01-02T03:04:05Z", "requirements": []}}
        },
        "in": "$runtime"
    });
    let expression = BuildExpression::from_value(document.clone()).unwrap();
    let script = Script::from_build_expression(&expression).unwrap();
    assert_eq!(script.at_time_binding, None);

    let text = to_text(&script);
    assert!(text.contains("\t\tat_time = \"2024-01-02T03:04:05Z\""));
    assert!(!text.contains("at_time = at_time"));
    assert_eq!(
        parse_script(&text).unwrap().to_build_expression().unwrap().to_json_string().unwrap(),
        expression.to_json_string().unwrap()
    );
}

#[test]
fn test_keys_that_are_not_identifiers_survive() {
    let document = json!({
        "let": {
            "runtime": {"solve": {
                "build-flags": {"in": 1, "null": [], "let": "x"},
                "requirements": []
            }}
        },
        "in": "$runtime"
    });
    let expression = BuildExpression::from_value(document.clone()).unwrap();
    let script = Script::from_build_expression(&expression).unwrap();

    let text = to_text(&script);
    assert!(text.contains("\t\t\"build-flags\" = {\n\t\t\t\"in\" = 1,"));
    let reparsed = parse_script(&text).unwrap();
    assert_eq!(reparsed, script);
    assert_eq!(reparsed.to_build_expression().unwrap().as_value(), &document);
}

#[test]
fn test_unknown_functions_survive_as_objects() {
    let document = json!({
        "let": {
            "runtime": {"solve": {"platforms": [], "requirements": [], "flags": {"fast": true}}},
            "extra": {"install": {"name": "perl"}}
        },
        "in": "$runtime"
    });
    let expression = BuildExpression::from_value(document.clone()).unwrap();
    let script = Script::from_build_expression(&expression).unwrap();

    assert!(matches!(script.binding("extra"), Some(Value::Object(_))));
    assert_eq!(script.to_build_expression().unwrap().as_value(), &document);
}

#[test]
fn test_in_call_from_json() {
    let expression = BuildExpression::from_value(json!({
        "let": {},
        "in": {"solve": {"platforms": []}}
    }))
    .unwrap();
    let script = Script::from_build_expression(&expression).unwrap();
    assert_eq!(
        script.in_expr,
        InExpr::Call(FuncCall {
            name: "solve".to_string(),
            arguments: vec![Assignment::new("platforms", Value::List(vec![]))],
        })
    );
}

#[test]
fn test_in_must_be_reference_or_call() {
    let expression = BuildExpression::from_value(json!({"let": {}, "in": "runtime"})).unwrap();
    match Script::from_build_expression(&expression) {
        Err(TransformError::UnexpectedShape { path, .. }) => assert_eq!(path, "/in"),
        other => panic!("Expected UnexpectedShape, got {:?}", other),
    }
}

#[test]
fn test_missing_keys() {
    assert!(matches!(
        BuildExpression::from_str(r#"{"let": {}}"#),
        Err(TransformError::MissingKey("in"))
    ));
    assert!(matches!(
        BuildExpression::from_str(r#"{"in": "$x"}"#),
        Err(TransformError::MissingKey("let"))
    ));
}

#[test]
fn test_let_must_be_an_object() {
    match BuildExpression::from_str(r#"{"let": [], "in": "$x"}"#) {
        Err(TransformError::UnexpectedShape { path, found, .. }) => {
            assert_eq!(path, "/let");
            assert_eq!(found, "array");
        }
        other => panic!("Expected UnexpectedShape, got {:?}", other),
    }
}

#[test]
fn test_invalid_json() {
    assert!(matches!(
        BuildExpression::from_str("{not json"),
        Err(TransformError::Json(_))
    ));
}

// ============================================================================
// Round trips
// ============================================================================

#[test]
fn test_text_round_trip() {
    let script = parse_script(SCRIPT).unwrap();
    assert_eq!(to_text(&script), SCRIPT);
    assert_eq!(parse_script(&to_text(&script)).unwrap(), script);
}

#[test]
fn test_json_round_trip() {
    let expression = BuildExpression::from_str(JSON).unwrap();
    let script = Script::from_build_expression(&expression).unwrap();
    assert_eq!(script.to_build_expression().unwrap(), expression);
}

#[test]
fn test_numbers_survive_json() {
    let script = parse_script("let:\n x = [0, -3, 2.5, 1000000]\nin: x").unwrap();
    let expression = script.to_build_expression().unwrap();
    assert_eq!(expression.to_json_string().unwrap(), r#"{"let":{"x":[0,-3,2.5,1000000]},"in":"$x"}"#);
    assert_eq!(Script::from_build_expression(&expression).unwrap(), script);
}

#[test]
fn test_numbers_are_exact() {
    let script =
        parse_script("let:\n x = [12345678901234567890123, 1.50, -0.000001]\nin: x").unwrap();
    let expression = script.to_build_expression().unwrap();
    assert_eq!(
        expression.to_json_string().unwrap(),
        r#"{"let":{"x":[12345678901234567890123,1.50,-0.000001]},"in":"$x"}"#
    );
    assert_eq!(Script::from_build_expression(&expression).unwrap(), script);

    let expression = BuildExpression::from_str(r#"{"let":{"x":12345678901234567890123},"in":"$x"}"#).unwrap();
    let script = Script::from_build_expression(&expression).unwrap();
    assert_eq!(
        script.binding("x"),
        Some(&Value::Number(Decimal::from_str("12345678901234567890123").unwrap()))
    );
}
