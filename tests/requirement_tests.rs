// tests/requirement_tests.rs

use std::str::FromStr;

use buildscript::requirement::{
    Comparator, Operation, Requirement, RequirementError, VersionConstraint,
};
use buildscript::transform::parse_timestamp;
use buildscript::{BuildExpression, parse_script};
use serde_json::{Value as Json, json};

fn expression() -> BuildExpression {
    BuildExpression::from_value(json!({
        "let": {
            "runtime": {
                "solve": {
                    "at_time": "2023-04-27T17:30:05.999Z",
                    "platforms": ["78977bc8-0f32-519d-80f3-9043f059398c"],
                    "requirements": [
                        {
                            "name": "perl",
                            "namespace": "language",
                            "version_requirements": [{"comparator": "eq", "version": "5.36.0"}]
                        },
                        {"name": "DateTime", "namespace": "language/perl"}
                    ]
                }
            }
        },
        "in": "$runtime"
    }))
    .unwrap()
}

fn requirement_names(expression: &BuildExpression) -> Vec<String> {
    expression
        .requirements()
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect()
}

fn solve_at_time(expression: &BuildExpression) -> &Json {
    expression
        .as_value()
        .pointer("/let/runtime/solve/at_time")
        .unwrap()
}

// ============================================================================
// Reading requirements
// ============================================================================

#[test]
fn test_requirements() {
    let requirements = expression().requirements().unwrap();
    assert_eq!(
        requirements,
        vec![
            Requirement::new("language", "perl")
                .with_constraints(vec![VersionConstraint::new(Comparator::Eq, "5.36.0")]),
            Requirement::new("language/perl", "DateTime"),
        ]
    );
}

#[test]
fn test_requirements_from_script() {
    let source = "\
let:
\truntime = solve(
\t\tat_time = \"2023-04-27T17:30:05.999Z\",
\t\trequirements = [{name = \"perl\", namespace = \"language\"}]
\t)
in: runtime";
    let requirements = parse_script(source).unwrap().requirements().unwrap();
    assert_eq!(requirements, vec![Requirement::new("language", "perl")]);
}

#[test]
fn test_solve_inside_in_call() {
    let expression = BuildExpression::from_value(json!({
        "let": {
            "base": {"solve": {"requirements": [{"name": "perl", "namespace": "language"}]}}
        },
        "in": {"merge": {"left": "$base", "right": "$base"}}
    }))
    .unwrap();
    assert_eq!(requirement_names(&expression), vec!["perl"]);
}

#[test]
fn test_version_function_form() {
    let expression = BuildExpression::from_value(json!({
        "let": {
            "runtime": {
                "solve_legacy": {
                    "requirements": [{
                        "name": "DateTime",
                        "namespace": "language/perl",
                        "version": {"And": {
                            "left": {"Gte": {"value": "1.50"}},
                            "right": {"Lt": {"value": "2"}}
                        }}
                    }]
                }
            }
        },
        "in": "$runtime"
    }))
    .unwrap();
    let requirements = expression.requirements().unwrap();
    assert_eq!(
        requirements[0].version_constraints,
        vec![
            VersionConstraint::new(Comparator::Gte, "1.50"),
            VersionConstraint::new(Comparator::Lt, "2"),
        ]
    );
}

#[test]
fn test_solve_not_found() {
    let expression = BuildExpression::from_value(json!({"let": {"x": []}, "in": "$x"})).unwrap();
    assert!(matches!(
        expression.requirements(),
        Err(RequirementError::SolveNotFound)
    ));
}

#[test]
fn test_reference_cycle_is_not_followed_forever() {
    let expression =
        BuildExpression::from_value(json!({"let": {"a": "$b", "b": "$a"}, "in": "$a"})).unwrap();
    assert!(matches!(
        expression.requirements(),
        Err(RequirementError::SolveNotFound)
    ));
}

#[test]
fn test_requirements_missing_or_not_a_list() {
    let missing = BuildExpression::from_value(json!({
        "let": {"r": {"solve": {"platforms": []}}},
        "in": "$r"
    }))
    .unwrap();
    match missing.requirements() {
        Err(RequirementError::RequirementsNotFound { path }) => {
            assert_eq!(path, "/let/r/solve")
        }
        other => panic!("Expected RequirementsNotFound, got {:?}", other),
    }

    let scalar = BuildExpression::from_value(json!({
        "let": {"r": {"solve": {"requirements": "perl"}}},
        "in": "$r"
    }))
    .unwrap();
    assert!(matches!(
        scalar.requirements(),
        Err(RequirementError::NotAList { found: "string", .. })
    ));
}

#[test]
fn test_malformed_entry() {
    let expression = BuildExpression::from_value(json!({
        "let": {"r": {"solve": {"requirements": [{"name": "perl"}]}}},
        "in": "$r"
    }))
    .unwrap();
    match expression.requirements() {
        Err(RequirementError::Malformed { index, reason }) => {
            assert_eq!(index, 0);
            assert_eq!(reason, "missing 'namespace'");
        }
        other => panic!("Expected Malformed, got {:?}", other),
    }
}

// ============================================================================
// Updating requirements
// ============================================================================

#[test]
fn test_add_requirement() {
    let now = parse_timestamp("2024-05-01T12:00:00Z").unwrap();
    let mut expression = expression();
    let json = Requirement::new("language/perl", "JSON")
        .with_constraints(vec![VersionConstraint::new(Comparator::Gte, "4.0")]);
    expression
        .update_requirement_at(Operation::Add, &json, now)
        .unwrap();

    assert_eq!(requirement_names(&expression), vec!["perl", "DateTime", "JSON"]);
    assert_eq!(
        expression.as_value().pointer("/let/runtime/solve/requirements/2"),
        Some(&json!({
            "name": "JSON",
            "namespace": "language/perl",
            "version_requirements": [{"comparator": "gte", "version": "4.0"}]
        }))
    );
    assert_eq!(solve_at_time(&expression), &json!("2024-05-01T12:00:00Z"));
}

#[test]
fn test_remove_requirement() {
    let now = parse_timestamp("2024-05-01T12:00:00Z").unwrap();
    let mut expression = expression();
    expression
        .update_requirement_at(
            Operation::Remove,
            &Requirement::new("language/perl", "DateTime"),
            now,
        )
        .unwrap();
    assert_eq!(requirement_names(&expression), vec!["perl"]);
}

#[test]
fn test_remove_missing_requirement_fails() {
    let mut expression = expression();
    let before = expression.clone();
    match expression.update_requirement(Operation::Remove, &Requirement::new("language", "python"))
    {
        Err(RequirementError::NotFound { name, namespace }) => {
            assert_eq!(name, "python");
            assert_eq!(namespace, "language");
        }
        other => panic!("Expected NotFound, got {:?}", other),
    }
    assert_eq!(expression, before);
}

#[test]
fn test_remove_matches_namespace_too() {
    let mut expression = expression();
    let result = expression.update_requirement(Operation::Remove, &Requirement::new("language", "DateTime"));
    assert!(matches!(result, Err(RequirementError::NotFound { .. })));
}

#[test]
fn test_update_requirement() {
    let now = parse_timestamp("2024-05-01T12:00:00Z").unwrap();
    let mut expression = expression();
    let perl = Requirement::new("language", "perl")
        .with_constraints(vec![VersionConstraint::new(Comparator::Gte, "5.30")]);
    expression
        .update_requirement_at(Operation::Update, &perl, now)
        .unwrap();

    assert_eq!(expression.requirements().unwrap()[0], perl);
    assert_eq!(solve_at_time(&expression), &json!("2024-05-01T12:00:00Z"));
}

#[test]
fn test_update_without_constraints_clears_them() {
    let mut expression = expression();
    expression
        .update_requirement(Operation::Update, &Requirement::new("language", "perl"))
        .unwrap();
    let entry = expression
        .as_value()
        .pointer("/let/runtime/solve/requirements/0")
        .unwrap();
    assert_eq!(entry, &json!({"name": "perl", "namespace": "language"}));
}

#[test]
fn test_update_missing_requirement_fails() {
    let mut expression = expression();
    let result = expression.update_requirement(Operation::Update, &Requirement::new("language", "ruby"));
    assert!(matches!(result, Err(RequirementError::NotFound { .. })));
}

#[test]
fn test_update_refreshes_timestamp() {
    let mut expression = expression();
    expression
        .update_requirement(Operation::Add, &Requirement::new("language/perl", "JSON"))
        .unwrap();
    assert_ne!(solve_at_time(&expression), &json!("2023-04-27T17:30:05.999Z"));
}

#[test]
fn test_update_moves_the_at_time_binding() {
    let now = parse_timestamp("2024-05-01T12:00:00Z").unwrap();
    let mut expression = BuildExpression::from_value(json!({
        "let": {
            "at_time": "2023-04-27T17:30:05.999Z",
            "runtime": {"solve": {"at_time": "$at_time", "requirements": []}}
        },
        "in": "$runtime"
    }))
    .unwrap();
    expression
        .update_requirement_at(Operation::Add, &Requirement::new("language", "perl"), now)
        .unwrap();
    assert_eq!(solve_at_time(&expression), &json!("$at_time"));
    assert_eq!(expression.as_value()["let"]["at_time"], json!("2024-05-01T12:00:00Z"));
}

// ============================================================================
// Editing a script
// ============================================================================

const SCRIPT: &str = "\
let:
\t# pinned for CI
\truntime = solve(
\t\tat_time = at_time,
\t\t# keep sorted
\t\trequirements = [
\t\t\t{
\t\t\t\tname = \"perl\",
\t\t\t\tnamespace = \"language\"
\t\t\t}
\t\t]
\t)
\tat_time = \"2023-04-27T17:30:05.999Z\"

in: runtime
";

#[test]
fn test_script_edit_keeps_comments_and_layout() {
    let now = parse_timestamp("2024-05-01T12:00:00Z").unwrap();
    let mut script = parse_script(SCRIPT).unwrap();
    let added = Requirement::from_str("language/perl/JSON@>=4.0").unwrap();
    script
        .update_requirement_at(Operation::Add, &added, now)
        .unwrap();

    let expected = "\
let:
\t# pinned for CI
\truntime = solve(
\t\tat_time = at_time,
\t\t# keep sorted
\t\trequirements = [
\t\t\t{
\t\t\t\tname = \"perl\",
\t\t\t\tnamespace = \"language\"
\t\t\t},
\t\t\t{
\t\t\t\tname = \"JSON\",
\t\t\t\tnamespace = \"language/perl\",
\t\t\t\tversion_requirements = [
\t\t\t\t\t{
\t\t\t\t\t\tcomparator = \"gte\",
\t\t\t\t\t\tversion = \"4.0\"
\t\t\t\t\t}
\t\t\t\t]
\t\t\t}
\t\t]
\t)
\tat_time = \"2024-05-01T12:00:00Z\"

in: runtime
";
    assert_eq!(buildscript::to_text(&script), expected);
    assert_eq!(script.requirements().unwrap()[1], added);
}

#[test]
fn test_script_remove_and_update() {
    let now = parse_timestamp("2024-05-01T12:00:00Z").unwrap();
    let mut script = parse_script(SCRIPT).unwrap();
    let perl = Requirement::new("language", "perl")
        .with_constraints(vec![VersionConstraint::new(Comparator::Eq, "5.36.0")]);
    script
        .update_requirement_at(Operation::Update, &perl, now)
        .unwrap();
    assert_eq!(script.requirements().unwrap(), vec![perl.clone()]);
    assert_eq!(script.at_time, Some(now));

    script
        .update_requirement_at(Operation::Remove, &perl, now)
        .unwrap();
    assert!(script.requirements().unwrap().is_empty());

    let before = script.clone();
    let result = script.update_requirement_at(Operation::Remove, &perl, now);
    assert!(matches!(result, Err(RequirementError::NotFound { .. })));
    assert_eq!(script, before);
}

#[test]
fn test_script_edit_follows_in_call() {
    let now = parse_timestamp("2024-05-01T12:00:00Z").unwrap();
    let mut script = parse_script(
        "let:\n base = solve(requirements = [])\nin: merge(left = base, right = base)",
    )
    .unwrap();
    script
        .update_requirement_at(Operation::Add, &Requirement::new("language", "perl"), now)
        .unwrap();
    assert_eq!(script.requirements().unwrap().len(), 1);

    // The timestamp is written inline because the script never bound it
    let text = buildscript::to_text(&script);
    assert!(text.contains("\t\tat_time = \"2024-05-01T12:00:00Z\""));
}

#[test]
fn test_script_edit_without_solve() {
    let mut script = parse_script("let:\n x = [1]\nin: x").unwrap();
    let result = script.update_requirement(Operation::Add, &Requirement::new("language", "perl"));
    assert!(matches!(result, Err(RequirementError::SolveNotFound)));

    let mut script = parse_script("let:\n r = solve(requirements = {})\nin: r").unwrap();
    let result = script.update_requirement(Operation::Add, &Requirement::new("language", "perl"));
    assert!(matches!(result, Err(RequirementError::NotAList { found: "object", .. })));
}

// ============================================================================
// Requirement specs
// ============================================================================

#[test]
fn test_parse_requirement_spec() {
    let req = Requirement::from_str("language/perl/DateTime@>=1.50,<2").unwrap();
    assert_eq!(req.namespace, "language/perl");
    assert_eq!(req.name, "DateTime");
    assert_eq!(
        req.version_constraints,
        vec![
            VersionConstraint::new(Comparator::Gte, "1.50"),
            VersionConstraint::new(Comparator::Lt, "2"),
        ]
    );
    assert_eq!(req.to_string(), "language/perl/DateTime@>=1.50,<2");
}

#[test]
fn test_bare_version_means_equal() {
    let req = Requirement::from_str("language/perl@5.36.0").unwrap();
    assert_eq!(
        req.version_constraints,
        vec![VersionConstraint::new(Comparator::Eq, "5.36.0")]
    );
}

#[test]
fn test_spec_without_version() {
    let req = Requirement::from_str("language/perl").unwrap();
    assert!(req.version_constraints.is_empty());
    assert_eq!(req.to_string(), "language/perl");
}

#[test]
fn test_invalid_specs() {
    for spec in ["perl", "language/perl@>=", "language/perl@", "/perl"] {
        assert!(
            matches!(
                Requirement::from_str(spec),
                Err(RequirementError::InvalidSpec { .. })
            ),
            "Failed for spec: {}",
            spec
        );
    }
}

#[test]
fn test_comparator_wire_names() {
    assert_eq!(serde_json::to_string(&Comparator::Gte).unwrap(), "\"gte\"");
    assert_eq!(Comparator::from_str("lte").unwrap(), Comparator::Lte);
    assert!(matches!(
        Comparator::from_str("~"),
        Err(RequirementError::UnknownComparator(_))
    ));
}
