//! End-to-end validation of documents against rule sets
//!
//! These tests load real values and rules files from temporary charts and
//! check the findings produced for each kind of rule failure.

mod common;

use common::Chart;
use helm_cel::config::rules_file::parse_rules;
use helm_cel::config::values::parse_document;
use helm_cel::engine::{ValidationOutcome, Validator};
use helm_cel::error::{ExpandError, ValidateError};
use helm_cel::types::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

fn validate(values: &str, rules: &str) -> ValidationOutcome {
    let document = assert_ok!(parse_document(values), "values should parse");
    let rules = assert_ok!(parse_rules(rules), "rules should parse");
    assert_ok!(Validator::new().validate(&document, &rules))
}

#[test]
fn test_passing_rules_produce_empty_outcome() {
    let outcome = validate(
        "replicas: 3\nservice:\n  port: 80\n",
        r#"
rules:
  - expr: values.replicas >= 1
    desc: at least one replica
  - expr: has(values.service.port)
    desc: service port must be set
"#,
    );
    assert!(outcome.is_success());
    assert!(!outcome.has_warnings());
}

#[test]
fn test_failing_rule_reports_path_and_value() {
    let outcome = validate(
        "service:\n  port: 70000\n",
        r#"
rules:
  - expr: values.service.port <= 65535
    desc: port must be valid
"#,
    );
    assert_eq!(outcome.errors.len(), 1);
    let finding = &outcome.errors[0];
    assert_eq!(finding.description, "port must be valid");
    assert_eq!(finding.expression, "values.service.port <= 65535");
    assert_eq!(finding.path.as_deref(), Some("service.port"));
    assert_eq!(finding.value, Some(Value::from(70000)));
}

#[test]
fn test_parameterized_macro_failure() {
    let outcome = validate(
        "port: 70000\n",
        r#"
expressions:
  inRange: "$0 >= $1 && $0 <= $2"
rules:
  - expr: "${inRange(values.port, 1, 65535)}"
    desc: port in range
"#,
    );
    assert_eq!(outcome.errors.len(), 1);
    let finding = &outcome.errors[0];
    assert_eq!(
        finding.expression,
        "(values.port >= 1 && values.port <= 65535)"
    );
    assert_eq!(finding.path.as_deref(), Some("port"));
    assert_eq!(finding.value, Some(Value::from(70000)));
}

#[test]
fn test_presence_failure_points_at_parent() {
    let outcome = validate(
        "service:\n  type: ClusterIP\n",
        r#"
rules:
  - expr: has(values.service)&&has(values.service.port)
    desc: service port required
"#,
    );
    assert_eq!(outcome.errors.len(), 1);
    let finding = &outcome.errors[0];
    assert_eq!(finding.path.as_deref(), Some("service"));

    let mut expected = BTreeMap::new();
    expected.insert("type".to_string(), Value::from("ClusterIP"));
    assert_eq!(finding.value, Some(Value::Mapping(expected)));
}

#[test]
fn test_warning_rule_does_not_fail_validation() {
    let outcome = validate(
        "replicas: 1\n",
        r#"
rules:
  - expr: values.replicas > 1
    desc: consider more replicas
    severity: warning
"#,
    );
    assert!(!outcome.has_errors());
    assert!(outcome.has_warnings());
    assert_eq!(outcome.warnings[0].description, "consider more replicas");
    assert_eq!(outcome.warnings[0].value, Some(Value::from(1)));
}

#[test]
fn test_compile_error_is_always_an_error() {
    let outcome = validate(
        "replicas: 1\n",
        r#"
rules:
  - expr: values.replicas >
    desc: broken rule
    severity: warning
"#,
    );
    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.errors.len(), 1);
    assert!(
        outcome.errors[0]
            .description
            .starts_with("Invalid rule syntax in 'broken rule': ")
    );
}

#[test]
fn test_deeply_nested_rule_is_reported_not_fatal() {
    let nested = format!("{}values.replicas > 0{}", "(".repeat(1000), ")".repeat(1000));
    let rules = format!(
        "rules:\n  - expr: \"{}\"\n    desc: nested rule\n    severity: warning\n  - expr: values.replicas > 5\n    desc: enough replicas\n",
        nested
    );

    let outcome = std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(move || validate("replicas: 1\n", &rules))
        .unwrap()
        .join()
        .unwrap();

    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.errors.len(), 2);
    assert!(
        outcome.errors[0]
            .description
            .starts_with("Invalid rule syntax in 'nested rule': ")
    );
    assert!(
        outcome.errors[0]
            .description
            .contains("expression recursion limit exceeded")
    );
    assert_eq!(outcome.errors[1].description, "enough replicas");
}

#[test]
fn test_runtime_error_uses_rule_severity() {
    let outcome = validate(
        "service: {}\n",
        r#"
rules:
  - expr: values.service.port > 0
    desc: port must be positive
    severity: warning
"#,
    );
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].path.as_deref(), Some("port"));
    assert_eq!(outcome.warnings[0].value, None);
}

#[test]
fn test_errors_keep_declaration_order() {
    let outcome = validate(
        "a: 1\nb: 2\n",
        r#"
rules:
  - expr: values.a > 10
    desc: first
  - expr: values.b > 10
    desc: second
"#,
    );
    let descriptions: Vec<&str> = outcome
        .errors
        .iter()
        .map(|f| f.description.as_str())
        .collect();
    assert_eq!(descriptions, vec!["first", "second"]);
    assert!(outcome.warnings.is_empty());
}

#[test]
fn test_comprehensions_over_lists() {
    let outcome = validate(
        r#"
ingress:
  hosts:
    - host: a.example.com
      port: 80
    - host: b.example.com
      port: 443
"#,
        r#"
rules:
  - expr: values.ingress.hosts.all(h, h.port in [80, 443])
    desc: only web ports
  - expr: values.ingress.hosts.exists(h, h.host.endsWith('.example.com'))
    desc: example host present
  - expr: size(values.ingress.hosts.filter(h, h.port == 443)) == 1
    desc: exactly one tls host
"#,
    );
    assert!(outcome.is_success(), "unexpected findings: {:?}", outcome);
}

#[test]
fn test_expansion_failure_aborts_run() {
    let document = parse_document("a: 1\n").unwrap();
    let rules = parse_rules(
        r#"
rules:
  - expr: values.a == 1
    desc: fine
  - expr: "${undefined}"
    desc: broken
"#,
    )
    .unwrap();
    let err = Validator::new().validate(&document, &rules).unwrap_err();
    match err {
        ValidateError::Expand { rule, source } => {
            assert_eq!(rule, "broken");
            assert_eq!(
                source,
                ExpandError::UndefinedReference("${undefined}".to_string())
            );
        }
        other => panic!("Expected expansion error, got {:?}", other),
    }
}

#[test]
fn test_validate_chart_merges_values_files() {
    let chart = Chart::new()
        .values("service:\n  port: 80\n  type: ClusterIP\n")
        .file("prod.yaml", "service:\n  port: 8443\n")
        .rules(
            r#"
rules:
  - expr: values.service.port == 8443
    desc: production port
  - expr: values.service.type == 'ClusterIP'
    desc: type survives merge
"#,
        );

    let outcome = Validator::new()
        .validate_chart(
            chart.path(),
            &[PathBuf::from("values.yaml"), PathBuf::from("prod.yaml")],
            &[PathBuf::from("values.cel.yaml")],
        )
        .unwrap();
    assert!(outcome.is_success(), "unexpected findings: {:?}", outcome);
}

#[test]
fn test_validate_chart_concatenates_rules_files() {
    let chart = Chart::new()
        .values("replicas: 0\n")
        .rules(
            r#"
expressions:
  positive: "$0 > 0"
rules:
  - expr: "${positive(values.replicas)}"
    desc: replicas positive
"#,
        )
        .file(
            "extra.cel.yaml",
            r#"
rules:
  - expr: "${positive(values.replicas + 1)}"
    desc: macro from another file
"#,
        );

    let outcome = Validator::new()
        .validate_chart(
            chart.path(),
            &[PathBuf::from("values.yaml")],
            &[PathBuf::from("values.cel.yaml"), PathBuf::from("extra.cel.yaml")],
        )
        .unwrap();
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].description, "replicas positive");
}

#[test]
fn test_validate_chart_missing_rules_file() {
    let chart = Chart::new().values("a: 1\n");
    let err = Validator::new()
        .validate_chart(
            chart.path(),
            &[PathBuf::from("values.yaml")],
            &[PathBuf::from("values.cel.yaml")],
        )
        .unwrap_err();
    assert!(matches!(err, ValidateError::Rules(_)));
    assert!(err.to_string().starts_with("failed to load rules: "));
}

#[test]
fn test_empty_rules_file_is_success() {
    let chart = Chart::new().values("a: 1\n").rules("");
    let outcome = Validator::new()
        .validate_chart(
            chart.path(),
            &[PathBuf::from("values.yaml")],
            &[PathBuf::from("values.cel.yaml")],
        )
        .unwrap();
    assert!(outcome.is_success());
}
