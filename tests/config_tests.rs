//! Loading of values files, rules files and helm-cel.toml settings

mod common;

use common::Chart;
use helm_cel::config::{Settings, rules_file, values};
use helm_cel::error::{ConfigError, LoadError};
use helm_cel::output::OutputFormat;
use helm_cel::types::{Severity, Value};
use std::path::PathBuf;

#[test]
fn test_values_merge_is_deep_and_ordered() {
    let chart = Chart::new()
        .values("image:\n  repository: nginx\n  tag: '1.25'\nreplicas: 1\nports: [80, 443]\n")
        .file("override.yaml", "image:\n  tag: '1.27'\nports: [8080]\n");

    let merged = values::load_and_merge(&[chart.join("values.yaml"), chart.join("override.yaml")])
        .unwrap();

    let image = merged.get("image").unwrap();
    assert_eq!(image.get("repository"), Some(&Value::from("nginx")));
    assert_eq!(image.get("tag"), Some(&Value::from("1.27")));
    assert_eq!(merged.get("replicas"), Some(&Value::from(1)));
    assert_eq!(
        merged.get("ports"),
        Some(&Value::Sequence(vec![Value::from(8080)]))
    );
}

#[test]
fn test_empty_values_file_is_empty_mapping() {
    let chart = Chart::new().values("");
    let document = values::load_values_file(&chart.join("values.yaml")).unwrap();
    assert_eq!(document, Value::mapping());
}

#[test]
fn test_missing_values_file_names_path() {
    let chart = Chart::new();
    let path = chart.join("values.yaml");
    let err = values::load_and_merge(&[path.clone()]).unwrap_err();
    assert!(matches!(err, LoadError::Read { .. }));
    assert!(!err.is_parse());
    assert!(err.to_string().contains(&path.display().to_string()));
}

#[test]
fn test_malformed_values_file_is_parse_error() {
    let chart = Chart::new().values("key: [unclosed\n");
    let err = values::load_values_file(&chart.join("values.yaml")).unwrap_err();
    assert!(err.is_parse());
    assert!(err.to_string().contains("failed to parse values file"));
}

#[test]
fn test_rules_files_concatenate_and_share_macros() {
    let chart = Chart::new()
        .rules(
            r#"
expressions:
  positive: "$0 > 0"
rules:
  - expr: "${positive(values.a)}"
    desc: a positive
"#,
        )
        .file(
            "extra.cel.yaml",
            r#"
expressions:
  small: "$0 < 10"
rules:
  - expr: "${small(values.a)}"
    desc: a small
    severity: warning
"#,
        );

    let rules =
        rules_file::load_and_merge(&[chart.join("values.cel.yaml"), chart.join("extra.cel.yaml")])
            .unwrap();
    assert_eq!(rules.len(), 2);
    assert_eq!(rules.rules[0].description, "a positive");
    assert_eq!(rules.rules[1].severity, Severity::Warning);
    assert_eq!(rules.macros.len(), 2);
}

#[test]
fn test_duplicate_macro_across_files() {
    let chart = Chart::new()
        .rules("expressions:\n  positive: \"$0 > 0\"\n")
        .file("extra.cel.yaml", "expressions:\n  positive: \"$0 >= 1\"\n");

    let extra = chart.join("extra.cel.yaml");
    let err = rules_file::load_and_merge(&[chart.join("values.cel.yaml"), extra.clone()])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        format!(
            "duplicate named expression 'positive' found in {} (already defined as '$0 > 0')",
            extra.display()
        )
    );
}

#[test]
fn test_unknown_severity_is_error() {
    let rules = rules_file::parse_rules(
        "rules:\n  - expr: values.a > 0\n    desc: a\n    severity: critical\n",
    )
    .unwrap();
    assert_eq!(rules.rules[0].severity, Severity::Error);
}

#[test]
fn test_settings_discovered_in_chart() {
    let chart = Chart::new().file(
        "helm-cel.toml",
        r#"
[validate]
values-files = ["values.yaml", "prod.yaml"]
output = "yaml"

[generate]
output-file = "generated.cel.yaml"
"#,
    );

    let settings = Settings::discover(chart.path()).unwrap();
    assert_eq!(
        settings.validate.values_files,
        vec![PathBuf::from("values.yaml"), PathBuf::from("prod.yaml")]
    );
    assert_eq!(
        settings.validate.rules_files,
        vec![PathBuf::from("values.cel.yaml")]
    );
    assert_eq!(settings.validate.output, OutputFormat::Yaml);
    assert_eq!(settings.generate.values_file, PathBuf::from("values.yaml"));
    assert_eq!(
        settings.generate.output_file,
        PathBuf::from("generated.cel.yaml")
    );
}

#[test]
fn test_settings_syntax_error() {
    let chart = Chart::new().file("helm-cel.toml", "[validate\n");
    let err = Settings::discover(chart.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}
