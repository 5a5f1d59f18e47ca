//! Integration tests for FQCN compliance validation.

mod common;

use common::*;
use fqcn_converter::error::ErrorKind;
use fqcn_converter::locate::estimate_line;
use fqcn_converter::validate::{rules, Severity};
use pretty_assertions::assert_eq;

#[test]
fn test_compliant_task_scores_one() {
    let result =
        validator().validate_content("- name: t\n  ansible.builtin.copy:\n    src: a\n    dest: b");

    assert!(result.valid);
    assert_eq!(result.score, 1.0);
    assert!(result.issues.is_empty());
    assert_eq!(result.modules_total, 1);
    assert_eq!(result.modules_fqcn, 1);
}

#[test]
fn test_unknown_module_warns_without_invalidating() {
    let result = validator().validate_content(UNKNOWN_MODULE_TASKS);

    assert!(result.valid);
    assert!(result.score < 1.0);
    assert_eq!(result.issues.len(), 1);
    let issue = &result.issues[0];
    assert_eq!(issue.severity, Severity::Warning);
    assert_eq!(issue.rule_id, rules::UNKNOWN_MODULE);
    assert_eq!(issue.module.as_deref(), Some("unknown_mod"));
    assert_eq!(issue.line, 2);
}

#[test]
fn test_mixed_playbook_issues_and_score() {
    let result = validator().validate_content(MIXED_PLAYBOOK);

    assert!(!result.valid);
    assert_eq!(result.modules_total, 6);
    assert_eq!(result.modules_fqcn, 1);
    assert!((result.score - 1.0 / 6.0).abs() < f64::EPSILON);

    let flagged: Vec<(&str, usize)> = result
        .errors()
        .map(|i| (i.module.as_deref().unwrap_or(""), i.line))
        .collect();
    assert_eq!(
        flagged,
        vec![
            ("package", 9),
            ("user", 14),
            ("template", 25),
            ("debug", 29),
            ("service", 34),
        ]
    );
    assert!(result.errors().all(|i| i.rule_id == rules::SHORT_NAME));
    assert!(result.errors().all(|i| i.suggestion.is_some()));
}

#[test]
fn test_validation_after_conversion_is_clean() {
    let converted = converter().convert_content(MIXED_PLAYBOOK).converted_content;
    let result = validator().validate_content(&converted);

    assert!(result.valid);
    assert_eq!(result.score, 1.0);
    assert!(result.issues.is_empty());
}

#[test]
fn test_third_party_collection_is_informational() {
    let result = validator().validate_content("- acme.widgets.frobnicate:\n    level: 3\n");

    assert!(result.valid);
    assert_eq!(result.score, 1.0);
    assert_eq!(result.issues.len(), 1);
    assert_eq!(result.issues[0].severity, Severity::Info);
    assert_eq!(result.issues[0].rule_id, rules::THIRD_PARTY);
}

#[test]
fn test_unlocatable_key_falls_back_to_estimate() {
    let content = "\
- name: first
  ansible.builtin.debug: {}
- name: second
  \"co\\x70y\": {}
";
    let result = validator().validate_content(content);

    assert_eq!(result.issues.len(), 1);
    let issue = &result.issues[0];
    assert_eq!(issue.rule_id, rules::SHORT_NAME);
    assert_eq!(issue.line, estimate_line(1));
    assert_eq!(issue.column, None);
}

#[test]
fn test_malformed_yaml_reports_parse_error() {
    let result = validator().validate_content(BROKEN_YAML);

    assert!(!result.valid);
    assert_eq!(result.score, 0.0);
    assert_eq!(result.error_kind, Some(ErrorKind::Parse));
    assert_eq!(result.issues[0].rule_id, rules::PARSE);
    assert!(result.clone().into_result().is_err());
}

#[test]
fn test_validate_file_sets_path() {
    let ws = Workspace::new();
    let path = ws.write("handlers/main.yml", "- name: restart\n  service:\n    name: x\n");

    let result = validator().validate_file(&path);

    assert_eq!(result.file_path.as_deref(), Some(path.as_path()));
    assert_eq!(result.errors().count(), 1);
    assert_eq!(result.issues[0].line, 2);
}

#[test]
fn test_missing_file_is_reported() {
    let ws = Workspace::new();
    let result = validator().validate_file(ws.path().join("nope.yml"));

    assert!(!result.valid);
    assert_eq!(result.error_kind, Some(ErrorKind::FileAccess));
    assert_eq!(result.issues[0].rule_id, rules::FILE_ACCESS);
}

#[test]
fn test_meets_threshold_and_strict() {
    let content = "- ansible.builtin.copy: {}\n- unknown_mod: {}\n";
    let result = validator().validate_content(content);

    assert!(result.valid);
    assert_eq!(result.score, 0.5);
    assert!(result.meets(0.5, false));
    assert!(!result.meets(0.75, false));
    assert!(!result.meets(0.0, true));
}
