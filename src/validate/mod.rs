//! FQCN compliance validation.
//!
//! Uses the same task discovery and classification as the converter, but
//! only reports. Each module invocation is checked against these rules:
//!
//! | Invocation | Severity | Counts as FQCN |
//! |---|---|---|
//! | short name with a table entry | error | no |
//! | three-segment FQCN, known collection | - | yes |
//! | three-segment FQCN, unknown collection | info | yes |
//! | other dotted name | warning | no |
//! | plausible short name without entry | warning | no |

mod types;

pub use types::{rules, Severity, ValidationIssue, ValidationResult};

use crate::classify::{collect_tasks, parse_documents, Classifier, ModuleInvocation};
use crate::convert::{quote_list, task_label};
use crate::error::Error;
use crate::locate::{estimate_line, ItemSpan, KeyLocation, SourceMap};
use crate::mapping::{Fqcn, MappingTable};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info_span};

/// Scores FQCN compliance without modifying content.
#[derive(Debug, Clone)]
pub struct Validator {
    table: Arc<MappingTable>,
}

impl Validator {
    pub fn new(table: Arc<MappingTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &MappingTable {
        &self.table
    }

    /// Validates content. Malformed YAML is reported, not raised.
    pub fn validate_content(&self, content: &str) -> ValidationResult {
        self.validate_source(content, None)
    }

    /// Validates a file. Read failures are reported like parse failures.
    pub fn validate_file(&self, path: impl AsRef<Path>) -> ValidationResult {
        let path = path.as_ref();
        let _span = info_span!("validate_file", path = %path.display()).entered();

        let mut result = match std::fs::read_to_string(path) {
            Ok(content) => self.validate_source(&content, Some(path)),
            Err(e) => ValidationResult::failed(&Error::file_access(path, e)),
        };
        result.file_path = Some(path.to_path_buf());
        debug!("{}", result.summary());
        result
    }

    fn validate_source(&self, content: &str, path: Option<&Path>) -> ValidationResult {
        let docs = match parse_documents(content) {
            Ok(docs) => docs,
            Err(e) => return ValidationResult::failed(&Error::parse(path.map(Path::to_path_buf), &e)),
        };

        let source = SourceMap::new(content);
        let classifier = Classifier::new(&self.table);
        let mut issues = Vec::new();
        let mut total = 0usize;
        let mut fqcn_count = 0usize;
        let mut cursor = 0usize;

        for task in collect_tasks(&docs, &source) {
            let classification = classifier.classify_task(task.mapping);
            let Some(invocation) = classification.invocation.as_ref() else {
                continue;
            };

            let from = task.item.map(|i| i.key_line).unwrap_or(cursor);
            let (line, column) = match attribute(&source, task.item.as_ref(), invocation, from) {
                Some(loc) => {
                    cursor = loc.line;
                    (loc.line_number(), Some(loc.column_number()))
                }
                None => (estimate_line(task.ordinal), None),
            };

            if classification.is_ambiguous() {
                issues.push(
                    ValidationIssue::new(
                        rules::AMBIGUOUS,
                        Severity::Warning,
                        line,
                        format!(
                            "Task {} has several module keys; '{}' is treated as the module, {} as parameters",
                            task_label(task.mapping, task.ordinal),
                            invocation.name,
                            quote_list(&classification.ignored_candidates)
                        ),
                    )
                    .with_module(invocation.name.as_str()),
                );
            }

            let name = invocation.name.as_str();
            let issue = if let Some(fqcn) = self.table.lookup(name) {
                total += 1;
                Some(
                    ValidationIssue::new(
                        rules::SHORT_NAME,
                        Severity::Error,
                        line,
                        format!("Module '{}' is not using its FQCN", name),
                    )
                    .with_suggestion(format!("Use '{}' instead of '{}'", fqcn, name)),
                )
            } else if let Ok(parsed) = name.parse::<Fqcn>() {
                total += 1;
                fqcn_count += 1;
                (!self.table.is_known_collection(&parsed)).then(|| {
                    ValidationIssue::new(
                        rules::THIRD_PARTY,
                        Severity::Info,
                        line,
                        format!(
                            "Module '{}' comes from collection '{}', which is not in the mapping table",
                            name,
                            parsed.collection_fqn()
                        ),
                    )
                })
            } else if name.contains('.') && classifier.looks_like_module(name) {
                total += 1;
                Some(
                    ValidationIssue::new(
                        rules::MALFORMED,
                        Severity::Warning,
                        line,
                        format!("Module '{}' is dotted but not a namespace.collection.module name", name),
                    )
                    .with_suggestion("An FQCN has exactly three non-empty segments"),
                )
            } else if classifier.looks_like_module(name) {
                total += 1;
                Some(
                    ValidationIssue::new(
                        rules::UNKNOWN_MODULE,
                        Severity::Warning,
                        line,
                        format!("Unrecognized module '{}'", name),
                    )
                    .with_suggestion(
                        "Check the spelling or add a mapping for it to use its FQCN",
                    ),
                )
            } else {
                // templated or otherwise not a module name
                debug!("Ignoring non-module invocation '{}' at line {}", name, line);
                None
            };

            if let Some(issue) = issue {
                issues.push(issue.with_column(column).with_module(name));
            }
        }

        let mut result = ValidationResult::from_counts(total, fqcn_count, issues);
        result.file_path = path.map(Path::to_path_buf);
        result
    }
}

/// Exact position, else the first `<key>:` at or after `from`.
fn attribute(
    source: &SourceMap<'_>,
    item: Option<&ItemSpan>,
    invocation: &ModuleInvocation,
    from: usize,
) -> Option<KeyLocation> {
    item.and_then(|item| invocation.locate(source, item))
        .or_else(|| source.search_key(invocation.search_key(), from))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> Validator {
        Validator::new(Arc::new(MappingTable::bundled()))
    }

    #[test]
    fn test_short_name_is_error_with_suggestion() {
        let result = validator().validate_content("- name: t\n  copy:\n    src: a\n");
        assert!(!result.valid);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.issues.len(), 1);
        let issue = &result.issues[0];
        assert_eq!(issue.severity, Severity::Error);
        assert_eq!(issue.line, 2);
        assert_eq!(issue.column, Some(3));
        assert!(issue.suggestion.as_deref().unwrap().contains("ansible.builtin.copy"));
    }

    #[test]
    fn test_compliant_content() {
        let result = validator()
            .validate_content("- name: t\n  ansible.builtin.copy:\n    src: a\n    dest: b\n");
        assert!(result.valid);
        assert_eq!(result.score, 1.0);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_mixed_score() {
        let content = "\
- ansible.builtin.copy: {}
- service: {name: x}
- ansible.builtin.file: {}
- community.general.ufw: {}
";
        let result = validator().validate_content(content);
        assert_eq!(result.modules_total, 4);
        assert_eq!(result.modules_fqcn, 3);
        assert_eq!(result.score, 0.75);
        assert_eq!(result.errors().count(), 1);
    }

    #[test]
    fn test_unknown_module_warns() {
        let result = validator().validate_content("- name: t\n  unknown_mod: {}\n");
        assert!(result.valid);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].severity, Severity::Warning);
        assert_eq!(result.issues[0].rule_id, rules::UNKNOWN_MODULE);
    }

    #[test]
    fn test_third_party_collection_is_info() {
        let result = validator().validate_content("- acme.tools.thing: {}\n");
        assert!(result.valid);
        assert_eq!(result.score, 1.0);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].severity, Severity::Info);
    }

    #[test]
    fn test_malformed_dotted_name_warns() {
        let result = validator().validate_content("- builtin.copy: {}\n");
        assert_eq!(result.issues[0].rule_id, rules::MALFORMED);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn test_empty_and_module_free_documents() {
        for content in ["", "# nothing\n", "foo: bar\n", "- name: b\n  block:\n    - debug_var: {}\n"] {
            let result = validator().validate_content(content);
            assert!(result.valid, "{}", content);
        }
        let result = validator().validate_content("key: value\n");
        assert_eq!(result.score, 1.0);
    }

    #[test]
    fn test_parse_failure_reports() {
        let result = validator().validate_content("- name: a\n  copy: [1, 2\n");
        assert!(!result.valid);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].severity, Severity::Error);
    }

    #[test]
    fn test_parameter_named_like_module_not_counted() {
        let result = validator().validate_content("- user:\n    name: u\n    group: admin\n");
        assert_eq!(result.modules_total, 1);
        assert_eq!(result.issues.len(), 1);
        assert!(result.issues[0].message.contains("'user'"));
    }

    #[test]
    fn test_ambiguous_task_warns() {
        let result = validator().validate_content("- ansible.builtin.copy: {}\n  template: {}\n");
        assert!(result.valid);
        assert_eq!(result.modules_total, 1);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].rule_id, rules::AMBIGUOUS);
    }

    #[test]
    fn test_missing_file() {
        let result = validator().validate_file("/definitely/not/here.yml");
        assert!(!result.valid);
        assert_eq!(result.error_kind, Some(crate::error::ErrorKind::FileAccess));
        assert_eq!(result.issues[0].rule_id, rules::FILE_ACCESS);
    }
}
