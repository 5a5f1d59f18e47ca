//! Property tests for conversion and validation.

mod common;

use common::*;
use fqcn_converter::validate::rules;
use proptest::prelude::*;

const MODULE_NAMES: &[&str] = &[
    "copy",
    "file",
    "user",
    "group",
    "service",
    "template",
    "ping",
    "debug",
    "ufw",
    "mount",
    "ansible.builtin.copy",
    "ansible.posix.sysctl",
    "community.general.ufw",
    "acme.widgets.frobnicate",
    "unknown_mod",
];

/// Parameter names, several of which are also module names.
const PARAM_NAMES: &[&str] = &["name", "group", "file", "src", "state", "user", "mode"];

#[derive(Debug, Clone)]
struct TaskSpec {
    module: &'static str,
    params: Vec<(&'static str, u8)>,
    when: bool,
    /// `- {name: ..., module: {...}}` on one line instead of block style
    flow: bool,
}

fn task_spec() -> impl Strategy<Value = TaskSpec> {
    (
        prop::sample::select(MODULE_NAMES),
        prop::collection::vec((prop::sample::select(PARAM_NAMES), any::<u8>()), 0..4),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(module, params, when, flow)| TaskSpec {
            module,
            params,
            when,
            flow,
        })
}

fn unique_params(task: &TaskSpec) -> Vec<(&'static str, u8)> {
    let mut seen = std::collections::HashSet::new();
    task.params
        .iter()
        .filter(|(param, _)| seen.insert(*param))
        .copied()
        .collect()
}

/// Renders `tasks`, spelling each module key as `module_key` returns it.
///
/// Task names quote the short module name followed by a colon, so only a
/// locator that respects quoting rewrites the right token.
fn render_with(tasks: &[TaskSpec], module_key: impl Fn(&str) -> String) -> String {
    let mut out = String::from("---\n");
    for (i, task) in tasks.iter().enumerate() {
        let name = format!("\"task {} runs {}: now\"", i, task.module);
        let key = module_key(task.module);
        let params = unique_params(task);

        if task.flow {
            let params: Vec<String> = params
                .iter()
                .map(|(param, value)| format!("{}: v{}", param, value))
                .collect();
            let when = if task.when { ", when: flag | bool" } else { "" };
            out.push_str(&format!(
                "- {{name: {}, {}: {{{}}}{}}}\n",
                name,
                key,
                params.join(", "),
                when
            ));
            continue;
        }

        out.push_str(&format!("- name: {}\n", name));
        if params.is_empty() {
            out.push_str(&format!("  {}: {{}}\n", key));
        } else {
            out.push_str(&format!("  {}:\n", key));
            for (param, value) in &params {
                out.push_str(&format!("    {}: v{}\n", param, value));
            }
        }
        if task.when {
            out.push_str("  when: flag | bool\n");
        }
    }
    out
}

fn render(tasks: &[TaskSpec]) -> String {
    render_with(tasks, str::to_string)
}

/// What conversion should produce: module keys resolved, everything else kept.
fn render_converted(tasks: &[TaskSpec]) -> String {
    let table = bundled();
    render_with(tasks, |module| table.lookup(module).unwrap_or(module).to_string())
}

proptest! {
    #[test]
    fn prop_conversion_is_idempotent(tasks in prop::collection::vec(task_spec(), 1..8)) {
        let doc = render(&tasks);
        let first = converter().convert_content(&doc);
        prop_assert!(first.success);

        let second = converter().convert_content(&first.converted_content);
        prop_assert!(second.success);
        prop_assert_eq!(second.changes_made, 0);
        prop_assert_eq!(&second.converted_content, &first.converted_content);
    }

    #[test]
    fn prop_only_module_keys_change(tasks in prop::collection::vec(task_spec(), 1..8)) {
        let doc = render(&tasks);
        let result = converter().convert_content(&doc);

        let before: Vec<&str> = doc.lines().collect();
        let after: Vec<&str> = result.converted_content.lines().collect();
        prop_assert_eq!(before.len(), after.len());

        let changed: Vec<usize> = before
            .iter()
            .zip(&after)
            .enumerate()
            .filter(|(_, (b, a))| b != a)
            .map(|(i, _)| i + 1)
            .collect();
        let converted: Vec<usize> = result.conversions.iter().map(|c| c.line).collect();
        prop_assert_eq!(changed, converted);
        prop_assert_eq!(&result.converted_content, &render_converted(&tasks));

        // parameters are never rewritten
        for line in &after {
            if line.starts_with("    ") {
                prop_assert!(!line.contains("ansible.builtin."), "parameter rewritten: {}", line);
            }
        }
    }

    #[test]
    fn prop_score_never_decreases(tasks in prop::collection::vec(task_spec(), 1..8)) {
        let doc = render(&tasks);
        let before = validator().validate_content(&doc);
        let converted = converter().convert_content(&doc);
        let after = validator().validate_content(&converted.converted_content);

        prop_assert!(after.score >= before.score);
        prop_assert_eq!(after.modules_total, before.modules_total);
        prop_assert!(after.issues.iter().all(|i| i.rule_id != rules::SHORT_NAME));
        prop_assert!(after.valid);
    }

    #[test]
    fn prop_mapping_entry_converts_alone(index in any::<prop::sample::Index>()) {
        let table = bundled();
        let entries: Vec<(&str, &str)> = table.iter().collect();
        let (short, fqcn) = entries[index.index(entries.len())];

        let result = converter().convert_content(&format!("- {}:\n    x: 1\n", short));
        prop_assert_eq!(result.changes_made, 1);
        prop_assert_eq!(result.converted_content, format!("- {}:\n    x: 1\n", fqcn));
    }
}

#[test]
fn test_every_mapping_entry_converts() {
    let table = bundled();
    let converter = converter();
    for (short, fqcn) in table.iter() {
        let result = converter.convert_content(&format!("- {}: {{}}\n", short));
        assert_eq!(result.changes_made, 1, "{} was not converted", short);
        assert_eq!(result.conversions[0].fqcn, fqcn);
        assert_eq!(result.converted_content, format!("- {}: {{}}\n", fqcn));
    }
}

#[test]
fn test_compliant_document_round_trip() {
    let table = bundled();
    let doc: String = table
        .iter()
        .take(20)
        .map(|(_, fqcn)| format!("- name: uses {}\n  {}: {{}}\n", fqcn, fqcn))
        .collect();

    let result = validator().validate_content(&doc);
    assert!(result.valid);
    assert_eq!(result.score, 1.0);
    assert!(result.issues.is_empty());
    assert_eq!(result.modules_total, 20);
}
