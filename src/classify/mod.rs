//! Module/parameter classification.
//!
//! Decides, for each key of a task mapping, whether it is a task directive,
//! the task's module invocation, a parameter belonging to that invocation, or
//! something unrecognisable. This is the piece that keeps a `user` task's
//! `group:` parameter from being mistaken for the `group` module.
//!
//! # Multi-module tasks
//!
//! A task may only invoke one module. When more than one key qualifies, the
//! first one in document order that is known (mapping-table entry or FQCN
//! form) is the invocation, falling back to the first candidate. Every other
//! candidate is classified [`KeyClass::Parameter`] of that invocation and
//! reported through [`TaskClassification::ignored_candidates`].

mod directives;
mod walker;

pub use directives::{ReservedDirectives, ACTION_DIRECTIVES, BLOCK_SECTIONS, TASK_DIRECTIVES};
pub use walker::{collect_tasks, is_play, parse_documents, TaskNode, PLAY_TASK_SECTIONS};

use crate::locate::{ItemSpan, KeyLocation, SourceMap};
use crate::mapping::{Fqcn, MappingTable};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_yaml::{Mapping, Value};

static MODULE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_.]*$").expect("module name pattern is valid")
});

/// Keys that look like identifiers but are never worth an "unknown module" warning.
const NON_MODULE_PREFIXES: &[&str] = &["include", "import"];
const NON_MODULE_NAMES: &[&str] = &["block", "rescue", "always", "meta"];

/// Classification of one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyClass {
    /// Reserved task directive (`name`, `when`, ...).
    Directive,
    /// The task's module invocation.
    ModuleCandidate,
    /// Consumed by an enclosing module invocation.
    Parameter,
    /// Neither a directive nor a plausible module name.
    Unknown,
}

/// Where a key sits relative to the task it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPosition<'a> {
    /// Direct key of a task mapping.
    TaskKey,
    /// Nested in the parameter block of the named module.
    UnderModule(&'a str),
}

/// How a task names its module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "form")]
pub enum InvocationForm {
    /// `copy: {...}` / `copy: src=a dest=b`
    Key,
    /// `action: copy src=a` or `action: {module: copy, ...}`
    Action {
        /// `action` or `local_action`
        directive: String,
        /// True for the `module:` mapping form.
        mapping: bool,
    },
}

/// The module a task invokes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleInvocation {
    pub name: String,
    #[serde(flatten)]
    pub form: InvocationForm,
}

impl ModuleInvocation {
    /// Exact text position of the module name inside a task item.
    ///
    /// For the key form this is the key itself; for `action:` forms it is the
    /// module word in the directive's value (or in its `module:` entry).
    pub fn locate(&self, source: &SourceMap<'_>, item: &ItemSpan) -> Option<KeyLocation> {
        if item.alias {
            return None;
        }
        match &self.form {
            InvocationForm::Key => source.find_key(item, &self.name),
            InvocationForm::Action { directive, mapping: false } => {
                let key = source.find_key(item, directive)?;
                source.inline_value(&key, &self.name)
            }
            InvocationForm::Action { directive, mapping: true } => {
                let key = source.find_key(item, directive)?;
                if let Some(open) = source.flow_value_open(&key) {
                    let module = source.flow_mapping_key(key.line, open, item.lines.end, "module")?;
                    return source.inline_value(&module, &self.name);
                }
                let window = source.value_window(&key, item.key_col?, item.lines);
                let block = source.mapping_block(window)?;
                let module = source.find_key(&block, "module")?;
                source.inline_value(&module, &self.name)
            }
        }
    }

    /// Key to search for when the exact position is unknown.
    pub fn search_key(&self) -> &str {
        match &self.form {
            InvocationForm::Key => &self.name,
            InvocationForm::Action { directive, .. } => directive,
        }
    }
}

/// A task key with its classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedKey {
    pub key: String,
    pub class: KeyClass,
    /// Module this key belongs to, for parameters.
    pub enclosing: Option<String>,
}

/// Classification of all keys of one task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskClassification {
    pub keys: Vec<ClassifiedKey>,
    pub invocation: Option<ModuleInvocation>,
    /// Module-like keys that lost the tie-break to `invocation`.
    pub ignored_candidates: Vec<String>,
}

impl TaskClassification {
    /// True when the task had more than one module-like key.
    pub fn is_ambiguous(&self) -> bool {
        !self.ignored_candidates.is_empty()
    }

    /// Class assigned to `key`, if the task has it.
    pub fn class_of(&self, key: &str) -> Option<KeyClass> {
        self.keys.iter().find(|k| k.key == key).map(|k| k.class)
    }
}

/// Classifies task keys against a mapping table.
#[derive(Debug, Clone)]
pub struct Classifier<'t> {
    table: &'t MappingTable,
    directives: ReservedDirectives,
}

impl<'t> Classifier<'t> {
    pub fn new(table: &'t MappingTable) -> Self {
        Self {
            table,
            directives: ReservedDirectives::new(),
        }
    }

    pub fn table(&self) -> &'t MappingTable {
        self.table
    }

    pub fn is_directive(&self, key: &str) -> bool {
        self.directives.contains(key)
    }

    /// Key resolves through the table or is already an FQCN.
    pub fn is_known_module(&self, key: &str) -> bool {
        self.table.contains(key) || Fqcn::is_fqcn(key)
    }

    /// Heuristic for unknown-but-plausible module names.
    ///
    /// A bare identifier that is not a directive, does not start with `_`,
    /// and is not one of the block/include/import/meta keywords.
    pub fn looks_like_module(&self, key: &str) -> bool {
        MODULE_NAME.is_match(key)
            && !key.starts_with('_')
            && !self.directives.contains(key)
            && !NON_MODULE_NAMES.contains(&key)
            && !NON_MODULE_PREFIXES.iter().any(|p| key.starts_with(p))
    }

    /// Classifies a single key at a given position.
    pub fn classify_key(&self, key: &str, position: KeyPosition<'_>) -> KeyClass {
        match position {
            KeyPosition::UnderModule(_) => KeyClass::Parameter,
            KeyPosition::TaskKey if self.directives.contains(key) => KeyClass::Directive,
            KeyPosition::TaskKey if self.is_known_module(key) || self.looks_like_module(key) => {
                KeyClass::ModuleCandidate
            }
            KeyPosition::TaskKey => KeyClass::Unknown,
        }
    }

    /// Classifies every key of a task mapping and picks its invocation.
    pub fn classify_task(&self, task: &Mapping) -> TaskClassification {
        let candidates: Vec<&str> = task
            .iter()
            .filter_map(|(k, v)| k.as_str().map(|k| (k, v)))
            .filter(|(k, v)| {
                self.classify_key(k, KeyPosition::TaskKey) == KeyClass::ModuleCandidate
                    && is_invocation_value(v)
            })
            .map(|(k, _)| k)
            .collect();

        let chosen = candidates
            .iter()
            .copied()
            .find(|k| self.is_known_module(k))
            .or_else(|| candidates.first().copied());

        let mut out = TaskClassification::default();
        for key in task.keys() {
            let Some(key) = key.as_str() else {
                continue;
            };
            let (class, enclosing) = if Some(key) == chosen {
                (KeyClass::ModuleCandidate, None)
            } else if candidates.contains(&key) {
                out.ignored_candidates.push(key.to_string());
                (KeyClass::Parameter, chosen.map(String::from))
            } else {
                match self.classify_key(key, KeyPosition::TaskKey) {
                    // module-like name whose value cannot be a parameter block
                    KeyClass::ModuleCandidate => (KeyClass::Unknown, None),
                    other => (other, None),
                }
            };
            out.keys.push(ClassifiedKey {
                key: key.to_string(),
                class,
                enclosing,
            });
        }

        out.invocation = match chosen {
            Some(name) => Some(ModuleInvocation {
                name: name.to_string(),
                form: InvocationForm::Key,
            }),
            None => action_invocation(task),
        };
        out
    }
}

/// Values a module key can carry: parameters, free-form string, or nothing.
fn is_invocation_value(value: &Value) -> bool {
    matches!(
        value,
        Value::Null | Value::Mapping(_) | Value::String(_) | Value::Tagged(_)
    )
}

fn action_invocation(task: &Mapping) -> Option<ModuleInvocation> {
    ACTION_DIRECTIVES.iter().find_map(|directive| {
        let (name, mapping) = match task.get(*directive)? {
            Value::String(s) => (s.split_whitespace().next()?.to_string(), false),
            Value::Mapping(m) => (m.get("module")?.as_str()?.to_string(), true),
            _ => return None,
        };
        Some(ModuleInvocation {
            name,
            form: InvocationForm::Action {
                directive: directive.to_string(),
                mapping,
            },
        })
    })
}
