//! Task directives: keys that control how a task runs and never name a module.

use std::collections::HashSet;

/// Keys reserved by the task grammar.
///
/// `with_*` lookup loops are matched by prefix in
/// [`ReservedDirectives::contains`] in addition to the listed ones.
pub const TASK_DIRECTIVES: &[&str] = &[
    "name", "when", "tags", "become", "become_user", "become_method",
    "become_flags", "become_exe", "register", "notify", "listen",
    "loop", "loop_control", "with_items", "with_dict", "with_fileglob",
    "with_first_found", "with_together", "with_nested", "with_sequence",
    "with_subelements", "with_indexed_items", "with_random_choice",
    "vars", "block", "rescue", "always", "include", "include_tasks",
    "import_tasks", "import_playbook", "delegate_to", "delegate_facts",
    "local_action", "action", "args", "run_once", "ignore_errors",
    "ignore_unreachable", "changed_when", "failed_when", "until",
    "retries", "delay", "async", "poll", "environment", "no_log",
    "check_mode", "diff", "connection", "throttle", "timeout",
    "any_errors_fatal", "module_defaults", "collections", "debugger",
    "remote_user", "port",
];

/// Keys that hold nested task lists.
pub const BLOCK_SECTIONS: &[&str] = &["block", "rescue", "always"];

/// Keys that introduce the `action`/`local_action` module form.
pub const ACTION_DIRECTIVES: &[&str] = &["action", "local_action"];

/// Closed set of task directive names.
#[derive(Debug, Clone)]
pub struct ReservedDirectives {
    names: HashSet<&'static str>,
}

impl Default for ReservedDirectives {
    fn default() -> Self {
        Self::new()
    }
}

impl ReservedDirectives {
    pub fn new() -> Self {
        Self {
            names: TASK_DIRECTIVES.iter().copied().collect(),
        }
    }

    /// Returns true if `key` is a task directive.
    pub fn contains(&self, key: &str) -> bool {
        self.names.contains(key) || key.starts_with("with_")
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
