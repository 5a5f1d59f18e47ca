//! Task discovery.
//!
//! Walks parsed documents and the [`SourceMap`] side by side so that every
//! task mapping found in the value tree is paired with the text lines it came
//! from. Plays contribute their task sections; `block`/`rescue`/`always`
//! recurse; top-level mappings (vars files, metadata) hold no tasks.

use super::directives::BLOCK_SECTIONS;
use crate::locate::{ItemSpan, SourceMap, Span};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

/// Play keys holding task lists, in the order Ansible runs them.
pub const PLAY_TASK_SECTIONS: &[&str] = &["pre_tasks", "tasks", "post_tasks", "handlers"];

/// Keys that only appear on plays.
const PLAY_MARKERS: &[&str] = &[
    "hosts",
    "import_playbook",
    "ansible.builtin.import_playbook",
    "roles",
];

/// One task mapping found during traversal.
#[derive(Debug, Clone, Copy)]
pub struct TaskNode<'a> {
    /// The task's keys and values.
    pub mapping: &'a Mapping,
    /// Nesting depth: 0 for top-level task files, 1 inside a play, +1 per block.
    pub depth: usize,
    /// Position in traversal (document) order.
    pub ordinal: usize,
    /// Text extent, when the item could be matched in the source.
    pub item: Option<ItemSpan>,
}

/// Parses every document of a YAML stream.
pub fn parse_documents(content: &str) -> Result<Vec<Value>, serde_yaml::Error> {
    let mut docs = Vec::new();
    for document in serde_yaml::Deserializer::from_str(content) {
        docs.push(Value::deserialize(document)?);
    }
    Ok(docs)
}

/// Returns true if a top-level sequence entry is a play rather than a task.
pub fn is_play(entry: &Mapping) -> bool {
    PLAY_MARKERS
        .iter()
        .chain(PLAY_TASK_SECTIONS)
        .any(|key| entry.contains_key(*key))
}

/// Collects all task mappings of `docs` in document order.
pub fn collect_tasks<'v>(docs: &'v [Value], source: &SourceMap<'_>) -> Vec<TaskNode<'v>> {
    let mut collector = Collector {
        source,
        tasks: Vec::new(),
    };
    // both sides skip null documents
    let spans = source.documents();

    for (idx, doc) in docs.iter().filter(|d| !d.is_null()).enumerate() {
        let Value::Sequence(entries) = doc else {
            continue;
        };
        let items = spans
            .get(idx)
            .map(|w| source.sequence_items(*w))
            .unwrap_or_default();

        for (i, entry) in entries.iter().enumerate() {
            let item = items.get(i).copied();
            match entry.as_mapping() {
                Some(play) if is_play(play) => collector.walk_play(play, item),
                Some(_) => collector.walk_task(entry, item, 0),
                None => {}
            }
        }
    }

    collector.tasks
}

struct Collector<'v, 's, 'a> {
    source: &'s SourceMap<'a>,
    tasks: Vec<TaskNode<'v>>,
}

impl<'v> Collector<'v, '_, '_> {
    fn walk_play(&mut self, play: &'v Mapping, item: Option<ItemSpan>) {
        for (key, value) in play {
            let Some(section) = key.as_str() else {
                continue;
            };
            if !PLAY_TASK_SECTIONS.contains(&section) {
                continue;
            }
            if let Some(list) = value.as_sequence() {
                let window = item.and_then(|it| self.child_window(&it, section));
                self.walk_task_list(list, window, 1);
            }
        }
    }

    fn walk_task_list(&mut self, list: &'v [Value], window: Option<Span>, depth: usize) {
        let items = window
            .map(|w| self.source.sequence_items(w))
            .unwrap_or_default();
        for (idx, value) in list.iter().enumerate() {
            self.walk_task(value, items.get(idx).copied(), depth);
        }
    }

    fn walk_task(&mut self, value: &'v Value, item: Option<ItemSpan>, depth: usize) {
        let Some(mapping) = value.as_mapping() else {
            return;
        };
        self.tasks.push(TaskNode {
            mapping,
            depth,
            ordinal: self.tasks.len(),
            item,
        });

        for (key, nested) in mapping {
            let Some(section) = key.as_str() else {
                continue;
            };
            if !BLOCK_SECTIONS.contains(&section) {
                continue;
            }
            if let Some(list) = nested.as_sequence() {
                let window = item.and_then(|it| self.child_window(&it, section));
                self.walk_task_list(list, window, depth + 1);
            }
        }
    }

    fn child_window(&self, item: &ItemSpan, key: &str) -> Option<Span> {
        let col = item.key_col?;
        let loc = self.source.find_key(item, key)?;
        Some(self.source.value_window(&loc, col, item.lines))
    }
}
