//! FQCN conversion.
//!
//! The converter never re-serialises YAML. It parses the text to find task
//! invocations, locates each one in the raw text, and replaces exactly the
//! bytes of the module name. Comments, quoting, anchors, block scalars and
//! line endings therefore come through untouched.

use crate::classify::{collect_tasks, parse_documents, Classifier, InvocationForm};
use crate::error::{Error, ErrorKind, Result};
use crate::locate::SourceMap;
use crate::mapping::MappingTable;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn};

/// Suffix appended to a file's path for its pre-conversion copy.
pub const BACKUP_SUFFIX: &str = ".fqcn_backup";

/// One rewritten module name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conversion {
    pub original: String,
    pub fqcn: String,
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
}

/// Outcome of converting one file or one piece of content.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    pub changes_made: usize,
    pub conversions: Vec<Conversion>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(skip)]
    pub original_content: String,
    #[serde(skip)]
    pub converted_content: String,
    #[serde(with = "humantime_serde")]
    pub processing_time: Duration,
    pub backup_created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl ConversionResult {
    fn unchanged(content: &str) -> Self {
        Self {
            success: true,
            file_path: None,
            changes_made: 0,
            conversions: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            original_content: content.to_string(),
            converted_content: content.to_string(),
            processing_time: Duration::ZERO,
            backup_created: false,
            backup_path: None,
            error_kind: None,
        }
    }

    /// A result for a unit that could not be converted at all.
    pub fn failure(file_path: Option<PathBuf>, err: Error) -> Self {
        let mut result = Self::unchanged("");
        result.file_path = file_path;
        result.fail(err);
        result
    }

    fn fail(&mut self, err: Error) {
        self.success = false;
        self.error_kind = Some(err.kind());
        self.errors.push(err.to_string());
    }

    /// Converts a failed result into its error.
    pub fn into_result(self) -> Result<Self> {
        if self.success {
            return Ok(self);
        }
        let message = self.errors.join("; ");
        Err(match self.error_kind {
            Some(ErrorKind::Parse) => Error::Parse {
                path: self.file_path,
                message,
                line: None,
            },
            Some(ErrorKind::FileAccess) => Error::file_access_msg(
                self.file_path.unwrap_or_default(),
                message,
            ),
            _ => Error::Internal(message),
        })
    }

    /// True when the converted content differs from the original.
    pub fn has_changes(&self) -> bool {
        self.changes_made > 0
    }
}

/// Rewrites short module names to their FQCN.
#[derive(Debug, Clone)]
pub struct Converter {
    table: Arc<MappingTable>,
    backup: bool,
}

impl Converter {
    /// Creates a converter over a shared mapping table. Backups are off.
    pub fn new(table: Arc<MappingTable>) -> Self {
        Self {
            table,
            backup: false,
        }
    }

    /// Applies custom mappings on top of the table; they win on collision.
    pub fn with_custom_mappings<I, K, V>(mut self, mappings: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let table = (*self.table).clone().with_overrides(mappings)?;
        self.table = Arc::new(table);
        Ok(self)
    }

    /// Writes `<path>.fqcn_backup` before rewriting a file.
    pub fn with_backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    pub fn table(&self) -> &MappingTable {
        &self.table
    }

    /// Converts content in memory. Never touches the filesystem.
    pub fn convert_content(&self, content: &str) -> ConversionResult {
        self.convert_source(content, None)
    }

    fn convert_source(&self, content: &str, path: Option<&Path>) -> ConversionResult {
        let started = Instant::now();
        let mut result = ConversionResult::unchanged(content);

        let docs = match parse_documents(content) {
            Ok(docs) => docs,
            Err(e) => {
                result.fail(Error::parse(path.map(Path::to_path_buf), &e));
                result.processing_time = started.elapsed();
                return result;
            }
        };

        let source = SourceMap::new(content);
        let classifier = Classifier::new(&self.table);
        let mut edits: BTreeMap<(usize, usize), Edit> = BTreeMap::new();

        for task in collect_tasks(&docs, &source) {
            let classification = classifier.classify_task(task.mapping);
            let Some(invocation) = classification.invocation.as_ref() else {
                continue;
            };

            if classification.is_ambiguous() {
                result.warnings.push(format!(
                    "Task {} has several module keys; converting '{}' and leaving {} as parameters",
                    task_label(task.mapping, task.ordinal),
                    invocation.name,
                    quote_list(&classification.ignored_candidates),
                ));
            }

            let Some(fqcn) = self.table.lookup(&invocation.name) else {
                continue;
            };

            let Some(item) = task.item else {
                result.warnings.push(format!(
                    "Could not locate '{}' of task {} in the source; left unchanged",
                    invocation.name,
                    task_label(task.mapping, task.ordinal)
                ));
                continue;
            };
            if item.alias {
                // rewritten at the anchor
                continue;
            }

            match invocation.locate(&source, &item) {
                Some(loc) => {
                    edits.entry((loc.line, loc.column)).or_insert_with(|| Edit {
                        len: loc.len,
                        original: invocation.name.clone(),
                        replacement: fqcn.to_string(),
                    });
                }
                None => {
                    let how = match invocation.form {
                        InvocationForm::Key => "key",
                        InvocationForm::Action { .. } => "action value",
                    };
                    result.warnings.push(format!(
                        "Could not locate {} '{}' of task {} in the source; left unchanged",
                        how,
                        invocation.name,
                        task_label(task.mapping, task.ordinal)
                    ));
                }
            }
        }

        if edits.is_empty() {
            result.processing_time = started.elapsed();
            return result;
        }

        let converted = apply_edits(content, &edits);
        if let Err(e) = parse_documents(&converted) {
            result.fail(Error::Internal(format!(
                "conversion produced unparsable YAML, nothing changed: {}",
                e
            )));
            result.processing_time = started.elapsed();
            return result;
        }

        for ((line, column), edit) in &edits {
            debug!("{}:{} {} -> {}", line + 1, column + 1, edit.original, edit.replacement);
            result.conversions.push(Conversion {
                original: edit.original.clone(),
                fqcn: edit.replacement.clone(),
                line: line + 1,
                column: column + 1,
            });
        }
        result.changes_made = result.conversions.len();
        result.converted_content = converted;
        result.processing_time = started.elapsed();
        result
    }

    /// Converts a file, writing it back unless `dry_run`.
    ///
    /// Read and write failures are reported in the result with
    /// [`ErrorKind::FileAccess`]. Nothing is written when parsing fails,
    /// when there is nothing to change, or on a dry run.
    pub fn convert_file(&self, path: impl AsRef<Path>, dry_run: bool) -> ConversionResult {
        let path = path.as_ref();
        let _span = info_span!("convert_file", path = %path.display()).entered();
        let started = Instant::now();

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                let mut result =
                    ConversionResult::failure(Some(path.to_path_buf()), Error::file_access(path, e));
                result.processing_time = started.elapsed();
                warn!("{}", result.errors.join("; "));
                return result;
            }
        };

        let mut result = self.convert_source(&content, Some(path));
        result.file_path = Some(path.to_path_buf());

        if result.success && result.has_changes() && !dry_run {
            if self.backup {
                let backup = backup_path(path);
                match std::fs::copy(path, &backup) {
                    Ok(_) => {
                        result.backup_created = true;
                        result.backup_path = Some(backup);
                    }
                    Err(e) => {
                        result.fail(Error::file_access(&backup, e));
                    }
                }
            }
            if result.success {
                if let Err(e) = write_atomic(path, &result.converted_content) {
                    result.fail(e);
                }
            }
        }

        result.processing_time = started.elapsed();
        if result.success {
            info!(
                "{} module(s) converted{}",
                result.changes_made,
                if dry_run { " (dry run)" } else { "" }
            );
        } else {
            warn!("conversion failed: {}", result.errors.join("; "));
        }
        result
    }
}

#[derive(Debug, Clone)]
struct Edit {
    len: usize,
    original: String,
    replacement: String,
}

/// Applies edits keyed by (line, column), right to left within a line.
fn apply_edits(content: &str, edits: &BTreeMap<(usize, usize), Edit>) -> String {
    let mut out = String::with_capacity(content.len() + edits.len() * 16);
    let touched: HashSet<usize> = edits.keys().map(|(line, _)| *line).collect();

    for (idx, raw) in content.split_inclusive('\n').enumerate() {
        if !touched.contains(&idx) {
            out.push_str(raw);
            continue;
        }
        let mut line = raw.to_string();
        for ((_, column), edit) in edits.range((idx, 0)..=(idx, usize::MAX)).rev() {
            line.replace_range(*column..*column + edit.len, &edit.replacement);
        }
        out.push_str(&line);
    }
    out
}

/// `<path>.fqcn_backup`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Replaces `path` with `content` via a temp file in the same directory.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| Error::file_access(dir, e))?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| Error::file_access(tmp.path(), e))?;
    if let Ok(meta) = std::fs::metadata(path) {
        std::fs::set_permissions(tmp.path(), meta.permissions())
            .map_err(|e| Error::file_access(path, e))?;
    }
    tmp.persist(path)
        .map_err(|e| Error::file_access(path, e.error))?;
    Ok(())
}

pub(crate) fn task_label(task: &serde_yaml::Mapping, ordinal: usize) -> String {
    match task.get("name").and_then(|n| n.as_str()) {
        Some(name) => format!("'{}'", name),
        None => format!("#{}", ordinal + 1),
    }
}

pub(crate) fn quote_list(items: &[String]) -> String {
    items
        .iter()
        .map(|i| format!("'{}'", i))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn converter() -> Converter {
        Converter::new(Arc::new(MappingTable::bundled()))
    }

    #[test]
    fn test_basic_conversion() {
        let result = converter().convert_content("- name: t\n  copy:\n    src: a\n    dest: b\n");
        assert!(result.success);
        assert_eq!(result.changes_made, 1);
        assert_eq!(
            result.converted_content,
            "- name: t\n  ansible.builtin.copy:\n    src: a\n    dest: b\n"
        );
        assert_eq!(
            result.conversions,
            vec![Conversion {
                original: "copy".into(),
                fqcn: "ansible.builtin.copy".into(),
                line: 2,
                column: 3,
            }]
        );
    }

    #[test]
    fn test_formatting_preserved() {
        let input = "\
# Deploy
- name: t   # trailing
  \"service\":   {name: x}

  when: true\r
- name: script
  shell: |
    copy: not a key
";
        let result = converter().convert_content(input);
        assert_eq!(result.changes_made, 2);
        assert_eq!(
            result.converted_content,
            "\
# Deploy
- name: t   # trailing
  \"ansible.builtin.service\":   {name: x}

  when: true\r
- name: script
  ansible.builtin.shell: |
    copy: not a key
"
        );
    }

    #[test]
    fn test_action_forms_converted() {
        let input = "\
- action: copy src=a dest=b
- local_action:
    module: shell
    cmd: ls
";
        let result = converter().convert_content(input);
        assert_eq!(result.changes_made, 2);
        assert!(result.converted_content.contains("action: ansible.builtin.copy src=a"));
        assert!(result.converted_content.contains("module: ansible.builtin.shell"));
    }

    #[test]
    fn test_alias_item_converted_once() {
        let input = "- &t\n  name: a\n  copy: {}\n- *t\n";
        let result = converter().convert_content(input);
        assert!(result.success);
        assert_eq!(result.changes_made, 1);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_parse_error() {
        let result = converter().convert_content("- name: a\n  copy: [1, 2\n");
        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::Parse));
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.converted_content, result.original_content);
    }

    #[test]
    fn test_ambiguous_task_warns() {
        let result = converter().convert_content("- copy: {}\n  template: {}\n");
        assert_eq!(result.changes_made, 1);
        assert!(result.converted_content.contains("ansible.builtin.copy:"));
        assert!(result.converted_content.contains("\n  template:"));
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_custom_mapping_wins() {
        let converter = converter()
            .with_custom_mappings([("copy", "acme.files.copy")])
            .unwrap();
        let result = converter.convert_content("- copy: {}\n");
        assert_eq!(result.converted_content, "- acme.files.copy: {}\n");
    }

    #[test]
    fn test_apply_edits_right_to_left() {
        let mut edits = BTreeMap::new();
        edits.insert(
            (0, 3),
            Edit { len: 1, original: "a".into(), replacement: "xxx".into() },
        );
        edits.insert(
            (0, 1),
            Edit { len: 1, original: "b".into(), replacement: "yy".into() },
        );
        assert_eq!(apply_edits("{b, a}\nrest", &edits), "{yy, xxx}\nrest");
    }

    #[test]
    fn test_backup_path() {
        assert_eq!(
            backup_path(Path::new("/x/site.yml")),
            PathBuf::from("/x/site.yml.fqcn_backup")
        );
    }

    #[test]
    fn test_convert_file_writes_and_backs_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.yml");
        std::fs::write(&path, "- copy: {}\n").unwrap();

        let result = converter().with_backup(true).convert_file(&path, false);
        assert!(result.success, "{:?}", result.errors);
        assert!(result.backup_created);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "- ansible.builtin.copy: {}\n");
        assert_eq!(std::fs::read_to_string(backup_path(&path)).unwrap(), "- copy: {}\n");
    }

    #[test]
    fn test_convert_file_dry_run_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.yml");
        std::fs::write(&path, "- copy: {}\n").unwrap();
        let result = converter().convert_file(&path, true);
        assert_eq!(result.changes_made, 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "- copy: {}\n");

        let result = converter().convert_file(dir.path().join("nope.yml"), false);
        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::FileAccess));
        assert!(result.into_result().is_err());
    }
}
