//! File patterns that identify Ansible content inside a project.

use crate::error::{Error, Result};
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// Include patterns used when none are configured.
pub const DEFAULT_PATTERNS: &[&str] = &[
    "*.yml",
    "*.yaml",
    "playbooks/**/*.yml",
    "playbooks/**/*.yaml",
    "tasks/**/*.yml",
    "tasks/**/*.yaml",
    "handlers/*.yml",
    "handlers/*.yaml",
    "roles/*/tasks/**/*.yml",
    "roles/*/tasks/**/*.yaml",
    "roles/*/handlers/*.yml",
    "roles/*/handlers/*.yaml",
];

/// Files that look like YAML but never hold tasks.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "**/requirements.yml",
    "**/requirements.yaml",
    "**/galaxy.yml",
    "**/.*",
];

/// Compiled include/exclude globs, matched against project-relative paths.
///
/// `*` does not cross directory separators; use `**` for that.
#[derive(Debug, Clone)]
pub struct ProjectPatterns {
    include: GlobSet,
    exclude: GlobSet,
    include_src: Vec<String>,
    exclude_src: Vec<String>,
}

impl Default for ProjectPatterns {
    fn default() -> Self {
        // the built-in globs are known to compile
        Self::new(DEFAULT_PATTERNS, DEFAULT_EXCLUDES).unwrap_or_else(|_| Self {
            include: GlobSet::empty(),
            exclude: GlobSet::empty(),
            include_src: Vec::new(),
            exclude_src: Vec::new(),
        })
    }
}

impl ProjectPatterns {
    /// Compiles the given globs. An empty include list means the defaults.
    pub fn new<I, E>(include: I, exclude: E) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let mut include_src: Vec<String> =
            include.into_iter().map(|p| p.as_ref().to_string()).collect();
        if include_src.is_empty() {
            include_src = DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect();
        }
        let exclude_src: Vec<String> = exclude.into_iter().map(|p| p.as_ref().to_string()).collect();

        Ok(Self {
            include: build_set(&include_src)?,
            exclude: build_set(&exclude_src)?,
            include_src,
            exclude_src,
        })
    }

    /// Custom include globs with the default excludes.
    pub fn with_includes<I>(include: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Self::new(include, DEFAULT_EXCLUDES)
    }

    pub fn include_patterns(&self) -> &[String] {
        &self.include_src
    }

    pub fn exclude_patterns(&self) -> &[String] {
        &self.exclude_src
    }

    /// Matches a path relative to the project root.
    pub fn matches(&self, relative: &Path) -> bool {
        self.include.is_match(relative) && !self.exclude.is_match(relative)
    }

    /// All matching files under `dir`, sorted.
    pub fn matching_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        {
            let entry = entry.map_err(|e| walk_error(dir, e))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
            if self.matches(relative) {
                files.push(entry.path().to_path_buf());
            }
        }
        Ok(files)
    }

    /// Outermost directories under `root` (itself included) that hold a
    /// matching file, in walk order.
    ///
    /// A single walk: every file is tried against each of its ancestors up
    /// to `root`, then directories nested in another hit are dropped.
    /// Hidden directories are never entered.
    pub fn project_roots(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut hits = BTreeSet::new();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(walk_error(root, e)),
                Err(e) => {
                    warn!("Skipping unreadable path during discovery: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            for dir in entry.path().ancestors().skip(1) {
                if let Ok(relative) = entry.path().strip_prefix(dir) {
                    if self.matches(relative) {
                        hits.insert(dir.to_path_buf());
                    }
                }
                if dir == root {
                    break;
                }
            }
        }

        // ordered by components, so a directory follows its ancestors directly
        let mut roots: Vec<PathBuf> = Vec::new();
        for dir in hits {
            if roots.last().map_or(true, |outer| !dir.starts_with(outer)) {
                roots.push(dir);
            }
        }
        Ok(roots)
    }
}

fn build_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(compile(pattern)?);
    }
    builder
        .build()
        .map_err(|e| Error::configuration(format!("invalid file patterns: {}", e)))
}

fn compile(pattern: &str) -> Result<Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| Error::configuration(format!("invalid file pattern '{}': {}", pattern, e)))
}

pub(crate) fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

pub(crate) fn walk_error(root: &Path, err: walkdir::Error) -> Error {
    let path = err.path().unwrap_or(root).to_path_buf();
    match err.into_io_error() {
        Some(io) => Error::file_access(path, io),
        None => Error::file_access_msg(path, "filesystem loop detected"),
    }
}
