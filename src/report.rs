//! Batch results and the JSON report.

use crate::convert::ConversionResult;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Outcome of converting one project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Every file converted (or there was nothing to convert).
    Succeeded,
    /// Some files failed, at least one succeeded.
    Partial,
    /// No file succeeded, or the project could not be read.
    Failed,
    /// Never started before the deadline.
    Skipped,
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectStatus::Succeeded => write!(f, "succeeded"),
            ProjectStatus::Partial => write!(f, "partial"),
            ProjectStatus::Failed => write!(f, "failed"),
            ProjectStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Per-project detail of a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectResult {
    pub project: PathBuf,
    pub status: ProjectStatus,
    /// True for succeeded and partial projects.
    pub success: bool,
    pub files_processed: usize,
    pub files_failed: usize,
    pub modules_converted: usize,
    pub error_message: Option<String>,
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub file_results: Vec<ConversionResult>,
}

impl ProjectResult {
    /// A project that failed before any file was touched.
    pub fn failed(project: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            status: ProjectStatus::Failed,
            success: false,
            files_processed: 0,
            files_failed: 0,
            modules_converted: 0,
            error_message: Some(message.into()),
            duration: Duration::ZERO,
            file_results: Vec::new(),
        }
    }

    /// A project that was never started.
    pub fn skipped(project: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            status: ProjectStatus::Skipped,
            ..Self::failed(project, reason)
        }
    }

    /// Aggregates the file results of one project.
    ///
    /// Any success makes the project at least partial; a project without
    /// any successful file reports the first file error.
    pub fn from_files(
        project: impl Into<PathBuf>,
        file_results: Vec<ConversionResult>,
        duration: Duration,
    ) -> Self {
        let failed: Vec<&ConversionResult> = file_results.iter().filter(|r| !r.success).collect();
        let succeeded = file_results.len() - failed.len();
        let modules_converted = file_results
            .iter()
            .filter(|r| r.success)
            .map(|r| r.changes_made)
            .sum();

        let first_error = || {
            failed.first().map(|r| {
                let file = r
                    .file_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                format!("{}: {}", file, r.errors.join("; "))
            })
        };

        let (status, error_message) = if failed.is_empty() {
            (ProjectStatus::Succeeded, None)
        } else if succeeded == 0 {
            (ProjectStatus::Failed, first_error())
        } else {
            (
                ProjectStatus::Partial,
                Some(format!(
                    "{} of {} files failed; first: {}",
                    failed.len(),
                    file_results.len(),
                    first_error().unwrap_or_default()
                )),
            )
        };
        let files_failed = failed.len();

        Self {
            project: project.into(),
            success: matches!(status, ProjectStatus::Succeeded | ProjectStatus::Partial),
            status,
            files_processed: file_results.len(),
            files_failed,
            modules_converted,
            error_message,
            duration,
            file_results,
        }
    }
}

/// Counts shown at the top of a report.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub total_projects: usize,
    pub successful_projects: usize,
    pub failed_projects: usize,
    pub partial_projects: usize,
    pub skipped_projects: usize,
    pub modules_converted: usize,
    pub files_processed: usize,
    #[serde(with = "humantime_serde")]
    pub execution_time: Duration,
    pub generated_at: DateTime<Utc>,
}

/// Aggregate of a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub summary: BatchSummary,
    pub project_results: Vec<ProjectResult>,
}

impl BatchResult {
    pub fn new(project_results: Vec<ProjectResult>, execution_time: Duration) -> Self {
        let count = |status: ProjectStatus| {
            project_results.iter().filter(|r| r.status == status).count()
        };
        let summary = BatchSummary {
            total_projects: project_results.len(),
            successful_projects: project_results.iter().filter(|r| r.success).count(),
            failed_projects: count(ProjectStatus::Failed),
            partial_projects: count(ProjectStatus::Partial),
            skipped_projects: count(ProjectStatus::Skipped),
            modules_converted: project_results.iter().map(|r| r.modules_converted).sum(),
            files_processed: project_results.iter().map(|r| r.files_processed).sum(),
            execution_time,
            generated_at: Utc::now(),
        };
        Self {
            summary,
            project_results,
        }
    }

    /// True when no project failed or was skipped.
    pub fn is_success(&self) -> bool {
        self.summary.failed_projects == 0 && self.summary.skipped_projects == 0
    }

    pub fn failed(&self) -> impl Iterator<Item = &ProjectResult> {
        self.project_results.iter().filter(|r| !r.success)
    }

    /// Multi-line plain-text summary.
    pub fn summary_text(&self) -> String {
        let s = &self.summary;
        let mut out = format!(
            "Processed {} project(s) in {}: {} successful ({} partial), {} failed, {} skipped\n\
             {} file(s) processed, {} module(s) converted",
            s.total_projects,
            humantime_serde::re::humantime::format_duration(round_millis(s.execution_time)),
            s.successful_projects,
            s.partial_projects,
            s.failed_projects,
            s.skipped_projects,
            s.files_processed,
            s.modules_converted,
        );
        for result in self.failed() {
            out.push_str(&format!(
                "\n  {} {}: {}",
                result.status,
                result.project.display(),
                result.error_message.as_deref().unwrap_or("unknown error")
            ));
        }
        out
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the JSON report to `path`.
    pub fn write_json_report(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|e| Error::file_access(path, e))
    }
}

fn round_millis(d: Duration) -> Duration {
    Duration::from_millis(d.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(success: bool, changes: usize) -> ConversionResult {
        let converter = crate::convert::Converter::new(std::sync::Arc::new(
            crate::mapping::MappingTable::bundled(),
        ));
        let content = if success {
            "- copy: {}\n".repeat(changes)
        } else {
            "- a: [\n".to_string()
        };
        let mut result = converter.convert_content(&content);
        result.file_path = Some(PathBuf::from("f.yml"));
        result
    }

    #[test]
    fn test_project_status_policy() {
        let ok = ProjectResult::from_files("p", vec![file(true, 1), file(true, 1)], Duration::ZERO);
        assert_eq!(ok.status, ProjectStatus::Succeeded);
        assert_eq!(ok.modules_converted, 2);

        let partial = ProjectResult::from_files("p", vec![file(true, 1), file(false, 0)], Duration::ZERO);
        assert_eq!(partial.status, ProjectStatus::Partial);
        assert!(partial.success);
        assert!(partial.error_message.unwrap().starts_with("1 of 2 files failed"));

        let failed = ProjectResult::from_files("p", vec![file(false, 0)], Duration::ZERO);
        assert_eq!(failed.status, ProjectStatus::Failed);
        assert!(!failed.success);
        assert!(failed.error_message.unwrap().starts_with("f.yml: "));

        let empty = ProjectResult::from_files("p", vec![], Duration::ZERO);
        assert_eq!(empty.status, ProjectStatus::Succeeded);
    }

    #[test]
    fn test_summary_counts_and_json_shape() {
        let results = vec![
            ProjectResult::from_files("a", vec![file(true, 2)], Duration::ZERO),
            ProjectResult::failed("b", "missing"),
            ProjectResult::skipped("c", "deadline"),
        ];
        let batch = BatchResult::new(results, Duration::from_millis(1500));
        assert_eq!(batch.summary.total_projects, 3);
        assert_eq!(batch.summary.successful_projects, 1);
        assert_eq!(batch.summary.failed_projects, 1);
        assert_eq!(batch.summary.skipped_projects, 1);
        assert_eq!(batch.summary.modules_converted, 2);
        assert!(!batch.is_success());

        let json: serde_json::Value = serde_json::from_str(&batch.to_json().unwrap()).unwrap();
        assert_eq!(json["summary"]["total_projects"], 3);
        assert_eq!(json["summary"]["execution_time"], "1s 500ms");
        assert_eq!(json["project_results"].as_array().unwrap().len(), 3);
        assert_eq!(json["project_results"][1]["status"], "failed");

        let text = batch.summary_text();
        assert!(text.contains("3 project(s)"));
        assert!(text.contains("failed b: missing"));
    }

    #[test]
    fn test_write_json_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        BatchResult::new(vec![], Duration::ZERO).write_json_report(&path).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["summary"]["total_projects"], 0);
    }
}
