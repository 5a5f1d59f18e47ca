//! Validation result types.

use crate::error::{Error, ErrorKind, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Severity of a compliance finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational - third-party collection, nothing to fix.
    Info,
    /// Warning - unrecognised or suspicious module name.
    Warning,
    /// Error - short name that has a known FQCN.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Rule identifiers attached to issues.
pub mod rules {
    /// Content could not be parsed.
    pub const PARSE: &str = "FQCN000";
    /// Short module name with a known FQCN.
    pub const SHORT_NAME: &str = "FQCN001";
    /// Short name missing from the mapping table.
    pub const UNKNOWN_MODULE: &str = "FQCN002";
    /// FQCN from a collection the table does not know.
    pub const THIRD_PARTY: &str = "FQCN003";
    /// Dotted name that is not a three-segment FQCN.
    pub const MALFORMED: &str = "FQCN004";
    /// Task with more than one module-like key.
    pub const AMBIGUOUS: &str = "FQCN005";
    /// File could not be read.
    pub const FILE_ACCESS: &str = "FQCN006";
}

/// One compliance finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub rule_id: String,
    /// 1-based line.
    pub line: usize,
    /// 1-based column, when the exact position is known.
    pub column: Option<usize>,
    pub severity: Severity,
    pub message: String,
    pub suggestion: Option<String>,
    /// Module name the finding is about.
    pub module: Option<String>,
}

impl ValidationIssue {
    pub fn new(
        rule_id: &str,
        severity: Severity,
        line: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            line,
            column: None,
            severity,
            message: message.into(),
            suggestion: None,
            module: None,
        }
    }

    pub fn with_column(mut self, column: Option<usize>) -> Self {
        self.column = column;
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.line)?;
        if let Some(col) = self.column {
            write!(f, ":{}", col)?;
        }
        write!(f, ": [{}] {} - {}", self.rule_id, self.severity, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, "\n  Suggestion: {}", suggestion)?;
        }
        Ok(())
    }
}

/// FQCN compliance of one file or piece of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// No error-severity issues.
    pub valid: bool,
    /// Fraction of module invocations already in FQCN form, in `[0, 1]`.
    pub score: f64,
    pub file_path: Option<PathBuf>,
    pub issues: Vec<ValidationIssue>,
    pub modules_total: usize,
    pub modules_fqcn: usize,
    /// Set when validation could not run (parse or read failure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl ValidationResult {
    /// Builds a result from counts and issues, deriving `valid` and `score`.
    pub fn from_counts(modules_total: usize, modules_fqcn: usize, issues: Vec<ValidationIssue>) -> Self {
        let score = if modules_total == 0 {
            1.0
        } else {
            modules_fqcn as f64 / modules_total as f64
        };
        Self {
            valid: !issues.iter().any(ValidationIssue::is_error),
            score,
            file_path: None,
            issues,
            modules_total,
            modules_fqcn,
            error_kind: None,
        }
    }

    /// A result for input that could not be validated at all.
    pub fn failed(error: &Error) -> Self {
        let line = match error {
            Error::Parse { line: Some(line), .. } => *line,
            _ => 1,
        };
        let rule = match error.kind() {
            ErrorKind::FileAccess => rules::FILE_ACCESS,
            _ => rules::PARSE,
        };
        Self {
            valid: false,
            score: 0.0,
            file_path: None,
            issues: vec![ValidationIssue::new(rule, Severity::Error, line, error.to_string())],
            modules_total: 0,
            modules_fqcn: 0,
            error_kind: Some(error.kind()),
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues_by_severity(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues_by_severity(Severity::Warning)
    }

    pub fn issues_by_severity(&self, severity: Severity) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }

    /// Get count of issues by severity.
    pub fn count_by_severity(&self) -> HashMap<Severity, usize> {
        let mut counts = HashMap::new();
        for issue in &self.issues {
            *counts.entry(issue.severity).or_insert(0) += 1;
        }
        counts
    }

    /// Checks the result against a pass threshold.
    ///
    /// `strict` also fails on warnings.
    pub fn meets(&self, min_score: f64, strict: bool) -> bool {
        self.valid && self.score >= min_score && !(strict && self.warnings().next().is_some())
    }

    /// Turns a result that could not be produced into its error.
    pub fn into_result(self) -> Result<Self> {
        match self.error_kind {
            None => Ok(self),
            Some(kind) => {
                let message = self
                    .issues
                    .first()
                    .map(|i| i.message.clone())
                    .unwrap_or_else(|| kind.to_string());
                Err(Error::validation(self.file_path, message))
            }
        }
    }

    /// One-line summary.
    pub fn summary(&self) -> String {
        let counts = self.count_by_severity();
        format!(
            "{}/{} modules FQCN (score {:.2}): {} error(s), {} warning(s), {} info",
            self.modules_fqcn,
            self.modules_total,
            self.score,
            counts.get(&Severity::Error).copied().unwrap_or(0),
            counts.get(&Severity::Warning).copied().unwrap_or(0),
            counts.get(&Severity::Info).copied().unwrap_or(0),
        )
    }
}
