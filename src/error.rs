//! Error types for the FQCN converter.
//!
//! Expected failure modes (malformed YAML, unreadable files) are captured into
//! result objects by the converter, validator and batch processor. The types
//! here describe those failures and carry the ones that do cross a public
//! boundary: mapping table construction and directory discovery.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for converter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], carried by result objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input is not well-formed enough to traverse.
    Parse,
    /// A path is missing, unreadable or unwritable.
    FileAccess,
    /// The mapping table or configuration is malformed.
    Configuration,
    /// Unexpected failure while validating.
    Validation,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    /// CLI exit status for this kind of failure.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Validation => 2,
            ErrorKind::Parse => 4,
            ErrorKind::FileAccess => 5,
            ErrorKind::Configuration => 6,
            ErrorKind::Internal => 1,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Parse => write!(f, "parse_error"),
            ErrorKind::FileAccess => write!(f, "file_access_error"),
            ErrorKind::Configuration => write!(f, "configuration_error"),
            ErrorKind::Validation => write!(f, "validation_error"),
            ErrorKind::Internal => write!(f, "internal_error"),
        }
    }
}

/// The main error type.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Input Errors
    // ========================================================================
    /// Content could not be parsed as YAML.
    #[error("Failed to parse YAML{}: {message}", path_suffix(.path))]
    Parse {
        /// File the content came from, if any
        path: Option<PathBuf>,
        /// Parser message
        message: String,
        /// 1-based line reported by the parser
        line: Option<usize>,
    },

    /// File could not be read or written.
    #[error("Cannot access '{}': {message}", .path.display())]
    FileAccess {
        /// Offending path
        path: PathBuf,
        /// Error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: Option<std::io::Error>,
    },

    // ========================================================================
    // Engine Errors
    // ========================================================================
    /// Mapping table or configuration is malformed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Validation failed in a way that is not a compliance finding.
    #[error("Validation failed{}: {message}", path_suffix(.path))]
    Validation {
        /// File being validated, if any
        path: Option<PathBuf>,
        /// Error message
        message: String,
    },

    // ========================================================================
    // Wrapped Errors
    // ========================================================================
    /// I/O error without a known path.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (de)serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error with source.
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
        /// Source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

fn path_suffix(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!(" in '{}'", p.display()),
        None => String::new(),
    }
}

impl Error {
    /// Creates a parse error from a serde_yaml error.
    pub fn parse(path: Option<PathBuf>, err: &serde_yaml::Error) -> Self {
        Self::Parse {
            path,
            message: err.to_string(),
            line: err.location().map(|l| l.line()),
        }
    }

    /// Creates a file access error from an I/O error.
    pub fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileAccess {
            path: path.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a file access error without an underlying I/O error.
    pub fn file_access_msg(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::FileAccess {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates a validation error.
    pub fn validation(path: Option<PathBuf>, message: impl Into<String>) -> Self {
        Self::Validation {
            path,
            message: message.into(),
        }
    }

    /// Returns the coarse kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Parse { .. } | Error::Yaml(_) => ErrorKind::Parse,
            Error::FileAccess { .. } | Error::Io(_) => ErrorKind::FileAccess,
            Error::Configuration(_) => ErrorKind::Configuration,
            Error::Validation { .. } => ErrorKind::Validation,
            Error::Json(_) | Error::Internal(_) | Error::Other { .. } => ErrorKind::Internal,
        }
    }

    /// Returns the error code for CLI exit status.
    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Adds context with a closure that is only evaluated on error.
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Other {
            message: message.into(),
            source: Some(Box::new(e)),
        })
    }

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| Error::Other {
            message: f().into(),
            source: Some(Box::new(e)),
        })
    }
}
