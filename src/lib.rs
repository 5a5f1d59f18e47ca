//! # fqcn-converter - FQCN conversion and validation for Ansible content
//!
//! Rewrites short Ansible module names (`copy`, `service`) to their fully
//! qualified collection names (`ansible.builtin.copy`) and scores how much of
//! a codebase already uses them.
//!
//! ## Core Concepts
//!
//! - **Mapping table**: short name to FQCN lookup, bundled or loaded from a file
//! - **Classifier**: decides which task keys are module invocations, which are
//!   directives (`when`, `register`) and which are parameters that merely share
//!   a module's name (a `user` task's `group:`)
//! - **Converter**: rewrites invocations in place, keeping comments and layout
//! - **Validator**: reports short names, unknown modules and a compliance score
//! - **Batch processor**: discovers project directories and converts them on a
//!   bounded worker pool
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌───────────────────────┐
//! │ MappingTable │───▶│  Classifier  │───▶│ Converter / Validator │
//! └──────────────┘    └──────────────┘    └───────────────────────┘
//!                            ▲                        │
//!                     ┌──────────────┐                ▼
//!                     │  SourceMap   │    ┌───────────────────────┐
//!                     │ (positions)  │    │    BatchProcessor     │
//!                     └──────────────┘    └───────────────────────┘
//!                                                     │
//!                                                     ▼
//!                                         ┌───────────────────────┐
//!                                         │  BatchResult / report │
//!                                         └───────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust
//! use fqcn_converter::prelude::*;
//! use std::sync::Arc;
//!
//! let table = Arc::new(MappingTable::bundled());
//! let converter = Converter::new(Arc::clone(&table));
//!
//! let result = converter.convert_content("- name: t\n  copy:\n    src: a\n    dest: b\n");
//! assert_eq!(result.changes_made, 1);
//! assert!(result.converted_content.contains("ansible.builtin.copy:"));
//!
//! let report = Validator::new(table).validate_content(&result.converted_content);
//! assert!(report.valid);
//! assert_eq!(report.score, 1.0);
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod prelude {
    //! Convenient re-exports of commonly used types.
    //!
    //! ```rust
    //! use fqcn_converter::prelude::*;
    //! ```

    pub use crate::batch::{BatchProcessor, ProjectPatterns};
    pub use crate::classify::{Classifier, KeyClass, KeyPosition, ReservedDirectives};
    pub use crate::convert::{Conversion, ConversionResult, Converter};
    pub use crate::error::{Error, ErrorContext, ErrorKind, Result};
    pub use crate::mapping::{Fqcn, MappingTable};
    pub use crate::report::{BatchResult, ProjectResult, ProjectStatus};
    pub use crate::validate::{Severity, ValidationIssue, ValidationResult, Validator};
}

// ============================================================================
// Core Modules
// ============================================================================

/// Error types and result aliases.
///
/// [`ErrorKind`](error::ErrorKind) is what result objects carry; the full
/// [`Error`](error::Error) only crosses the API for table loading and
/// directory discovery.
pub mod error;

/// Short-name to FQCN mapping table and the [`Fqcn`](mapping::Fqcn) type.
pub mod mapping;

/// Raw-text positions for keys of parsed YAML.
pub mod locate;

/// Task discovery and module/parameter classification.
pub mod classify;

// ============================================================================
// Engines
// ============================================================================

/// In-place FQCN rewriting.
pub mod convert;

/// Compliance scoring and issues.
pub mod validate;

/// Project discovery and parallel conversion.
pub mod batch;

/// Batch results and JSON reports.
pub mod report;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
