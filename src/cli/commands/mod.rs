//! Subcommands module for the fqcn-converter CLI
//!
//! This module contains all the subcommand implementations.

pub mod batch;
pub mod convert;
pub mod mappings;
pub mod validate;

use crate::cli::output::OutputFormatter;
use crate::config::Config;
use anyhow::Result;
use fqcn_converter::mapping::MappingTable;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Common context shared between commands
pub struct CommandContext {
    /// Configuration
    pub config: Config,
    /// Output formatter
    pub output: OutputFormatter,
}

impl CommandContext {
    /// Create a new command context from CLI arguments
    pub fn new(cli: &crate::cli::Cli, config: Config, use_color: bool) -> Self {
        let output = OutputFormatter::new(use_color, cli.is_json(), cli.verbosity());

        Self { config, output }
    }

    /// Effective mapping table; `cli_file` replaces the configured file.
    pub fn mapping_table(&self, cli_file: Option<&Path>) -> Result<Arc<MappingTable>> {
        let table = self.config.mapping_table(cli_file)?;
        self.output
            .debug(&format!("Mapping table has {} entries", table.len()));
        Ok(Arc::new(table))
    }

    /// Expands directories into the Ansible files they contain.
    ///
    /// Plain paths are kept as given, so a missing file is reported by the
    /// command that reads it.
    pub fn expand_paths(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let patterns = self.config.project_patterns(&[])?;
        let mut files = Vec::new();
        for path in paths {
            if path.is_dir() {
                let found = patterns.matching_files(path)?;
                self.output.debug(&format!(
                    "{}: {} matching file(s)",
                    path.display(),
                    found.len()
                ));
                files.extend(found);
            } else {
                files.push(path.clone());
            }
        }
        Ok(files)
    }
}
