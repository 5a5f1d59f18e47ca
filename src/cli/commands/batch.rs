//! Batch command - convert every project under a directory
//!
//! This module implements the `batch` subcommand.

use super::CommandContext;
use anyhow::{Context, Result};
use clap::Parser;
use fqcn_converter::batch::BatchProcessor;
use fqcn_converter::convert::Converter;
use std::path::PathBuf;
use std::time::Duration;

/// Arguments for the batch command
#[derive(Parser, Debug, Clone)]
pub struct BatchArgs {
    /// Directory to search for Ansible projects
    pub root: PathBuf,

    /// Report what would change without writing files
    #[arg(long, short = 'n')]
    pub dry_run: bool,

    /// Number of projects converted in parallel
    #[arg(long, short = 'w')]
    pub workers: Option<usize>,

    /// Include glob for Ansible files (repeatable; replaces the defaults)
    #[arg(long = "pattern", short = 'p', action = clap::ArgAction::Append)]
    pub patterns: Vec<String>,

    /// Write a JSON report to this file
    #[arg(long, short = 'r')]
    pub report: Option<PathBuf>,

    /// Skip projects not started within this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Do not write `.fqcn_backup` copies
    #[arg(long)]
    pub no_backup: bool,

    /// Mapping file replacing the bundled table
    #[arg(long, short = 'm')]
    pub mappings: Option<PathBuf>,
}

impl BatchArgs {
    /// Execute the batch command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let table = ctx.mapping_table(self.mappings.as_deref())?;
        let converter =
            Converter::new(table).with_backup(ctx.config.conversion.backup && !self.no_backup);
        let timeout = self
            .timeout
            .map(Duration::from_secs)
            .or_else(|| ctx.config.batch_timeout());
        let workers = self.workers.unwrap_or(ctx.config.batch.workers);

        let processor = BatchProcessor::new(converter)
            .with_patterns(ctx.config.project_patterns(&self.patterns)?)
            .with_timeout(timeout);

        ctx.output.banner("FQCN BATCH CONVERSION");
        ctx.output.info(&format!(
            "Searching {} with {} worker(s){}",
            self.root.display(),
            workers,
            if self.dry_run { " (dry run)" } else { "" }
        ));

        let spinner = ctx.output.create_spinner("Converting projects...");
        let outcome = processor.run(&self.root, self.dry_run, workers).await;
        if let Some(sp) = &spinner {
            sp.finish_and_clear();
        }
        let result = outcome?;

        if let Some(report) = &self.report {
            result
                .write_json_report(report)
                .with_context(|| format!("Failed to write report: {}", report.display()))?;
            ctx.output
                .info(&format!("Report written to {}", report.display()));
        }

        if ctx.output.is_json() {
            ctx.output.json(&result)?;
        } else {
            if result.project_results.is_empty() {
                ctx.output.warning("No Ansible projects found");
            }
            let rows: Vec<Vec<String>> = result
                .project_results
                .iter()
                .map(|r| {
                    vec![
                        r.project.display().to_string(),
                        r.status.to_string(),
                        r.files_processed.to_string(),
                        r.modules_converted.to_string(),
                    ]
                })
                .collect();
            if !rows.is_empty() {
                ctx.output
                    .table(&["PROJECT", "STATUS", "FILES", "MODULES"], &rows);
            }
            ctx.output.section("Summary");
            ctx.output.line(&result.summary_text());
            ctx.output.flush();
        }

        Ok(if result.is_success() { 0 } else { 1 })
    }
}
