//! Convert command - rewrite short module names in place
//!
//! This module implements the `convert` subcommand.

use super::CommandContext;
use crate::cli::diff::{ColorizedDiff, DiffOptions};
use anyhow::Result;
use clap::Parser;
use fqcn_converter::batch::BatchProcessor;
use fqcn_converter::convert::{ConversionResult, Converter};
use std::path::PathBuf;

/// Arguments for the convert command
#[derive(Parser, Debug, Clone)]
pub struct ConvertArgs {
    /// Files or directories to convert
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Report what would change without writing files
    #[arg(long, short = 'n')]
    pub dry_run: bool,

    /// Show a diff of every changed file
    #[arg(long, short = 'D')]
    pub diff: bool,

    /// Do not write `.fqcn_backup` copies
    #[arg(long)]
    pub no_backup: bool,

    /// Mapping file replacing the bundled table
    #[arg(long, short = 'm')]
    pub mappings: Option<PathBuf>,
}

impl ConvertArgs {
    /// Execute the convert command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let table = ctx.mapping_table(self.mappings.as_deref())?;
        let converter =
            Converter::new(table).with_backup(ctx.config.conversion.backup && !self.no_backup);
        let files = ctx.expand_paths(&self.paths)?;

        if files.is_empty() {
            ctx.output.warning("No Ansible files found");
            return Ok(0);
        }
        ctx.output
            .info(&format!("Converting {} file(s)", files.len()));

        let processor = BatchProcessor::new(converter);
        let results = processor
            .convert_files(&files, self.dry_run, ctx.config.batch.workers)
            .await;

        if ctx.output.is_json() {
            ctx.output.json(&results)?;
        } else {
            self.print_human(ctx, &results);
        }

        Ok(exit_code(&results))
    }

    fn print_human(&self, ctx: &CommandContext, results: &[ConversionResult]) {
        let differ = ColorizedDiff::with_options(DiffOptions {
            use_color: ctx.output.use_color(),
            ..DiffOptions::default()
        });
        let verb = if self.dry_run { "would convert" } else { "converted" };

        for result in results {
            let name = result
                .file_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();

            if !result.success {
                ctx.output
                    .error(&format!("{}: {}", name, result.errors.join("; ")));
                continue;
            }
            for warning in &result.warnings {
                ctx.output.warning(&format!("{}: {}", name, warning));
            }
            if !result.has_changes() {
                ctx.output.info(&format!("{}: already compliant", name));
                continue;
            }

            ctx.output.success(&format!(
                "{}: {} {} module(s)",
                name, verb, result.changes_made
            ));
            for conversion in &result.conversions {
                ctx.output.debug(&format!(
                    "  {}:{} {} -> {}",
                    conversion.line, conversion.column, conversion.original, conversion.fqcn
                ));
            }
            if let Some(backup) = &result.backup_path {
                ctx.output
                    .info(&format!("Backup written to {}", backup.display()));
            }
            if self.diff {
                print!(
                    "{}",
                    differ.diff(
                        &result.original_content,
                        &result.converted_content,
                        &name,
                        &format!("{} (fqcn)", name),
                    )
                );
            }
        }

        let converted: usize = results.iter().map(|r| r.changes_made).sum();
        let failed = results.iter().filter(|r| !r.success).count();
        ctx.output.line(&format!(
            "\n{} file(s), {} module(s) {}, {} failed in {:.2?}",
            results.len(),
            converted,
            verb,
            failed,
            ctx.output.elapsed()
        ));
        ctx.output.flush();
    }
}

/// Exit status of the first failed file, or 0.
fn exit_code(results: &[ConversionResult]) -> i32 {
    results
        .iter()
        .find(|r| !r.success)
        .map(|r| r.error_kind.map_or(1, |kind| kind.exit_code()))
        .unwrap_or(0)
}
