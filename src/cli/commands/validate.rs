//! Validate command - FQCN compliance report
//!
//! This module implements the `validate` subcommand.

use super::CommandContext;
use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use fqcn_converter::validate::{Severity, ValidationResult, Validator};
use serde::Serialize;
use std::path::PathBuf;

/// Arguments for the validate command
#[derive(Parser, Debug, Clone)]
pub struct ValidateArgs {
    /// Files or directories to validate
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Fail on warnings as well as errors
    #[arg(long)]
    pub strict: bool,

    /// Fail when a file scores below this value (0.0 - 1.0)
    #[arg(long, default_value_t = 0.0, value_parser = parse_score)]
    pub min_score: f64,

    /// Mapping file replacing the bundled table
    #[arg(long, short = 'm')]
    pub mappings: Option<PathBuf>,
}

/// JSON report of a validate run
#[derive(Debug, Serialize)]
struct ValidateReport<'a> {
    passed: bool,
    overall_score: f64,
    modules_total: usize,
    modules_fqcn: usize,
    results: &'a [ValidationResult],
}

impl ValidateArgs {
    /// Execute the validate command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let validator = Validator::new(ctx.mapping_table(self.mappings.as_deref())?);
        let files = ctx.expand_paths(&self.paths)?;

        if files.is_empty() {
            ctx.output.warning("No Ansible files found");
            return Ok(0);
        }

        let results = tokio::task::spawn_blocking(move || {
            files
                .iter()
                .map(|file| validator.validate_file(file))
                .collect::<Vec<_>>()
        })
        .await?;

        let modules_total: usize = results.iter().map(|r| r.modules_total).sum();
        let modules_fqcn: usize = results.iter().map(|r| r.modules_fqcn).sum();
        let overall_score = if modules_total == 0 {
            1.0
        } else {
            modules_fqcn as f64 / modules_total as f64
        };
        let code = self.exit_code(&results);

        if ctx.output.is_json() {
            ctx.output.json(&ValidateReport {
                passed: code == 0,
                overall_score,
                modules_total,
                modules_fqcn,
                results: &results,
            })?;
            return Ok(code);
        }

        ctx.output.banner("FQCN VALIDATION");
        for result in &results {
            self.print_result(ctx, result);
        }

        ctx.output.section("Summary");
        ctx.output.line(&format!(
            "{} file(s), {}/{} modules FQCN, overall score {:.2}",
            results.len(),
            modules_fqcn,
            modules_total,
            overall_score
        ));
        if code == 0 {
            ctx.output.success("All files pass");
        } else {
            let failing = results
                .iter()
                .filter(|r| !r.meets(self.min_score, self.strict))
                .count();
            ctx.output.error(&format!("{} file(s) failed validation", failing));
            ctx.output
                .hint("Run 'fqcn-converter convert' on the failing files to fix short names");
        }
        ctx.output.flush();

        Ok(code)
    }

    fn print_result(&self, ctx: &CommandContext, result: &ValidationResult) {
        let name = result
            .file_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let status = if result.meets(self.min_score, self.strict) {
            "PASS"
        } else {
            "FAIL"
        };

        let header = format!("{} {} ({})", status, name, result.summary());
        if ctx.output.use_color() {
            let painted = if status == "PASS" {
                header.green()
            } else {
                header.red()
            };
            ctx.output.line(&painted.to_string());
        } else {
            ctx.output.line(&header);
        }

        for issue in &result.issues {
            let text = format!("  {}", issue).replace('\n', "\n  ");
            if !ctx.output.use_color() {
                ctx.output.line(&text);
                continue;
            }
            let painted = match issue.severity {
                Severity::Error => text.red(),
                Severity::Warning => text.yellow(),
                Severity::Info => text.normal(),
            };
            ctx.output.line(&painted.to_string());
        }
    }

    /// 0 when every file passes; otherwise the status of the first failure.
    fn exit_code(&self, results: &[ValidationResult]) -> i32 {
        if let Some(kind) = results.iter().find_map(|r| r.error_kind) {
            return kind.exit_code();
        }
        if results.iter().all(|r| r.meets(self.min_score, self.strict)) {
            0
        } else {
            fqcn_converter::error::ErrorKind::Validation.exit_code()
        }
    }
}

fn parse_score(s: &str) -> std::result::Result<f64, String> {
    let score: f64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    if (0.0..=1.0).contains(&score) {
        Ok(score)
    } else {
        Err(format!("score must be between 0.0 and 1.0, got {}", score))
    }
}
