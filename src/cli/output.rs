//! Console output for fqcn-converter.
//!
//! Human mode writes coloured text to stdout and diagnostics to stderr.
//! JSON mode keeps stdout for the command's single JSON document and turns
//! diagnostics into one JSON object per line on stderr.

use colored::{ColoredString, Colorize};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::{self, Write};
use std::time::{Duration, Instant};

const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";
const SPINNER_TICK: Duration = Duration::from_millis(100);

/// Writes command output in human or JSON mode.
pub struct OutputFormatter {
    use_color: bool,
    json_mode: bool,
    /// `-v` count; gates `info` (1) and `debug` (2)
    verbosity: u8,
    started: Instant,
}

impl OutputFormatter {
    /// `NO_COLOR` in the environment always disables colour.
    pub fn new(use_color: bool, json_mode: bool, verbosity: u8) -> Self {
        Self {
            use_color: use_color && std::env::var_os("NO_COLOR").is_none(),
            json_mode,
            verbosity,
            started: Instant::now(),
        }
    }

    pub fn use_color(&self) -> bool {
        self.use_color
    }

    pub fn is_json(&self) -> bool {
        self.json_mode
    }

    /// Time since the command started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn paint<'a>(&self, text: &'a str, style: fn(&'a str) -> ColoredString) -> String {
        if self.use_color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Boxed title printed at the top of a human report.
    pub fn banner(&self, title: &str) {
        if self.json_mode {
            return;
        }
        let rule = "=".repeat(title.len() + 4);
        let padded = format!("  {}  ", title);
        println!();
        println!("{}", self.paint(&rule, |s| s.bright_blue()));
        println!("{}", self.paint(&padded, |s| s.bright_blue().bold()));
        println!("{}", self.paint(&rule, |s| s.bright_blue()));
        println!();
    }

    pub fn section(&self, title: &str) {
        if self.json_mode {
            return;
        }
        let underline = "-".repeat(title.len());
        println!();
        println!("{}", self.paint(title, |s| s.cyan().bold()));
        println!("{}", self.paint(&underline, |s| s.cyan()));
    }

    pub fn line(&self, message: &str) {
        if !self.json_mode {
            println!("{}", message);
        }
    }

    pub fn success(&self, message: &str) {
        if !self.json_mode {
            println!("{} {}", self.paint("OK:", |s| s.green().bold()), message);
        }
    }

    pub fn error(&self, message: &str) {
        self.diagnostic("error", "ERROR:", message, |s| s.red().bold());
    }

    pub fn warning(&self, message: &str) {
        self.diagnostic("warning", "WARNING:", message, |s| s.yellow().bold());
    }

    pub fn hint(&self, message: &str) {
        self.diagnostic("hint", "HINT:", message, |s| s.cyan().bold());
    }

    fn diagnostic(
        &self,
        kind: &str,
        prefix: &'static str,
        message: &str,
        style: fn(&'static str) -> ColoredString,
    ) {
        if self.json_mode {
            eprintln!("{}", serde_json::json!({ "type": kind, "message": message }));
        } else {
            eprintln!("{} {}", self.paint(prefix, style), message);
        }
    }

    /// Shown with `-v`.
    pub fn info(&self, message: &str) {
        if self.verbosity >= 1 && !self.json_mode {
            println!("{} {}", self.paint("INFO:", |s| s.blue()), message);
        }
    }

    /// Shown with `-vv`.
    pub fn debug(&self, message: &str) {
        if self.verbosity >= 2 && !self.json_mode {
            println!("{} {}", self.paint("DEBUG:", |s| s.magenta()), message);
        }
    }

    /// Pretty JSON document on stdout.
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Ticking spinner for long batch runs; `None` in JSON mode.
    pub fn create_spinner(&self, message: &str) -> Option<ProgressBar> {
        if self.json_mode {
            return None;
        }
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template(SPINNER_TEMPLATE) {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(SPINNER_TICK);
        Some(spinner)
    }

    /// Column-aligned table. Cells beyond the header count are dropped.
    pub fn table(&self, headers: &[&str], rows: &[Vec<String>]) {
        if self.json_mode {
            return;
        }
        let widths = column_widths(headers, rows);
        let header = join_cells(headers.iter().copied(), &widths);
        let rule = widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-");

        println!("{}", self.paint(&header, |s| s.bright_white().bold()));
        println!("{}", self.paint(&rule, |s| s.bright_black()));
        for row in rows {
            println!("{}", join_cells(row.iter().map(String::as_str), &widths));
        }
    }

    pub fn flush(&self) {
        let _ = io::stdout().flush();
    }
}

fn column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(String::len)
                .fold(header.len(), usize::max)
        })
        .collect()
}

fn join_cells<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, width)| format!("{:width$}", cell, width = width))
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_string()
}
