//! Colorized diff output for conversions
//!
//! Renders the before/after of a rewritten file as a unified diff using the
//! similar crate.

use colored::Colorize;
use similar::{ChangeTag, DiffOp, TextDiff};
use std::fmt::Write;

/// Extract hunk range information from diff operations
/// Returns (old_start, old_len, new_start, new_len) in 1-based line numbers for display
fn hunk_ranges(ops: &[DiffOp]) -> (usize, usize, usize, usize) {
    let (Some(first), Some(last)) = (ops.first(), ops.last()) else {
        return (1, 0, 1, 0);
    };
    let old_start = first.old_range().start;
    let new_start = first.new_range().start;
    let old_len = last.old_range().end.saturating_sub(old_start);
    let new_len = last.new_range().end.saturating_sub(new_start);
    (old_start + 1, old_len, new_start + 1, new_len)
}

/// Diff display options
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Number of context lines to show
    pub context_lines: usize,
    /// Use colors
    pub use_color: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            context_lines: 3,
            use_color: true,
        }
    }
}

/// Colorized diff generator
#[derive(Debug, Clone, Default)]
pub struct ColorizedDiff {
    options: DiffOptions,
}

impl ColorizedDiff {
    /// Create a new colorized diff with custom options
    pub fn with_options(options: DiffOptions) -> Self {
        Self { options }
    }

    /// Generate a unified diff between two strings
    pub fn diff(&self, old: &str, new: &str, old_name: &str, new_name: &str) -> String {
        let diff = TextDiff::from_lines(old, new);
        let mut output = String::new();
        if !diff.iter_all_changes().any(|c| c.tag() != ChangeTag::Equal) {
            return output;
        }

        self.line(&mut output, format!("--- {}", old_name), Style::Removed);
        self.line(&mut output, format!("+++ {}", new_name), Style::Added);

        for hunk in diff
            .unified_diff()
            .context_radius(self.options.context_lines)
            .iter_hunks()
        {
            let (old_start, old_len, new_start, new_len) = hunk_ranges(hunk.ops());
            self.line(
                &mut output,
                format!("@@ -{},{} +{},{} @@", old_start, old_len, new_start, new_len),
                Style::Header,
            );

            for change in hunk.iter_changes() {
                let text = change.value().trim_end_matches(['\n', '\r']);
                let (marker, style) = match change.tag() {
                    ChangeTag::Delete => ('-', Style::Removed),
                    ChangeTag::Insert => ('+', Style::Added),
                    ChangeTag::Equal => (' ', Style::Context),
                };
                self.line(&mut output, format!("{}{}", marker, text), style);
                if change.missing_newline() {
                    let _ = writeln!(output, "\\ No newline at end of file");
                }
            }
        }

        output
    }

    fn line(&self, output: &mut String, text: String, style: Style) {
        let _ = if self.options.use_color {
            match style {
                Style::Removed => writeln!(output, "{}", text.red()),
                Style::Added => writeln!(output, "{}", text.green()),
                Style::Header => writeln!(output, "{}", text.cyan()),
                Style::Context => writeln!(output, "{}", text.dimmed()),
            }
        } else {
            writeln!(output, "{}", text)
        };
    }
}

#[derive(Clone, Copy)]
enum Style {
    Removed,
    Added,
    Header,
    Context,
}
