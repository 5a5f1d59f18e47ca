//! CLI module for fqcn-converter
//!
//! Argument parsing and subcommand dispatch for the converter binary.

pub mod commands;
pub mod completions;
pub mod diff;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// fqcn-converter - FQCN conversion for Ansible content
///
/// Rewrites short module names to fully qualified collection names and
/// reports how compliant a codebase already is.
#[derive(Parser, Debug, Clone)]
#[command(name = "fqcn-converter")]
#[command(author = "fqcn-converter Contributors")]
#[command(version)]
#[command(about = "Convert Ansible module names to FQCN and validate compliance", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true, env = "FQCN_CONVERTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output for scripting
    Json,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Convert short module names to FQCN in files or directories
    Convert(commands::convert::ConvertArgs),

    /// Validate FQCN compliance and report issues
    Validate(commands::validate::ValidateArgs),

    /// Discover Ansible projects under a directory and convert them in parallel
    Batch(commands::batch::BatchArgs),

    /// List the effective mapping table or resolve one name
    Mappings(commands::mappings::MappingsArgs),

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }

    /// Check if JSON output is requested
    pub fn is_json(&self) -> bool {
        matches!(self.output, OutputFormat::Json)
    }
}
