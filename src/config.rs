//! Configuration for the fqcn-converter CLI
//!
//! Handles loading and merging configuration from multiple sources:
//! - Default values
//! - System configuration (/etc/fqcn-converter/config.yml)
//! - User configuration (~/.config/fqcn-converter/config.yml)
//! - Project configuration (./.fqcn-converter.yml, ./fqcn-converter.toml)
//! - Environment variables
//! - Command-line arguments (applied by the commands)

use anyhow::{Context, Result};
use fqcn_converter::batch::ProjectPatterns;
use fqcn_converter::mapping::MappingTable;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default number of batch workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Mapping table settings
    pub mappings: MappingsConfig,

    /// Conversion settings
    pub conversion: ConversionConfig,

    /// Batch settings
    pub batch: BatchConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Mapping table settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingsConfig {
    /// Mapping file replacing the bundled table
    pub file: Option<PathBuf>,

    /// Extra short name to FQCN entries; win over the table
    pub overrides: IndexMap<String, String>,
}

/// Conversion settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Write `<file>.fqcn_backup` before rewriting
    pub backup: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self { backup: true }
    }
}

/// Batch settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Worker pool size
    pub workers: usize,

    /// Include globs; empty means the built-in patterns
    pub patterns: Vec<String>,

    /// Exclude globs; empty means the built-in excludes
    pub exclude: Vec<String>,

    /// Skip projects not started within this many seconds
    pub timeout_secs: Option<u64>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            patterns: Vec::new(),
            exclude: Vec::new(),
            timeout_secs: None,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when neither RUST_LOG nor -v is given
    pub level: String,

    /// Log format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl Config {
    /// Load configuration from all sources
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Config::default();

        for path in Self::get_config_paths(config_path) {
            if path.exists() {
                config = config.merge_from_file(&path)?;
            } else if config_path == Some(&path) {
                anyhow::bail!("Config file not found: {}", path.display());
            }
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Get the list of configuration file paths to check
    fn get_config_paths(explicit_path: Option<&PathBuf>) -> Vec<PathBuf> {
        if let Some(path) = explicit_path {
            return vec![path.clone()];
        }
        if let Ok(env_config) = std::env::var("FQCN_CONVERTER_CONFIG") {
            return vec![PathBuf::from(env_config)];
        }

        let mut paths = vec![PathBuf::from("/etc/fqcn-converter/config.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("fqcn-converter/config.yml"));
        }
        paths.push(PathBuf::from(".fqcn-converter.yml"));
        paths.push(PathBuf::from("fqcn-converter.toml"));
        paths
    }

    /// Merge configuration from a file
    fn merge_from_file(&self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let file_config: Config = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            "toml" => toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            _ => toml::from_str(&content)
                .or_else(|_| serde_yaml::from_str(&content))
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
        };

        Ok(self.merge(file_config))
    }

    /// Merge another config into this one; `other` wins where it differs from the defaults
    fn merge(&self, other: Config) -> Config {
        let defaults = Config::default();
        Config {
            mappings: MappingsConfig {
                file: other.mappings.file.or_else(|| self.mappings.file.clone()),
                overrides: {
                    let mut overrides = self.mappings.overrides.clone();
                    overrides.extend(other.mappings.overrides);
                    overrides
                },
            },
            conversion: ConversionConfig {
                backup: if other.conversion.backup != defaults.conversion.backup {
                    other.conversion.backup
                } else {
                    self.conversion.backup
                },
            },
            batch: BatchConfig {
                workers: if other.batch.workers != DEFAULT_WORKERS {
                    other.batch.workers
                } else {
                    self.batch.workers
                },
                patterns: if other.batch.patterns.is_empty() {
                    self.batch.patterns.clone()
                } else {
                    other.batch.patterns
                },
                exclude: if other.batch.exclude.is_empty() {
                    self.batch.exclude.clone()
                } else {
                    other.batch.exclude
                },
                timeout_secs: other.batch.timeout_secs.or(self.batch.timeout_secs),
            },
            logging: LoggingConfig {
                level: if other.logging.level != defaults.logging.level {
                    other.logging.level
                } else {
                    self.logging.level.clone()
                },
                format: if other.logging.format != LogFormat::Text {
                    other.logging.format
                } else {
                    self.logging.format
                },
            },
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // FQCN_CONVERTER_WORKERS
        if let Ok(workers) = std::env::var("FQCN_CONVERTER_WORKERS") {
            if let Ok(n) = workers.parse() {
                self.batch.workers = n;
            }
        }

        // FQCN_CONVERTER_NO_BACKUP
        if std::env::var("FQCN_CONVERTER_NO_BACKUP").is_ok() {
            self.conversion.backup = false;
        }

        // FQCN_CONVERTER_MAPPINGS
        if let Ok(file) = std::env::var("FQCN_CONVERTER_MAPPINGS") {
            self.mappings.file = Some(PathBuf::from(file));
        }
    }

    /// Builds the mapping table: file (or bundled data) plus overrides.
    ///
    /// `cli_file` wins over the configured file.
    pub fn mapping_table(&self, cli_file: Option<&Path>) -> Result<MappingTable> {
        let file = cli_file
            .map(Path::to_path_buf)
            .or_else(|| self.mappings.file.clone())
            .map(|f| expand_path(&f));

        let table = match file {
            Some(path) => MappingTable::from_file(&path)
                .with_context(|| format!("Failed to load mapping file: {}", path.display()))?,
            None => MappingTable::bundled(),
        };

        table
            .with_overrides(&self.mappings.overrides)
            .context("Invalid mapping override in configuration")
    }

    /// Batch file patterns, with `cli_patterns` replacing configured includes.
    pub fn project_patterns(&self, cli_patterns: &[String]) -> Result<ProjectPatterns> {
        let include = if cli_patterns.is_empty() {
            self.batch.patterns.as_slice()
        } else {
            cli_patterns
        };
        let patterns = if self.batch.exclude.is_empty() {
            ProjectPatterns::with_includes(include)
        } else {
            ProjectPatterns::new(include, &self.batch.exclude)
        };
        patterns.context("Invalid batch patterns")
    }

    /// Batch deadline, if configured.
    pub fn batch_timeout(&self) -> Option<Duration> {
        self.batch.timeout_secs.map(Duration::from_secs)
    }
}

/// Expands `~` and environment variables in a configured path.
fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => path.to_path_buf(),
    }
}
