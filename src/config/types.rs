//! Configuration types for workflow-policy
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables.

use serde::Deserialize;

/// Destination or source value meaning standard output / standard input
pub const STDIO_PATH: &str = "-";

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Where workflows are discovered
    pub discovery: DiscoveryConfig,

    /// Where the generated policy is written
    pub output: OutputConfig,

    /// Optional user-authored policy to merge in
    pub merge: MergeConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Workflow discovery configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Directory, relative to the repository root, holding workflow files
    pub workflow_dir: String,

    /// File extensions treated as workflow definitions
    pub extensions: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            workflow_dir: ".github/workflows".to_string(),
            extensions: vec!["yml".to_string(), "yaml".to_string()],
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output file. `-` writes to standard output.
    pub path: String,

    /// Prefix the document with a "generated file" header comment
    pub header: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: ".policy.yml".to_string(),
            header: true,
        }
    }
}

impl OutputConfig {
    pub fn is_stdout(&self) -> bool {
        self.path == STDIO_PATH
    }
}

/// Merge configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Policy file to merge with the generated one. `-` reads standard
    /// input; absent or empty disables merging.
    pub path: Option<String>,
}

impl MergeConfig {
    /// The merge source, if merging is enabled
    pub fn source(&self) -> Option<&str> {
        self.path.as_deref().filter(|p| !p.is_empty())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}
