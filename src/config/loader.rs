//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Environment variables (WORKFLOW_POLICY__*)
//! 2. Configuration file (TOML)
//! 3. Default values
//!
//! Command-line flags are applied on top by the binary.

use crate::config::types::GeneratorConfig;
use crate::error::ConfigError;
use config::{Config, Environment, File, FileFormat};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "workflow-policy.toml",
    ".workflow-policy.toml",
    "~/.config/workflow-policy/config.toml",
];

/// Load configuration from a TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<GeneratorConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let generator_config: GeneratorConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&generator_config)?;

    Ok(generator_config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<GeneratorConfig, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        // Explicit path provided - must exist
        let expanded = shellexpand::tilde(path);
        if !Path::new(expanded.as_ref()).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
    } else {
        // Try default paths (first existing one wins)
        for path in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
                break;
            }
        }
    }

    // e.g., WORKFLOW_POLICY__OUTPUT__PATH, WORKFLOW_POLICY__LOGGING__LEVEL
    // Double underscore (__) maps to nested keys (output.path)
    builder = builder.add_source(
        Environment::with_prefix("WORKFLOW_POLICY")
            .prefix_separator("__")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("discovery.extensions")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let generator_config: GeneratorConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&generator_config)?;

    Ok(generator_config)
}

/// Validate configuration values
pub fn validate_config(config: &GeneratorConfig) -> Result<(), ConfigError> {
    if config.discovery.workflow_dir.trim().is_empty() {
        return Err(ConfigError::Missing {
            field: "discovery.workflow_dir".to_string(),
        });
    }

    if config.discovery.extensions.is_empty() {
        return Err(ConfigError::Invalid {
            message: "discovery.extensions must list at least one extension".to_string(),
        });
    }

    if let Some(ext) = config
        .discovery
        .extensions
        .iter()
        .find(|ext| ext.is_empty() || ext.contains(['/', '*', '?', '[']))
    {
        return Err(ConfigError::Invalid {
            message: format!("discovery.extensions contains an invalid extension: '{}'", ext),
        });
    }

    if config.output.path.trim().is_empty() {
        return Err(ConfigError::Missing {
            field: "output.path".to_string(),
        });
    }

    if let Err(e) = EnvFilter::try_new(&config.logging.level) {
        return Err(ConfigError::Invalid {
            message: format!("logging.level '{}' is invalid: {}", config.logging.level, e),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;

    #[test]
    fn test_load_config_from_str_basic() {
        let toml = r#"
[output]
path = "-"

[merge]
path = "policy.base.yml"
"#;

        let config = load_config_from_str(toml).unwrap();
        assert!(config.output.is_stdout());
        assert_eq!(config.merge.source(), Some("policy.base.yml"));
        assert_eq!(config.discovery.workflow_dir, ".github/workflows");
    }

    #[test]
    fn test_load_config_from_str_with_logging() {
        let toml = r#"
[logging]
level = "debug"
format = "json"
"#;

        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_empty_workflow_dir_error() {
        let toml = r#"
[discovery]
workflow_dir = ""
"#;

        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_empty_extensions_error() {
        let mut config = GeneratorConfig::default();
        config.discovery.extensions.clear();

        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_wildcard_extension_error() {
        let mut config = GeneratorConfig::default();
        config.discovery.extensions = vec!["y*".to_string()];

        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_invalid_log_level_error() {
        let mut config = GeneratorConfig::default();
        config.logging.level = "app=shouty".to_string();

        assert!(validate_config(&config).is_err());
    }
}
