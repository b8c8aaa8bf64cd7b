//! Error types for workflow-policy
//!
//! This module defines the error hierarchy used throughout the application.
//! Per-workflow errors ([`WorkflowError`]) are absorbed and logged during
//! discovery and aggregation; everything else surfaces through [`AppError`].

use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Workflow discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("Failed to merge generated policy with existing policy: {0}")]
    Merge(#[from] MergeError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },
}

/// One or more path globs could not be compiled.
///
/// Carries every offending pattern, verbatim and in input order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid globs: {}", .globs.join(", "))]
pub struct InvalidGlobsError {
    pub globs: Vec<String>,
}

impl InvalidGlobsError {
    pub fn new(globs: Vec<String>) -> Self {
        Self { globs }
    }
}

/// Errors raised while interpreting a single workflow file
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("failed to parse workflow: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("unexpected type for workflow `on`. got: {found}. expected: string, list or map")]
    UnexpectedTriggerShape { found: String },

    #[error(transparent)]
    InvalidGlobs(#[from] InvalidGlobsError),

    #[error("invalid workflow file {path}: {source}")]
    Invalid {
        path: String,
        #[source]
        source: Box<WorkflowError>,
    },
}

impl WorkflowError {
    /// Attach the workflow path to an error
    pub fn in_file(self, path: impl Into<String>) -> Self {
        WorkflowError::Invalid {
            path: path.into(),
            source: Box::new(self),
        }
    }

    pub fn unexpected_shape(found: impl Into<String>) -> Self {
        WorkflowError::UnexpectedTriggerShape {
            found: found.into(),
        }
    }
}

/// Workflow discovery errors
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("no workflows found in directory {dir}")]
    NoWorkflows { dir: String },

    #[error("invalid workflow search pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("failed to list workflows: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors loading or serializing policy documents
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("invalid config: {0}")]
    InvalidOverride(#[source] serde_yaml::Error),

    #[error("failed to open policy to merge {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize policy: {0}")]
    Serialize(#[source] serde_yaml::Error),
}

/// Merge engine errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("tried to merge two disapproval rules - this is not allowed")]
    DisapprovalConflict,

    #[error("tried to merge two rules with the same name `{}` - this is not allowed", .names.join(", "))]
    DuplicateRuleNames { names: Vec<String> },
}

/// Output sink errors
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("failed to create temporary file in {dir}: {source}")]
    CreateTemp {
        dir: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write policy: {0}")]
    Write(#[from] std::io::Error),

    #[error("failed to rename temporary file to {dest}: {source}")]
    Rename {
        dest: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove temporary file: {0}")]
    Remove(#[source] std::io::Error),
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_globs_message_lists_every_glob() {
        let err = InvalidGlobsError::new(vec!["[bad1".into(), "[bad2".into()]);
        assert_eq!(err.to_string(), "invalid globs: [bad1, [bad2");
    }

    #[test]
    fn test_duplicate_rule_names_message() {
        let err = MergeError::DuplicateRuleNames {
            names: vec!["custom".into(), "other".into()],
        };
        assert!(err.to_string().contains("`custom, other`"));
    }

    #[test]
    fn test_workflow_error_in_file() {
        let err = WorkflowError::unexpected_shape("number").in_file(".github/workflows/a.yml");
        let message = err.to_string();
        assert!(message.contains(".github/workflows/a.yml"));
        assert!(message.contains("got: number"));
    }

    #[test]
    fn test_app_error_from_merge_error() {
        let err: AppError = MergeError::DisapprovalConflict.into();
        assert!(matches!(err, AppError::Merge(MergeError::DisapprovalConflict)));
    }
}
