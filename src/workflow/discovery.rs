//! Workflow discovery
//!
//! Finds workflow files under a repository and parses them into a
//! [`WorkflowCollection`]. Files are read through a [`WorkflowSource`] so that
//! tests can substitute an in-memory tree for the real filesystem.

use crate::config::DiscoveryConfig;
use crate::error::{DiscoveryError, WorkflowError};
use crate::workflow::types::WorkflowDefinition;
use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Workflows keyed by repository-relative path, iterated in ascending order
pub type WorkflowCollection = BTreeMap<String, WorkflowDefinition>;

/// A tree of files that workflows can be discovered in
pub trait WorkflowSource {
    /// List the files directly inside `dir` having one of `extensions`.
    ///
    /// Returned paths are relative to the source root and use `/` separators.
    fn list(&self, dir: &str, extensions: &[String]) -> Result<Vec<String>, DiscoveryError>;

    /// Read one file previously returned by [`WorkflowSource::list`]
    fn read(&self, path: &str) -> io::Result<Vec<u8>>;
}

/// Workflows on the local filesystem, rooted at a repository checkout
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl WorkflowSource for DirSource {
    fn list(&self, dir: &str, extensions: &[String]) -> Result<Vec<String>, DiscoveryError> {
        let root = glob::Pattern::escape(&self.root.to_string_lossy());
        let dir = glob::Pattern::escape(dir.trim_matches('/'));
        let mut found = Vec::new();

        for ext in extensions {
            let pattern = format!("{root}/{dir}/*.{ext}");
            for entry in glob::glob(&pattern)? {
                let path = entry.map_err(io::Error::from)?;
                if !path.is_file() {
                    continue;
                }
                let relative = path.strip_prefix(&self.root).unwrap_or(&path);
                let relative = relative
                    .components()
                    .filter(|c| !matches!(c, Component::CurDir))
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                found.push(relative);
            }
        }

        found.sort();
        found.dedup();
        Ok(found)
    }

    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.root.join(path))
    }
}

/// In-memory file tree
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, replacing any existing file at the same path
    pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }
}

impl WorkflowSource for MemorySource {
    fn list(&self, dir: &str, extensions: &[String]) -> Result<Vec<String>, DiscoveryError> {
        let prefix = format!("{}/", dir.trim_matches('/'));
        Ok(self
            .files
            .keys()
            .filter(|path| {
                let Some(name) = path.strip_prefix(&prefix) else {
                    return false;
                };
                !name.contains('/')
                    && extensions
                        .iter()
                        .any(|ext| name.ends_with(&format!(".{ext}")))
            })
            .cloned()
            .collect())
    }

    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }
}

/// List every workflow file, failing if there are none at all
pub fn list_workflows(
    source: &dyn WorkflowSource,
    config: &DiscoveryConfig,
) -> Result<Vec<String>, DiscoveryError> {
    let paths = source.list(&config.workflow_dir, &config.extensions)?;
    if paths.is_empty() {
        return Err(DiscoveryError::NoWorkflows {
            dir: config.workflow_dir.clone(),
        });
    }

    debug!(num_workflows = paths.len(), "Found workflows");
    Ok(paths)
}

/// Discover and parse every workflow.
///
/// Files that cannot be read or parsed are logged and skipped. The only
/// failures are listing errors and finding no workflow files at all.
pub fn load_workflows(
    source: &dyn WorkflowSource,
    config: &DiscoveryConfig,
) -> Result<WorkflowCollection, DiscoveryError> {
    let mut workflows = WorkflowCollection::new();

    for path in list_workflows(source, config)? {
        let contents = match source.read(&path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to read workflow");
                continue;
            }
        };

        debug!(path = %path, "Parsing workflow");
        match parse_workflow(&path, &contents) {
            Ok(workflow) => {
                workflows.insert(path, workflow);
            }
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to parse workflow");
            }
        }
    }

    Ok(workflows)
}

/// Parse a single workflow, attaching its path to any error
pub fn parse_workflow(path: &str, contents: &[u8]) -> Result<WorkflowDefinition, WorkflowError> {
    WorkflowDefinition::from_slice(contents).map_err(|e| e.in_file(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DiscoveryConfig {
        DiscoveryConfig::default()
    }

    #[test]
    fn test_memory_source_lists_workflow_extensions_only() {
        let source = MemorySource::new()
            .with_file(".github/workflows/workflow1.yml", "")
            .with_file(".github/workflows/workflow2.yml", "")
            .with_file(".github/workflows/workflow3.yaml", "")
            .with_file(".github/workflows/not-a-workflow.txt", "")
            .with_file(".github/workflows/nested/deep.yml", "")
            .with_file("other/workflow.yml", "");

        let paths = list_workflows(&source, &config()).unwrap();
        assert_eq!(
            paths,
            vec![
                ".github/workflows/workflow1.yml",
                ".github/workflows/workflow2.yml",
                ".github/workflows/workflow3.yaml",
            ]
        );
    }

    #[test]
    fn test_no_workflows() {
        let source = MemorySource::new().with_file("README.md", "hello");
        let result = list_workflows(&source, &config());
        assert!(matches!(result, Err(DiscoveryError::NoWorkflows { .. })));
    }

    #[test]
    fn test_load_workflows_skips_invalid() {
        let source = MemorySource::new()
            .with_file(
                ".github/workflows/pr.yml",
                "on:\n  pull_request:\n    paths: [\"src/**\"]\n",
            )
            .with_file(".github/workflows/push.yml", "on:\n  push:\n")
            .with_file(".github/workflows/broken.yml", "on: [pull_request\n")
            .with_file(".github/workflows/shape.yml", "on: 7\n");

        let workflows = load_workflows(&source, &config()).unwrap();
        let paths: Vec<_> = workflows.keys().cloned().collect();
        assert_eq!(
            paths,
            vec![".github/workflows/pr.yml", ".github/workflows/push.yml"]
        );
    }

    #[test]
    fn test_parse_workflow_wraps_path() {
        let err = parse_workflow(".github/workflows/x.yml", b"on: 1").unwrap_err();
        assert!(matches!(err, WorkflowError::Invalid { ref path, .. } if path == ".github/workflows/x.yml"));
    }
}
