//! Policy generation pipeline
//!
//! ```text
//! discover → parse → filter → synthesize → aggregate → [merge] → render → write
//! ```
//!
//! Per-workflow problems are logged and skipped. Discovery, merge, override
//! parsing and output failures abort the run, and the output is discarded.

use crate::config::{DiscoveryConfig, STDIO_PATH};
use crate::error::{OutputError, PolicyError, Result};
use crate::output::{PolicyWriter, render_document};
use crate::policy::{PolicyDocument, aggregate, merge};
use crate::workflow::{WorkflowSource, load_workflows};
use std::fs::File;
use std::io::{self, Read, Write};
use tracing::{info, warn};

/// Open the policy to merge. `-` reads standard input.
pub fn open_override(path: &str) -> std::result::Result<Box<dyn Read>, PolicyError> {
    if path == STDIO_PATH {
        return Ok(Box::new(io::stdin()));
    }
    let file = File::open(path).map_err(|source| PolicyError::Read {
        path: path.to_string(),
        source,
    })?;
    Ok(Box::new(file))
}

/// Reads a user-authored policy document to merge with the generated one
pub fn load_override(reader: impl Read) -> std::result::Result<PolicyDocument, PolicyError> {
    PolicyDocument::from_reader(reader)
}

/// Generates a policy from the workflows in a [`WorkflowSource`]
pub struct Generator<S> {
    source: S,
    discovery: DiscoveryConfig,
    command: Option<String>,
}

impl<S: WorkflowSource> Generator<S> {
    pub fn new(source: S, discovery: DiscoveryConfig) -> Self {
        Self {
            source,
            discovery,
            command: None,
        }
    }

    /// Emit the generated-file header naming `command`
    pub fn with_header(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The policy derived from the workflows alone
    pub fn generated_policy(&self) -> Result<PolicyDocument> {
        let workflows = load_workflows(&self.source, &self.discovery)?;
        Ok(aggregate(&workflows))
    }

    /// The generated policy, merged with `merge_with` when given
    pub fn generate(&self, merge_with: Option<&mut (dyn Read + '_)>) -> Result<PolicyDocument> {
        let generated = self.generated_policy()?;

        let Some(reader) = merge_with else {
            return Ok(generated);
        };

        let user_policy = load_override(reader)?;
        Ok(merge(generated, user_policy)?)
    }

    /// The final document as text
    pub fn render(&self, merge_with: Option<&mut (dyn Read + '_)>) -> Result<String> {
        let doc = self.generate(merge_with)?;
        Ok(render_document(&doc, self.command.as_deref())?)
    }

    /// Generate, render and write the policy.
    ///
    /// The writer is committed only if every step succeeds; otherwise it is
    /// aborted and the error returned.
    pub fn run(&self, merge_with: Option<&mut (dyn Read + '_)>, mut writer: PolicyWriter) -> Result<()> {
        let rendered = self.render(merge_with).and_then(|text| {
            writer
                .write_all(text.as_bytes())
                .map_err(|e| OutputError::Write(e).into())
        });

        if let Err(e) = rendered {
            if let Err(abort_err) = writer.abort() {
                warn!(error = %abort_err, "Failed to abort output");
            }
            return Err(e);
        }

        let dest = writer.destination().to_string();
        writer.commit()?;
        info!(path = %dest, "Wrote policy");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::workflow::MemorySource;

    fn generator(source: MemorySource) -> Generator<MemorySource> {
        Generator::new(source, DiscoveryConfig::default())
    }

    #[test]
    fn test_generate_without_merge() {
        let source = MemorySource::new().with_file(".github/workflows/ci.yml", "on: pull_request");
        let doc = generator(source).generate(None).unwrap();
        assert_eq!(doc.approval_rules.len(), 2);
    }

    #[test]
    fn test_no_workflows_is_error() {
        let result = generator(MemorySource::new()).generate(None);
        assert!(matches!(result, Err(AppError::Discovery(_))));
    }

    #[test]
    fn test_invalid_override_is_error() {
        let source = MemorySource::new().with_file(".github/workflows/ci.yml", "on: pull_request");
        let mut reader: &[u8] = b"invalid yaml";
        let result = generator(source).generate(Some(&mut reader));
        assert!(matches!(
            result,
            Err(AppError::Policy(PolicyError::InvalidOverride(_)))
        ));
    }

    #[test]
    fn test_empty_override_is_error() {
        let source = MemorySource::new().with_file(".github/workflows/ci.yml", "on: pull_request");
        for contents in ["", "# only a comment\n"] {
            let mut reader = contents.as_bytes();
            let result = generator(source.clone()).generate(Some(&mut reader));
            assert!(
                matches!(
                    result,
                    Err(AppError::Policy(PolicyError::InvalidOverride(_)))
                ),
                "{contents:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_generate_with_boxed_override() {
        let source = MemorySource::new().with_file(".github/workflows/ci.yml", "on: pull_request");
        let generator = generator(source);

        let mut boxed: Option<Box<dyn Read>> =
            Some(Box::new("approval_rules:\n  - name: custom\n".as_bytes()));
        let doc = generator.generate(boxed.as_deref_mut()).unwrap();

        assert_eq!(doc.approval_rules.len(), 3);
        assert_eq!(doc.approval_rules[2].name, "custom");
    }

    #[test]
    fn test_open_missing_override() {
        let result = open_override("/nonexistent/policy.yml");
        assert!(matches!(result, Err(PolicyError::Read { .. })));
    }

    #[test]
    fn test_render_header() {
        let source = MemorySource::new().with_file(".github/workflows/ci.yml", "on: pull_request");
        let text = generator(source)
            .with_header("test-command")
            .render(None)
            .unwrap();
        assert!(text.contains("# This file is generated by test-command."));
    }
}
