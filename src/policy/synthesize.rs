//! Approval rule synthesis for a single workflow

use crate::error::InvalidGlobsError;
use crate::policy::glob::{GlobMatcher, compile_globs};
use crate::policy::types::{
    ApprovalRule, ChangedFiles, Conclusion, HasWorkflowResult, Predicates, Requires,
};
use crate::workflow::WorkflowDefinition;

/// Conclusions that satisfy a generated rule.
///
/// `skipped` counts as passing: path-filtered workflows that were not
/// triggered and conditionally skipped jobs must not block merges.
pub const SKIPPED_OR_SUCCESS: &[Conclusion] = &[Conclusion::Success, Conclusion::Skipped];

/// Glob matching every file.
///
/// policy-bot only counts files matching one of `changed_files.paths`, so a
/// workflow scoped by `paths-ignore` alone gets this as its `paths`.
pub const ANY_PATH: &str = "**";

/// Deterministic rule name for the workflow at `path`
pub fn rule_name(path: &str) -> String {
    format!("{path} built or skipped")
}

/// Build the approval rule requiring the workflow at `path` to pass.
///
/// The rule only applies to pull requests touching the workflow's combined
/// `paths` / `paths-ignore` scoping; a workflow without path filters gets an
/// unconditional rule.
pub fn synthesize_rule(
    path: &str,
    workflow: &WorkflowDefinition,
) -> Result<ApprovalRule, InvalidGlobsError> {
    let scope = workflow.path_scope();

    let predicates = if scope.is_empty() {
        Predicates::default()
    } else {
        let mut paths: Vec<&str> = scope.paths.iter().map(String::as_str).collect();
        if paths.is_empty() {
            paths.push(ANY_PATH);
        }
        let n_paths = paths.len();

        // One batch so that every invalid glob is reported together
        let globs: Vec<&str> = paths
            .into_iter()
            .chain(scope.paths_ignore.iter().map(String::as_str))
            .collect();
        let mut compiled = compile_globs(&globs)?;
        let ignore = compiled.split_off(n_paths);

        Predicates {
            changed_files: Some(ChangedFiles {
                paths: compiled.into_iter().map(GlobMatcher::into_regex).collect(),
                ignore: ignore.into_iter().map(GlobMatcher::into_regex).collect(),
            }),
            ..Default::default()
        }
    };

    Ok(ApprovalRule {
        name: rule_name(path),
        predicates,
        requires: Requires {
            conditions: Predicates {
                has_workflow_result: Some(HasWorkflowResult {
                    conclusions: SKIPPED_OR_SUCCESS.to_vec(),
                    workflows: vec![path.to_string()],
                }),
                ..Default::default()
            },
            ..Default::default()
        },
        ..Default::default()
    })
}
