//! Workflow qualification
//!
//! A workflow only gates merges if it runs for pull requests *and* is
//! guaranteed a fresh run whenever new commits are pushed. A workflow whose
//! `types` omit `synchronize` (e.g. `types: [opened]`) runs once when the
//! pull request is opened and never again, so its result can be stale or
//! missing.

use crate::workflow::types::{SYNCHRONIZE, WorkflowDefinition};

/// Result of checking a workflow against the qualification rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualification {
    /// The workflow gates pull requests
    Qualifies,
    /// No `pull_request` or `pull_request_target` trigger
    NotPullRequest,
    /// Pull request triggers exist but none of them fire on `synchronize`
    NoSynchronize,
}

impl Qualification {
    pub fn qualifies(&self) -> bool {
        matches!(self, Qualification::Qualifies)
    }

    /// Short reason used in log output
    pub fn reason(&self) -> &'static str {
        match self {
            Qualification::Qualifies => "qualifies",
            Qualification::NotPullRequest => "not a pull request workflow",
            Qualification::NoSynchronize => "does not run on synchronize",
        }
    }
}

/// Whether the workflow triggers on `pull_request` or `pull_request_target`
pub fn is_pull_request_workflow(workflow: &WorkflowDefinition) -> bool {
    workflow.pull_request_triggers().next().is_some()
}

/// Whether some pull request trigger of the workflow fires on `synchronize`
pub fn runs_on_synchronize(workflow: &WorkflowDefinition) -> bool {
    workflow
        .pull_request_triggers()
        .any(|(_, detail)| detail.runs_on(SYNCHRONIZE))
}

/// Classify a workflow
pub fn check(workflow: &WorkflowDefinition) -> Qualification {
    if !is_pull_request_workflow(workflow) {
        Qualification::NotPullRequest
    } else if !runs_on_synchronize(workflow) {
        Qualification::NoSynchronize
    } else {
        Qualification::Qualifies
    }
}

/// Whether the workflow should produce an approval rule
pub fn qualifies(workflow: &WorkflowDefinition) -> bool {
    check(workflow).qualifies()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(yaml: &str) -> WorkflowDefinition {
        WorkflowDefinition::from_slice(yaml.as_bytes()).unwrap()
    }

    #[rstest]
    #[case::push_only("on: push", Qualification::NotPullRequest)]
    #[case::push_map("on:\n  push:\n    branches: [main]\n", Qualification::NotPullRequest)]
    #[case::no_triggers("jobs: {}", Qualification::NotPullRequest)]
    #[case::bare_pull_request("on: pull_request", Qualification::Qualifies)]
    #[case::list_target("on: [push, pull_request_target]", Qualification::Qualifies)]
    #[case::types_omitted("on:\n  pull_request:\n    paths: [src/**]\n", Qualification::Qualifies)]
    #[case::types_closed("on:\n  pull_request:\n    types: [closed]\n", Qualification::NoSynchronize)]
    #[case::types_opened_sync(
        "on:\n  pull_request:\n    types: [opened, synchronize]\n",
        Qualification::Qualifies
    )]
    #[case::types_scalar("on:\n  pull_request:\n    types: synchronize\n", Qualification::Qualifies)]
    #[case::one_trigger_syncs(
        "on:\n  pull_request:\n    types: [closed]\n  pull_request_target:\n",
        Qualification::Qualifies
    )]
    #[case::neither_syncs(
        "on:\n  pull_request:\n    types: [closed]\n  pull_request_target:\n    types: [labeled]\n",
        Qualification::NoSynchronize
    )]
    fn test_check(#[case] yaml: &str, #[case] expected: Qualification) {
        let workflow = parse(yaml);
        assert_eq!(check(&workflow), expected);
        assert_eq!(qualifies(&workflow), expected == Qualification::Qualifies);
    }

    #[test]
    fn test_is_pull_request_workflow_ignores_types() {
        let workflow = parse("on:\n  pull_request:\n    types: [closed]\n");
        assert!(is_pull_request_workflow(&workflow));
        assert!(!runs_on_synchronize(&workflow));
    }
}
