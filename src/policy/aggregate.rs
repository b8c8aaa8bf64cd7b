//! Policy aggregation over every discovered workflow

use crate::error::WorkflowError;
use crate::policy::synthesize::synthesize_rule;
use crate::policy::types::{ApprovalExpr, ApprovalRule, Policy, PolicyDocument};
use crate::workflow::{WorkflowCollection, filter};
use tracing::{debug, warn};

/// Name of the unconditional rule every generated policy ends with.
///
/// Keeps the top-level `and` satisfiable when no workflow qualifies.
pub const FALLBACK_RULE_NAME: &str = "default to approval";

/// Generate a policy requiring every qualifying workflow to pass.
///
/// Workflows are visited in ascending path order. Non-qualifying workflows
/// are skipped; workflows whose rule cannot be built (invalid globs) are
/// skipped with a warning. The result always contains the fallback rule.
pub fn aggregate(workflows: &WorkflowCollection) -> PolicyDocument {
    let mut rules = Vec::with_capacity(workflows.len() + 1);

    for (path, workflow) in workflows {
        let qualification = filter::check(workflow);
        if !qualification.qualifies() {
            debug!(path = %path, reason = qualification.reason(), "Skipping workflow");
            continue;
        }

        match synthesize_rule(path, workflow) {
            Ok(rule) => rules.push(rule),
            Err(e) => {
                let e = WorkflowError::from(e).in_file(path);
                warn!(path = %path, error = %e, "Failed to make approval rule, skipping workflow");
            }
        }
    }

    rules.push(ApprovalRule::named(FALLBACK_RULE_NAME));
    debug!(num_rules = rules.len(), "Generated approval rules");

    let requirement = rules
        .iter()
        .map(|rule| ApprovalExpr::rule(rule.name.clone()))
        .collect();

    PolicyDocument {
        policy: Policy {
            approval: vec![ApprovalExpr::And(requirement)],
            disapproval: None,
        },
        approval_rules: rules,
    }
}
