//! Merging a generated policy with a user-authored one
//!
//! Merging is additive: approval expressions and approval rules of both
//! documents are concatenated, left first. Two things are rejected instead of
//! resolved:
//! - both documents defining a disapproval policy
//! - a rule name defined more than once in the merged rule list

use crate::error::MergeError;
use crate::policy::types::{ApprovalRule, Policy, PolicyDocument};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Names that appear more than once, deduplicated, in first-seen order
pub fn find_duplicate_rule_names(rules: &[ApprovalRule]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates: Vec<String> = Vec::new();

    for rule in rules {
        if !seen.insert(rule.name.as_str()) && !duplicates.contains(&rule.name) {
            duplicates.push(rule.name.clone());
        }
    }

    duplicates
}

/// Merge `right` into `left`.
///
/// On failure no partial document is produced. References to rules neither
/// side defines are logged and kept.
pub fn merge(left: PolicyDocument, right: PolicyDocument) -> Result<PolicyDocument, MergeError> {
    debug!("Merging user-provided policy with generated policy");

    let has_disapproval_left = left.policy.disapproval.is_some();
    let has_disapproval_right = right.policy.disapproval.is_some();
    if has_disapproval_left && has_disapproval_right {
        return Err(MergeError::DisapprovalConflict);
    }

    let (n_rules_left, n_rules_right) = (left.approval_rules.len(), right.approval_rules.len());
    let (n_policies_left, n_policies_right) =
        (left.policy.approval.len(), right.policy.approval.len());

    let mut approval = left.policy.approval;
    approval.extend(right.policy.approval);

    let mut approval_rules = left.approval_rules;
    approval_rules.extend(right.approval_rules);

    let duplicates = find_duplicate_rule_names(&approval_rules);
    if !duplicates.is_empty() {
        return Err(MergeError::DuplicateRuleNames { names: duplicates });
    }

    let merged = PolicyDocument {
        policy: Policy {
            approval,
            disapproval: left.policy.disapproval.or(right.policy.disapproval),
        },
        approval_rules,
    };

    debug!(
        n_approval_rules_left = n_rules_left,
        n_approval_rules_right = n_rules_right,
        n_approval_rules_merged = merged.approval_rules.len(),
        n_approval_policies_left = n_policies_left,
        n_approval_policies_right = n_policies_right,
        n_approval_policies_merged = merged.policy.approval.len(),
        has_disapproval_left,
        has_disapproval_right,
        "Merged policies"
    );

    let undefined = merged.undefined_rule_references();
    if !undefined.is_empty() {
        warn!(rules = ?undefined, "Merged policy references approval rules that are not defined");
    }

    Ok(merged)
}
