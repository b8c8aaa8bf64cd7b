//! Policy module
//!
//! Turns qualifying workflows into a policy-bot configuration and merges it
//! with a user-authored one.
//!
//! ## Generated Policy
//!
//! ```yaml
//! policy:
//!   approval:
//!     - and:
//!         - .github/workflows/test.yml built or skipped
//!         - default to approval
//! approval_rules:
//!   - name: .github/workflows/test.yml built or skipped
//!     if:
//!       changed_files:
//!         paths: ["^src/.*$"]
//!     requires:
//!       conditions:
//!         has_workflow_result:
//!           conclusions: [success, skipped]
//!           workflows: [.github/workflows/test.yml]
//!   - name: default to approval
//! ```

pub mod aggregate;
pub mod glob;
pub mod merge;
pub mod synthesize;
pub mod types;

pub use aggregate::{FALLBACK_RULE_NAME, aggregate};
pub use glob::{GlobMatcher, compile_globs};
pub use merge::{find_duplicate_rule_names, merge};
pub use synthesize::{ANY_PATH, SKIPPED_OR_SUCCESS, rule_name, synthesize_rule};
pub use types::{
    ApprovalExpr, ApprovalRule, ChangedFiles, Conclusion, HasWorkflowResult, PathRegex, Policy,
    PolicyDocument, Predicates, Requires,
};
