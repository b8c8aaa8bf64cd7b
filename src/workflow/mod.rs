//! Workflow module
//!
//! Parses GitHub Actions workflow definitions and decides which of them gate
//! pull requests.
//!
//! ## Qualifying workflows
//!
//! A workflow produces an approval rule when both hold:
//! - it triggers on `pull_request` or `pull_request_target`
//! - one of those triggers fires on `synchronize` (an omitted `types` list
//!   includes it)

pub mod discovery;
pub mod filter;
pub mod types;

pub use discovery::{
    DirSource, MemorySource, WorkflowCollection, WorkflowSource, list_workflows, load_workflows,
    parse_workflow,
};
pub use filter::{Qualification, is_pull_request_workflow, qualifies, runs_on_synchronize};
pub use types::{PathScope, TriggerDetail, Triggers, WorkflowDefinition};
