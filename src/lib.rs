//! Workflow Policy Generator
//!
//! Generates a [policy-bot](https://github.com/palantir/policy-bot) approval
//! policy from a repository's GitHub Actions workflows.
//!
//! ## Features
//!
//! - **One rule per workflow** that runs on pull request `synchronize`, requiring
//!   the workflow to conclude `success` or `skipped`
//! - **Path scoping**: `paths` / `paths-ignore` globs become `changed_files`
//!   regex predicates
//! - **Merging** with a hand-written policy, rejecting conflicts
//! - **Crash-safe output**: the policy file is replaced atomically
//!
//! ## Pipeline
//!
//! ```text
//! workflows → filter → synthesize → aggregate → [merge] → render → write
//! ```
//!
//! ## Example Configuration
//!
//! ```toml
//! [discovery]
//! workflow_dir = ".github/workflows"
//!
//! [output]
//! path = ".policy.yml"
//!
//! [merge]
//! path = "policy.base.yml"        # hand-written rules to keep
//!
//! [logging]
//! level = "info"
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod output;
pub mod policy;
pub mod workflow;

// Re-export main types
pub use config::{GeneratorConfig, load_config};
pub use error::{AppError, Result};
pub use generator::Generator;
pub use policy::PolicyDocument;
