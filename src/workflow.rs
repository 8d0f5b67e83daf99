//! Commit workflows: the single-commit flow and the patch-splitting loop.

pub mod commit;
pub mod split;

#[cfg(test)]
pub(crate) mod test_utils;

use thiserror::Error;

pub use commit::{run_commit_flow, CommitChoice, CommitOutcome};
pub use split::{run_split_flow, CommitHistory, SplitOptions, SplitReport, StopReason};

/// Conditions that stop a workflow without being git or model failures.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// The model flagged content that must not be committed.
    #[error("The diff contains changes that should not be committed: {reason}")]
    FaultsDetected {
        /// Model's explanation.
        reason: String,
    },

    /// Patch mode needs an empty index to stage into.
    #[error("The index already has staged changes; commit or unstage them, or rerun with --reset")]
    IndexNotClean,
}
