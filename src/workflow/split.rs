//! Splitting the working-tree diff into a series of focused commits.
//!
//! Each round asks the model for one patch: which hunks of the current
//! diff to stage and the message to commit them with. The round stages
//! exactly those hunks, commits, and feeds the resulting patch back as
//! context for the next round. Every committed round consumes at least one
//! hunk, so the loop ends once the diff runs dry if not before.

use anyhow::{Context, Result};
use console::style;
use tracing::{debug, info};

use crate::git::GitOperations;
use crate::llm::CommitClient;
use crate::utils::progress::Spinner;
use crate::workflow::WorkflowError;

/// Options for [`run_split_flow`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitOptions {
    /// Stop after staging the first patch without committing.
    pub dry_run: bool,
    /// Unstage existing changes instead of refusing to start.
    pub reset: bool,
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The working tree has no more changes.
    DiffExhausted,
    /// The model selected no hunk.
    NoHunksSelected,
    /// The model reported the last patch.
    NoMorePatches,
    /// Dry run stopped after staging.
    DryRun,
}

/// Summary of a split run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitReport {
    /// Commits created during the run.
    pub commits_created: usize,
    /// Why the loop stopped.
    pub stop_reason: StopReason,
}

/// Patches committed so far in this run, oldest first.
#[derive(Debug, Clone, Default)]
pub struct CommitHistory {
    text: String,
    patches: usize,
}

impl CommitHistory {
    /// Appends one `git format-patch` output.
    pub fn push(&mut self, patch: &str) {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
        self.text.push_str(patch);
        self.patches += 1;
    }

    /// The accumulated patches.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of patches recorded.
    pub fn len(&self) -> usize {
        self.patches
    }

    /// True before the first commit.
    pub fn is_empty(&self) -> bool {
        self.patches == 0
    }
}

/// Repeatedly stages and commits model-selected hunks of the working tree.
///
/// Errors from git, the model or validation abort the run. Commits already
/// made stay in place and nothing staged is rolled back.
pub async fn run_split_flow(
    git: &dyn GitOperations,
    client: &CommitClient,
    options: SplitOptions,
) -> Result<SplitReport> {
    if git.has_staged_changes()? {
        if !options.reset {
            return Err(WorkflowError::IndexNotClean.into());
        }
        git.reset_index().context("Failed to unstage existing changes")?;
    }

    let mut history = CommitHistory::default();
    let mut commits_created = 0;
    let report = |commits_created, stop_reason| SplitReport {
        commits_created,
        stop_reason,
    };

    loop {
        let diff = git.diff(false).context("Failed to read working tree changes")?;
        if diff.trim().is_empty() {
            println!("No changes left to commit.");
            return Ok(report(commits_created, StopReason::DiffExhausted));
        }

        let decision = {
            let _spinner = Spinner::start("Selecting the next patch...");
            client
                .create_patch_from_diff(&diff, history.as_str())
                .await?
        };
        debug!(round = commits_created + 1, reason = %decision.reason, "Patch selected");

        if decision.contains_faults {
            return Err(WorkflowError::FaultsDetected {
                reason: decision.reason,
            }
            .into());
        }
        if !decision.has_included_hunks() {
            println!("No hunks selected for another patch.");
            return Ok(report(commits_created, StopReason::NoHunksSelected));
        }

        git.stage_hunks(&diff, &decision.hunks)?;
        let headline = decision.commit_message.lines().next().unwrap_or_default();
        println!(
            "Staged {} of {} hunks: {}",
            decision.included_count(),
            decision.hunks.len(),
            style(headline).bold()
        );

        if options.dry_run {
            println!("\n{}\n", decision.commit_message.trim_end());
            println!("Dry run: hunks left staged, nothing committed.");
            return Ok(report(commits_created, StopReason::DryRun));
        }

        let output = git.commit(&decision.commit_message)?;
        print!("{output}");
        commits_created += 1;
        info!(commits_created, "Committed patch");

        if !decision.more_patches_remaining {
            return Ok(report(commits_created, StopReason::NoMorePatches));
        }
        history.push(&git.last_commit_patch()?);
    }
}
