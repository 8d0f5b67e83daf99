//! Single commit from the staged diff.

use anyhow::{Context, Result};
use console::style;
use tracing::info;

use crate::data::message::format_commit_message;
use crate::git::GitOperations;
use crate::llm::CommitClient;
use crate::utils::progress::Spinner;
use crate::utils::prompt::Prompter;

/// What to do with a generated message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitChoice {
    /// Commit as generated.
    Use,
    /// Open the message in an editor first.
    Edit,
    /// Do not commit.
    Discard,
}

impl CommitChoice {
    /// Menu order.
    pub const ALL: [Self; 3] = [Self::Use, Self::Edit, Self::Discard];

    /// Menu label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Use => "Use commit",
            Self::Edit => "Edit commit",
            Self::Discard => "Do not commit",
        }
    }
}

/// How the single-commit flow ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Nothing was staged.
    NothingToCommit,
    /// Committed with the generated message.
    Committed,
    /// Committed with an edited message.
    Edited,
    /// The user declined.
    Discarded,
}

/// Generates a message for the staged diff and lets the user commit it.
pub async fn run_commit_flow(
    git: &dyn GitOperations,
    client: &CommitClient,
    prompter: &dyn Prompter,
) -> Result<CommitOutcome> {
    let diff = git.diff(true).context("Failed to read staged changes")?;
    if diff.trim().is_empty() {
        println!("No staged changes. Stage files with `git add` first.");
        return Ok(CommitOutcome::NothingToCommit);
    }

    let (headline, description) = {
        let _spinner = Spinner::start("Generating commit message...");
        client.generate_commit_message(&diff).await?
    };

    println!("\n{}\n\n{}\n", style(&headline).bold(), description.trim_end());
    let message = format_commit_message(&headline, &description);

    let labels = CommitChoice::ALL.map(CommitChoice::label);
    let choice = CommitChoice::ALL[prompter.select("What would you like to do?", &labels)?];
    info!(?choice, "Commit choice");

    match choice {
        CommitChoice::Use => {
            let output = git.commit(&message)?;
            print!("{output}");
            Ok(CommitOutcome::Committed)
        }
        CommitChoice::Edit => {
            let output = git.commit_with_editor(&message)?;
            print!("{output}");
            Ok(CommitOutcome::Edited)
        }
        CommitChoice::Discard => {
            println!("Commit discarded.");
            Ok(CommitOutcome::Discarded)
        }
    }
}
