//! CLI interface for ai-commit.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use crate::config::ConfigManager;
use crate::git::GitRepository;
use crate::llm::{create_ai_client, CommitClient};
use crate::utils::prompt::TerminalPrompter;
use crate::workflow::{run_commit_flow, run_split_flow, SplitOptions};
use crate::VERSION;

/// ai-commit: LLM-written commit messages for the staged diff.
#[derive(Parser, Debug)]
#[command(name = "ai-commit")]
#[command(about = "Generate git commit messages with an LLM", long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Prompts for new credentials and saves them.
    #[arg(long)]
    pub config: bool,

    /// Prints the current configuration with the key masked.
    #[arg(long)]
    pub show_config: bool,

    /// Prints the version.
    #[arg(short = 'v', long)]
    pub version: bool,

    /// Splits working-tree changes into several focused commits.
    #[arg(short = 'p', long)]
    pub patch: bool,

    /// Stages the first patch and stops without committing.
    #[arg(long, requires = "patch")]
    pub dry_run: bool,

    /// Unstages already staged changes before splitting.
    #[arg(long, requires = "patch")]
    pub reset: bool,

    /// Overrides the configured model.
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Seconds to wait for the model before giving up.
    #[arg(
        long,
        value_name = "SECONDS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: u64,

    #[arg(hide = true)]
    unknown: Vec<String>,
}

impl Cli {
    /// Executes the CLI command.
    pub async fn execute(self) -> Result<()> {
        if let Some(word) = self.unknown.first() {
            println!("No options with \"{word}\" here.");
            return Ok(());
        }
        if self.version {
            println!("Version: {VERSION}");
            return Ok(());
        }

        let manager = ConfigManager::new()?;
        if self.show_config {
            let config = manager.read_file()?.unwrap_or_default();
            let config = manager.apply_env(config)?;
            println!("{}", manager.describe(&config));
            return Ok(());
        }

        let prompter = TerminalPrompter::new();
        let config = manager.load(self.config, &prompter)?;
        if self.config && !self.patch {
            return Ok(());
        }

        let repo = GitRepository::open()?;
        let timeout = Duration::from_secs(self.timeout);
        let ai_client = create_ai_client(&config.settings, self.model.as_deref(), timeout)?;
        let client = CommitClient::with_timeout(ai_client, timeout);
        debug!(metadata = ?client.get_ai_client_metadata(), "Client ready");

        if self.patch {
            let options = SplitOptions {
                dry_run: self.dry_run,
                reset: self.reset,
            };
            let report = run_split_flow(&repo, &client, options).await?;
            println!(
                "Created {} commit{}.",
                report.commits_created,
                if report.commits_created == 1 { "" } else { "s" }
            );
        } else {
            run_commit_flow(&repo, &client, &prompter).await?;
        }
        Ok(())
    }
}
