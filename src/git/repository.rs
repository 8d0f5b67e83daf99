//! Git repository access through the `git` binary.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow::{Context, Result};
use git2::Repository;
use tracing::{debug, info, warn};

use crate::data::HunkFlag;
use crate::git::diff::build_partial_patch;
use crate::git::editor;
use crate::git::error::GitError;

/// Repository operations the workflows depend on.
pub trait GitOperations {
    /// Returns `git diff` output, or `git diff --cached` when `staged`.
    fn diff(&self, staged: bool) -> Result<String>;

    /// Returns true when the index differs from `HEAD`.
    fn has_staged_changes(&self) -> Result<bool>;

    /// Unstages everything, keeping the working tree.
    fn reset_index(&self) -> Result<()>;

    /// Stages the hunks of `diff` flagged for inclusion.
    fn stage_hunks(&self, diff: &str, flags: &[HunkFlag]) -> Result<()>;

    /// Commits the index with `message`, returning git's output.
    fn commit(&self, message: &str) -> Result<String>;

    /// Opens `draft` in the user's editor and commits the edited text.
    fn commit_with_editor(&self, draft: &str) -> Result<String>;

    /// Returns `git format-patch -1 --stdout` for `HEAD`.
    fn last_commit_patch(&self) -> Result<String>;
}

/// A working tree, driven through `git` subprocesses.
#[derive(Debug, Clone)]
pub struct GitRepository {
    workdir: PathBuf,
}

impl GitRepository {
    /// Opens the repository containing the current directory.
    pub fn open() -> Result<Self> {
        Self::open_at(".")
    }

    /// Opens the repository containing `path`.
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::discover(path)
            .with_context(|| format!("Not in a git repository: {}", path.display()))?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| GitError::NotARepository(repo.path().display().to_string()))?
            .to_path_buf();
        debug!(workdir = %workdir.display(), "Opened repository");
        Ok(Self { workdir })
    }

    /// Root of the working tree.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Reads a git configuration value, `None` when unset.
    pub fn config_value(&self, key: &str) -> Result<Option<String>> {
        let command = format!("git config --get {key}");
        let output = Command::new("git")
            .args(["config", "--get", key])
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| GitError::Spawn {
                command: command.clone(),
                source,
            })?;

        match output.status.code() {
            Some(0) => {
                let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
                Ok(Some(value).filter(|v| !v.is_empty()))
            }
            // Exit code 1 means the key is not set.
            Some(1) => Ok(None),
            _ => Err(GitError::CommandFailed {
                command,
                output: combined_output(&output),
            }
            .into()),
        }
    }

    /// Runs git, optionally feeding `input` on stdin, and returns stdout.
    ///
    /// A non-zero exit returns the combined stdout and stderr in the error.
    pub(crate) fn run(&self, args: &[&str], input: Option<&str>) -> Result<String, GitError> {
        let command = format!("git {}", args.join(" "));
        debug!(%command, "Running git");

        let spawn_error = |source: std::io::Error| GitError::Spawn {
            command: command.clone(),
            source,
        };

        let mut child = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        if let (Some(input), Some(mut stdin)) = (input, child.stdin.take()) {
            stdin.write_all(input.as_bytes()).map_err(spawn_error)?;
        }

        let output = child.wait_with_output().map_err(spawn_error)?;
        if !output.status.success() {
            return Err(GitError::CommandFailed {
                command,
                output: combined_output(&output),
            });
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            warn!(%command, stderr = %stderr.trim(), "git wrote to stderr");
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text
}

impl GitOperations for GitRepository {
    fn diff(&self, staged: bool) -> Result<String> {
        let mut args = vec![
            "diff",
            "--no-color",
            "--no-ext-diff",
            "--src-prefix=a/",
            "--dst-prefix=b/",
        ];
        if staged {
            args.push("--cached");
        }
        let diff = self.run(&args, None)?;
        debug!(staged, diff_len = diff.len(), "Read diff");
        Ok(diff)
    }

    fn has_staged_changes(&self) -> Result<bool> {
        let repo = Repository::open(&self.workdir).context("Failed to open git repository")?;
        let head_tree = match repo.head() {
            Ok(head) => Some(head.peel_to_tree().context("Failed to read HEAD tree")?),
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => None,
            Err(e) if e.code() == git2::ErrorCode::NotFound => None,
            Err(e) => return Err(e).context("Failed to resolve HEAD"),
        };
        let index = repo.index().context("Failed to read index")?;
        let diff = repo
            .diff_tree_to_index(head_tree.as_ref(), Some(&index), None)
            .context("Failed to compare index with HEAD")?;
        Ok(diff.deltas().len() > 0)
    }

    fn reset_index(&self) -> Result<()> {
        self.run(&["reset", "-q"], None)?;
        info!("Unstaged all changes");
        Ok(())
    }

    fn stage_hunks(&self, diff: &str, flags: &[HunkFlag]) -> Result<()> {
        let patch = build_partial_patch(diff, flags)?;
        if patch.is_empty() {
            debug!("No hunks selected, nothing to stage");
            return Ok(());
        }
        self.run(
            &["apply", "--cached", "--whitespace=nowarn", "-"],
            Some(patch.as_str()),
        )
        .context("Failed to stage selected hunks")?;
        info!(
            hunks = flags.iter().filter(|f| f.is_included()).count(),
            "Staged hunks"
        );
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<String> {
        let output = self
            .run(&["commit", "-m", message], None)
            .context("Failed to create commit")?;
        info!("Created commit");
        Ok(output)
    }

    fn commit_with_editor(&self, draft: &str) -> Result<String> {
        editor::edit_and_commit(self, draft)
    }

    fn last_commit_patch(&self) -> Result<String> {
        Ok(self
            .run(&["format-patch", "-1", "--stdout"], None)
            .context("Failed to read last commit")?)
    }
}
