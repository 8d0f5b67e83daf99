//! In-memory git double for workflow tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{anyhow, Result};

use crate::data::HunkFlag;
use crate::git::GitOperations;

/// Records every mutation and replays scripted diffs.
///
/// Working-tree diffs are returned in FIFO order; once exhausted, an empty
/// diff is returned.
#[derive(Default)]
pub(crate) struct MockGit {
    worktree_diffs: Mutex<VecDeque<String>>,
    staged_diff: String,
    index_dirty: Mutex<bool>,
    resets: Mutex<usize>,
    staged: Mutex<Vec<Vec<HunkFlag>>>,
    commits: Mutex<Vec<String>>,
    edited_drafts: Mutex<Vec<String>>,
    fail_commit: bool,
}

impl MockGit {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_staged_diff(mut self, diff: &str) -> Self {
        self.staged_diff = diff.to_string();
        self
    }

    pub(crate) fn with_worktree_diffs(self, diffs: &[&str]) -> Self {
        *self.worktree_diffs.lock().unwrap() = diffs.iter().map(|d| (*d).to_string()).collect();
        self
    }

    pub(crate) fn with_dirty_index(self) -> Self {
        *self.index_dirty.lock().unwrap() = true;
        self
    }

    pub(crate) fn failing_commits(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    pub(crate) fn staged(&self) -> Vec<Vec<HunkFlag>> {
        self.staged.lock().unwrap().clone()
    }

    pub(crate) fn commits(&self) -> Vec<String> {
        self.commits.lock().unwrap().clone()
    }

    pub(crate) fn edited_drafts(&self) -> Vec<String> {
        self.edited_drafts.lock().unwrap().clone()
    }

    pub(crate) fn resets(&self) -> usize {
        *self.resets.lock().unwrap()
    }
}

/// Patch text returned for the commit at `index`.
pub(crate) fn patch_for_commit(index: usize) -> String {
    format!("From 000{index}\nSubject: [PATCH] commit {index}\n")
}

impl GitOperations for MockGit {
    fn diff(&self, staged: bool) -> Result<String> {
        if staged {
            return Ok(self.staged_diff.clone());
        }
        Ok(self
            .worktree_diffs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    fn has_staged_changes(&self) -> Result<bool> {
        Ok(*self.index_dirty.lock().unwrap())
    }

    fn reset_index(&self) -> Result<()> {
        *self.resets.lock().unwrap() += 1;
        *self.index_dirty.lock().unwrap() = false;
        Ok(())
    }

    fn stage_hunks(&self, _diff: &str, flags: &[HunkFlag]) -> Result<()> {
        self.staged.lock().unwrap().push(flags.to_vec());
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<String> {
        if self.fail_commit {
            return Err(anyhow!("pre-commit hook failed"));
        }
        self.commits.lock().unwrap().push(message.to_string());
        Ok(String::new())
    }

    fn commit_with_editor(&self, draft: &str) -> Result<String> {
        self.edited_drafts.lock().unwrap().push(draft.to_string());
        Ok(String::new())
    }

    fn last_commit_patch(&self) -> Result<String> {
        Ok(patch_for_commit(self.commits.lock().unwrap().len()))
    }
}
