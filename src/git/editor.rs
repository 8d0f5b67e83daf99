//! Editing a draft commit message before committing.

use std::io::Write;
use std::process::Command;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::git::error::GitError;
use crate::git::repository::GitRepository;
use crate::utils::settings::EnvSource;

/// Editor used when nothing is configured.
pub const FALLBACK_EDITOR: &str = "vi";

/// Picks the editor: `core.editor`, then `GIT_EDITOR`, `VISUAL`, `EDITOR`.
pub fn resolve_editor(core_editor: Option<String>, env: &EnvSource) -> String {
    core_editor
        .filter(|e| !e.trim().is_empty())
        .or_else(|| env.get_env_vars(&["GIT_EDITOR", "VISUAL", "EDITOR"]))
        .unwrap_or_else(|| FALLBACK_EDITOR.to_string())
}

/// Splits an editor setting into program and arguments.
pub(crate) fn parse_editor_command(editor: &str) -> (&str, Vec<&str>) {
    let mut parts = editor.split_whitespace();
    let cmd = parts.next().unwrap_or(editor);
    let args: Vec<&str> = parts.collect();
    (cmd, args)
}

/// Writes `draft` to a temporary file, opens it in the editor and commits
/// the file's final contents. The file is removed on every path.
pub(crate) fn edit_and_commit(repo: &GitRepository, draft: &str) -> Result<String> {
    let mut file = tempfile::Builder::new()
        .prefix("AI_COMMIT_EDITMSG")
        .tempfile()
        .context("Failed to create temporary commit message file")?;
    file.write_all(draft.as_bytes())
        .context("Failed to write draft commit message")?;
    file.flush()
        .context("Failed to write draft commit message")?;

    let editor = resolve_editor(repo.config_value("core.editor")?, &EnvSource::process());
    let (program, args) = parse_editor_command(&editor);
    info!(%editor, path = %file.path().display(), "Opening editor");

    let status = Command::new(program)
        .args(args)
        .arg(file.path())
        .current_dir(repo.workdir())
        .status()
        .map_err(|e| GitError::EditorFailed {
            editor: editor.clone(),
            reason: e.to_string(),
        })?;
    if !status.success() {
        return Err(GitError::EditorFailed {
            editor,
            reason: format!("exited with {status}"),
        }
        .into());
    }
    debug!("Editor closed");

    let path = file.path().to_string_lossy().into_owned();
    let output = repo
        .run(&["commit", "-F", path.as_str()], None)
        .context("Failed to commit edited message")?;
    Ok(output)
}
