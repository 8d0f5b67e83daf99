//! Git error types.

use thiserror::Error;

/// Errors raised while running git or preparing input for it.
#[derive(Error, Debug)]
pub enum GitError {
    /// A git command exited non-zero.
    #[error("`{command}` failed:\n{output}")]
    CommandFailed {
        /// The command line that was run.
        command: String,
        /// Combined stdout and stderr.
        output: String,
    },

    /// A process could not be started.
    #[error("Failed to run `{command}`")]
    Spawn {
        /// The command line that was attempted.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Not inside a repository with a working tree.
    #[error("Not a git working tree: {0}")]
    NotARepository(String),

    /// A line starting with `@@` could not be parsed as a hunk header.
    #[error("Malformed hunk header: {0:?}")]
    MalformedHunkHeader(String),

    /// The number of hunk flags does not match the diff being staged.
    #[error("Expected {expected} hunk flags for the diff, got {actual}")]
    FlagCountMismatch {
        /// Hunks in the diff.
        expected: usize,
        /// Flags supplied.
        actual: usize,
    },

    /// The editor could not be run or exited non-zero.
    #[error("Editor `{editor}` failed: {reason}")]
    EditorFailed {
        /// Editor command line.
        editor: String,
        /// What went wrong.
        reason: String,
    },
}
