//! Git operations: diffs, hunk staging and commits.

pub mod diff;
pub mod editor;
pub mod error;
pub mod repository;

pub use diff::{build_partial_patch, split_diff, FileDiff, Hunk, HunkHeader};
pub use error::GitError;
pub use repository::{GitOperations, GitRepository};
