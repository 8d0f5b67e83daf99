//! Structured shapes exchanged with the model.

pub mod message;
pub mod patch;

pub use message::{Dependency, DependencyChanges, StructuredCommitMessage};
pub use patch::{HunkFlag, PatchDecision, PatchResponse};
