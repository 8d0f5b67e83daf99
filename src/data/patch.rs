//! Patch-splitting decision returned by the model.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::message::StructuredCommitMessage;
use crate::llm::error::LlmError;

/// Raw patch response, exactly as the model emits it.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PatchResponse {
    /// One `"y"`/`"n"` entry per hunk in the diff, in diff order.
    #[serde(rename = "included-hunks")]
    pub included_hunks: Vec<String>,
    /// Model's explanation of the grouping.
    pub reason: String,
    /// Message for the commit built from the included hunks.
    #[serde(rename = "commitMessage")]
    pub commit_message: StructuredCommitMessage,
    /// Whether further patches should follow this one.
    #[serde(rename = "morePatchesRemaining")]
    pub more_patches_remaining: bool,
    /// Whether the model spotted content that should not be committed.
    #[serde(rename = "containsFaults")]
    pub contains_faults: bool,
}

/// Per-hunk staging decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HunkFlag {
    /// Stage this hunk.
    Include,
    /// Leave this hunk in the working tree.
    Skip,
}

impl HunkFlag {
    /// Parses a model flag. Only the exact strings `"y"` and `"n"` are accepted.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "y" => Some(Self::Include),
            "n" => Some(Self::Skip),
            _ => None,
        }
    }

    /// Returns true for [`HunkFlag::Include`].
    pub fn is_included(self) -> bool {
        self == Self::Include
    }
}

impl fmt::Display for HunkFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Include => write!(f, "y"),
            Self::Skip => write!(f, "n"),
        }
    }
}

/// A validated patch decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchDecision {
    /// Flags aligned one-to-one with the hunks of the diff they were made for.
    pub hunks: Vec<HunkFlag>,
    /// Model's explanation of the grouping.
    pub reason: String,
    /// Full commit message with dependency changes merged into the body.
    pub commit_message: String,
    /// Whether further patches should follow this one.
    pub more_patches_remaining: bool,
    /// Whether the model spotted content that should not be committed.
    pub contains_faults: bool,
}

impl PatchDecision {
    /// Returns true when at least one hunk is flagged for staging.
    pub fn has_included_hunks(&self) -> bool {
        self.hunks.iter().any(|flag| flag.is_included())
    }

    /// Number of hunks flagged for staging.
    pub fn included_count(&self) -> usize {
        self.hunks.iter().filter(|flag| flag.is_included()).count()
    }
}

impl PatchResponse {
    /// Validates the response against the hunk count of the diff it answers.
    ///
    /// The flag list length must equal `expected_hunks` and every flag must be
    /// exactly `"y"` or `"n"`. Nothing is coerced: any mismatch is an error.
    pub fn validate(self, expected_hunks: usize) -> Result<PatchDecision, LlmError> {
        if self.included_hunks.len() != expected_hunks {
            return Err(LlmError::HunkCountMismatch {
                expected: expected_hunks,
                actual: self.included_hunks.len(),
            });
        }

        let hunks = self
            .included_hunks
            .iter()
            .enumerate()
            .map(|(index, value)| {
                HunkFlag::parse(value).ok_or_else(|| LlmError::InvalidHunkFlag {
                    index,
                    value: value.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PatchDecision {
            hunks,
            reason: self.reason,
            commit_message: self.commit_message.full_message(),
            more_patches_remaining: self.more_patches_remaining,
            contains_faults: self.contains_faults,
        })
    }
}
