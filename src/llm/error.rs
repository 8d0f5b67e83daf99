//! LLM-specific error handling.

use thiserror::Error;

/// Errors raised while talking to a completion backend or reading its answer.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Completion request returned a non-success status.
    #[error("Completion request failed: {0}")]
    ApiRequestFailed(String),

    /// Network connectivity error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The backend response did not have the expected envelope.
    #[error("Invalid response format from completion API: {0}")]
    InvalidResponseFormat(String),

    /// The model's message content did not match the requested schema.
    #[error("Failed to parse model response: {0}")]
    ResponseParse(String),

    /// The model returned a different number of hunk flags than the diff has hunks.
    #[error("Expected {expected} hunks in the patch, got {actual}")]
    HunkCountMismatch {
        /// Hunks counted in the diff.
        expected: usize,
        /// Flags returned by the model.
        actual: usize,
    },

    /// A hunk flag was something other than "y" or "n".
    #[error("Invalid hunk flag {value:?} at position {index}")]
    InvalidHunkFlag {
        /// Zero-based hunk position.
        index: usize,
        /// Offending flag value.
        value: String,
    },

    /// No answer arrived within the generation time limit.
    #[error("Completion request timed out after {0} seconds")]
    Timeout(u64),

    /// The configured endpoint could not be turned into a request URL.
    #[error("Invalid endpoint URL {url}: {reason}")]
    InvalidEndpoint {
        /// URL as configured.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
}
