//! Utility functions and helpers.

pub mod progress;
pub mod prompt;
pub mod settings;

pub use progress::Spinner;
pub use prompt::{Prompter, ScriptedAnswer, ScriptedPrompter, TerminalPrompter};
pub use settings::EnvSource;
