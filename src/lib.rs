//! # ai-commit
//!
//! Generates git commit messages with an LLM.
//!
//! The default flow sends the staged diff to a completion backend and
//! offers the suggested message for use, editing or discarding. Patch mode
//! asks the model to split the working-tree diff into focused patches and
//! stages and commits them one at a time.
//!
//! ## Modules
//!
//! - [`config`]: credentials file and environment overlay
//! - [`git`]: diffs, hunk staging and commits through the `git` binary
//! - [`llm`]: completion backends, prompts and response validation
//! - [`workflow`]: the single-commit flow and the patch-splitting loop

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod data;
pub mod git;
pub mod llm;
pub mod utils;
pub mod workflow;

pub use crate::cli::Cli;

/// The current version of ai-commit.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
