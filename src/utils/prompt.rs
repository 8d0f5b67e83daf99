//! Interactive prompts.
//!
//! Workflows talk to the user through [`Prompter`] so they can be driven
//! headlessly. [`TerminalPrompter`] is the real terminal implementation and
//! [`ScriptedPrompter`] replays canned answers.

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{anyhow, bail, Context, Result};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Password, Select};

/// Asks the user to choose or type something.
pub trait Prompter {
    /// Shows `items` under `title` and returns the index of the chosen one.
    fn select(&self, title: &str, items: &[&str]) -> Result<usize>;

    /// Reads one line of text. `masked` hides the typed characters.
    fn input(&self, title: &str, masked: bool) -> Result<String>;

    /// Reads one line of text, asking again until it is not blank.
    fn required_input(&self, title: &str, masked: bool) -> Result<String> {
        loop {
            let value = self.input(title, masked)?;
            if !value.trim().is_empty() {
                return Ok(value);
            }
        }
    }
}

/// Shown when a required answer is left blank.
pub const EMPTY_INPUT_MESSAGE: &str = "Sorry, this cannot be empty";

#[allow(clippy::ptr_arg)]
fn not_blank(value: &String) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        Err(EMPTY_INPUT_MESSAGE)
    } else {
        Ok(())
    }
}

/// Prompts on the controlling terminal.
#[derive(Default)]
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    /// Creates a prompter using the colorful theme.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Prompter for TerminalPrompter {
    fn select(&self, title: &str, items: &[&str]) -> Result<usize> {
        Select::with_theme(&self.theme)
            .with_prompt(title)
            .items(items)
            .default(0)
            .interact()
            .with_context(|| format!("Failed to read selection for {title:?}"))
    }

    fn input(&self, title: &str, masked: bool) -> Result<String> {
        let value = if masked {
            Password::with_theme(&self.theme)
                .with_prompt(title)
                .allow_empty_password(true)
                .interact()
        } else {
            Input::<String>::with_theme(&self.theme)
                .with_prompt(title)
                .allow_empty(true)
                .interact_text()
        };
        value.with_context(|| format!("Failed to read input for {title:?}"))
    }

    fn required_input(&self, title: &str, masked: bool) -> Result<String> {
        let value = if masked {
            Password::with_theme(&self.theme)
                .with_prompt(title)
                .validate_with(not_blank)
                .interact()
        } else {
            Input::<String>::with_theme(&self.theme)
                .with_prompt(title)
                .validate_with(not_blank)
                .interact_text()
        };
        value.with_context(|| format!("Failed to read input for {title:?}"))
    }
}

/// One canned answer for a [`ScriptedPrompter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedAnswer {
    /// Index to return from [`Prompter::select`].
    Choice(usize),
    /// Text to return from [`Prompter::input`].
    Text(String),
}

/// Replays answers in order, recording every question asked.
///
/// Asking more questions than were scripted, or asking a question of the
/// wrong kind, is an error.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<ScriptedAnswer>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    /// Creates a prompter that replays `answers`.
    pub fn new(answers: impl IntoIterator<Item = ScriptedAnswer>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Titles of the questions asked so far.
    pub fn asked(&self) -> Vec<String> {
        self.asked
            .lock()
            .map(|asked| asked.clone())
            .unwrap_or_default()
    }

    /// Number of scripted answers not consumed yet.
    pub fn remaining(&self) -> usize {
        self.answers.lock().map(|a| a.len()).unwrap_or_default()
    }

    fn next(&self, title: &str) -> Result<ScriptedAnswer> {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(title.to_string());
        }
        self.answers
            .lock()
            .map_err(|_| anyhow!("Scripted answers lock poisoned"))?
            .pop_front()
            .ok_or_else(|| anyhow!("No scripted answer left for {title:?}"))
    }
}

impl Prompter for ScriptedPrompter {
    fn select(&self, title: &str, items: &[&str]) -> Result<usize> {
        match self.next(title)? {
            ScriptedAnswer::Choice(index) if index < items.len() => Ok(index),
            ScriptedAnswer::Choice(index) => {
                bail!("Scripted choice {index} out of range for {title:?}")
            }
            ScriptedAnswer::Text(_) => bail!("Expected a choice for {title:?}, got text"),
        }
    }

    fn input(&self, title: &str, _masked: bool) -> Result<String> {
        match self.next(title)? {
            ScriptedAnswer::Text(text) => Ok(text),
            ScriptedAnswer::Choice(_) => bail!("Expected text for {title:?}, got a choice"),
        }
    }
}
