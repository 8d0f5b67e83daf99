//! Prompt templates for commit message generation and patch splitting.

use super::ai::Prompt;
use super::schema::{COMMIT_MESSAGE_SCHEMA, PATCH_SCHEMA};

/// Role instruction for single commit message generation.
pub const COMMIT_AUTHOR_PROMPT: &str = "You are a helpful git commit author. \
Write a concise headline and a brief description for the following git diff.";

/// Keeps the headline focused.
pub const HEADLINE_SCOPE_PROMPT: &str =
    "The headline should only mention the core area of the diff.";

/// Routes dependency changes into structured output instead of prose.
pub const DEPENDENCY_PROMPT: &str = "Do not mention dependency changes in the headline or \
description. Report them in the dependencies field of the structured output instead.";

/// Role instruction for patch splitting.
pub const PATCH_AUTHOR_PROMPT: &str = "You are an experienced engineer who curates git \
history. Help split a working-tree diff into focused patches and write a commit message \
for each one.";

/// Explains how hunks are selected.
pub const PATCH_RULES_PROMPT: &str = r#"The diff below was produced by 'git --no-pager diff' and probably contains several unrelated changes that belong in separate commits.
A patch may span several files and hunks when they belong together.
Select exactly one patch: the change a human would most naturally commit first.
For "included-hunks" return one entry per hunk, in the order the hunks appear in the diff, exactly like answering 'git add --patch': "y" stages the hunk, "n" leaves it for a later patch. Use only the strings "y" and "n".
Set "morePatchesRemaining" to false when the hunks you include leave nothing else to commit, otherwise true.
If the diff contains content that must not be committed, such as credentials, API keys or accidental debug output, leave those hunks out and set "containsFaults" to true.
Explain your grouping briefly in "reason"."#;

/// Commit message rules for patches.
pub const PATCH_MESSAGE_PROMPT: &str = "Commit messages: the headline should only mention the \
core area of the hunks being staged in this patch. Dependency changes go in the dependencies \
field of the structured output, not in the headline or description.";

fn schema_instruction(fields: &str, schema: &str) -> String {
    format!(
        "Output must be a single JSON object with {fields} according to this schema: {schema}"
    )
}

/// Builds the prompt for a single commit message.
pub fn commit_message_prompt(diff: &str) -> Prompt {
    Prompt::new(format!("my diff is:\n{diff}"))
        .with_system(COMMIT_AUTHOR_PROMPT)
        .with_system(HEADLINE_SCOPE_PROMPT)
        .with_system(DEPENDENCY_PROMPT)
        .with_system(schema_instruction(
            "headline, description and dependencies fields",
            COMMIT_MESSAGE_SCHEMA,
        ))
}

/// Builds the prompt asking for the next patch of a split.
///
/// `history` holds the patches already committed in this run and may be empty.
pub fn patch_prompt(diff: &str, hunk_count: usize, history: &str) -> Prompt {
    let mut user = format!("my diff is:\n{diff}");
    if !history.trim().is_empty() {
        user.push_str("\n\nFor context, I have already applied the following commits:\n");
        user.push_str(history);
    }

    Prompt::new(user)
        .with_system(PATCH_AUTHOR_PROMPT)
        .with_system(schema_instruction(
            "included-hunks, reason, commitMessage, morePatchesRemaining and containsFaults fields",
            PATCH_SCHEMA,
        ))
        .with_system(PATCH_RULES_PROMPT)
        .with_system(format!(
            "Number of hunks in the diff: {hunk_count}. The included-hunks list must contain exactly {hunk_count} entries."
        ))
        .with_system(PATCH_MESSAGE_PROMPT)
}
