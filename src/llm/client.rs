//! Commit message and patch-splitting requests on top of an [`AiClient`].

use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::data::{PatchDecision, PatchResponse, StructuredCommitMessage};
use crate::llm::ai::{AiClient, AiClientMetadata, GenerationOptions, Prompt};
use crate::llm::error::LlmError;
use crate::llm::prompts;

/// Upper bound for a single generation.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Counts hunk headers, i.e. lines starting with `@@`.
pub fn count_hunks(diff: &str) -> usize {
    diff.lines().filter(|line| line.starts_with("@@")).count()
}

/// Strips a markdown code fence surrounding the whole response.
///
/// Fences inside the JSON (for example in a description) are left alone.
fn extract_json(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.trim_end().strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string on the opening line, e.g. `json`.
    match body.split_once('\n') {
        Some((info, inner)) if !info.trim_start().starts_with('{') => inner.trim(),
        _ => body.trim(),
    }
}

fn parse_structured<T: DeserializeOwned>(content: &str) -> Result<T, LlmError> {
    let trimmed = content.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }
    serde_json::from_str(extract_json(trimmed)).map_err(|e| {
        debug!(raw = %content, "Model response did not match the schema");
        LlmError::ResponseParse(e.to_string())
    })
}

/// Client issuing the two structured requests the tool needs.
pub struct CommitClient {
    client: Box<dyn AiClient>,
    timeout: Duration,
}

impl CommitClient {
    /// Wraps an AI client with the default generation timeout.
    pub fn new(client: Box<dyn AiClient>) -> Self {
        Self::with_timeout(client, DEFAULT_GENERATION_TIMEOUT)
    }

    /// Wraps an AI client with a custom generation timeout.
    pub fn with_timeout(client: Box<dyn AiClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Returns metadata of the underlying AI client.
    pub fn get_ai_client_metadata(&self) -> AiClientMetadata {
        self.client.get_metadata()
    }

    async fn send(&self, prompt: &Prompt) -> Result<String> {
        let metadata = self.client.get_metadata();
        info!(
            provider = %metadata.provider,
            model = %metadata.model,
            prompt_len = prompt.len(),
            "Requesting completion"
        );

        let options = GenerationOptions::json_object();
        match tokio::time::timeout(self.timeout, self.client.generate(prompt, &options)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(self.timeout.as_secs()).into()),
        }
    }

    /// Generates a headline and description for a staged diff.
    ///
    /// The description already carries the dependency appendix.
    pub async fn generate_commit_message(&self, diff: &str) -> Result<(String, String)> {
        let prompt = prompts::commit_message_prompt(diff);
        let content = self
            .send(&prompt)
            .await
            .context("Failed to generate commit message")?;

        let message: StructuredCommitMessage =
            parse_structured(&content).context("Failed to decode commit message")?;
        let description = message.description_with_dependencies();
        Ok((message.headline, description))
    }

    /// Asks the model which hunks of `diff` form the next patch.
    ///
    /// `history` holds the patches committed earlier in this run. The
    /// returned flags are guaranteed to line up with the hunks of `diff`.
    pub async fn create_patch_from_diff(&self, diff: &str, history: &str) -> Result<PatchDecision> {
        let hunk_count = count_hunks(diff);
        debug!(hunk_count, history_len = history.len(), "Requesting next patch");

        let prompt = prompts::patch_prompt(diff, hunk_count, history);
        let content = self
            .send(&prompt)
            .await
            .context("Failed to generate patch")?;

        let response: PatchResponse =
            parse_structured(&content).context("Failed to decode patch response")?;
        let decision = response.validate(hunk_count)?;

        debug!(
            included = decision.included_count(),
            more = decision.more_patches_remaining,
            reason = %decision.reason,
            "Patch decision received"
        );
        Ok(decision)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;

    use proptest::prelude::*;

    use super::*;
    use crate::data::HunkFlag;
    use crate::llm::test_utils::{ConfigurableMockAiClient, PromptRecordHandle};

    const TWO_HUNK_DIFF: &str = "\
diff --git a/src/lib.rs b/src/lib.rs
index 1111111..2222222 100644
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -1,3 +1,3 @@
 fn a() {}
-fn b() {}
+fn b() { fix(); }
 fn c() {}
@@ -20,3 +20,4 @@
 fn x() {}
+fn y() {}
 fn z() {}
";

    fn patch_json(flags: &[&str], more: bool, faults: bool) -> String {
        serde_json::json!({
            "included-hunks": flags,
            "reason": "bug fix first",
            "commitMessage": {"headline": "fix bug", "description": "details"},
            "morePatchesRemaining": more,
            "containsFaults": faults
        })
        .to_string()
    }

    fn client_with(responses: Vec<Result<String>>) -> (CommitClient, PromptRecordHandle) {
        let mock = ConfigurableMockAiClient::new(responses);
        let prompts = mock.prompt_handle();
        (CommitClient::new(Box::new(mock)), prompts)
    }

    #[test]
    fn counts_only_lines_starting_with_markers() {
        assert_eq!(count_hunks(TWO_HUNK_DIFF), 2);
        assert_eq!(count_hunks(""), 0);
        assert_eq!(count_hunks(" @@ not a header\n+@@ nope\n"), 0);
    }

    #[test]
    fn extracts_fenced_json() {
        assert_eq!(extract_json("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(extract_json("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(extract_json("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn fence_inside_a_string_is_not_stripped() {
        let content = r#"{"text": "see ```json {} ``` here"}"#;
        assert_eq!(extract_json(content), content);
        assert_eq!(extract_json("```{\"a\":1}```"), "{\"a\":1}");
    }

    #[tokio::test]
    async fn description_mentioning_a_json_fence_parses() {
        let body = serde_json::json!({
            "headline": "Document config format",
            "description": "README now shows a ```json example block.",
            "dependencies": {"added": [], "upgraded": [], "downgraded": [], "removed": []}
        })
        .to_string();
        let (client, _) = client_with(vec![Ok(body)]);

        let (headline, description) = client.generate_commit_message("+docs").await.unwrap();
        assert_eq!(headline, "Document config format");
        assert_eq!(description, "README now shows a ```json example block.");
    }

    #[tokio::test]
    async fn fenced_response_parses() {
        let body = "```json\n{\"headline\": \"h\", \"description\": \"d\", \"dependencies\": {\"added\": [], \"upgraded\": [], \"downgraded\": [], \"removed\": []}}\n```";
        let (client, _) = client_with(vec![Ok(body.to_string())]);
        let (headline, _) = client.generate_commit_message("+x").await.unwrap();
        assert_eq!(headline, "h");
    }

    #[tokio::test]
    async fn commit_message_merges_dependencies() {
        let body = serde_json::json!({
            "headline": "Add http client",
            "description": "Talk to the API",
            "dependencies": {
                "added": [{"name": "reqwest", "version": "0.13"}],
                "upgraded": [], "downgraded": [], "removed": []
            }
        })
        .to_string();
        let (client, handle) = client_with(vec![Ok(body)]);

        let (headline, description) = client.generate_commit_message("+x").await.unwrap();
        assert_eq!(headline, "Add http client");
        assert_eq!(
            description,
            "Talk to the API\n\nDependency changes:\n- Added:\n  - reqwest (0.13)\n"
        );

        let prompts = handle.prompts();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].user, "my diff is:\n+x");
    }

    #[tokio::test]
    async fn malformed_commit_message_is_parse_error() {
        let (client, _) = client_with(vec![Ok("not json".to_string())]);
        let err = client.generate_commit_message("+x").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LlmError>(),
            Some(LlmError::ResponseParse(_))
        ));
    }

    #[tokio::test]
    async fn patch_decision_is_validated_against_diff() {
        let (client, handle) = client_with(vec![Ok(patch_json(&["y", "n"], true, false))]);

        let decision = client
            .create_patch_from_diff(TWO_HUNK_DIFF, "")
            .await
            .unwrap();
        assert_eq!(decision.hunks, vec![HunkFlag::Include, HunkFlag::Skip]);
        assert_eq!(decision.commit_message, "fix bug\n\ndetails");
        assert!(decision.more_patches_remaining);

        let prompts = handle.prompts();
        assert!(prompts[0]
            .system
            .iter()
            .any(|s| s.contains("Number of hunks in the diff: 2.")));
    }

    #[tokio::test]
    async fn patch_length_mismatch_fails() {
        let (client, _) = client_with(vec![Ok(patch_json(&["y"], false, false))]);
        let err = client
            .create_patch_from_diff(TWO_HUNK_DIFF, "")
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LlmError>(),
            Some(LlmError::HunkCountMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[tokio::test]
    async fn patch_invalid_flag_fails() {
        let (client, _) = client_with(vec![Ok(patch_json(&["y", "yes"], false, false))]);
        let err = client
            .create_patch_from_diff(TWO_HUNK_DIFF, "")
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LlmError>(),
            Some(LlmError::InvalidHunkFlag { index: 1, .. })
        ));
    }

    #[tokio::test]
    async fn zero_hunk_diff_requires_empty_flags() {
        let (client, _) = client_with(vec![
            Ok(patch_json(&[], false, false)),
            Ok(patch_json(&["n"], false, false)),
        ]);
        let decision = client
            .create_patch_from_diff("Binary files differ\n", "")
            .await
            .unwrap();
        assert!(decision.hunks.is_empty());

        let err = client
            .create_patch_from_diff("Binary files differ\n", "")
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LlmError>(),
            Some(LlmError::HunkCountMismatch {
                expected: 0,
                actual: 1
            })
        ));
    }

    #[tokio::test]
    async fn backend_error_propagates() {
        let (client, _) = client_with(vec![Err(anyhow::anyhow!("rate limit"))]);
        let err = client.generate_commit_message("+x").await.unwrap_err();
        assert!(format!("{err:#}").contains("rate limit"));
    }

    struct StalledClient;

    impl AiClient for StalledClient {
        fn generate<'a>(
            &'a self,
            _prompt: &'a Prompt,
            _options: &'a GenerationOptions,
        ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
            Box::pin(std::future::pending())
        }

        fn get_metadata(&self) -> AiClientMetadata {
            AiClientMetadata {
                provider: "Stalled".to_string(),
                model: "none".to_string(),
            }
        }
    }

    #[tokio::test]
    async fn stalled_backend_times_out() {
        let client =
            CommitClient::with_timeout(Box::new(StalledClient), Duration::from_millis(50));
        let err = client.generate_commit_message("+x").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LlmError>(),
            Some(LlmError::Timeout(_))
        ));
    }

    proptest! {
        #[test]
        fn hunk_count_matches_header_lines(headers in 0usize..20, body in 0usize..5) {
            let mut diff = String::from("diff --git a/f b/f\n--- a/f\n+++ b/f\n");
            for i in 0..headers {
                diff.push_str(&format!("@@ -{i},1 +{i},1 @@\n"));
                for _ in 0..body {
                    diff.push_str(" context @@ inside\n");
                }
            }
            prop_assert_eq!(count_hunks(&diff), headers);
        }
    }
}
