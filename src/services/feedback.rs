//! Feedback conversations about the last grouping.
//!
//! The processor only talks to the reasoning service. Persisting the
//! proposed policy text and pattern deltas is left to the caller.

use crate::llm::system_prompt::{FEEDBACK_TEMPERATURE, build_feedback_prompt};
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider, parse_json_completion};
use crate::models::{ChatTurn, FeedbackResponse, LastAction, PatternStore};
use crate::{Error, Result};
use secrecy::SecretString;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::instrument;

/// Character budget for the pattern summary in feedback prompts.
pub const FEEDBACK_PATTERN_BUDGET: usize = 1000;

/// Runs feedback conversations against the reasoning service.
pub struct FeedbackProcessor {
    provider: Arc<dyn LlmProvider>,
}

impl FeedbackProcessor {
    /// Creates a processor backed by `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Sends the conversation and returns the parsed answer.
    ///
    /// The last turn of `transcript` is the new user message; earlier turns
    /// are replayed as history.
    ///
    /// # Errors
    ///
    /// - `MissingCredential` if `credential` is `None`
    /// - `InvalidInput` if `transcript` is empty
    /// - `RemoteTransport` / `OperationFailed` if the remote call fails
    /// - `RemoteSchema` if the answer does not match the feedback schema
    #[instrument(skip_all, fields(turns = transcript.len()))]
    pub fn process(
        &self,
        credential: Option<&SecretString>,
        transcript: &[ChatTurn],
        last_action: &LastAction,
        soul: &str,
        patterns: &PatternStore,
    ) -> Result<FeedbackResponse> {
        let credential = credential.ok_or_else(Error::missing_credential)?;
        let Some((latest, history)) = transcript.split_last() else {
            return Err(Error::InvalidInput(
                "feedback transcript is empty".to_string(),
            ));
        };

        let last_action_json =
            serde_json::to_string_pretty(last_action).map_err(|e| Error::OperationFailed {
                operation: "serialize_last_action".to_string(),
                cause: e.to_string(),
            })?;
        let patterns_json = patterns.summarize_within(FEEDBACK_PATTERN_BUDGET);

        let mut messages = vec![ChatMessage::system(build_feedback_prompt(
            &last_action_json,
            soul,
            &patterns_json,
        ))];
        if !history.is_empty() {
            messages.push(ChatMessage::user(format_history(history)));
        }
        messages.push(ChatMessage::user(format!(
            "New User Message: {}",
            latest.message
        )));

        let completion = self.provider.complete(
            credential,
            &CompletionRequest::json(messages, FEEDBACK_TEMPERATURE),
        )?;
        let response: FeedbackResponse = parse_json_completion("feedback response", &completion)?;

        tracing::debug!(
            soul_updated = response.soul_update().is_some(),
            pattern_domains = response.updated_patterns.as_ref().map_or(0, |p| p.len()),
            "Received feedback response"
        );
        Ok(response)
    }
}

fn format_history(history: &[ChatTurn]) -> String {
    let mut out = String::from("Previous Conversation History:\n");
    for turn in history {
        let _ = writeln!(out, "{}: {}", turn.sender.label(), turn.message);
    }
    out
}
