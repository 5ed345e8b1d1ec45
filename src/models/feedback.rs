//! Feedback conversation types.

use super::PatternDeltas;
use serde::{Deserialize, Serialize};

/// Who wrote a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The user.
    User,
    /// The assistant.
    Ai,
}

impl Sender {
    /// Uppercase label used when replaying history to the model.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Ai => "AI",
        }
    }
}

/// One message of a feedback conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Author of the message.
    pub sender: Sender,
    /// Message text.
    pub message: String,
}

impl ChatTurn {
    /// A user message.
    #[must_use]
    pub fn user(message: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            message: message.into(),
        }
    }

    /// An assistant message.
    #[must_use]
    pub fn ai(message: impl Into<String>) -> Self {
        Self {
            sender: Sender::Ai,
            message: message.into(),
        }
    }
}

/// The reasoning service's answer to a feedback conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    /// Replacement policy text, only when the user asked for a behavior change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_soul: Option<String>,
    /// Pattern weight deltas to merge additively.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_patterns: Option<PatternDeltas>,
    /// Conversational reply for the user.
    pub response_message: String,
}

impl FeedbackResponse {
    /// The replacement policy text, ignoring blank values.
    #[must_use]
    pub fn soul_update(&self) -> Option<&str> {
        self.updated_soul
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }
}
