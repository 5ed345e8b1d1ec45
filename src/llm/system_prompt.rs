//! Prompts for the reasoning service.
//!
//! Two operations talk to the model:
//!
//! - **Classification**: place the tabs the rules could not resolve, using
//!   dense integer indices instead of real tab identifiers.
//! - **Feedback**: discuss the last grouping with the user and optionally
//!   propose a new policy text and pattern weight deltas.
//!
//! Both demand a bare JSON object so the output can be validated against a
//! fixed schema.

/// Sampling temperature for classification (deterministic).
pub const CLASSIFICATION_TEMPERATURE: f32 = 0.0;

/// Sampling temperature for feedback conversations.
pub const FEEDBACK_TEMPERATURE: f32 = 0.2;

/// Output contract for classification.
pub const GROUPING_SCHEMA: &str = r#"{
  "groups": [ { "groupName": "string", "tabIds": [number (idx values)] } ],
  "closeRecommendations": [number (idx values)]
}"#;

/// Output contract for feedback.
pub const FEEDBACK_SCHEMA: &str = r#"{
  "updatedSoul": "string (optional: the complete new SOUL text)",
  "updatedPatterns": { "domain": { "groupName": number } } (optional),
  "responseMessage": "string (your reply to the user)"
}"#;

/// Builds the system prompt for classifying unresolved tabs.
///
/// `patterns_json` is the already-truncated learned pattern summary and
/// `resolved_summary` lists the groups the rules produced.
#[must_use]
pub fn build_classification_prompt(
    soul: &str,
    patterns_json: &str,
    resolved_summary: &str,
) -> String {
    let resolved = if resolved_summary.is_empty() {
        "(none)"
    } else {
        resolved_summary
    };

    format!(
        r"You are an AI tab organizer.

=== CORE TRUTH (SOUL) ===
{soul}

=== LEARNED HISTORICAL PATTERNS ===
{patterns_json}

=== ALREADY GROUPED BY RULES (do NOT classify these again) ===
{resolved}

Requirements:
- Classify ONLY the unresolved tabs listed in the user message.
- Identify each tab by its integer idx field and return idx values in tabIds.
- Place each idx in exactly ONE group. Do not duplicate. Do not skip any. Never use an idx that was not listed.
- Use ONLY group names from the SOUL naming convention or the learned patterns. Do NOT invent categories.
- You may list idx values of tabs worth closing in closeRecommendations.
- Return ONLY valid JSON, no markdown.

Schema:
{GROUPING_SCHEMA}"
    )
}

/// Builds the user message carrying the unresolved tabs.
#[must_use]
pub fn build_classification_user_message(unresolved_json: &str) -> String {
    format!("Classify these unresolved tabs:\n{unresolved_json}")
}

/// Builds the system prompt for a feedback conversation.
#[must_use]
pub fn build_feedback_prompt(last_action_json: &str, soul: &str, patterns_json: &str) -> String {
    format!(
        r"You are the tuning assistant of a browser tab organizer.
The user is asking about the last grouping you made, or giving feedback about your behavior.

=== LAST ACTION (the tabs you grouped last time) ===
{last_action_json}

=== CURRENT SOUL (your core instructions) ===
{soul}

=== CURRENT LEARNED PATTERNS (heaviest domains) ===
{patterns_json}

Requirements:
1. Read the user's feedback and answer it in context.
2. If the user only asks why something happened, explain it from the LAST ACTION and the SOUL. Do NOT change the SOUL unless the user explicitly asks for different behavior.
3. If the user wants a rule changed or a mistake fixed, return updatedSoul with the COMPLETE new SOUL text. Omit the field otherwise.
4. If the feedback implies a direct domain-to-group mapping, return updatedPatterns with integer weights to add. Omit the field otherwise.
5. Always return responseMessage: a direct, conversational reply that says what you changed, if anything.
6. Return ONLY valid JSON matching the schema, no markdown.

Schema:
{FEEDBACK_SCHEMA}"
    )
}
