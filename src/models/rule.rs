//! Deterministic grouping rules.

use serde::{Deserialize, Serialize};

/// What a rule does when its pattern matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleKind {
    /// Put the tab into the rule's group.
    Group,
    /// Never recommend closing the tab.
    Protect,
    /// Recommend closing the tab.
    AutoClose,
}

impl RuleKind {
    /// Returns the kind as its persisted string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Protect => "protect",
            Self::AutoClose => "auto-close",
        }
    }
}

/// A user-editable rule.
///
/// Patterns are plain substrings, matched case-sensitively against the
/// tab's domain or full URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Rule identifier.
    pub id: String,
    /// Rule kind.
    #[serde(rename = "type")]
    pub kind: RuleKind,
    /// Substring matched against domain or URL.
    pub pattern: String,
    /// Target group, required for `group` rules to have any effect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Rule {
    /// Creates a `group` rule.
    #[must_use]
    pub fn group(
        id: impl Into<String>,
        pattern: impl Into<String>,
        group_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: RuleKind::Group,
            pattern: pattern.into(),
            group_name: Some(group_name.into()),
            description: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the target group of an active `group` rule.
    ///
    /// `None` for other kinds and for group rules without a name.
    #[must_use]
    pub fn target_group(&self) -> Option<&str> {
        match (self.kind, self.group_name.as_deref()) {
            (RuleKind::Group, Some(name)) if !name.is_empty() => Some(name),
            _ => None,
        }
    }

    /// Returns true if the pattern occurs in the domain or the URL.
    #[must_use]
    pub fn matches(&self, domain: &str, url: &str) -> bool {
        domain.contains(&self.pattern) || url.contains(&self.pattern)
    }
}

/// Rules seeded on first use.
#[must_use]
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule::group("1", "mail.google.com", "Communication").with_description("Gmail"),
        Rule::group("2", "web.whatsapp.com", "Communication").with_description("WhatsApp"),
        Rule::group("3", "github.com", "Dev").with_description("GitHub"),
        Rule::group("4", "vercel.com", "Dev").with_description("Vercel"),
        Rule::group("5", "chatgpt.com", "AI").with_description("ChatGPT"),
        Rule::group("6", "canvas", "Study").with_description("Canvas LMS"),
        Rule::group("7", "docs.google.com", "Work").with_description("Google Docs"),
        Rule::group("8", "tradingview.com", "Markets").with_description("TradingView"),
        Rule::group("9", "youtube.com", "Entertainment").with_description("YouTube"),
    ]
}
