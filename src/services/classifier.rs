//! Tab classification pipeline.
//!
//! 1. Rules resolve whatever they can. Their decisions are final.
//! 2. If nothing is left, the remote service is never called.
//! 3. Otherwise the unresolved tabs are given dense indices `0..m` and sent
//!    to the reasoning service together with the policy text, the heaviest
//!    learned patterns and a summary of the rule-derived groups.
//! 4. The response is validated (every index known, none repeated) and
//!    merged onto the rule-derived groups by group name, translating indices
//!    back to real tab identifiers.

use crate::llm::system_prompt::{
    CLASSIFICATION_TEMPERATURE, build_classification_prompt, build_classification_user_message,
};
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider, parse_json_completion};
use crate::models::{ClassificationResult, PatternStore, Rule, Tab, TabGroup, TabId};
use crate::services::RulesEngine;
use crate::{Error, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::instrument;

/// Number of learned domains included in the classification prompt.
pub const TOP_PATTERN_DOMAINS: usize = 50;

/// Dense index to real identifier mapping.
///
/// The reasoning service transcribes small sequential integers far more
/// reliably than large sparse tab IDs, so it only ever sees positions in
/// this table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabIndex {
    ids: Vec<TabId>,
}

impl TabIndex {
    /// Assigns indices `0..n` to the given tabs in order.
    #[must_use]
    pub fn build<'a>(tabs: impl IntoIterator<Item = &'a Tab>) -> Self {
        Self {
            ids: tabs.into_iter().map(|tab| tab.id).collect(),
        }
    }

    /// Number of indexed tabs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true when no tab is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Real identifier for an index.
    #[must_use]
    pub fn resolve(&self, idx: usize) -> Option<TabId> {
        self.ids.get(idx).copied()
    }
}

/// A tab as presented to the reasoning service.
#[derive(Debug, Serialize)]
struct IndexedTab<'a> {
    idx: usize,
    domain: &'a str,
    url: &'a str,
    title: &'a str,
}

/// The grouping schema the reasoning service must answer with.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteGrouping {
    groups: Vec<RemoteGroup>,
    #[serde(default)]
    close_recommendations: Vec<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteGroup {
    group_name: String,
    tab_ids: Vec<usize>,
}

/// Groups being accumulated by name, in first-seen order.
#[derive(Debug, Default)]
struct GroupAccumulator {
    groups: Vec<TabGroup>,
}

impl GroupAccumulator {
    fn push(&mut self, name: &str, id: TabId) {
        if let Some(group) = self.groups.iter_mut().find(|g| g.group_name == name) {
            group.tab_ids.push(id);
        } else {
            self.groups.push(TabGroup::new(name, vec![id]));
        }
    }

    fn into_groups(self) -> Vec<TabGroup> {
        self.groups
    }
}

/// Classifies tabs with rules first and the reasoning service second.
pub struct Classifier {
    provider: Arc<dyn LlmProvider>,
}

impl Classifier {
    /// Creates a classifier backed by `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Classifies `tabs`.
    ///
    /// The credential is required even when the rules resolve everything;
    /// its absence fails before any work is done.
    ///
    /// # Errors
    ///
    /// - `MissingCredential` if `credential` is `None`
    /// - `RemoteTransport` / `OperationFailed` if the remote call fails
    /// - `RemoteSchema` if the response is not valid grouping JSON or
    ///   references unknown or repeated indices
    #[instrument(skip_all, fields(tabs = tabs.len(), rules = rules.len()))]
    pub fn classify(
        &self,
        credential: Option<&SecretString>,
        tabs: &[Tab],
        rules: &[Rule],
        soul: &str,
        patterns: &PatternStore,
    ) -> Result<ClassificationResult> {
        let credential = credential.ok_or_else(Error::missing_credential)?;

        let mut merged = GroupAccumulator::default();
        let mut unresolved: Vec<&Tab> = Vec::new();
        for tab in tabs {
            match RulesEngine::group_for(rules, tab) {
                Some(group) => merged.push(group, tab.id),
                None => unresolved.push(tab),
            }
        }

        if unresolved.is_empty() {
            tracing::debug!("All tabs resolved by rules, skipping remote call");
            metrics::counter!("classification_runs_total", "path" => "rules").increment(1);
            return Ok(ClassificationResult {
                groups: merged.into_groups(),
                close_recommendations: Vec::new(),
            });
        }

        let index = TabIndex::build(unresolved.iter().copied());
        tracing::debug!(
            resolved = tabs.len() - index.len(),
            unresolved = index.len(),
            "Sending unresolved tabs to reasoning service"
        );

        let request = build_request(&merged.groups, tabs, &unresolved, soul, patterns)?;
        let completion = self.provider.complete(credential, &request)?;
        let grouping: RemoteGrouping = parse_json_completion("grouping response", &completion)?;

        if let Err(e) = validate_grouping(&grouping, index.len()) {
            tracing::warn!(error = %e, "Rejected grouping response");
            return Err(e);
        }

        for group in grouping.groups.iter().filter(|g| !g.tab_ids.is_empty()) {
            for &idx in &group.tab_ids {
                merged.push(&group.group_name, resolve(&index, idx)?);
            }
        }
        let close_recommendations = grouping
            .close_recommendations
            .iter()
            .map(|&idx| resolve(&index, idx))
            .collect::<Result<Vec<_>>>()?;

        metrics::counter!("classification_runs_total", "path" => "remote").increment(1);
        Ok(ClassificationResult {
            groups: merged.into_groups(),
            close_recommendations,
        })
    }
}

fn resolve(index: &TabIndex, idx: usize) -> Result<TabId> {
    index
        .resolve(idx)
        .ok_or_else(|| Error::RemoteSchema(format!("unknown tab index {idx}")))
}

/// Builds the remote request for the unresolved tabs.
fn build_request(
    resolved: &[TabGroup],
    tabs: &[Tab],
    unresolved: &[&Tab],
    soul: &str,
    patterns: &PatternStore,
) -> Result<CompletionRequest> {
    let patterns_json = to_json(&patterns.top_domains(TOP_PATTERN_DOMAINS))?;
    let summary = summarize_resolved(resolved, tabs);
    let indexed: Vec<IndexedTab<'_>> = unresolved
        .iter()
        .enumerate()
        .map(|(idx, tab)| IndexedTab {
            idx,
            domain: &tab.domain,
            url: &tab.url,
            title: &tab.title,
        })
        .collect();

    Ok(CompletionRequest::json(
        vec![
            ChatMessage::system(build_classification_prompt(soul, &patterns_json, &summary)),
            ChatMessage::user(build_classification_user_message(&to_json(&indexed)?)),
        ],
        CLASSIFICATION_TEMPERATURE,
    ))
}

/// One line per rule-derived group: its name and the domains it holds.
fn summarize_resolved(resolved: &[TabGroup], tabs: &[Tab]) -> String {
    resolved
        .iter()
        .map(|group| {
            let mut domains: Vec<&str> = Vec::new();
            for id in &group.tab_ids {
                if let Some(tab) = tabs.iter().find(|t| t.id == *id) {
                    if !domains.contains(&tab.domain.as_str()) {
                        domains.push(&tab.domain);
                    }
                }
            }
            format!(
                "  {}: {} tab(s) [{}]",
                group.group_name,
                group.tab_ids.len(),
                domains.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Checks the response against the unresolved index space.
fn validate_grouping(grouping: &RemoteGrouping, unresolved: usize) -> Result<()> {
    let mut seen = HashSet::new();
    for group in &grouping.groups {
        if group.tab_ids.is_empty() {
            continue;
        }
        if group.group_name.trim().is_empty() {
            return Err(Error::RemoteSchema(
                "group with tabs has an empty groupName".to_string(),
            ));
        }
        for &idx in &group.tab_ids {
            if idx >= unresolved {
                return Err(Error::RemoteSchema(format!(
                    "group '{}' references index {idx}, only {unresolved} tab(s) were sent",
                    group.group_name
                )));
            }
            if !seen.insert(idx) {
                return Err(Error::RemoteSchema(format!(
                    "index {idx} appears in more than one group"
                )));
            }
        }
    }

    let mut close = HashSet::new();
    for &idx in &grouping.close_recommendations {
        if idx >= unresolved {
            return Err(Error::RemoteSchema(format!(
                "close recommendation references index {idx}, only {unresolved} tab(s) were sent"
            )));
        }
        if !close.insert(idx) {
            return Err(Error::RemoteSchema(format!(
                "index {idx} is recommended for closing twice"
            )));
        }
    }
    Ok(())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| Error::OperationFailed {
        operation: "serialize_prompt".to_string(),
        cause: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::default_rules;
    use proptest::prelude::*;
    use std::sync::Mutex;

    /// Provider returning canned completions and recording requests.
    struct ScriptedProvider {
        response: String,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        fn new(response: &str) -> Arc<Self> {
            Arc::new(Self {
                response: response.to_string(),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn last_user_message(&self) -> String {
            let requests = self.requests.lock().unwrap();
            requests.last().unwrap().messages[1].content.clone()
        }
    }

    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn complete(&self, _: &SecretString, request: &CompletionRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(self.response.clone())
        }
    }

    fn key() -> SecretString {
        SecretString::from("test-key")
    }

    fn tabs() -> Vec<Tab> {
        vec![
            Tab::new(TabId::new(101), "https://github.com/org/repo", "Repo"),
            Tab::new(TabId::new(202), "https://reddit.com/r/rust", "r/rust"),
            Tab::new(TabId::new(303), "https://news.ycombinator.com/", "Hacker News"),
        ]
    }

    #[test]
    fn test_spec_scenario_rules_then_remote() {
        let provider = ScriptedProvider::new(
            r#"{"groups":[{"groupName":"Read Later","tabIds":[0,1]}],"closeRecommendations":[]}"#,
        );
        let classifier = Classifier::new(provider.clone());

        let result = classifier
            .classify(
                Some(&key()),
                &tabs(),
                &default_rules(),
                "soul",
                &PatternStore::new(),
            )
            .unwrap();

        assert_eq!(
            result.groups,
            vec![
                TabGroup::new("Dev", vec![TabId::new(101)]),
                TabGroup::new("Read Later", vec![TabId::new(202), TabId::new(303)]),
            ]
        );
        assert!(result.close_recommendations.is_empty());
        assert_eq!(provider.calls(), 1);

        let sent = provider.last_user_message();
        assert!(sent.contains(r#""idx":0,"domain":"reddit.com""#));
        assert!(sent.contains(r#""idx":1,"domain":"news.ycombinator.com""#));
        assert!(!sent.contains("github.com"));
        assert!(!sent.contains("202"));
    }

    #[test]
    fn test_fully_resolved_skips_remote() {
        let provider = ScriptedProvider::new("never used");
        let classifier = Classifier::new(provider.clone());
        let tabs = vec![
            Tab::new(TabId::new(1), "https://github.com/a", "a"),
            Tab::new(TabId::new(2), "https://www.youtube.com/watch?v=1", "v"),
            Tab::new(TabId::new(3), "https://github.com/b", "b"),
        ];

        let result = classifier
            .classify(Some(&key()), &tabs, &default_rules(), "soul", &PatternStore::new())
            .unwrap();

        assert_eq!(provider.calls(), 0);
        assert_eq!(
            result.groups,
            vec![
                TabGroup::new("Dev", vec![TabId::new(1), TabId::new(3)]),
                TabGroup::new("Entertainment", vec![TabId::new(2)]),
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        let provider = ScriptedProvider::new("never used");
        let classifier = Classifier::new(provider.clone());

        let result = classifier
            .classify(Some(&key()), &[], &default_rules(), "soul", &PatternStore::new())
            .unwrap();

        assert_eq!(result, ClassificationResult::default());
        assert_eq!(provider.calls(), 0);
    }

    #[test]
    fn test_missing_credential_fails_before_remote() {
        let provider = ScriptedProvider::new("never used");
        let classifier = Classifier::new(provider.clone());

        let err = classifier
            .classify(None, &tabs(), &default_rules(), "soul", &PatternStore::new())
            .unwrap_err();

        assert!(err.is_missing_credential());
        assert_eq!(provider.calls(), 0);
    }

    #[test]
    fn test_remote_group_merges_with_rule_group() {
        let provider = ScriptedProvider::new(
            r#"{"groups":[{"groupName":"Dev","tabIds":[1]},{"groupName":"Social","tabIds":[0]}],"closeRecommendations":[0]}"#,
        );
        let classifier = Classifier::new(provider);

        let result = classifier
            .classify(Some(&key()), &tabs(), &default_rules(), "soul", &PatternStore::new())
            .unwrap();

        assert_eq!(
            result.group("Dev").map(|g| g.tab_ids.clone()),
            Some(vec![TabId::new(101), TabId::new(303)])
        );
        assert_eq!(
            result.group("Social").map(|g| g.tab_ids.clone()),
            Some(vec![TabId::new(202)])
        );
        assert_eq!(result.close_recommendations, vec![TabId::new(202)]);
    }

    #[test]
    fn test_omitted_tabs_stay_ungrouped() {
        let provider =
            ScriptedProvider::new(r#"{"groups":[{"groupName":"Read Later","tabIds":[1]}]}"#);
        let classifier = Classifier::new(provider);

        let result = classifier
            .classify(Some(&key()), &tabs(), &default_rules(), "soul", &PatternStore::new())
            .unwrap();

        assert_eq!(result.grouped_count(), 2);
        assert!(
            result
                .groups
                .iter()
                .all(|g| !g.tab_ids.contains(&TabId::new(202)))
        );
    }

    #[test]
    fn test_duplicate_index_is_rejected() {
        let provider = ScriptedProvider::new(
            r#"{"groups":[{"groupName":"A","tabIds":[0]},{"groupName":"B","tabIds":[0,1]}],"closeRecommendations":[]}"#,
        );
        let classifier = Classifier::new(provider);

        let err = classifier
            .classify(Some(&key()), &tabs(), &default_rules(), "soul", &PatternStore::new())
            .unwrap_err();
        assert!(matches!(err, Error::RemoteSchema(_)));
    }

    #[test]
    fn test_out_of_range_index_is_rejected() {
        let provider = ScriptedProvider::new(
            r#"{"groups":[{"groupName":"A","tabIds":[2]}],"closeRecommendations":[]}"#,
        );
        let classifier = Classifier::new(provider);

        let err = classifier
            .classify(Some(&key()), &tabs(), &default_rules(), "soul", &PatternStore::new())
            .unwrap_err();
        assert!(err.to_string().contains("index 2"));
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let provider = ScriptedProvider::new(r#"{"groups": "nope"}"#);
        let classifier = Classifier::new(provider);

        let err = classifier
            .classify(Some(&key()), &tabs(), &default_rules(), "soul", &PatternStore::new())
            .unwrap_err();
        assert!(matches!(err, Error::RemoteSchema(_)));
    }

    #[test]
    fn test_prompt_carries_context() {
        let provider = ScriptedProvider::new(r#"{"groups":[],"closeRecommendations":[]}"#);
        let classifier = Classifier::new(provider.clone());
        let mut patterns = PatternStore::new();
        patterns.increment("reddit.com", "Read Later");

        classifier
            .classify(Some(&key()), &tabs(), &default_rules(), "MY SOUL", &patterns)
            .unwrap();

        let requests = provider.requests.lock().unwrap();
        let request = &requests[0];
        assert!(request.json_output);
        assert!(request.temperature.abs() < f32::EPSILON);
        let system = &request.messages[0].content;
        assert!(system.contains("MY SOUL"));
        assert!(system.contains(r#"{"reddit.com":{"Read Later":1}}"#));
        assert!(system.contains("Dev: 1 tab(s) [github.com]"));
    }

    #[test]
    fn test_validate_allows_empty_groups_without_name() {
        let grouping = RemoteGrouping {
            groups: vec![RemoteGroup {
                group_name: String::new(),
                tab_ids: Vec::new(),
            }],
            close_recommendations: Vec::new(),
        };
        assert!(validate_grouping(&grouping, 0).is_ok());
    }

    proptest! {
        #[test]
        fn prop_index_round_trip(ids in proptest::collection::vec(any::<i64>(), 0..64)) {
            let tabs: Vec<Tab> = ids
                .iter()
                .map(|&id| Tab::new(TabId::new(id), "https://example.com", "t"))
                .collect();
            let index = TabIndex::build(&tabs);

            prop_assert_eq!(index.len(), ids.len());
            for (idx, &id) in ids.iter().enumerate() {
                prop_assert_eq!(index.resolve(idx), Some(TabId::new(id)));
            }
            prop_assert_eq!(index.resolve(ids.len()), None);
        }

        #[test]
        fn prop_result_partitions_input(n in 0_usize..12, seed in any::<u64>()) {
            // Remote places every even unresolved index, skips the odd ones
            let tabs: Vec<Tab> = (0..n)
                .map(|i| {
                    let url = if (seed >> (i % 64)) & 1 == 1 {
                        format!("https://github.com/{i}")
                    } else {
                        format!("https://site{i}.example/")
                    };
                    Tab::new(TabId::new(1000 + i as i64), url, "t")
                })
                .collect();
            let unresolved = tabs
                .iter()
                .filter(|t| !t.domain.contains("github.com"))
                .count();
            let placed: Vec<usize> = (0..unresolved).filter(|i| i % 2 == 0).collect();
            let response = serde_json::json!({
                "groups": [{"groupName": "Misc", "tabIds": placed}],
                "closeRecommendations": []
            })
            .to_string();
            let classifier = Classifier::new(ScriptedProvider::new(&response));

            let result = classifier
                .classify(Some(&key()), &tabs, &default_rules(), "s", &PatternStore::new())
                .unwrap();

            let mut seen = HashSet::new();
            for group in &result.groups {
                for id in &group.tab_ids {
                    prop_assert!(seen.insert(*id));
                    prop_assert!(tabs.iter().any(|t| t.id == *id));
                }
            }
            prop_assert_eq!(seen.len(), (n - unresolved) + placed.len());
        }
    }
}
