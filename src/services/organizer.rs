//! Organizer facade.
//!
//! Wires persisted state, the browser host and the reasoning service into
//! the operations a UI exposes: analyze, apply, feedback, ungroup.

use super::{Classifier, FeedbackProcessor, GroupingObserver};
use crate::host::{GroupId, TabHost};
use crate::llm::LlmProvider;
use crate::models::{
    ChatTurn, ClassificationResult, FeedbackResponse, GroupSnapshot, LastAction, TabGroup,
    TabSnapshot,
};
use crate::storage::StateStore;
use crate::{Result, current_timestamp_ms};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::instrument;

/// Entry point for tab organization.
pub struct TabOrganizer {
    state: StateStore,
    host: Arc<dyn TabHost>,
    classifier: Classifier,
    feedback: FeedbackProcessor,
    observer: GroupingObserver,
    fallback_credential: Option<SecretString>,
}

impl TabOrganizer {
    /// Creates an organizer.
    #[must_use]
    pub fn new(state: StateStore, host: Arc<dyn TabHost>, provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            observer: GroupingObserver::new(state.clone(), Arc::clone(&host)),
            classifier: Classifier::new(Arc::clone(&provider)),
            feedback: FeedbackProcessor::new(provider),
            state,
            host,
            fallback_credential: None,
        }
    }

    /// Sets a credential used when none is persisted.
    #[must_use]
    pub fn with_fallback_credential(mut self, credential: Option<SecretString>) -> Self {
        self.fallback_credential = credential;
        self
    }

    /// The persisted state this organizer works on.
    #[must_use]
    pub const fn state(&self) -> &StateStore {
        &self.state
    }

    /// The persisted credential, else the fallback.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn credential(&self) -> Result<Option<SecretString>> {
        Ok(self.state.credential()?.or_else(|| self.fallback_credential.clone()))
    }

    /// Classifies the tabs of the current window.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredential` when no credential is available, or any
    /// error from the host, the store or the reasoning service.
    #[instrument(skip(self))]
    pub fn analyze_tabs(&self) -> Result<ClassificationResult> {
        let credential = self.credential()?;
        let now = current_timestamp_ms();
        let tabs: Vec<_> = self
            .host
            .current_window_tabs()?
            .iter()
            .map(|t| t.to_tab(now))
            .collect();

        let rules = self.state.rules()?;
        let soul = self.state.soul()?;
        let patterns = self.state.patterns()?;

        self.classifier
            .classify(credential.as_ref(), &tabs, &rules, &soul, &patterns)
    }

    /// Creates one host group per non-empty group and records the last action.
    ///
    /// # Errors
    ///
    /// Returns an error if the host rejects a group or the store cannot be
    /// written.
    pub fn group_tabs(&self, groups: &[TabGroup]) -> Result<LastAction> {
        self.apply_groups(groups, 0)
    }

    /// Applies a classification result, counting its close recommendations.
    ///
    /// # Errors
    ///
    /// Same as [`Self::group_tabs`].
    pub fn apply_result(&self, result: &ClassificationResult) -> Result<LastAction> {
        self.apply_groups(&result.groups, result.close_recommendations.len())
    }

    #[instrument(skip_all, fields(groups = groups.len()))]
    fn apply_groups(&self, groups: &[TabGroup], close_recommendations: usize) -> Result<LastAction> {
        let mut created = Vec::new();
        for group in groups.iter().filter(|g| !g.tab_ids.is_empty()) {
            let id = self.host.create_group(&group.tab_ids)?;
            self.host.update_group(id, &group.group_name, false)?;

            let mut tabs = Vec::with_capacity(group.tab_ids.len());
            for tab_id in &group.tab_ids {
                let snapshot = self.host.get_tab(*tab_id)?.map_or_else(TabSnapshot::unknown, |t| {
                    TabSnapshot {
                        title: t.title.clone().unwrap_or_else(|| "Unknown".to_string()),
                        domain: match t.domain() {
                            d if d.is_empty() => "unknown".to_string(),
                            d => d,
                        },
                    }
                });
                tabs.push(snapshot);
            }
            created.push(GroupSnapshot {
                group_name: group.group_name.clone(),
                tab_count: group.tab_ids.len(),
                tabs,
            });
        }

        let action = LastAction::from_groups(current_timestamp_ms(), created, close_recommendations);
        self.state.record_last_action(&action)?;
        tracing::info!(
            groups = action.groups_created.len(),
            tabs = action.tabs_organized,
            "Applied grouping"
        );
        Ok(action)
    }

    /// Runs a feedback conversation and persists what it proposes.
    ///
    /// A non-blank `updatedSoul` replaces the policy text verbatim and any
    /// `updatedPatterns` are merged additively.
    ///
    /// # Errors
    ///
    /// Returns an error from the feedback processor or the store. Nothing
    /// is persisted when the conversation fails.
    #[instrument(skip_all, fields(turns = transcript.len()))]
    pub fn process_feedback(&self, transcript: &[ChatTurn]) -> Result<FeedbackResponse> {
        let credential = self.credential()?;
        let last_action = self
            .state
            .last_action()?
            .unwrap_or_else(|| LastAction::empty(current_timestamp_ms()));
        let soul = self.state.soul()?;
        let patterns = self.state.patterns()?;

        let response = self.feedback.process(
            credential.as_ref(),
            transcript,
            &last_action,
            &soul,
            &patterns,
        )?;

        if let Some(text) = response.soul_update() {
            self.state.save_soul(text)?;
            tracing::info!("Policy text updated from feedback");
        }
        if let Some(deltas) = response.updated_patterns.as_ref().filter(|d| !d.is_empty()) {
            self.state.merge_pattern_deltas(deltas)?;
            let pairs: usize = deltas.values().map(|groups| groups.len()).sum();
            metrics::counter!("patterns_learned_total", "source" => "feedback")
                .increment(pairs as u64);
            tracing::info!(domains = deltas.len(), "Merged pattern deltas from feedback");
        }
        Ok(response)
    }

    /// Removes every tab of the current window from its group.
    ///
    /// Returns the number of tabs ungrouped.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot be queried or updated.
    pub fn ungroup_all(&self) -> Result<usize> {
        let grouped: Vec<_> = self
            .host
            .current_window_tabs()?
            .into_iter()
            .filter(|t| t.group_id.is_some())
            .map(|t| t.id)
            .collect();
        if grouped.is_empty() {
            return Ok(0);
        }
        self.host.ungroup(&grouped)?;
        tracing::info!(tabs = grouped.len(), "Ungrouped tabs");
        Ok(grouped.len())
    }

    /// Forwards a "group label changed" notification to the observer.
    ///
    /// # Errors
    ///
    /// See [`GroupingObserver::on_group_updated`].
    pub fn on_group_updated(&self, group: GroupId, label: Option<&str>) -> Result<usize> {
        self.observer.on_group_updated(group, label)
    }
}
