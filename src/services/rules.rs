//! Rules engine.
//!
//! Rules are scanned in list order; the first active `group` rule whose
//! pattern occurs in the tab's domain or URL decides the tab's group.

use crate::Result;
use crate::models::{Rule, Tab};
use crate::storage::StateStore;

/// Persisted, ordered rule set.
#[derive(Clone)]
pub struct RulesEngine {
    state: StateStore,
}

impl RulesEngine {
    /// Creates a rules engine over the persisted state.
    #[must_use]
    pub const fn new(state: StateStore) -> Self {
        Self { state }
    }

    /// Returns the rules in priority order, seeding defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the rules cannot be loaded.
    pub fn list(&self) -> Result<Vec<Rule>> {
        self.state.rules()
    }

    /// Replaces the whole rule set.
    ///
    /// # Errors
    ///
    /// Returns an error if the rules cannot be saved.
    pub fn save(&self, rules: &[Rule]) -> Result<()> {
        self.state.save_rules(rules)?;
        tracing::info!(count = rules.len(), "Saved rules");
        Ok(())
    }

    /// Restores the default rule set.
    ///
    /// # Errors
    ///
    /// Returns an error if the rules cannot be saved.
    pub fn reset(&self) -> Result<Vec<Rule>> {
        self.state.reset_rules()
    }

    /// Finds the first rule that groups `tab`.
    #[must_use]
    pub fn first_match<'a>(rules: &'a [Rule], tab: &Tab) -> Option<&'a Rule> {
        rules
            .iter()
            .find(|rule| rule.target_group().is_some() && rule.matches(&tab.domain, &tab.url))
    }

    /// Returns the group name the rules assign to `tab`, if any.
    #[must_use]
    pub fn group_for<'a>(rules: &'a [Rule], tab: &Tab) -> Option<&'a str> {
        Self::first_match(rules, tab).and_then(Rule::target_group)
    }
}
