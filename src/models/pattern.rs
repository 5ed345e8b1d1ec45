//! Learned domain-to-group weights.
//!
//! The store maps a domain to the groups it has been seen in, each with a
//! non-negative weight. Weights only grow through the two learning
//! channels (manual grouping: +1, feedback: +delta). Nothing decays.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Weight deltas proposed by the feedback loop: domain -> group -> delta.
pub type PatternDeltas = BTreeMap<String, BTreeMap<String, i64>>;

/// Persisted domain -> group -> weight mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternStore(BTreeMap<String, BTreeMap<String, u64>>);

impl PatternStore {
    /// Creates an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns true when nothing has been learned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of domains with at least one association.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Weight for a (domain, group) pair, 0 when unknown.
    #[must_use]
    pub fn weight(&self, domain: &str, group: &str) -> u64 {
        self.0
            .get(domain)
            .and_then(|groups| groups.get(group))
            .copied()
            .unwrap_or(0)
    }

    /// Group weights recorded for a domain.
    #[must_use]
    pub fn groups_for(&self, domain: &str) -> Option<&BTreeMap<String, u64>> {
        self.0.get(domain)
    }

    /// Sum of all group weights for a domain.
    #[must_use]
    pub fn total_weight(&self, domain: &str) -> u64 {
        self.0
            .get(domain)
            .map_or(0, |groups| groups.values().copied().fold(0, u64::saturating_add))
    }

    /// Adds one observation of `domain` in `group`.
    ///
    /// Returns false without touching the store when either key is empty.
    pub fn increment(&mut self, domain: &str, group: &str) -> bool {
        if domain.is_empty() || group.is_empty() {
            return false;
        }
        let weight = self
            .0
            .entry(domain.to_string())
            .or_default()
            .entry(group.to_string())
            .or_insert(0);
        *weight = weight.saturating_add(1);
        true
    }

    /// Merges feedback deltas additively.
    ///
    /// Missing entries start at 0. Negative deltas saturate at 0 so the
    /// store never holds a negative weight.
    pub fn merge_deltas(&mut self, deltas: &PatternDeltas) {
        for (domain, groups) in deltas {
            let entry = self.0.entry(domain.clone()).or_default();
            for (group, delta) in groups {
                let weight = entry.entry(group.clone()).or_insert(0);
                *weight = if *delta >= 0 {
                    weight.saturating_add(delta.unsigned_abs())
                } else {
                    weight.saturating_sub(delta.unsigned_abs())
                };
            }
        }
    }

    /// Domains ordered by total weight, heaviest first.
    ///
    /// Ties are broken by domain name so the order is deterministic.
    #[must_use]
    pub fn ranked_domains(&self) -> Vec<(&str, u64)> {
        let mut ranked: Vec<(&str, u64)> = self
            .0
            .keys()
            .map(|domain| (domain.as_str(), self.total_weight(domain)))
            .collect();
        // BTreeMap keys arrive sorted, so a stable sort keeps name order on ties
        ranked.sort_by_key(|&(_, total)| Reverse(total));
        ranked
    }

    /// The `limit` heaviest domains as a new store.
    #[must_use]
    pub fn top_domains(&self, limit: usize) -> Self {
        let mut top = Self::new();
        for (domain, _) in self.ranked_domains().into_iter().take(limit) {
            if let Some(groups) = self.0.get(domain) {
                top.0.insert(domain.to_string(), groups.clone());
            }
        }
        top
    }

    /// Serializes the heaviest domains that fit in `max_chars` of JSON.
    ///
    /// Whole domains are added in rank order, so the output is always a
    /// valid JSON object. A domain whose entry alone would overflow the
    /// budget is skipped.
    #[must_use]
    pub fn summarize_within(&self, max_chars: usize) -> String {
        let mut kept = Self::new();
        let mut rendered = "{}".to_string();
        for (domain, _) in self.ranked_domains() {
            let Some(groups) = self.0.get(domain) else {
                continue;
            };
            kept.0.insert(domain.to_string(), groups.clone());
            let candidate = serde_json::to_string(&kept).unwrap_or_default();
            if candidate.chars().count() > max_chars {
                kept.0.remove(domain);
                continue;
            }
            rendered = candidate;
        }
        rendered
    }

    /// Iterates over domains and their group weights.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, u64>)> {
        self.0.iter()
    }
}

impl FromIterator<(String, BTreeMap<String, u64>)> for PatternStore {
    fn from_iter<I: IntoIterator<Item = (String, BTreeMap<String, u64>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
