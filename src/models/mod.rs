//! Data models for intellitab.
//!
//! This module contains the core data structures shared by the rules engine,
//! the classifier, the learning store and the feedback loop.

mod action;
mod classification;
mod feedback;
mod pattern;
mod rule;
mod soul;
mod tab;

pub use action::{GroupSnapshot, LastAction, TabSnapshot};
pub use classification::{ClassificationResult, TabGroup};
pub use feedback::{ChatTurn, FeedbackResponse, Sender};
pub use pattern::{PatternDeltas, PatternStore};
pub use rule::{Rule, RuleKind, default_rules};
pub use soul::DEFAULT_SOUL;
pub use tab::{Tab, TabId, domain_of};
