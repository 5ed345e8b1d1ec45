//! Business logic services.
//!
//! Services orchestrate persisted state, the browser host and the reasoning
//! service. [`TabOrganizer`] is the facade a UI talks to.

mod classifier;
mod feedback;
mod observer;
mod organizer;
mod rules;

pub use classifier::{Classifier, TOP_PATTERN_DOMAINS, TabIndex};
pub use feedback::{FEEDBACK_PATTERN_BUDGET, FeedbackProcessor};
pub use observer::GroupingObserver;
pub use organizer::TabOrganizer;
pub use rules::RulesEngine;
