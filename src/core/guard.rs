//! Transition triggers: event descriptors paired with guard conditions.
//!
//! Guards are referenced by id only. Their evaluation is delegated to the
//! host's [`ConditionEvaluator`](crate::engine::ConditionEvaluator), which
//! keeps the chart model free of host code.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a guard condition understood by the host evaluator.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GuardId(String);

impl GuardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GuardId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for GuardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pattern matched against hierarchical event names.
///
/// Matching is by dotted token prefix: `"error"` matches `"error"` and
/// `"error.execution"` but not `"errors"`. A trailing `".*"` is accepted
/// and ignored, and `"*"` matches every event.
///
/// # Example
///
/// ```rust
/// use mindchart::core::EventDescriptor;
///
/// let done = EventDescriptor::new("done.state");
/// assert!(done.matches("done.state.loading"));
/// assert!(!done.matches("done.stateful"));
/// assert!(EventDescriptor::new("*").matches("anything"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventDescriptor(String);

impl EventDescriptor {
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let trimmed = pattern
            .strip_suffix(".*")
            .unwrap_or(&pattern)
            .trim_end_matches('.')
            .to_string();
        Self(trimmed)
    }

    /// The normalized pattern.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.0 == "*"
    }

    /// Check whether `event_name` is matched by this descriptor.
    pub fn matches(&self, event_name: &str) -> bool {
        if self.is_wildcard() {
            return true;
        }
        match event_name.strip_prefix(self.0.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('.'),
            None => false,
        }
    }
}

impl From<&str> for EventDescriptor {
    fn from(pattern: &str) -> Self {
        Self::new(pattern)
    }
}

/// One `(event descriptor, guard)` pair of a transition.
///
/// A missing descriptor makes the trigger eventless; a missing guard is
/// always satisfied.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Trigger {
    event: Option<EventDescriptor>,
    guard: Option<GuardId>,
}

impl Trigger {
    pub fn new(event: Option<EventDescriptor>, guard: Option<GuardId>) -> Self {
        Self { event, guard }
    }

    pub fn event(&self) -> Option<&EventDescriptor> {
        self.event.as_ref()
    }

    pub fn guard(&self) -> Option<&GuardId> {
        self.guard.as_ref()
    }

    /// Whether the descriptor part of this trigger accepts `event_name`.
    /// Eventless triggers never match a named event.
    pub fn accepts(&self, event_name: &str) -> bool {
        self.event.as_ref().is_some_and(|d| d.matches(event_name))
    }
}
