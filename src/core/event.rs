//! Events consumed by the interpreter.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Name of the internal event raised when a guard or action faults.
pub const ERROR_EXECUTION: &str = "error.execution";

/// Prefix of the internal completion events (`done.state.<id>`).
pub const DONE_STATE_PREFIX: &str = "done.state.";

/// Which queue an event belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventOrigin {
    /// Raised by the chart itself; drained before any external event.
    Internal,
    /// Submitted by the host.
    External,
}

/// A named event with an optional payload that the engine never inspects.
///
/// # Example
///
/// ```rust
/// use mindchart::core::{Event, EventOrigin};
/// use serde_json::json;
///
/// let event = Event::external("updateScore").with_payload(json!({ "score": 10 }));
/// assert_eq!(event.name(), "updateScore");
/// assert_eq!(event.origin(), EventOrigin::External);
/// assert!(event.payload().is_some());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    name: String,
    payload: Option<Value>,
    origin: EventOrigin,
}

impl Event {
    pub fn new(name: impl Into<String>, origin: EventOrigin) -> Self {
        Self {
            name: name.into(),
            payload: None,
            origin,
        }
    }

    pub fn external(name: impl Into<String>) -> Self {
        Self::new(name, EventOrigin::External)
    }

    pub fn internal(name: impl Into<String>) -> Self {
        Self::new(name, EventOrigin::Internal)
    }

    /// Completion event for `state_name`.
    pub fn done_state(state_name: &str) -> Self {
        Self::internal(format!("{DONE_STATE_PREFIX}{state_name}"))
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub(crate) fn with_origin(mut self, origin: EventOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn origin(&self) -> EventOrigin {
        self.origin
    }

    pub fn is_internal(&self) -> bool {
        self.origin == EventOrigin::Internal
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
