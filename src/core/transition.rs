//! Transitions between states.

use super::guard::Trigger;
use super::state::StateId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an action understood by the host's
/// [`ActionExecutor`](crate::engine::ActionExecutor).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActionId(String);

impl ActionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ActionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Index of a transition in the chart; equal to its document-order rank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransitionId(pub(crate) u32);

impl TransitionId {
    pub fn rank(self) -> usize {
        self.0 as usize
    }
}

/// Whether a transition leaves its source state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionKind {
    /// The source is exited and re-entered when it is part of the domain.
    #[default]
    External,
    /// A compound source is kept active when every target is its descendant.
    Internal,
}

/// Default entry of a compound state or history pseudostate.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InitialTransition {
    pub(crate) targets: Vec<StateId>,
    pub(crate) actions: Vec<ActionId>,
}

impl InitialTransition {
    pub fn targets(&self) -> &[StateId] {
        &self.targets
    }

    pub fn actions(&self) -> &[ActionId] {
        &self.actions
    }
}

/// A transition owned by exactly one source state.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub(crate) id: TransitionId,
    pub(crate) source: StateId,
    pub(crate) triggers: Vec<Trigger>,
    pub(crate) targets: Vec<StateId>,
    pub(crate) actions: Vec<ActionId>,
    pub(crate) kind: TransitionKind,
}

impl Transition {
    pub fn id(&self) -> TransitionId {
        self.id
    }

    pub fn source(&self) -> StateId {
        self.source
    }

    /// `(event descriptor, guard)` pairs in evaluation order.
    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    /// Targets; empty for a transition that only runs its actions.
    pub fn targets(&self) -> &[StateId] {
        &self.targets
    }

    pub fn actions(&self) -> &[ActionId] {
        &self.actions
    }

    pub fn kind(&self) -> TransitionKind {
        self.kind
    }

    /// Eventless transitions are taken without consuming an event.
    pub fn is_eventless(&self) -> bool {
        self.triggers.iter().all(|t| t.event().is_none())
    }

    pub fn is_targetless(&self) -> bool {
        self.targets.is_empty()
    }
}
