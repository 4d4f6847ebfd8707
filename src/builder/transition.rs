//! Builder for declaring transitions.

use crate::core::{ActionId, TransitionKind};

/// Builder for a transition with a fluent API.
///
/// The source state is implied by the [`StateBuilder`](super::StateBuilder)
/// the transition is attached to. Targets are given by state name and are
/// resolved when the chart is built.
#[derive(Clone, Debug, Default)]
pub struct TransitionBuilder {
    pub(crate) triggers: Vec<(Option<String>, Option<String>)>,
    pub(crate) targets: Vec<String>,
    pub(crate) actions: Vec<ActionId>,
    pub(crate) kind: TransitionKind,
}

impl TransitionBuilder {
    /// Create an eventless, unguarded transition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transition triggered by events matching `descriptor`.
    pub fn on(descriptor: impl Into<String>) -> Self {
        Self::new().or_on(descriptor)
    }

    /// Create an eventless transition taken as soon as `guard` holds.
    pub fn eventless() -> Self {
        Self::new()
    }

    /// Add another event descriptor that also triggers this transition.
    pub fn or_on(mut self, descriptor: impl Into<String>) -> Self {
        self.triggers.push((Some(descriptor.into()), None));
        self
    }

    /// Add an explicit `(descriptor, guard)` pair.
    pub fn trigger(mut self, descriptor: Option<&str>, guard: Option<&str>) -> Self {
        self.triggers
            .push((descriptor.map(str::to_string), guard.map(str::to_string)));
        self
    }

    /// Guard the most recently added trigger.
    ///
    /// On a transition without triggers this adds an eventless, guarded one.
    pub fn when(mut self, guard: impl Into<String>) -> Self {
        match self.triggers.last_mut() {
            Some((_, slot)) => *slot = Some(guard.into()),
            None => self.triggers.push((None, Some(guard.into()))),
        }
        self
    }

    /// Add a target state. Call repeatedly for targets in parallel regions.
    pub fn to(mut self, target: impl Into<String>) -> Self {
        self.targets.push(target.into());
        self
    }

    /// Add an action executed while the transition is taken.
    pub fn action(mut self, action: impl Into<ActionId>) -> Self {
        self.actions.push(action.into());
        self
    }

    /// Keep a compound source active when all targets are its descendants.
    pub fn internal(mut self) -> Self {
        self.kind = TransitionKind::Internal;
        self
    }
}
