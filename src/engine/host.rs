//! Capabilities injected by the host.
//!
//! The chart references guards and actions by id only. A running
//! [`StateChart`](super::StateChart) asks a [`ConditionEvaluator`] whether a
//! guard holds and an [`ActionExecutor`] to run an action. Both receive a
//! read-only view of the engine through [`EventContext`]; actions may also
//! raise internal events through [`ActionContext`].
//!
//! [`GuardTable`] and [`ActionTable`] are closure-backed implementations
//! for hosts that do not need a custom evaluator.

use super::configuration::Configuration;
use super::error::{ActionFault, GuardFault};
use crate::core::{ActionId, Chart, Event, EventOrigin, GuardId};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::ops::Deref;
use uuid::Uuid;

/// Read-only view handed to guards and actions.
pub struct EventContext<'a> {
    chart: &'a Chart,
    configuration: &'a Configuration,
    event: Option<&'a Event>,
    session_id: Uuid,
}

impl<'a> EventContext<'a> {
    pub(crate) fn new(
        chart: &'a Chart,
        configuration: &'a Configuration,
        event: Option<&'a Event>,
        session_id: Uuid,
    ) -> Self {
        Self {
            chart,
            configuration,
            event,
            session_id,
        }
    }

    pub fn chart(&self) -> &'a Chart {
        self.chart
    }

    /// The event being processed; `None` during eventless transitions and
    /// the initial entry.
    pub fn event(&self) -> Option<&'a Event> {
        self.event
    }

    pub fn event_name(&self) -> Option<&'a str> {
        self.event.map(Event::name)
    }

    pub fn payload(&self) -> Option<&'a serde_json::Value> {
        self.event.and_then(Event::payload)
    }

    /// Whether the named state is currently active. Unknown names are not.
    pub fn is_active(&self, name: &str) -> bool {
        self.chart
            .lookup(name)
            .is_some_and(|id| self.configuration.contains(id))
    }

    pub fn active_state_names(&self) -> Vec<&'a str> {
        self.configuration.names(self.chart)
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }
}

/// Context handed to actions: an [`EventContext`] plus the internal queue.
pub struct ActionContext<'a> {
    context: EventContext<'a>,
    internal: &'a mut VecDeque<Event>,
}

impl<'a> ActionContext<'a> {
    pub(crate) fn new(context: EventContext<'a>, internal: &'a mut VecDeque<Event>) -> Self {
        Self { context, internal }
    }

    /// Raise an internal event, processed before any pending external event.
    pub fn raise(&mut self, name: impl Into<String>) {
        self.raise_event(Event::internal(name));
    }

    /// Raise `event` on the internal queue, whatever origin it was built with.
    pub fn raise_event(&mut self, event: Event) {
        self.internal.push_back(event.with_origin(EventOrigin::Internal));
    }
}

impl<'a> Deref for ActionContext<'a> {
    type Target = EventContext<'a>;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

/// Decides whether a guard holds.
pub trait ConditionEvaluator {
    fn evaluate(&self, guard: &GuardId, context: &EventContext<'_>) -> Result<bool, GuardFault>;
}

/// Runs the actions a chart references.
pub trait ActionExecutor {
    fn execute(&mut self, action: &ActionId, context: &mut ActionContext<'_>)
        -> Result<(), ActionFault>;
}

type GuardFn = Box<dyn Fn(&EventContext<'_>) -> bool + Send + Sync>;
type ActionFn = Box<dyn FnMut(&mut ActionContext<'_>) -> Result<(), ActionFault> + Send>;

/// Guards backed by pure predicates.
///
/// # Example
///
/// ```rust
/// use mindchart::engine::GuardTable;
///
/// let guards = GuardTable::new()
///     .with("always", |_| true)
///     .with("has_payload", |ctx| ctx.payload().is_some());
/// assert_eq!(guards.len(), 2);
/// ```
#[derive(Default)]
pub struct GuardTable {
    guards: HashMap<GuardId, GuardFn>,
}

impl GuardTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F>(mut self, id: impl Into<GuardId>, predicate: F) -> Self
    where
        F: Fn(&EventContext<'_>) -> bool + Send + Sync + 'static,
    {
        self.insert(id, predicate);
        self
    }

    pub fn insert<F>(&mut self, id: impl Into<GuardId>, predicate: F)
    where
        F: Fn(&EventContext<'_>) -> bool + Send + Sync + 'static,
    {
        self.guards.insert(id.into(), Box::new(predicate));
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

impl ConditionEvaluator for GuardTable {
    fn evaluate(&self, guard: &GuardId, context: &EventContext<'_>) -> Result<bool, GuardFault> {
        self.guards
            .get(guard)
            .map(|predicate| predicate(context))
            .ok_or_else(|| GuardFault::UnknownGuard(guard.clone()))
    }
}

impl fmt::Debug for GuardTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardTable")
            .field("guards", &self.guards.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Actions backed by closures.
///
/// # Example
///
/// ```rust
/// use mindchart::engine::ActionTable;
///
/// let actions = ActionTable::new()
///     .with_fn("log", |_| println!("entered"))
///     .with("tilt", |ctx| {
///         ctx.raise("tilted");
///         Ok(())
///     });
/// assert_eq!(actions.len(), 2);
/// ```
#[derive(Default)]
pub struct ActionTable {
    actions: HashMap<ActionId, ActionFn>,
}

impl ActionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fallible action.
    pub fn with<F>(mut self, id: impl Into<ActionId>, action: F) -> Self
    where
        F: FnMut(&mut ActionContext<'_>) -> Result<(), ActionFault> + Send + 'static,
    {
        self.insert(id, action);
        self
    }

    /// Register an action that cannot fail.
    pub fn with_fn<F>(self, id: impl Into<ActionId>, mut action: F) -> Self
    where
        F: FnMut(&mut ActionContext<'_>) + Send + 'static,
    {
        self.with(id, move |ctx: &mut ActionContext<'_>| {
            action(ctx);
            Ok(())
        })
    }

    pub fn insert<F>(&mut self, id: impl Into<ActionId>, action: F)
    where
        F: FnMut(&mut ActionContext<'_>) -> Result<(), ActionFault> + Send + 'static,
    {
        self.actions.insert(id.into(), Box::new(action));
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl ActionExecutor for ActionTable {
    fn execute(
        &mut self,
        action: &ActionId,
        context: &mut ActionContext<'_>,
    ) -> Result<(), ActionFault> {
        match self.actions.get_mut(action) {
            Some(run) => run(context),
            None => Err(ActionFault::UnknownAction(action.clone())),
        }
    }
}

impl fmt::Debug for ActionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionTable")
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}
