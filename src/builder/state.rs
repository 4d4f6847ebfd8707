//! Builder for declaring states and their subtrees.

use super::transition::TransitionBuilder;
use crate::core::{ActionId, HistoryDepth};

/// Declared kind of a state before children are known.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DeclaredKind {
    /// Atomic without children, compound with children.
    Plain,
    Parallel,
    Final,
    History(HistoryDepth),
}

/// Builder for one state and, recursively, its children.
///
/// Children are kept in declaration order, which becomes the document
/// order used for conflict resolution.
///
/// # Example
///
/// ```rust
/// use mindchart::builder::{ChartBuilder, StateBuilder, TransitionBuilder};
///
/// let chart = ChartBuilder::new("door")
///     .state(
///         StateBuilder::new("closed")
///             .on_entry("lock")
///             .transition(TransitionBuilder::on("open").to("opened")),
///     )
///     .state(StateBuilder::new("opened"))
///     .build()
///     .unwrap();
///
/// assert!(chart.lookup("opened").is_some());
/// ```
#[derive(Clone, Debug)]
pub struct StateBuilder {
    pub(crate) name: String,
    pub(crate) kind: DeclaredKind,
    pub(crate) initial: Vec<String>,
    pub(crate) initial_actions: Vec<ActionId>,
    pub(crate) on_entry: Vec<ActionId>,
    pub(crate) on_exit: Vec<ActionId>,
    pub(crate) children: Vec<StateBuilder>,
    pub(crate) transitions: Vec<TransitionBuilder>,
}

impl StateBuilder {
    fn with_kind(name: impl Into<String>, kind: DeclaredKind) -> Self {
        Self {
            name: name.into(),
            kind,
            initial: Vec::new(),
            initial_actions: Vec::new(),
            on_entry: Vec::new(),
            on_exit: Vec::new(),
            children: Vec::new(),
            transitions: Vec::new(),
        }
    }

    /// A state that is atomic, or compound once children are added.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_kind(name, DeclaredKind::Plain)
    }

    /// A parallel state; each child is an independent region.
    pub fn parallel(name: impl Into<String>) -> Self {
        Self::with_kind(name, DeclaredKind::Parallel)
    }

    pub fn final_state(name: impl Into<String>) -> Self {
        Self::with_kind(name, DeclaredKind::Final)
    }

    pub fn history(name: impl Into<String>, depth: HistoryDepth) -> Self {
        Self::with_kind(name, DeclaredKind::History(depth))
    }

    pub fn shallow_history(name: impl Into<String>) -> Self {
        Self::history(name, HistoryDepth::Shallow)
    }

    pub fn deep_history(name: impl Into<String>) -> Self {
        Self::history(name, HistoryDepth::Deep)
    }

    /// Add an initial target of a compound state.
    pub fn initial(mut self, target: impl Into<String>) -> Self {
        self.initial.push(target.into());
        self
    }

    /// Add an action run when the initial transition is taken.
    pub fn initial_action(mut self, action: impl Into<ActionId>) -> Self {
        self.initial_actions.push(action.into());
        self
    }

    /// Add a default target of a history state, used before any record exists.
    pub fn default_target(self, target: impl Into<String>) -> Self {
        self.initial(target)
    }

    /// Add an action run when the history default is taken.
    pub fn default_action(self, action: impl Into<ActionId>) -> Self {
        self.initial_action(action)
    }

    pub fn on_entry(mut self, action: impl Into<ActionId>) -> Self {
        self.on_entry.push(action.into());
        self
    }

    pub fn on_exit(mut self, action: impl Into<ActionId>) -> Self {
        self.on_exit.push(action.into());
        self
    }

    /// Add a child state.
    pub fn state(mut self, child: StateBuilder) -> Self {
        self.children.push(child);
        self
    }

    /// Add an outgoing transition.
    pub fn transition(mut self, transition: TransitionBuilder) -> Self {
        self.transitions.push(transition);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
