//! The immutable chart model.
//!
//! A [`Chart`] is an arena of [`StateNode`]s and [`Transition`]s built once
//! by the [`ChartBuilder`](crate::builder::ChartBuilder) and then shared
//! read-only (typically behind an `Arc`) by any number of running
//! [`StateChart`](crate::engine::StateChart) instances.

use super::state::{StateId, StateKind, StateNode};
use super::transition::{Transition, TransitionId};
use std::collections::HashMap;

/// Validated, immutable graph of states and transitions.
#[derive(Clone, Debug)]
pub struct Chart {
    pub(crate) name: String,
    pub(crate) states: Vec<StateNode>,
    pub(crate) transitions: Vec<Transition>,
    pub(crate) index: HashMap<String, StateId>,
}

impl Chart {
    /// Name of the chart; also the name of its root state.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The root state. It is always the first state in document order.
    pub fn root(&self) -> StateId {
        StateId(0)
    }

    /// Look up a state by id.
    ///
    /// Ids are only handed out by the chart that owns them, so indexing
    /// with an id from a different chart is a programming error.
    pub fn state(&self, id: StateId) -> &StateNode {
        &self.states[id.index()]
    }

    /// Fallible variant of [`Chart::state`].
    pub fn get(&self, id: StateId) -> Option<&StateNode> {
        self.states.get(id.index())
    }

    pub fn transition(&self, id: TransitionId) -> &Transition {
        &self.transitions[id.rank()]
    }

    /// Resolve a state name.
    pub fn lookup(&self, name: &str) -> Option<StateId> {
        self.index.get(name).copied()
    }

    /// All states, root included, in document order.
    pub fn states(&self) -> impl Iterator<Item = &StateNode> {
        self.states.iter()
    }

    /// All transitions in document order.
    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn name_of(&self, id: StateId) -> &str {
        self.state(id).name()
    }

    /// Whether `state` is a proper descendant of `ancestor`.
    pub fn is_descendant(&self, state: StateId, ancestor: StateId) -> bool {
        let mut current = self.state(state).parent;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.state(parent).parent;
        }
        false
    }

    /// Proper ancestors of `state`, nearest first, stopping before `upto`
    /// (or after the root when `upto` is `None`).
    pub fn proper_ancestors(&self, state: StateId, upto: Option<StateId>) -> Vec<StateId> {
        let mut ancestors = Vec::new();
        let mut current = self.state(state).parent;
        while let Some(parent) = current {
            if Some(parent) == upto {
                break;
            }
            ancestors.push(parent);
            current = self.state(parent).parent;
        }
        ancestors
    }

    /// Least common compound ancestor of `states`.
    ///
    /// The root always qualifies, so this falls back to the root when no
    /// compound ancestor contains every state.
    pub fn least_common_compound_ancestor(&self, states: &[StateId]) -> StateId {
        let Some((&head, tail)) = states.split_first() else {
            return self.root();
        };
        for ancestor in self.proper_ancestors(head, None) {
            let qualifies = ancestor == self.root() || self.state(ancestor).is_compound();
            if qualifies && tail.iter().all(|&s| self.is_descendant(s, ancestor)) {
                return ancestor;
            }
        }
        self.root()
    }

    /// History pseudostates directly below `state`.
    pub fn history_children(&self, state: StateId) -> impl Iterator<Item = &StateNode> {
        self.state(state)
            .children
            .iter()
            .map(|&child| self.state(child))
            .filter(|child| child.is_history())
    }

    /// Default entry targets of a compound state: its initial transition's
    /// targets, or its first non-history child when none was declared.
    pub fn default_targets(&self, state: StateId) -> Vec<StateId> {
        let node = self.state(state);
        match &node.kind {
            StateKind::Compound { initial } if !initial.targets.is_empty() => {
                initial.targets.clone()
            }
            _ => node
                .children
                .iter()
                .copied()
                .find(|&c| !self.state(c).is_history())
                .into_iter()
                .collect(),
        }
    }
}
