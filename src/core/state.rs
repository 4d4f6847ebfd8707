//! State nodes of the chart model.
//!
//! States live in an arena owned by [`Chart`](super::Chart) and refer to
//! each other through [`StateId`] indices. Ids are assigned in document
//! order (pre-order over the state tree), so comparing two ids compares
//! their document positions.

use super::transition::{ActionId, InitialTransition, TransitionId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a state in the chart arena.
///
/// The ordering of ids is the document order of the states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StateId(pub(crate) u32);

impl StateId {
    /// Position of the state in document order.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether a history pseudostate remembers only the immediate children of
/// its parent or every active atomic descendant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryDepth {
    Shallow,
    Deep,
}

/// Kind-specific data of a state.
///
/// This is a closed set: the selector and the microstep executor match
/// exhaustively over it.
#[derive(Clone, Debug, PartialEq)]
pub enum StateKind {
    /// Leaf state without children.
    Atomic,
    /// Exactly one child is active while the state is active.
    Compound { initial: InitialTransition },
    /// Every child is active while the state is active.
    Parallel,
    /// Leaf state signalling completion of its parent.
    Final,
    /// Pseudostate restoring a previously recorded configuration of its parent.
    History {
        depth: HistoryDepth,
        default: Option<InitialTransition>,
    },
}

/// A node of the state tree.
#[derive(Clone, Debug, PartialEq)]
pub struct StateNode {
    pub(crate) id: StateId,
    pub(crate) name: String,
    pub(crate) parent: Option<StateId>,
    pub(crate) children: Vec<StateId>,
    pub(crate) kind: StateKind,
    pub(crate) depth: usize,
    pub(crate) on_entry: Vec<ActionId>,
    pub(crate) on_exit: Vec<ActionId>,
    pub(crate) transitions: Vec<TransitionId>,
}

impl StateNode {
    pub fn id(&self) -> StateId {
        self.id
    }

    /// Unique name of the state within its chart.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent state, `None` only for the root.
    pub fn parent(&self) -> Option<StateId> {
        self.parent
    }

    /// Children in document order.
    pub fn children(&self) -> &[StateId] {
        &self.children
    }

    pub fn kind(&self) -> &StateKind {
        &self.kind
    }

    /// Distance from the root; the root has depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn on_entry(&self) -> &[ActionId] {
        &self.on_entry
    }

    pub fn on_exit(&self) -> &[ActionId] {
        &self.on_exit
    }

    /// Outgoing transitions in document order.
    pub fn transitions(&self) -> &[TransitionId] {
        &self.transitions
    }

    pub fn is_atomic(&self) -> bool {
        matches!(self.kind, StateKind::Atomic | StateKind::Final)
    }

    pub fn is_compound(&self) -> bool {
        matches!(self.kind, StateKind::Compound { .. })
    }

    pub fn is_parallel(&self) -> bool {
        matches!(self.kind, StateKind::Parallel)
    }

    pub fn is_final(&self) -> bool {
        matches!(self.kind, StateKind::Final)
    }

    pub fn is_history(&self) -> bool {
        matches!(self.kind, StateKind::History { .. })
    }
}
