//! Engine errors and recoverable faults.

use crate::core::{ActionId, GuardId};
use std::fmt;
use thiserror::Error;

/// Failure reported by a [`ConditionEvaluator`](super::ConditionEvaluator).
///
/// A faulting guard is treated as `false`.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GuardFault {
    #[error("Unknown guard '{0}'")]
    UnknownGuard(GuardId),

    #[error("Guard evaluation failed: {0}")]
    Failed(String),
}

/// Failure reported by an [`ActionExecutor`](super::ActionExecutor).
///
/// A faulting action is treated as a no-op; the microstep continues.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ActionFault {
    #[error("Unknown action '{0}'")]
    UnknownAction(ActionId),

    #[error("Action execution failed: {0}")]
    Failed(String),
}

/// Where an action ran when it faulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionPhase {
    Exit,
    Transition,
    Entry,
    Initial,
    HistoryDefault,
}

impl fmt::Display for ActionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Exit => "exit",
            Self::Transition => "transition",
            Self::Entry => "entry",
            Self::Initial => "initial transition",
            Self::HistoryDefault => "history default",
        };
        f.write_str(label)
    }
}

/// A recoverable fault surfaced to observers.
///
/// Faults never abort a microstep; the configuration always ends
/// consistent.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Fault {
    #[error("Guard '{guard}' on a transition from '{state}' faulted: {fault}")]
    Guard {
        guard: GuardId,
        state: String,
        fault: GuardFault,
    },

    #[error("Action '{action}' during {phase} of '{state}' faulted: {fault}")]
    Action {
        action: ActionId,
        state: String,
        phase: ActionPhase,
        fault: ActionFault,
    },

    #[error("Macrostep did not stabilize within {limit} microsteps")]
    NonTerminating { limit: usize },
}

/// Errors returned to callers of the [`StateChart`](super::StateChart) façade.
///
/// None of these leave the engine in a partially updated state.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("State chart is already running")]
    AlreadyRunning,

    #[error("State chart is not running")]
    NotRunning,

    #[error("Macrostep did not stabilize within {limit} microsteps")]
    NonTerminating { limit: usize },

    #[error("Unknown state '{0}'")]
    UnknownState(String),

    #[error("State chart instance is gone; event hand-off closed")]
    HandOffClosed,
}
