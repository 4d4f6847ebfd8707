//! Chart model types.
//!
//! This module contains the immutable description of a state chart:
//! - States and their kinds via `StateNode` / `StateKind`
//! - Transitions with triggers, targets and actions
//! - Events and event descriptors
//! - Per-history-state memory
//!
//! Nothing in this module executes host code. Guards and actions are
//! referenced by id and evaluated by the engine through injected
//! capabilities.

mod chart;
mod event;
mod guard;
mod history;
mod state;
mod transition;

pub use chart::Chart;
pub use event::{Event, EventOrigin, DONE_STATE_PREFIX, ERROR_EXECUTION};
pub use guard::{EventDescriptor, GuardId, Trigger};
pub use history::HistoryMemory;
pub use state::{HistoryDepth, StateId, StateKind, StateNode};
pub use transition::{ActionId, InitialTransition, Transition, TransitionId, TransitionKind};
