//! Per-history-state memory.
//!
//! When the parent of a history pseudostate is exited, the engine records
//! which of its descendants were active so that a later entry through the
//! history state can restore them.

use super::state::StateId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Recorded configurations keyed by history pseudostate.
///
/// Records are created empty, overwritten on every exit of the parent and
/// only discarded by [`HistoryMemory::clear`] when the engine is reset.
///
/// # Example
///
/// ```rust
/// use mindchart::builder::{ChartBuilder, StateBuilder};
/// use mindchart::core::HistoryMemory;
///
/// let chart = ChartBuilder::new("machine")
///     .state(
///         StateBuilder::new("S")
///             .state(StateBuilder::shallow_history("h"))
///             .state(StateBuilder::new("a"))
///             .state(StateBuilder::new("b")),
///     )
///     .build()
///     .unwrap();
///
/// let h = chart.lookup("h").unwrap();
/// let b = chart.lookup("b").unwrap();
///
/// let mut memory = HistoryMemory::new();
/// assert!(memory.get(h).is_none());
///
/// memory.record(h, vec![b]);
/// assert_eq!(memory.get(h), Some(&[b][..]));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMemory {
    records: BTreeMap<StateId, Vec<StateId>>,
}

impl HistoryMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the record of `history` with `states` (kept in document order).
    pub fn record(&mut self, history: StateId, mut states: Vec<StateId>) {
        states.sort_unstable();
        states.dedup();
        self.records.insert(history, states);
    }

    /// States to restore when `history` is entered, if it was ever recorded.
    pub fn get(&self, history: StateId) -> Option<&[StateId]> {
        self.records.get(&history).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (StateId, &[StateId])> {
        self.records.iter().map(|(h, s)| (*h, s.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Forget every record. Only an engine reset does this.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
