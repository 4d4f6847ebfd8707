//! The set of currently active states.

use crate::core::{Chart, StateId, StateKind};
use std::collections::BTreeSet;
use thiserror::Error;

/// Structural invariant broken by a configuration.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigurationViolation {
    #[error("Active compound state '{state}' has {active} active children, expected exactly one")]
    CompoundChildren { state: String, active: usize },

    #[error("Region '{region}' of active parallel state '{state}' is not active")]
    MissingRegion { state: String, region: String },

    #[error("State '{state}' is active but its parent '{parent}' is not")]
    DetachedState { state: String, parent: String },

    #[error("History pseudostate '{state}' can never be active")]
    PseudostateActive { state: String },

    #[error("Configuration refers to state {id} unknown to the chart")]
    UnknownState { id: StateId },
}

/// Active states, iterated in document order.
///
/// The root never appears in a configuration; it is implicitly active
/// while the chart runs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Configuration {
    active: BTreeSet<StateId>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, state: StateId) -> bool {
        self.active.contains(&state)
    }

    pub fn iter(&self) -> impl Iterator<Item = StateId> + '_ {
        self.active.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Names of all active states in document order.
    pub fn names<'c>(&self, chart: &'c Chart) -> Vec<&'c str> {
        self.iter().map(|s| chart.name_of(s)).collect()
    }

    /// Names of the active atomic states in document order.
    pub fn leaf_names<'c>(&self, chart: &'c Chart) -> Vec<&'c str> {
        self.iter()
            .map(|s| chart.state(s))
            .filter(|node| node.is_atomic())
            .map(|node| node.name())
            .collect()
    }

    pub(crate) fn insert(&mut self, state: StateId) -> bool {
        self.active.insert(state)
    }

    pub(crate) fn remove(&mut self, state: StateId) -> bool {
        self.active.remove(&state)
    }

    pub(crate) fn clear(&mut self) {
        self.active.clear();
    }

    /// Whether `state` has completed: a compound with an active final
    /// child, or a parallel state whose every region has completed.
    pub fn is_in_final_state(&self, chart: &Chart, state: StateId) -> bool {
        let node = chart.state(state);
        match node.kind() {
            StateKind::Parallel => regions(chart, state).all(|r| self.is_in_final_state(chart, r)),
            StateKind::Compound { .. } => node
                .children()
                .iter()
                .any(|&c| chart.state(c).is_final() && self.contains(c)),
            _ => false,
        }
    }

    /// Check the structural invariants against `chart`.
    ///
    /// An empty configuration is valid (the chart is not running).
    pub fn validate(&self, chart: &Chart) -> Result<(), ConfigurationViolation> {
        if self.is_empty() {
            return Ok(());
        }

        for state in self.iter() {
            let Some(node) = chart.get(state) else {
                return Err(ConfigurationViolation::UnknownState { id: state });
            };
            if node.is_history() {
                return Err(ConfigurationViolation::PseudostateActive {
                    state: node.name().to_string(),
                });
            }
            if let Some(parent) = node.parent() {
                if parent != chart.root() && !self.contains(parent) {
                    return Err(ConfigurationViolation::DetachedState {
                        state: node.name().to_string(),
                        parent: chart.name_of(parent).to_string(),
                    });
                }
            }
        }

        self.check_children(chart, chart.root())?;
        for state in self.iter() {
            self.check_children(chart, state)?;
        }
        Ok(())
    }

    fn check_children(&self, chart: &Chart, state: StateId) -> Result<(), ConfigurationViolation> {
        let node = chart.state(state);
        let compound = node.is_compound() || (state == chart.root() && !node.is_parallel());
        if compound {
            let active = regions(chart, state).filter(|&c| self.contains(c)).count();
            if active != 1 {
                return Err(ConfigurationViolation::CompoundChildren {
                    state: node.name().to_string(),
                    active,
                });
            }
        } else if node.is_parallel() {
            if let Some(region) = regions(chart, state).find(|&r| !self.contains(r)) {
                return Err(ConfigurationViolation::MissingRegion {
                    state: node.name().to_string(),
                    region: chart.name_of(region).to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Non-history children of `state`.
pub(crate) fn regions(chart: &Chart, state: StateId) -> impl Iterator<Item = StateId> + '_ {
    chart
        .state(state)
        .children()
        .iter()
        .copied()
        .filter(move |&c| !chart.state(c).is_history())
}

impl FromIterator<StateId> for Configuration {
    fn from_iter<I: IntoIterator<Item = StateId>>(iter: I) -> Self {
        Self {
            active: iter.into_iter().collect(),
        }
    }
}
