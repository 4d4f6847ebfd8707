//! Builder API for ergonomic chart construction.
//!
//! This module provides fluent builders for declaring state trees and
//! transitions by name. `ChartBuilder::build` flattens the tree in
//! document order, validates it and resolves names into arena ids.

pub(crate) mod draft;

pub mod chart;
pub mod error;
pub mod state;
pub mod transition;

pub use chart::ChartBuilder;
pub use error::BuildError;
pub use state::StateBuilder;
pub use transition::TransitionBuilder;

pub(crate) use state::DeclaredKind;

/// Create a transition taken on `event` to `target`.
///
/// # Example
///
/// ```
/// use mindchart::builder::{simple_transition, ChartBuilder, StateBuilder};
///
/// let chart = ChartBuilder::new("light")
///     .state(StateBuilder::new("red").transition(simple_transition("tick", "green")))
///     .state(StateBuilder::new("green"))
///     .build()
///     .unwrap();
///
/// assert_eq!(chart.transitions().count(), 1);
/// ```
pub fn simple_transition(event: &str, target: &str) -> TransitionBuilder {
    TransitionBuilder::on(event).to(target)
}

/// Create a transition taken on `event` to `target` when `guard` holds.
///
/// # Example
///
/// ```
/// use mindchart::builder::{guarded_transition, ChartBuilder, StateBuilder};
///
/// let chart = ChartBuilder::new("door")
///     .state(StateBuilder::new("closed").transition(guarded_transition("open", "unlocked", "opened")))
///     .state(StateBuilder::new("opened"))
///     .build()
///     .unwrap();
///
/// let t = chart.transitions().next().unwrap();
/// assert_eq!(t.triggers()[0].guard().unwrap().as_str(), "unlocked");
/// ```
pub fn guarded_transition(event: &str, guard: &str, target: &str) -> TransitionBuilder {
    TransitionBuilder::on(event).when(guard).to(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_transition_builds() {
        let t = simple_transition("go", "b");
        assert_eq!(t.triggers, vec![(Some("go".to_string()), None)]);
        assert_eq!(t.targets, vec!["b".to_string()]);
    }

    #[test]
    fn guarded_transition_records_guard() {
        let t = guarded_transition("go", "ready", "b");
        assert_eq!(t.triggers[0].1.as_deref(), Some("ready"));
    }
}
