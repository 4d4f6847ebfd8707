//! Violations detected while validating a chart model.

use thiserror::Error;

/// A single reason a chart model is malformed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ChartViolation {
    #[error("Chart '{chart}' declares no states")]
    EmptyChart { chart: String },

    #[error("State id '{name}' is declared more than once")]
    DuplicateState { name: String },

    #[error("Transition from '{state}' targets unknown state '{target}'")]
    UnknownTarget { state: String, target: String },

    #[error("Transition from '{state}' targets the chart root")]
    RootTarget { state: String },

    #[error("Initial target '{target}' of '{state}' does not exist")]
    UnknownInitial { state: String, target: String },

    #[error("Initial target '{target}' of '{state}' is not inside its region")]
    InitialOutsideRegion { state: String, target: String },

    #[error("State '{state}' declares an initial transition but is not compound")]
    InitialNotAllowed { state: String },

    #[error("{kind} state '{state}' cannot have children")]
    ChildrenNotAllowed { state: String, kind: &'static str },

    #[error("{kind} state '{state}' cannot have outgoing transitions")]
    TransitionsNotAllowed { state: String, kind: &'static str },

    #[error("Parallel state '{state}' has no regions")]
    EmptyParallel { state: String },

    #[error("Compound state '{state}' has only history children")]
    NoRegularChildren { state: String },

    #[error("Transition from '{state}' mixes eventless and event triggers")]
    MixedTriggers { state: String },

    #[error("Transition from '{state}' has an empty event descriptor")]
    EmptyEventDescriptor { state: String },

    #[error("Targets of '{state}' are not in distinct parallel regions")]
    ConflictingTargets { state: String },
}
