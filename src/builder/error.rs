//! Build errors for chart construction.

use crate::validation::ChartViolation;
use thiserror::Error;

/// Errors that can occur when building a chart.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(
        "Chart model is invalid ({} violation(s)): {}",
        .violations.len(),
        describe(.violations)
    )]
    ModelInvalid { violations: Vec<ChartViolation> },

    #[error("Chart declares {count} states, more than an arena can index")]
    TooManyStates { count: usize },

    #[error("Chart declares {count} transitions, more than an arena can index")]
    TooManyTransitions { count: usize },
}

fn describe(violations: &[ChartViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<ChartViolation> for BuildError {
    fn from(violation: ChartViolation) -> Self {
        BuildError::ModelInvalid {
            violations: vec![violation],
        }
    }
}
