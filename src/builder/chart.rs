//! Builder for constructing charts.

use crate::builder::draft::{Draft, DraftState};
use crate::builder::error::BuildError;
use crate::builder::state::{DeclaredKind, StateBuilder};
use crate::core::{
    Chart, EventDescriptor, GuardId, InitialTransition, StateId, StateKind, StateNode, Transition,
    TransitionId, Trigger,
};
use crate::validation::rules::validate;
use crate::validation::ChartViolation;
use std::collections::HashMap;
use stillwater::validation::Validation;

/// Builder for constructing charts with a fluent API.
///
/// The builder plays the chart-builder role: it resolves state names,
/// validates the whole model and only then hands out an immutable
/// [`Chart`].
pub struct ChartBuilder {
    root: StateBuilder,
}

impl ChartBuilder {
    /// Create a chart whose root behaves like a compound state.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            root: StateBuilder::new(name),
        }
    }

    /// Create a chart whose top-level states all run in parallel.
    pub fn parallel(name: impl Into<String>) -> Self {
        Self {
            root: StateBuilder::parallel(name),
        }
    }

    /// Add an initial target (defaults to the first top-level state).
    pub fn initial(mut self, target: impl Into<String>) -> Self {
        self.root = self.root.initial(target);
        self
    }

    /// Add an action run by the chart's initial transition.
    pub fn initial_action(mut self, action: impl Into<crate::core::ActionId>) -> Self {
        self.root = self.root.initial_action(action);
        self
    }

    /// Add a top-level state.
    pub fn state(mut self, state: StateBuilder) -> Self {
        self.root = self.root.state(state);
        self
    }

    /// Add several top-level states at once.
    pub fn states(mut self, states: Vec<StateBuilder>) -> Self {
        for state in states {
            self.root = self.root.state(state);
        }
        self
    }

    /// Validate and build the chart.
    /// Returns an error listing every violation if the model is malformed.
    pub fn build(self) -> Result<Chart, BuildError> {
        let draft = Draft::flatten(self.root);

        if let Validation::Failure(errors) = validate(&draft) {
            return Err(BuildError::ModelInvalid {
                violations: errors.iter().cloned().collect(),
            });
        }

        resolve(draft)
    }
}

fn state_id(index: usize) -> Result<StateId, BuildError> {
    u32::try_from(index)
        .map(StateId)
        .map_err(|_| BuildError::TooManyStates { count: index + 1 })
}

fn transition_id(index: usize) -> Result<TransitionId, BuildError> {
    u32::try_from(index)
        .map(TransitionId)
        .map_err(|_| BuildError::TooManyTransitions { count: index + 1 })
}

fn lookup(
    index: &HashMap<String, StateId>,
    owner: &str,
    target: &str,
) -> Result<StateId, BuildError> {
    index.get(target).copied().ok_or_else(|| {
        BuildError::from(ChartViolation::UnknownTarget {
            state: owner.to_string(),
            target: target.to_string(),
        })
    })
}

fn resolve_initial(
    index: &HashMap<String, StateId>,
    state: &DraftState,
) -> Result<InitialTransition, BuildError> {
    let targets = state
        .initial
        .iter()
        .map(|t| lookup(index, &state.name, t))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(InitialTransition {
        targets,
        actions: state.initial_actions.clone(),
    })
}

fn resolve(draft: Draft) -> Result<Chart, BuildError> {
    let mut index = HashMap::with_capacity(draft.states.len());
    for (i, state) in draft.states.iter().enumerate() {
        index.insert(state.name.clone(), state_id(i)?);
    }

    let mut states = Vec::with_capacity(draft.states.len());
    for (i, state) in draft.states.iter().enumerate() {
        let kind = match state.kind {
            DeclaredKind::Plain if state.children.is_empty() => StateKind::Atomic,
            DeclaredKind::Plain => StateKind::Compound {
                initial: resolve_initial(&index, state)?,
            },
            DeclaredKind::Parallel => StateKind::Parallel,
            DeclaredKind::Final => StateKind::Final,
            DeclaredKind::History(depth) => {
                let default = resolve_initial(&index, state)?;
                StateKind::History {
                    depth,
                    default: (!default.targets.is_empty() || !default.actions.is_empty())
                        .then_some(default),
                }
            }
        };

        states.push(StateNode {
            id: state_id(i)?,
            name: state.name.clone(),
            parent: state.parent.map(state_id).transpose()?,
            children: state
                .children
                .iter()
                .map(|&c| state_id(c))
                .collect::<Result<_, _>>()?,
            kind,
            depth: state.depth,
            on_entry: state.on_entry.clone(),
            on_exit: state.on_exit.clone(),
            transitions: state
                .transitions
                .iter()
                .map(|&t| transition_id(t))
                .collect::<Result<_, _>>()?,
        });
    }

    let mut transitions = Vec::with_capacity(draft.transitions.len());
    for (i, transition) in draft.transitions.into_iter().enumerate() {
        let source = state_id(transition.source)?;
        let owner = &draft.states[transition.source].name;
        let targets = transition
            .targets
            .iter()
            .map(|t| lookup(&index, owner, t))
            .collect::<Result<Vec<_>, _>>()?;
        let triggers = transition
            .triggers
            .into_iter()
            .map(|(event, guard)| {
                Trigger::new(event.map(EventDescriptor::new), guard.map(GuardId::new))
            })
            .collect();

        transitions.push(Transition {
            id: transition_id(i)?,
            source,
            triggers,
            targets,
            actions: transition.actions,
            kind: transition.kind,
        });
    }

    let name = draft.states[0].name.clone();
    Ok(Chart {
        name,
        states,
        transitions,
        index,
    })
}
