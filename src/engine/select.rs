//! Transition selection and the set arithmetic shared with the executor.

use super::configuration::{regions, Configuration};
use super::error::Fault;
use super::host::{ConditionEvaluator, EventContext};
use crate::core::{
    Chart, Event, GuardId, HistoryMemory, StateId, StateKind, Transition, TransitionId,
    TransitionKind,
};
use std::collections::BTreeSet;
use tracing::{trace, warn};
use uuid::Uuid;

/// Inputs of one selection pass.
pub(crate) struct Selector<'a, C> {
    pub(crate) chart: &'a Chart,
    pub(crate) configuration: &'a Configuration,
    pub(crate) history: &'a HistoryMemory,
    pub(crate) evaluator: &'a C,
    pub(crate) session_id: Uuid,
}

/// A transition that survived the enabling check.
struct Candidate {
    id: TransitionId,
    source: StateId,
    depth: usize,
    targetless: bool,
    exits: BTreeSet<StateId>,
}

impl Candidate {
    fn conflicts_with(&self, other: &Candidate) -> bool {
        !self.exits.is_disjoint(&other.exits)
            || (self.targetless && other.exits.contains(&self.source))
            || (other.targetless && self.exits.contains(&other.source))
    }

    /// The shallower source wins; at equal depth the earlier one does.
    fn preempts(&self, other: &Candidate) -> bool {
        (self.depth, self.source) < (other.depth, other.source)
    }
}

impl<'a, C: ConditionEvaluator> Selector<'a, C> {
    /// Conflict-free transitions for `event` (eventless when `None`), in
    /// document order.
    ///
    /// Guard faults count as `false` and are appended to `faults`.
    pub(crate) fn select(&self, event: Option<&Event>, faults: &mut Vec<Fault>) -> Vec<TransitionId> {
        let context = EventContext::new(self.chart, self.configuration, event, self.session_id);

        let mut chosen: Vec<Candidate> = Vec::new();
        for state in self.configuration.iter() {
            let Some(id) = self.first_enabled(state, event, &context, faults) else {
                continue;
            };
            let transition = self.chart.transition(id);
            let candidate = Candidate {
                id,
                source: state,
                depth: self.chart.state(state).depth(),
                targetless: transition.is_targetless(),
                exits: exit_set(self.chart, self.configuration, self.history, transition),
            };

            let rivals: Vec<usize> = chosen
                .iter()
                .enumerate()
                .filter(|(_, c)| c.conflicts_with(&candidate))
                .map(|(i, _)| i)
                .collect();
            if rivals.iter().any(|&i| chosen[i].preempts(&candidate)) {
                trace!(transition = ?id, "transition preempted");
                continue;
            }
            for &i in rivals.iter().rev() {
                let dropped = chosen.remove(i);
                trace!(transition = ?dropped.id, "transition preempted");
            }
            chosen.push(candidate);
        }

        let mut selected: Vec<TransitionId> = chosen.into_iter().map(|c| c.id).collect();
        selected.sort();
        trace!(
            event = event.map(Event::name),
            selected = selected.len(),
            "transitions selected"
        );
        selected
    }

    fn first_enabled(
        &self,
        state: StateId,
        event: Option<&Event>,
        context: &EventContext<'_>,
        faults: &mut Vec<Fault>,
    ) -> Option<TransitionId> {
        self.chart
            .state(state)
            .transitions()
            .iter()
            .copied()
            .find(|&id| self.is_enabled(self.chart.transition(id), event, context, faults))
    }

    fn is_enabled(
        &self,
        transition: &Transition,
        event: Option<&Event>,
        context: &EventContext<'_>,
        faults: &mut Vec<Fault>,
    ) -> bool {
        match event {
            None => {
                transition.is_eventless()
                    && (transition.triggers().is_empty()
                        || transition.triggers().iter().any(|trigger| {
                            self.guard_holds(trigger.guard(), transition, context, faults)
                        }))
            }
            Some(event) => transition.triggers().iter().any(|trigger| {
                trigger.accepts(event.name())
                    && self.guard_holds(trigger.guard(), transition, context, faults)
            }),
        }
    }

    fn guard_holds(
        &self,
        guard: Option<&GuardId>,
        transition: &Transition,
        context: &EventContext<'_>,
        faults: &mut Vec<Fault>,
    ) -> bool {
        let Some(guard) = guard else {
            return true;
        };
        match self.evaluator.evaluate(guard, context) {
            Ok(holds) => holds,
            Err(fault) => {
                let state = self.chart.name_of(transition.source()).to_string();
                warn!(guard = %guard, state = %state, error = %fault, "guard faulted");
                faults.push(Fault::Guard {
                    guard: guard.clone(),
                    state,
                    fault,
                });
                false
            }
        }
    }
}

/// Targets of `transition` with history pseudostates resolved against
/// `history`.
pub(crate) fn effective_targets(
    chart: &Chart,
    history: &HistoryMemory,
    transition: &Transition,
) -> Vec<StateId> {
    let mut targets = Vec::new();
    for &target in transition.targets() {
        resolve_target(chart, history, target, &mut targets);
    }
    targets.sort();
    targets.dedup();
    targets
}

fn resolve_target(chart: &Chart, history: &HistoryMemory, target: StateId, out: &mut Vec<StateId>) {
    let node = chart.state(target);
    let StateKind::History { default, .. } = node.kind() else {
        out.push(target);
        return;
    };

    if let Some(recorded) = history.get(target) {
        out.extend_from_slice(recorded);
        return;
    }
    match default {
        Some(default) if !default.targets().is_empty() => {
            for &t in default.targets() {
                resolve_target(chart, history, t, out);
            }
        }
        _ => {
            if let Some(parent) = node.parent() {
                out.extend(default_entry(chart, parent));
            }
        }
    }
}

/// States entered by default below `state`: the initial targets of a
/// compound state (or the chart root) and every region of a parallel one.
pub(crate) fn default_entry(chart: &Chart, state: StateId) -> Vec<StateId> {
    if chart.state(state).is_parallel() {
        regions(chart, state).collect()
    } else {
        chart.default_targets(state)
    }
}

/// The state whose active descendants `transition` exits, or `None` for a
/// targetless transition.
pub(crate) fn transition_domain(
    chart: &Chart,
    history: &HistoryMemory,
    transition: &Transition,
) -> Option<StateId> {
    let targets = effective_targets(chart, history, transition);
    if targets.is_empty() {
        return None;
    }

    let source = transition.source();
    if transition.kind() == TransitionKind::Internal
        && chart.state(source).is_compound()
        && targets.iter().all(|&t| chart.is_descendant(t, source))
    {
        return Some(source);
    }

    let mut states = Vec::with_capacity(targets.len() + 1);
    states.push(source);
    states.extend(targets);
    Some(chart.least_common_compound_ancestor(&states))
}

/// Active states `transition` would exit.
pub(crate) fn exit_set(
    chart: &Chart,
    configuration: &Configuration,
    history: &HistoryMemory,
    transition: &Transition,
) -> BTreeSet<StateId> {
    match transition_domain(chart, history, transition) {
        Some(domain) => configuration
            .iter()
            .filter(|&s| chart.is_descendant(s, domain))
            .collect(),
        None => BTreeSet::new(),
    }
}
