//! Execution of one microstep: exit, transition content, entry.

use super::configuration::{regions, Configuration};
use super::error::{ActionPhase, Fault};
use super::host::{ActionContext, ActionExecutor, EventContext};
use super::select::{default_entry, effective_targets, exit_set, transition_domain};
use crate::core::{
    ActionId, Chart, Event, HistoryDepth, HistoryMemory, StateId, StateKind, TransitionId,
};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::{debug, warn};
use uuid::Uuid;

/// What a microstep changed.
#[derive(Debug, Default)]
pub(crate) struct StepOutcome {
    /// Exited states in exit order.
    pub(crate) exited: Vec<StateId>,
    /// Entered states in entry order.
    pub(crate) entered: Vec<StateId>,
    /// A final child of the root became active, or every region of a
    /// parallel root completed.
    pub(crate) reached_final: bool,
}

/// Entry set under construction.
#[derive(Default)]
struct EntryPlan {
    states: BTreeSet<StateId>,
    default_entry: BTreeSet<StateId>,
    history_actions: BTreeMap<StateId, Vec<ActionId>>,
}

impl EntryPlan {
    fn covers(&self, chart: &Chart, region: StateId) -> bool {
        self.states
            .iter()
            .any(|&s| s == region || chart.is_descendant(s, region))
    }
}

/// Mutable engine state borrowed for the duration of one microstep.
pub(crate) struct Microstep<'a, A> {
    pub(crate) chart: &'a Chart,
    pub(crate) configuration: &'a mut Configuration,
    pub(crate) history: &'a mut HistoryMemory,
    pub(crate) internal: &'a mut VecDeque<Event>,
    pub(crate) executor: &'a mut A,
    pub(crate) event: Option<&'a Event>,
    pub(crate) session_id: Uuid,
    pub(crate) faults: &'a mut Vec<Fault>,
}

impl<'a, A: ActionExecutor> Microstep<'a, A> {
    /// Take `transitions` (conflict-free, document order) as one microstep.
    pub(crate) fn run(mut self, transitions: &[TransitionId]) -> StepOutcome {
        let chart = self.chart;
        let mut outcome = StepOutcome::default();

        let mut exits = BTreeSet::new();
        for &id in transitions {
            exits.extend(exit_set(chart, self.configuration, self.history, chart.transition(id)));
        }
        self.record_history(&exits);
        for &state in exits.iter().rev() {
            self.exit(state);
            outcome.exited.push(state);
        }

        for &id in transitions {
            let transition = chart.transition(id);
            self.run_actions(transition.actions(), ActionPhase::Transition, transition.source());
        }

        let mut plan = EntryPlan::default();
        for &id in transitions {
            let transition = chart.transition(id);
            for &target in transition.targets() {
                self.add_descendants(target, &mut plan);
            }
            let Some(domain) = transition_domain(chart, self.history, transition) else {
                continue;
            };
            for target in effective_targets(chart, self.history, transition) {
                self.add_ancestors(target, Some(domain), &mut plan);
            }
            if domain == chart.root() {
                self.complete_parallel_root(&mut plan);
            }
        }
        self.enter(plan, &mut outcome);
        outcome
    }

    /// Enter the chart's default configuration.
    pub(crate) fn enter_initial(mut self) -> StepOutcome {
        let chart = self.chart;
        let root = chart.root();
        let mut outcome = StepOutcome::default();

        if let StateKind::Compound { initial } = chart.state(root).kind() {
            self.run_actions(initial.actions(), ActionPhase::Initial, root);
        }

        let mut plan = EntryPlan::default();
        for target in default_entry(chart, root) {
            self.add_descendants(target, &mut plan);
            self.add_ancestors(target, Some(root), &mut plan);
        }
        self.enter(plan, &mut outcome);
        outcome
    }

    /// Exit every active state without recording history.
    pub(crate) fn exit_all(mut self) -> StepOutcome {
        let active: Vec<StateId> = self.configuration.iter().collect();
        let mut outcome = StepOutcome::default();
        for &state in active.iter().rev() {
            self.exit(state);
            outcome.exited.push(state);
        }
        outcome
    }

    fn record_history(&mut self, exits: &BTreeSet<StateId>) {
        let chart = self.chart;
        for &state in exits {
            for history in chart.history_children(state) {
                let StateKind::History { depth, .. } = history.kind() else {
                    continue;
                };
                let recorded: Vec<StateId> = match depth {
                    HistoryDepth::Deep => self
                        .configuration
                        .iter()
                        .filter(|&s| chart.state(s).is_atomic() && chart.is_descendant(s, state))
                        .collect(),
                    HistoryDepth::Shallow => self
                        .configuration
                        .iter()
                        .filter(|&s| chart.state(s).parent() == Some(state))
                        .collect(),
                };
                debug!(history = history.name(), states = recorded.len(), "history recorded");
                self.history.record(history.id(), recorded);
            }
        }
    }

    fn exit(&mut self, state: StateId) {
        let chart = self.chart;
        self.run_actions(chart.state(state).on_exit(), ActionPhase::Exit, state);
        self.configuration.remove(state);
    }

    fn enter(&mut self, plan: EntryPlan, outcome: &mut StepOutcome) {
        let chart = self.chart;
        let root = chart.root();
        let EntryPlan {
            states,
            default_entry,
            mut history_actions,
        } = plan;

        for state in states {
            if !self.configuration.insert(state) {
                continue;
            }
            outcome.entered.push(state);

            let node = chart.state(state);
            // History defaults of a parent that stayed active run before its
            // first entered child.
            if let Some(parent) = node.parent() {
                if let Some(actions) = history_actions.remove(&parent) {
                    self.run_actions(&actions, ActionPhase::HistoryDefault, parent);
                }
            }
            self.run_actions(node.on_entry(), ActionPhase::Entry, state);

            if default_entry.contains(&state) {
                if let StateKind::Compound { initial } = node.kind() {
                    self.run_actions(initial.actions(), ActionPhase::Initial, state);
                }
            }
            if let Some(actions) = history_actions.remove(&state) {
                self.run_actions(&actions, ActionPhase::HistoryDefault, state);
            }

            if node.is_final() {
                self.final_entered(state, outcome);
            }
        }

        if chart.state(root).is_parallel() && self.configuration.is_in_final_state(chart, root) {
            outcome.reached_final = true;
        }
    }

    fn final_entered(&mut self, state: StateId, outcome: &mut StepOutcome) {
        let chart = self.chart;
        let root = chart.root();
        let Some(parent) = chart.state(state).parent() else {
            return;
        };
        if parent == root {
            if !chart.state(root).is_parallel() {
                outcome.reached_final = true;
            }
            return;
        }

        self.internal.push_back(Event::done_state(chart.name_of(parent)));
        if let Some(grandparent) = chart.state(parent).parent() {
            if grandparent != root
                && chart.state(grandparent).is_parallel()
                && self.configuration.is_in_final_state(chart, grandparent)
            {
                self.internal
                    .push_back(Event::done_state(chart.name_of(grandparent)));
            }
        }
    }

    fn add_descendants(&mut self, state: StateId, plan: &mut EntryPlan) {
        let chart = self.chart;
        let node = chart.state(state);
        match node.kind() {
            StateKind::History { default, .. } => {
                let Some(parent) = node.parent() else {
                    return;
                };
                let targets: Vec<StateId> = match (self.history.get(state), default) {
                    (Some(recorded), _) => recorded.to_vec(),
                    (None, Some(default)) if !default.targets().is_empty() => {
                        plan.history_actions
                            .insert(parent, default.actions().to_vec());
                        default.targets().to_vec()
                    }
                    (None, default) => {
                        if let Some(default) = default {
                            plan.history_actions
                                .insert(parent, default.actions().to_vec());
                        }
                        default_entry(chart, parent)
                    }
                };
                for &target in &targets {
                    self.add_descendants(target, plan);
                }
                for &target in &targets {
                    self.add_ancestors(target, Some(parent), plan);
                }
            }
            StateKind::Compound { .. } => {
                plan.states.insert(state);
                plan.default_entry.insert(state);
                let targets = chart.default_targets(state);
                for &target in &targets {
                    self.add_descendants(target, plan);
                }
                for &target in &targets {
                    self.add_ancestors(target, Some(state), plan);
                }
            }
            StateKind::Parallel => {
                plan.states.insert(state);
                for region in regions(chart, state) {
                    if !plan.covers(chart, region) {
                        self.add_descendants(region, plan);
                    }
                }
            }
            StateKind::Atomic | StateKind::Final => {
                plan.states.insert(state);
            }
        }
    }

    fn add_ancestors(&mut self, state: StateId, upto: Option<StateId>, plan: &mut EntryPlan) {
        let chart = self.chart;
        for ancestor in chart.proper_ancestors(state, upto) {
            if ancestor == chart.root() {
                continue;
            }
            plan.states.insert(ancestor);
            if chart.state(ancestor).is_parallel() {
                for region in regions(chart, ancestor) {
                    if !plan.covers(chart, region) {
                        self.add_descendants(region, plan);
                    }
                }
            }
        }
    }

    /// A transition whose domain is a parallel root exits every region, so
    /// regions it does not target are re-entered by default.
    fn complete_parallel_root(&mut self, plan: &mut EntryPlan) {
        let chart = self.chart;
        let root = chart.root();
        if !chart.state(root).is_parallel() {
            return;
        }
        for region in regions(chart, root) {
            if !plan.covers(chart, region) && !self.configuration.contains(region) {
                self.add_descendants(region, plan);
            }
        }
    }

    fn run_actions(&mut self, actions: &[ActionId], phase: ActionPhase, state: StateId) {
        let chart = self.chart;
        for action in actions {
            let context = EventContext::new(chart, self.configuration, self.event, self.session_id);
            let mut context = ActionContext::new(context, self.internal);
            if let Err(fault) = self.executor.execute(action, &mut context) {
                let state = chart.name_of(state).to_string();
                warn!(action = %action, state = %state, %phase, error = %fault, "action faulted");
                self.faults.push(Fault::Action {
                    action: action.clone(),
                    state,
                    phase,
                    fault,
                });
            }
        }
    }
}
