//! The state chart façade: lifecycle, event submission and queries.

use super::config::EngineConfig;
use super::configuration::Configuration;
use super::error::{EngineError, Fault};
use super::host::{ActionExecutor, ConditionEvaluator};
use super::microstep::{Microstep, StepOutcome};
use super::observer::{ChangeListener, ConfigurationChange, Observer, Observers, StateWatcher, SubscriptionId};
use super::queue::{EventQueues, EventSender};
use super::select::Selector;
use crate::core::{Chart, Event, HistoryMemory, TransitionId, ERROR_EXECUTION};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Lifecycle status of a state chart instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunStatus {
    /// Not started, or stopped. The configuration is empty.
    Idle,
    /// Running a macrostep.
    Stabilizing,
    /// Stable; waiting for the next external event.
    AwaitingExternal,
    /// A top-level final state was reached. Further events are ignored.
    Final,
}

/// A running instance of a [`Chart`].
///
/// The chart is shared read-only; everything that changes while the chart
/// runs (configuration, history, queues, observers) is owned here. One
/// thread drives an instance; other threads hand events over through
/// [`StateChart::sender`].
///
/// # Example
///
/// ```rust
/// use mindchart::builder::{simple_transition, ChartBuilder, StateBuilder};
/// use mindchart::engine::{ActionTable, GuardTable, StateChart};
/// use std::sync::Arc;
///
/// let chart = ChartBuilder::new("switch")
///     .state(StateBuilder::new("off").transition(simple_transition("flip", "on")))
///     .state(StateBuilder::new("on").transition(simple_transition("flip", "off")))
///     .build()
///     .unwrap();
///
/// let mut switch = StateChart::new(Arc::new(chart), GuardTable::new(), ActionTable::new());
/// switch.start().unwrap();
/// assert_eq!(switch.active_state_names(), vec!["off"]);
///
/// switch.submit("flip").unwrap();
/// assert_eq!(switch.active_state_names(), vec!["on"]);
/// ```
pub struct StateChart<C, A> {
    pub(crate) chart: Arc<Chart>,
    pub(crate) evaluator: C,
    pub(crate) executor: A,
    pub(crate) config: EngineConfig,
    pub(crate) status: RunStatus,
    pub(crate) configuration: Configuration,
    pub(crate) history: HistoryMemory,
    pub(crate) queues: EventQueues,
    pub(crate) observers: Observers,
    pub(crate) session_id: Uuid,
}

impl<C: ConditionEvaluator, A: ActionExecutor> StateChart<C, A> {
    pub fn new(chart: Arc<Chart>, evaluator: C, executor: A) -> Self {
        Self {
            chart,
            evaluator,
            executor,
            config: EngineConfig::default(),
            status: RunStatus::Idle,
            configuration: Configuration::new(),
            history: HistoryMemory::new(),
            queues: EventQueues::new(),
            observers: Observers::default(),
            session_id: Uuid::new_v4(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn chart(&self) -> &Arc<Chart> {
        &self.chart
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn evaluator(&self) -> &C {
        &self.evaluator
    }

    pub fn executor(&self) -> &A {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut A {
        &mut self.executor
    }

    /// Whether the chart has been started and not stopped.
    pub fn is_running(&self) -> bool {
        matches!(
            self.status,
            RunStatus::Stabilizing | RunStatus::AwaitingExternal
        )
    }

    /// Enter the default configuration and run to the first stable state.
    ///
    /// Events of either origin submitted while idle are processed as part of
    /// this call. History recorded by a previous run is discarded.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.status != RunStatus::Idle {
            return Err(EngineError::AlreadyRunning);
        }
        info!(chart = self.chart.name(), session = %self.session_id, "state chart starting");

        self.history.clear();
        self.configuration.clear();
        self.status = RunStatus::Stabilizing;

        let mut faults = Vec::new();
        let outcome = Microstep {
            chart: &self.chart,
            configuration: &mut self.configuration,
            history: &mut self.history,
            internal: self.queues.internal_mut(),
            executor: &mut self.executor,
            event: None,
            session_id: self.session_id,
            faults: &mut faults,
        }
        .enter_initial();
        self.settle(outcome, None, faults);

        self.run_macrosteps(true)
    }

    /// Exit every active state and return to [`RunStatus::Idle`].
    ///
    /// Pending events are discarded. Stopping a finished chart only resets
    /// its status.
    pub fn stop(&mut self) -> Result<(), EngineError> {
        if self.status == RunStatus::Idle {
            return Err(EngineError::NotRunning);
        }

        let mut faults = Vec::new();
        let outcome = Microstep {
            chart: &self.chart,
            configuration: &mut self.configuration,
            history: &mut self.history,
            internal: self.queues.internal_mut(),
            executor: &mut self.executor,
            event: None,
            session_id: self.session_id,
            faults: &mut faults,
        }
        .exit_all();
        self.report_faults(faults, false);
        self.notify_change(&outcome, None);

        self.queues.clear();
        self.status = RunStatus::Idle;
        info!(chart = self.chart.name(), "state chart stopped");
        Ok(())
    }

    /// Submit an external event by name.
    pub fn submit(&mut self, name: impl Into<String>) -> Result<(), EngineError> {
        self.submit_event(Event::external(name))
    }

    /// Queue `event` and, if the chart is running, process everything that
    /// is pending before returning.
    ///
    /// Events submitted while idle wait for [`StateChart::start`]. Events
    /// submitted after the chart finished are ignored.
    pub fn submit_event(&mut self, event: Event) -> Result<(), EngineError> {
        if self.status == RunStatus::Final {
            debug!(event = event.name(), "chart finished; event ignored");
            return Ok(());
        }
        self.queues.push(event);
        self.run_macrosteps(false)
    }

    /// Process events handed over through [`EventSender`]s.
    pub fn process_pending(&mut self) -> Result<(), EngineError> {
        self.run_macrosteps(false)
    }

    /// Handle for submitting events from other threads.
    pub fn sender(&self) -> EventSender {
        self.queues.sender()
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn history(&self) -> &HistoryMemory {
        &self.history
    }

    /// Every state of the chart except the root, in document order.
    pub fn state_names(&self) -> Vec<&str> {
        self.chart.states().skip(1).map(|s| s.name()).collect()
    }

    /// Active states in document order.
    pub fn active_state_names(&self) -> Vec<&str> {
        self.configuration.names(&self.chart)
    }

    /// Active atomic states in document order.
    pub fn active_leaf_names(&self) -> Vec<&str> {
        self.configuration.leaf_names(&self.chart)
    }

    /// Whether the named state is active. Unknown names are not.
    pub fn is_active(&self, name: &str) -> bool {
        self.chart
            .lookup(name)
            .is_some_and(|id| self.configuration.contains(id))
    }

    pub fn subscribe(&mut self, observer: impl Observer + 'static) -> SubscriptionId {
        self.observers.subscribe(Box::new(observer))
    }

    /// Call `listener` with every configuration change.
    pub fn on_change<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&ConfigurationChange) + Send + 'static,
    {
        self.subscribe(ChangeListener(listener))
    }

    /// Call `callback` with `true` when `state` becomes active and `false`
    /// when it stops being active.
    pub fn on_state_active<F>(&mut self, state: &str, callback: F) -> Result<SubscriptionId, EngineError>
    where
        F: FnMut(bool) + Send + 'static,
    {
        if self.chart.lookup(state).is_none() {
            return Err(EngineError::UnknownState(state.to_string()));
        }
        Ok(self.subscribe(StateWatcher {
            state: state.to_string(),
            callback,
        }))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Drive macrosteps until both queues are empty or the chart finishes.
    ///
    /// `progressed` tells whether the configuration already changed since
    /// the last stable-state notification.
    fn run_macrosteps(&mut self, mut progressed: bool) -> Result<(), EngineError> {
        if !self.is_running() {
            return Ok(());
        }
        self.queues.drain_hand_off();

        let mut microsteps = 0usize;
        self.status = RunStatus::Stabilizing;
        loop {
            while self.status != RunStatus::Final {
                let mut enabled = self.select(None);
                let mut event = None;
                if enabled.is_empty() {
                    let Some(internal) = self.queues.pop_internal() else {
                        break;
                    };
                    progressed = true;
                    enabled = self.select(Some(&internal));
                    if enabled.is_empty() {
                        self.drop_event(&internal);
                        continue;
                    }
                    event = Some(internal);
                }

                microsteps += 1;
                self.check_limit(microsteps)?;
                self.microstep(&enabled, event.as_ref());
                progressed = true;
            }

            if self.status == RunStatus::Final {
                return Ok(());
            }

            self.status = RunStatus::AwaitingExternal;
            if progressed {
                debug!(chart = self.chart.name(), "stable configuration reached");
                self.observers.each(|o| o.reached_stable_state());
                progressed = false;
            }

            self.queues.drain_hand_off();
            let Some(external) = self.queues.pop_external() else {
                return Ok(());
            };
            self.status = RunStatus::Stabilizing;
            progressed = true;
            microsteps = 0;

            let enabled = self.select(Some(&external));
            if enabled.is_empty() {
                self.drop_event(&external);
                continue;
            }
            microsteps += 1;
            self.check_limit(microsteps)?;
            self.microstep(&enabled, Some(&external));
        }
    }

    fn check_limit(&mut self, microsteps: usize) -> Result<(), EngineError> {
        let Some(limit) = self.config.microstep_limit else {
            return Ok(());
        };
        if microsteps <= limit {
            return Ok(());
        }

        warn!(chart = self.chart.name(), limit, "macrostep did not stabilize");
        let fault = Fault::NonTerminating { limit };
        self.observers.each(|o| o.fault(&fault));
        self.queues.clear_internal();
        self.status = RunStatus::AwaitingExternal;
        Err(EngineError::NonTerminating { limit })
    }

    fn select(&mut self, event: Option<&Event>) -> Vec<TransitionId> {
        let mut faults = Vec::new();
        let selected = Selector {
            chart: &self.chart,
            configuration: &self.configuration,
            history: &self.history,
            evaluator: &self.evaluator,
            session_id: self.session_id,
        }
        .select(event, &mut faults);
        // Eventless passes repeat after every internal event; raising an
        // error event for them would never let the macrostep settle.
        self.report_faults(faults, event.is_some());
        selected
    }

    fn microstep(&mut self, transitions: &[TransitionId], event: Option<&Event>) {
        let mut faults = Vec::new();
        let outcome = Microstep {
            chart: &self.chart,
            configuration: &mut self.configuration,
            history: &mut self.history,
            internal: self.queues.internal_mut(),
            executor: &mut self.executor,
            event,
            session_id: self.session_id,
            faults: &mut faults,
        }
        .run(transitions);
        self.settle(outcome, event, faults);
    }

    /// Publish the effects of a microstep.
    fn settle(&mut self, outcome: StepOutcome, event: Option<&Event>, faults: Vec<Fault>) {
        debug!(
            event = event.map(Event::name),
            exited = outcome.exited.len(),
            entered = outcome.entered.len(),
            "microstep"
        );
        self.report_faults(faults, true);
        self.notify_change(&outcome, event);

        if outcome.reached_final {
            self.status = RunStatus::Final;
            self.queues.clear();
            info!(chart = self.chart.name(), "state chart finished");
            self.observers.each(|o| o.finished());
        }
    }

    fn notify_change(&mut self, outcome: &StepOutcome, event: Option<&Event>) {
        if outcome.exited.is_empty() && outcome.entered.is_empty() {
            return;
        }
        let names = |ids: &[crate::core::StateId]| {
            ids.iter()
                .map(|&id| self.chart.name_of(id).to_string())
                .collect::<Vec<_>>()
        };
        let change = ConfigurationChange {
            exited: names(&outcome.exited),
            entered: names(&outcome.entered),
            event: event.map(|e| e.name().to_string()),
        };
        self.observers.each(|o| o.configuration_changed(&change));
    }

    fn report_faults(&mut self, faults: Vec<Fault>, raise: bool) {
        for fault in faults {
            if raise && self.config.raise_error_events {
                self.queues.push(
                    Event::internal(ERROR_EXECUTION).with_payload(json!({ "message": fault.to_string() })),
                );
            }
            self.observers.each(|o| o.fault(&fault));
        }
    }

    fn drop_event(&mut self, event: &Event) {
        debug!(event = event.name(), "event matched no transition; dropped");
        if self.config.report_dropped_events {
            self.observers.each(|o| o.event_dropped(event));
        }
    }
}

impl<C, A> std::fmt::Debug for StateChart<C, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateChart")
            .field("chart", &self.chart.name())
            .field("status", &self.status)
            .field("configuration", &self.configuration.names(&self.chart))
            .field("session_id", &self.session_id)
            .field("observers", &self.observers.len())
            .finish()
    }
}
