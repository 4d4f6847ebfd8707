//! Checkpoint and restore for running state charts.
//!
//! A checkpoint captures everything a [`StateChart`] accumulates while it
//! runs (status, active states, recorded history and pending events) by
//! state *name*, so it survives process restarts and can be restored into a
//! fresh instance built from the same chart. Guards and actions are host
//! code and are not part of a checkpoint.

use crate::core::{Event, EventOrigin, StateId};
use crate::engine::{ActionExecutor, ConditionEvaluator, Configuration, RunStatus, StateChart};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// A pending event as stored in a checkpoint.
///
/// The payload is kept as JSON text so that every format can carry it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedEvent {
    pub name: String,
    pub origin: EventOrigin,
    pub payload: Option<String>,
}

impl SavedEvent {
    fn capture(event: &Event) -> Result<Self, CheckpointError> {
        let payload = event
            .payload()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| CheckpointError::SerializationFailed(e.to_string()))?;
        Ok(Self {
            name: event.name().to_string(),
            origin: event.origin(),
            payload,
        })
    }

    fn into_event(self) -> Result<Event, CheckpointError> {
        let event = Event::new(self.name, self.origin);
        match self.payload {
            Some(text) => serde_json::from_str(&text)
                .map(|payload| event.with_payload(payload))
                .map_err(|e| CheckpointError::DeserializationFailed(e.to_string())),
            None => Ok(event),
        }
    }
}

/// Serializable snapshot of a state chart instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: Uuid,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    /// Name of the chart the instance runs
    pub chart: String,

    /// Session of the instance the checkpoint was taken from
    pub session_id: Uuid,

    pub status: RunStatus,

    /// Active states in document order
    pub active: Vec<String>,

    /// Recorded history, keyed by history pseudostate
    pub history: BTreeMap<String, Vec<String>>,

    pub internal: Vec<SavedEvent>,

    pub external: Vec<SavedEvent>,
}

impl Checkpoint {
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self = serde_json::from_str(json)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.check_version()?;
        Ok(checkpoint)
    }

    pub fn to_binary(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self = bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.check_version()?;
        Ok(checkpoint)
    }

    fn check_version(&self) -> Result<(), CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        Ok(())
    }
}

impl<C: ConditionEvaluator, A: ActionExecutor> StateChart<C, A> {
    /// Capture the instance's run-time state.
    pub fn checkpoint(&self) -> Result<Checkpoint, CheckpointError> {
        let chart = &self.chart;
        let names = |ids: &[StateId]| -> Vec<String> {
            ids.iter().map(|&id| chart.name_of(id).to_string()).collect()
        };

        Ok(Checkpoint {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            chart: chart.name().to_string(),
            session_id: self.session_id,
            status: self.status,
            active: self.active_state_names().into_iter().map(String::from).collect(),
            history: self
                .history
                .iter()
                .map(|(h, states)| (chart.name_of(h).to_string(), names(states)))
                .collect(),
            internal: self
                .queues
                .internal()
                .map(SavedEvent::capture)
                .collect::<Result<_, _>>()?,
            external: self
                .queues
                .external()
                .map(SavedEvent::capture)
                .collect::<Result<_, _>>()?,
        })
    }

    /// Replace the run-time state of an idle instance with `checkpoint`.
    ///
    /// Nothing changes unless the whole checkpoint is valid. Entry actions
    /// are not re-run; the restored configuration is taken as already
    /// entered. Pending events are processed by the next
    /// [`submit_event`](StateChart::submit_event) or
    /// [`process_pending`](StateChart::process_pending).
    pub fn restore(&mut self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        if self.status != RunStatus::Idle {
            return Err(CheckpointError::Running);
        }
        checkpoint.check_version()?;
        if checkpoint.chart != self.chart.name() {
            return Err(CheckpointError::ChartMismatch {
                expected: self.chart.name().to_string(),
                found: checkpoint.chart.clone(),
            });
        }

        let resolve = |name: &String| {
            self.chart
                .lookup(name)
                .ok_or_else(|| CheckpointError::UnknownState(name.clone()))
        };

        let configuration: Configuration =
            checkpoint.active.iter().map(resolve).collect::<Result<_, _>>()?;
        configuration.validate(&self.chart)?;

        let status = match checkpoint.status {
            RunStatus::Stabilizing => RunStatus::AwaitingExternal,
            other => other,
        };
        if (status == RunStatus::Idle) != configuration.is_empty() {
            return Err(CheckpointError::ValidationFailed(format!(
                "status {status:?} does not match {} active state(s)",
                configuration.len()
            )));
        }

        let mut history = crate::core::HistoryMemory::new();
        for (name, states) in &checkpoint.history {
            let id = resolve(name)?;
            if !self.chart.state(id).is_history() {
                return Err(CheckpointError::ValidationFailed(format!(
                    "'{name}' records history but is not a history state"
                )));
            }
            let recorded: Vec<StateId> = states.iter().map(resolve).collect::<Result<_, _>>()?;
            if recorded.is_empty() {
                return Err(CheckpointError::ValidationFailed(format!(
                    "history '{name}' has an empty record"
                )));
            }
            let parent = self.chart.state(id).parent().unwrap_or(self.chart.root());
            if let Some(&stray) = recorded
                .iter()
                .find(|&&s| !self.chart.is_descendant(s, parent) || self.chart.state(s).is_history())
            {
                return Err(CheckpointError::ValidationFailed(format!(
                    "history '{name}' records '{}' outside '{}'",
                    self.chart.name_of(stray),
                    self.chart.name_of(parent)
                )));
            }
            history.record(id, recorded);
        }

        let internal = checkpoint
            .internal
            .iter()
            .cloned()
            .map(SavedEvent::into_event)
            .collect::<Result<Vec<_>, _>>()?;
        let external = checkpoint
            .external
            .iter()
            .cloned()
            .map(SavedEvent::into_event)
            .collect::<Result<Vec<_>, _>>()?;

        self.configuration = configuration;
        self.history = history;
        self.queues.replace(internal, external);
        self.status = status;
        info!(
            chart = self.chart.name(),
            checkpoint = %checkpoint.id,
            active = self.configuration.len(),
            "state chart restored"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{ChartBuilder, StateBuilder, TransitionBuilder};
    use crate::core::Chart;
    use crate::engine::{ActionTable, GuardTable};
    use serde_json::json;
    use std::sync::Arc;

    fn chart() -> Arc<Chart> {
        Arc::new(
            ChartBuilder::new("player")
                .state(
                    StateBuilder::new("on")
                        .transition(TransitionBuilder::on("power").to("off"))
                        .state(StateBuilder::deep_history("h"))
                        .state(StateBuilder::new("stopped").transition(TransitionBuilder::on("play").to("playing")))
                        .state(StateBuilder::new("playing")),
                )
                .state(StateBuilder::new("off").transition(TransitionBuilder::on("power").to("h")))
                .build()
                .unwrap(),
        )
    }

    fn machine(chart: Arc<Chart>) -> StateChart<GuardTable, ActionTable> {
        StateChart::new(chart, GuardTable::new(), ActionTable::new())
    }

    #[test]
    fn checkpoint_captures_configuration_and_history() {
        let mut m = machine(chart());
        m.start().unwrap();
        m.submit("play").unwrap();
        m.submit("power").unwrap();

        let cp = m.checkpoint().unwrap();
        assert_eq!(cp.version, CHECKPOINT_VERSION);
        assert_eq!(cp.chart, "player");
        assert_eq!(cp.active, vec!["off"]);
        assert_eq!(cp.history.get("h"), Some(&vec!["playing".to_string()]));
    }

    #[test]
    fn restore_resumes_with_history() {
        let chart = chart();
        let mut original = machine(Arc::clone(&chart));
        original.start().unwrap();
        original.submit("play").unwrap();
        original.submit("power").unwrap();
        let json = original.checkpoint().unwrap().to_json().unwrap();

        let mut restored = machine(chart);
        restored.restore(&Checkpoint::from_json(&json).unwrap()).unwrap();
        assert_eq!(restored.status(), RunStatus::AwaitingExternal);
        assert_eq!(restored.active_state_names(), vec!["off"]);

        restored.submit("power").unwrap();
        assert_eq!(restored.active_state_names(), vec!["on", "playing"]);
    }

    #[test]
    fn binary_format_carries_payloads() {
        let mut m = machine(chart());
        m.submit_event(Event::external("play").with_payload(json!({"track": 3})))
            .unwrap();
        let cp = m.checkpoint().unwrap();
        let back = Checkpoint::from_binary(&cp.to_binary().unwrap()).unwrap();
        assert_eq!(back, cp);

        let mut restored = machine(chart());
        restored.restore(&back).unwrap();
        restored.start().unwrap();
        assert_eq!(restored.active_state_names(), vec!["on", "playing"]);
    }

    #[test]
    fn restore_requires_idle_instance() {
        let mut m = machine(chart());
        let cp = m.checkpoint().unwrap();
        m.start().unwrap();
        assert!(matches!(m.restore(&cp), Err(CheckpointError::Running)));
    }

    #[test]
    fn restore_rejects_foreign_or_invalid_checkpoints() {
        let mut source = machine(chart());
        source.start().unwrap();
        let cp = source.checkpoint().unwrap();

        let mut wrong_chart = cp.clone();
        wrong_chart.chart = "radio".to_string();
        let mut unknown = cp.clone();
        unknown.active = vec!["on".to_string(), "paused".to_string()];
        let mut broken = cp.clone();
        broken.active = vec!["on".to_string()];
        let mut future = cp;
        future.version = CHECKPOINT_VERSION + 1;

        let mut target = machine(chart());
        assert!(matches!(
            target.restore(&wrong_chart),
            Err(CheckpointError::ChartMismatch { .. })
        ));
        assert!(matches!(
            target.restore(&unknown),
            Err(CheckpointError::UnknownState(name)) if name == "paused"
        ));
        assert!(matches!(
            target.restore(&broken),
            Err(CheckpointError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            target.restore(&future),
            Err(CheckpointError::UnsupportedVersion { .. })
        ));
        assert_eq!(target.status(), RunStatus::Idle);
        assert!(target.active_state_names().is_empty());
    }

    #[test]
    fn restore_rejects_history_records_that_cannot_be_resumed() {
        let mut source = machine(chart());
        source.start().unwrap();
        source.submit("power").unwrap();
        let cp = source.checkpoint().unwrap();

        let mut empty = cp.clone();
        empty.history.insert("h".to_string(), Vec::new());
        let mut outside = cp.clone();
        outside.history.insert("h".to_string(), vec!["off".to_string()]);
        let mut itself = cp;
        itself.history.insert("h".to_string(), vec!["h".to_string()]);

        let mut target = machine(chart());
        for bad in [&empty, &outside, &itself] {
            assert!(matches!(
                target.restore(bad),
                Err(CheckpointError::ValidationFailed(_))
            ));
        }
        assert_eq!(target.status(), RunStatus::Idle);
        assert!(target.history().is_empty());
    }

    #[test]
    fn json_version_is_checked_on_load() {
        let mut cp = machine(chart()).checkpoint().unwrap();
        cp.version = 0;
        let json = serde_json::to_string(&cp).unwrap();
        assert!(matches!(
            Checkpoint::from_json(&json),
            Err(CheckpointError::UnsupportedVersion { found: 0, .. })
        ));
    }
}
