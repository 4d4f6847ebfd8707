//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Tunables of a running state chart.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```rust
/// use mindchart::engine::EngineConfig;
///
/// let config = EngineConfig::from_json(r#"{ "microstep_limit": 500 }"#).unwrap();
/// assert_eq!(config.microstep_limit, Some(500));
/// assert!(config.raise_error_events);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on microsteps per macrostep. `None` runs unbounded.
    pub microstep_limit: Option<usize>,

    /// Enqueue an internal `error.execution` event for action faults and
    /// for guard faults met while matching an event.
    pub raise_error_events: bool,

    /// Tell observers about events that matched no transition.
    pub report_dropped_events: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            microstep_limit: None,
            raise_error_events: true,
            report_dropped_events: true,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_microstep_limit(mut self, limit: usize) -> Self {
        self.microstep_limit = Some(limit);
        self
    }

    pub fn with_error_events(mut self, enabled: bool) -> Self {
        self.raise_error_events = enabled;
        self
    }

    pub fn with_dropped_event_reports(mut self, enabled: bool) -> Self {
        self.report_dropped_events = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_runs_unbounded() {
        let config = EngineConfig::default();
        assert_eq!(config.microstep_limit, None);
        assert!(config.raise_error_events);
        assert!(config.report_dropped_events);
    }

    #[test]
    fn empty_json_yields_defaults() {
        assert_eq!(EngineConfig::from_json("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn setters_chain() {
        let config = EngineConfig::new()
            .with_microstep_limit(10)
            .with_error_events(false)
            .with_dropped_event_reports(false);
        assert_eq!(config.microstep_limit, Some(10));
        assert!(!config.raise_error_events);
        assert!(!config.report_dropped_events);
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(EngineConfig::from_json(r#"{ "microstep_limit": "many" }"#).is_err());
    }
}
