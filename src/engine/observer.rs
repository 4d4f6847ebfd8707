//! Observers notified about configuration changes and faults.

use super::error::Fault;
use crate::core::Event;
use serde::{Deserialize, Serialize};

/// States entered and exited by one microstep, by name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationChange {
    /// Exited states in exit order.
    pub exited: Vec<String>,
    /// Entered states in entry order.
    pub entered: Vec<String>,
    /// Event that triggered the microstep, if any.
    pub event: Option<String>,
}

/// Receives notifications from a running state chart.
///
/// Every method defaults to a no-op, so observers implement only what they
/// need. Callbacks run on the thread driving the chart, after the
/// microstep that caused them has completed.
pub trait Observer: Send {
    fn configuration_changed(&mut self, _change: &ConfigurationChange) {}

    fn fault(&mut self, _fault: &Fault) {}

    /// An event matched no enabled transition and was discarded.
    fn event_dropped(&mut self, _event: &Event) {}

    /// The chart finished a macrostep and waits for external events.
    fn reached_stable_state(&mut self) {}

    /// The chart reached a top-level final state.
    fn finished(&mut self) {}
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Observer forwarding every configuration change to a closure.
pub(crate) struct ChangeListener<F>(pub(crate) F);

impl<F> Observer for ChangeListener<F>
where
    F: FnMut(&ConfigurationChange) + Send,
{
    fn configuration_changed(&mut self, change: &ConfigurationChange) {
        (self.0)(change);
    }
}

/// Observer reporting when one state becomes active or inactive.
pub(crate) struct StateWatcher<F> {
    pub(crate) state: String,
    pub(crate) callback: F,
}

impl<F> Observer for StateWatcher<F>
where
    F: FnMut(bool) + Send,
{
    fn configuration_changed(&mut self, change: &ConfigurationChange) {
        let exited = change.exited.iter().any(|s| *s == self.state);
        let entered = change.entered.iter().any(|s| *s == self.state);
        match (exited, entered) {
            (true, true) => {
                (self.callback)(false);
                (self.callback)(true);
            }
            (true, false) => (self.callback)(false),
            (false, true) => (self.callback)(true),
            (false, false) => {}
        }
    }
}

/// Registered observers in subscription order.
#[derive(Default)]
pub(crate) struct Observers {
    next: u64,
    entries: Vec<(SubscriptionId, Box<dyn Observer>)>,
}

impl Observers {
    pub(crate) fn subscribe(&mut self, observer: Box<dyn Observer>) -> SubscriptionId {
        let id = SubscriptionId(self.next);
        self.next += 1;
        self.entries.push((id, observer));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn each(&mut self, mut notify: impl FnMut(&mut dyn Observer)) {
        for (_, observer) in &mut self.entries {
            notify(observer.as_mut());
        }
    }
}
