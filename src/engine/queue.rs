//! Internal and external event queues.
//!
//! Only the thread driving a [`StateChart`](super::StateChart) touches the
//! queues directly. Other threads submit through an [`EventSender`], whose
//! events land in a channel that the driver drains into the external queue
//! before it looks for the next external event.

use super::error::EngineError;
use crate::core::{Event, EventOrigin};
use std::collections::VecDeque;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

/// Cloneable, thread-safe handle for submitting external events.
///
/// # Example
///
/// ```rust
/// use mindchart::builder::{ChartBuilder, StateBuilder};
/// use mindchart::engine::{ActionTable, GuardTable, StateChart};
/// use std::sync::Arc;
///
/// let chart = ChartBuilder::new("idle")
///     .state(StateBuilder::new("waiting"))
///     .build()
///     .unwrap();
/// let machine = StateChart::new(Arc::new(chart), GuardTable::new(), ActionTable::new());
///
/// let sender = machine.sender();
/// std::thread::spawn(move || sender.submit("ping").unwrap())
///     .join()
///     .unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct EventSender {
    tx: UnboundedSender<Event>,
}

impl EventSender {
    /// Submit a payload-less external event by name.
    pub fn submit(&self, name: impl Into<String>) -> Result<(), EngineError> {
        self.submit_event(Event::external(name))
    }

    /// Submit `event` as an external event.
    pub fn submit_event(&self, event: Event) -> Result<(), EngineError> {
        self.tx
            .send(event.with_origin(EventOrigin::External))
            .map_err(|_| EngineError::HandOffClosed)
    }

    /// Whether the receiving state chart has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// FIFO queues owned by one state chart instance.
#[derive(Debug)]
pub(crate) struct EventQueues {
    internal: VecDeque<Event>,
    external: VecDeque<Event>,
    tx: UnboundedSender<Event>,
    rx: UnboundedReceiver<Event>,
}

impl EventQueues {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            internal: VecDeque::new(),
            external: VecDeque::new(),
            tx,
            rx,
        }
    }

    pub(crate) fn sender(&self) -> EventSender {
        EventSender {
            tx: self.tx.clone(),
        }
    }

    /// Route `event` by its origin.
    pub(crate) fn push(&mut self, event: Event) {
        match event.origin() {
            EventOrigin::Internal => self.internal.push_back(event),
            EventOrigin::External => self.external.push_back(event),
        }
    }

    pub(crate) fn pop_internal(&mut self) -> Option<Event> {
        self.internal.pop_front()
    }

    pub(crate) fn pop_external(&mut self) -> Option<Event> {
        self.external.pop_front()
    }

    pub(crate) fn internal_mut(&mut self) -> &mut VecDeque<Event> {
        &mut self.internal
    }

    pub(crate) fn internal(&self) -> impl Iterator<Item = &Event> {
        self.internal.iter()
    }

    pub(crate) fn external(&self) -> impl Iterator<Item = &Event> {
        self.external.iter()
    }

    /// Move everything handed off by other threads into the external queue.
    /// Returns how many events were moved.
    pub(crate) fn drain_hand_off(&mut self) -> usize {
        let mut moved = 0;
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    self.external.push_back(event);
                    moved += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        moved
    }

    pub(crate) fn clear_internal(&mut self) {
        self.internal.clear();
    }

    /// Drop every pending event, including those still in the hand-off.
    pub(crate) fn clear(&mut self) {
        self.drain_hand_off();
        self.internal.clear();
        self.external.clear();
    }

    pub(crate) fn replace(&mut self, internal: Vec<Event>, external: Vec<Event>) {
        self.clear();
        self.internal.extend(internal);
        self.external.extend(external);
    }
}
