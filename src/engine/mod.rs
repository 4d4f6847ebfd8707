//! The interpreter.
//!
//! A [`StateChart`] runs one [`Chart`](crate::core::Chart) with
//! run-to-completion semantics:
//!
//! - A *microstep* takes a conflict-free set of enabled transitions: it
//!   exits states in reverse document order (recording history first),
//!   runs transition actions, then enters states in document order.
//! - A *macrostep* repeats microsteps, preferring eventless transitions and
//!   then internal events, until neither is left. Only then is the next
//!   external event taken.
//!
//! Guards and actions are evaluated through the [`ConditionEvaluator`] and
//! [`ActionExecutor`] capabilities. Their failures are reported as
//! [`Fault`]s and never leave the configuration inconsistent.

mod config;
mod configuration;
mod error;
mod host;
mod machine;
mod microstep;
mod observer;
mod queue;
mod select;

pub use config::EngineConfig;
pub use configuration::{Configuration, ConfigurationViolation};
pub use error::{ActionFault, ActionPhase, EngineError, Fault, GuardFault};
pub use host::{ActionContext, ActionExecutor, ActionTable, ConditionEvaluator, EventContext, GuardTable};
pub use machine::{RunStatus, StateChart};
pub use observer::{ConfigurationChange, Observer, SubscriptionId};
pub use queue::EventSender;
