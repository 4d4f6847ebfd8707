//! Mindchart: a hierarchical state-chart interpreter
//!
//! Mindchart separates an immutable chart model from the engine that runs
//! it. Charts are declared with fluent builders, validated as a whole, and
//! then shared read-only by any number of running instances. Guards and
//! actions are referenced by id and supplied by the host at run time.
//!
//! # Core Concepts
//!
//! - **Chart**: Tree of atomic, compound, parallel, final and history states
//! - **Builder**: Name-based declaration validated before a chart exists
//! - **Engine**: Run-to-completion interpreter with internal/external queues
//! - **Checkpoint**: Serializable snapshot of a running instance
//!
//! # Example
//!
//! ```rust
//! use mindchart::builder::{ChartBuilder, StateBuilder, TransitionBuilder};
//! use mindchart::engine::{ActionTable, GuardTable, StateChart};
//! use std::sync::Arc;
//!
//! let chart = ChartBuilder::new("door")
//!     .state(
//!         StateBuilder::new("closed")
//!             .transition(TransitionBuilder::on("open").when("unlocked").to("opened")),
//!     )
//!     .state(StateBuilder::new("opened").on_entry("creak"))
//!     .build()
//!     .unwrap();
//!
//! let guards = GuardTable::new().with("unlocked", |_| true);
//! let actions = ActionTable::new().with_fn("creak", |_| {});
//!
//! let mut door = StateChart::new(Arc::new(chart), guards, actions);
//! door.start().unwrap();
//! door.submit("open").unwrap();
//! assert!(door.is_active("opened"));
//! ```

pub mod builder;
pub mod checkpoint;
pub mod core;
pub mod engine;
pub mod validation;

// Re-export commonly used types
pub use builder::{BuildError, ChartBuilder, StateBuilder, TransitionBuilder};
pub use checkpoint::{Checkpoint, CheckpointError};
pub use core::{Chart, Event, StateId};
pub use engine::{
    ActionExecutor, ConditionEvaluator, EngineConfig, EngineError, Observer, RunStatus,
    StateChart,
};
