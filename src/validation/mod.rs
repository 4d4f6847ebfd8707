//! Validation of chart models before execution.
//!
//! Charts are validated with Stillwater's `Validation` type so that ALL
//! problems are collected in a single pass instead of stopping at the first
//! one. A chart that fails validation never reaches the engine; the builder
//! returns [`BuildError::ModelInvalid`](crate::builder::BuildError) with
//! every violation found.
//!
//! # Example
//!
//! ```rust
//! use mindchart::builder::{BuildError, ChartBuilder, StateBuilder, TransitionBuilder};
//! use mindchart::validation::ChartViolation;
//!
//! let result = ChartBuilder::new("machine")
//!     .state(StateBuilder::new("a").transition(TransitionBuilder::on("go").to("nowhere")))
//!     .state(StateBuilder::parallel("p"))
//!     .build();
//!
//! match result {
//!     Err(BuildError::ModelInvalid { violations }) => {
//!         assert_eq!(violations.len(), 2);
//!         assert!(violations
//!             .iter()
//!             .any(|v| matches!(v, ChartViolation::UnknownTarget { .. })));
//!     }
//!     _ => panic!("expected an invalid model"),
//! }
//! ```

pub(crate) mod rules;
pub mod violations;

pub use violations::ChartViolation;
