//! This is a stresstest library which simulates many concurrent users logging through two
//! independent logging backends, while sampling how the output of each backend grows.
//!
//! A run draws a random number of actors from a configured range. Every actor writes a fixed
//! number of messages to both backends on its own timer. Meanwhile, one sampler per backend
//! records the size of the backend's file on a fixed wall-clock period. Once every actor is done,
//! sampling stops and both time series are rendered into a comparison chart.
//!
//! Individual write or sample failures are logged and counted, but never fail a run. Only an
//! invalid configuration or a failing reporter does, see [`OrchestrationError`].
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod actor;
pub mod config;
pub mod error;
pub mod observability;
pub mod sampler;
pub mod stresstest;
pub mod summary;

pub use crate::config::RunConfig;
pub use crate::error::{ConfigError, OrchestrationError, SampleError};
pub use crate::stresstest::{Backend, ChartReporter, Reporter, RunResult, Stresstest};
