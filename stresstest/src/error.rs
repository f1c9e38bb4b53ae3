//! Errors of a stress run: invalid configuration, failed samples, and orchestration failures.

use thiserror::Error;

use crate::stresstest::RunResult;

/// An invalid [`RunConfig`](crate::config::RunConfig).
///
/// Configuration errors are detected before any actor or sampler is launched.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One of the actor bounds is zero.
    #[error("actor bounds must be positive, got {min}..={max}")]
    NonPositiveActors {
        /// Configured lower bound.
        min: u32,
        /// Configured upper bound.
        max: u32,
    },

    /// The lower actor bound exceeds the upper one.
    #[error("min_actors ({min}) exceeds max_actors ({max})")]
    InvertedActors {
        /// Configured lower bound.
        min: u32,
        /// Configured upper bound.
        max: u32,
    },

    /// Actors would not emit anything.
    #[error("events_per_actor must be positive")]
    NoEvents,

    /// Samplers need a non-zero period.
    #[error("sample_interval must be positive")]
    ZeroSampleInterval,

    /// The actor count could not be drawn from the configured range.
    #[error("failed to draw actor count: {0}")]
    ActorCount(#[from] rand::distr::uniform::Error),
}

/// A sampler tick could not read the size of its monitored resource.
///
/// Sample errors are logged and skipped; they never fail a run.
#[derive(Debug, Error)]
pub enum SampleError {
    /// Reading the size failed, most commonly because the resource does not exist yet.
    #[error("resource unreadable: {0}")]
    Unreadable(#[from] std::io::Error),
}

/// Errors that fail a stress run as a whole.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// The run configuration is invalid. Nothing was started.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The run completed, but rendering the report failed.
    ///
    /// The collected data is still available in `result`.
    #[error("failed to render report")]
    Render {
        /// The complete result of the run.
        result: Box<RunResult>,
        /// The error returned by the reporter.
        #[source]
        source: logstress_report::RenderError,
    },
}
