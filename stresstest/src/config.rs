//! Configuration of a stress run.
//!
//! [`Config`] is the YAML file format read by the `stresstest` binary. Every field has a default,
//! so an empty file (or no file at all) reproduces the reference scenario: a few thousand users
//! logging every three seconds into a JSON and a plain text backend.
//!
//! ```yaml
//! actors:
//!   min: 2000
//!   max: 8000
//! events_per_actor: 20
//! event_interval: 3s
//! sample_interval: 1s
//! message_size: 100
//! settle_delay: 2s
//! output: logFileSizeChart.html
//! backends:
//!   - name: pino
//!     format: json
//!     path: logs/pino-logfile.log
//!     buffer_size: 4KiB
//!   - name: winston
//!     format: text
//!     path: logs/winston-logfile.log
//! ```
//!
//! [`RunConfig`] is the validated subset that drives the orchestrator.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bytesize::ByteSize;
use logstress_sink::{FileSize, JsonSink, Sink, TextSink};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::stresstest::Backend;

/// Parameters of a single run. Immutable once the run starts.
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    /// Lower bound of the randomized actor count, inclusive.
    pub min_actors: u32,
    /// Upper bound of the randomized actor count, inclusive.
    pub max_actors: u32,
    /// Number of paired writes every actor emits before it is done.
    pub events_per_actor: u32,
    /// Period between two ticks of an actor. Zero means no delay between ticks.
    pub event_interval: Duration,
    /// Period between two size samples of each backend.
    pub sample_interval: Duration,
    /// Length of the random text appended to every message.
    pub message_size: usize,
    /// Extra wait after flushing the backends and before rendering the report.
    pub settle_delay: Duration,
    /// Seed for the actor count and message contents. Random if not set.
    pub seed: Option<u64>,
}

impl RunConfig {
    /// Checks the bounds of this configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (min, max) = (self.min_actors, self.max_actors);
        if min == 0 || max == 0 {
            return Err(ConfigError::NonPositiveActors { min, max });
        }
        if min > max {
            return Err(ConfigError::InvertedActors { min, max });
        }
        if self.events_per_actor == 0 {
            return Err(ConfigError::NoEvents);
        }
        if self.sample_interval.is_zero() {
            return Err(ConfigError::ZeroSampleInterval);
        }
        Ok(())
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            min_actors: 2000,
            max_actors: 8000,
            events_per_actor: 20,
            event_interval: Duration::from_secs(3),
            sample_interval: Duration::from_secs(1),
            message_size: 100,
            settle_delay: Duration::from_secs(2),
            seed: None,
        }
    }
}

/// The YAML configuration file of the `stresstest` binary.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bounds of the randomized actor count.
    pub actors: Actors,
    /// See [`RunConfig::events_per_actor`].
    pub events_per_actor: u32,
    /// See [`RunConfig::event_interval`].
    #[serde(with = "humantime_serde")]
    pub event_interval: Duration,
    /// See [`RunConfig::sample_interval`].
    #[serde(with = "humantime_serde")]
    pub sample_interval: Duration,
    /// See [`RunConfig::message_size`].
    pub message_size: usize,
    /// See [`RunConfig::settle_delay`].
    #[serde(with = "humantime_serde")]
    pub settle_delay: Duration,
    /// See [`RunConfig::seed`].
    pub seed: Option<u64>,

    /// Path of the comparison chart. The extension selects the format.
    pub output: PathBuf,

    /// The two logging backends to compare.
    pub backends: [BackendConfig; 2],
}

impl Config {
    /// Extracts the parameters for the orchestrator.
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            min_actors: self.actors.min,
            max_actors: self.actors.max,
            events_per_actor: self.events_per_actor,
            event_interval: self.event_interval,
            sample_interval: self.sample_interval,
            message_size: self.message_size,
            settle_delay: self.settle_delay,
            seed: self.seed,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let defaults = RunConfig::default();
        Self {
            actors: Actors {
                min: defaults.min_actors,
                max: defaults.max_actors,
            },
            events_per_actor: defaults.events_per_actor,
            event_interval: defaults.event_interval,
            sample_interval: defaults.sample_interval,
            message_size: defaults.message_size,
            settle_delay: defaults.settle_delay,
            seed: defaults.seed,
            output: PathBuf::from("logFileSizeChart.html"),
            backends: [
                BackendConfig {
                    name: "pino".into(),
                    sink: SinkConfig::Json {
                        path: PathBuf::from("logs/pino-logfile.log"),
                        buffer_size: default_buffer_size(),
                    },
                },
                BackendConfig {
                    name: "winston".into(),
                    sink: SinkConfig::Text {
                        path: PathBuf::from("logs/winston-logfile.log"),
                        mirror_stderr: false,
                    },
                },
            ],
        }
    }
}

/// Inclusive range of the actor count.
#[derive(Debug, Deserialize)]
pub struct Actors {
    /// Lower bound.
    pub min: u32,
    /// Upper bound.
    pub max: u32,
}

/// A named logging backend.
#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    /// Display name used in logs and the chart legend.
    pub name: String,
    /// Which sink to write through.
    #[serde(flatten)]
    pub sink: SinkConfig,
}

/// The logging backend and the file it appends to.
#[derive(Debug, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum SinkConfig {
    /// Newline-delimited JSON through a write buffer.
    Json {
        /// Log file path.
        path: PathBuf,
        /// Size of the write buffer. Defaults to 4KiB.
        #[serde(default = "default_buffer_size")]
        buffer_size: ByteSize,
    },
    /// Plain text lines written straight to the file.
    Text {
        /// Log file path.
        path: PathBuf,
        /// Also print every message to stderr.
        #[serde(default)]
        mirror_stderr: bool,
    },
}

fn default_buffer_size() -> ByteSize {
    ByteSize::kib(4)
}

impl SinkConfig {
    /// The file the backend appends to.
    pub fn path(&self) -> &Path {
        match self {
            Self::Json { path, .. } | Self::Text { path, .. } => path,
        }
    }
}

/// Converts a configured buffer size into an in-memory capacity.
fn buffer_capacity(size: ByteSize) -> io::Result<usize> {
    usize::try_from(size.as_u64()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("buffer size {size} exceeds addressable memory"),
        )
    })
}

impl BackendConfig {
    /// Opens the configured sink and a size probe on its file.
    pub async fn open(&self) -> io::Result<Backend> {
        let sink: Arc<dyn Sink> = match &self.sink {
            SinkConfig::Json { path, buffer_size } => {
                Arc::new(JsonSink::open(path, buffer_capacity(*buffer_size)?).await?)
            }
            SinkConfig::Text {
                path,
                mirror_stderr,
            } => Arc::new(TextSink::open(path).await?.mirror_stderr(*mirror_stderr)),
        };
        let probe = Arc::new(FileSize::new(self.sink.path()));

        Ok(Backend::new(self.name.clone(), sink, probe))
    }
}
