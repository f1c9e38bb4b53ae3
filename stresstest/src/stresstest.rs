//! Run simulated users against two logging backends while sampling their growth.
//!
//! A run draws a random actor count, spawns one [`ActorTask`] per actor and one [`Sampler`] per
//! backend, waits until every actor reached a terminal state, stops the samplers and hands both
//! frozen series to a [`Reporter`].
//!
//! Actors and samplers share no state. Each sampler exclusively owns its series until it is
//! stopped, so no synchronization beyond the stop token is required. The sinks themselves are
//! shared by all actors and serialize concurrent writes internally.
//!
//! There is no overall timeout. An actor whose sink never returns from a write keeps the run
//! from completing. Cancelling the token passed to [`Stresstest::with_shutdown`] resolves every
//! actor, including one stuck inside a write, so an aborted run always completes.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use logstress_report::RenderError;
use logstress_sink::{SizeProbe, Sink};
use logstress_types::{LabeledSeries, TimeSeries};
use rand::SeedableRng;
use rand::distr::{Distribution, Uniform};
use rand::rngs::SmallRng;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::actor::{ActorOutcome, ActorReport, ActorTask};
use crate::config::RunConfig;
use crate::error::{ConfigError, OrchestrationError};
use crate::sampler::{Sampler, SamplerReport};

const PROGRESS_TEMPLATE: &str = "{spinner} {msg} {wide_bar} {pos}/{len} {elapsed}";

/// A logging backend under test: a sink to write through and a probe to measure its output.
#[derive(Clone, Debug)]
pub struct Backend {
    /// Display name used in logs and reports.
    pub name: String,
    /// Write entry point, shared by all actors.
    pub sink: Arc<dyn Sink>,
    /// Measures the size of the sink's persisted output.
    pub probe: Arc<dyn SizeProbe>,
}

impl Backend {
    /// Creates a new backend.
    pub fn new(name: impl Into<String>, sink: Arc<dyn Sink>, probe: Arc<dyn SizeProbe>) -> Self {
        Self {
            name: name.into(),
            sink,
            probe,
        }
    }
}

/// Renders the series of a finished run.
#[async_trait::async_trait]
pub trait Reporter: fmt::Debug + Send + Sync {
    /// Renders both series into an artifact at `output`.
    async fn render(
        &self,
        a: LabeledSeries<'_>,
        b: LabeledSeries<'_>,
        output: &Path,
    ) -> Result<(), RenderError>;
}

/// Renders comparison charts with [`logstress_report::render`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ChartReporter;

#[async_trait::async_trait]
impl Reporter for ChartReporter {
    async fn render(
        &self,
        a: LabeledSeries<'_>,
        b: LabeledSeries<'_>,
        output: &Path,
    ) -> Result<(), RenderError> {
        logstress_report::render(a, b, output).await
    }
}

/// Per-backend outcome of a run.
#[derive(Clone, Debug)]
pub struct BackendRun {
    /// Name of the backend.
    pub name: String,
    /// Observed sizes, frozen when sampling stopped.
    pub series: TimeSeries,
    /// Writes that the sink rejected.
    pub write_failures: u64,
    /// Sampler ticks that could not read the size.
    pub sample_failures: u64,
    /// Whether the final flush succeeded.
    pub flushed: bool,
}

/// How the actors of a run finished.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActorTally {
    /// Actors that emitted their full quota.
    pub completed: u32,
    /// Actors stopped by the shutdown token.
    pub aborted: u32,
    /// Actors whose task panicked.
    pub failed: u32,
}

impl ActorTally {
    fn count(reports: &[ActorReport]) -> Self {
        let mut tally = Self::default();
        for report in reports {
            match report.outcome {
                ActorOutcome::Completed => tally.completed += 1,
                ActorOutcome::Aborted => tally.aborted += 1,
                ActorOutcome::Failed => tally.failed += 1,
            }
        }
        tally
    }
}

/// The outcome of a completed run.
#[derive(Clone, Debug)]
pub struct RunResult {
    /// Number of actors drawn for this run.
    pub actor_count: u32,
    /// `actor_count × events_per_actor`, the number of writes each backend should receive.
    pub total_writes_expected: u64,
    /// Seconds from the start of the run until all actors finished and sampling stopped.
    pub elapsed_seconds: f64,
    /// Seconds from the start of the run until the samplers were told to stop.
    ///
    /// Every recorded observation is stamped at or before this point.
    pub sampling_stopped_at: f64,
    /// How the actors finished.
    pub actors: ActorTally,
    /// Results per backend, in the order they were passed to [`Stresstest::new`].
    pub backends: [BackendRun; 2],
}

impl RunResult {
    /// The series of the first backend.
    pub fn series_a(&self) -> &TimeSeries {
        &self.backends[0].series
    }

    /// The series of the second backend.
    pub fn series_b(&self) -> &TimeSeries {
        &self.backends[1].series
    }

    /// Both series paired with their backend names.
    pub fn labeled(&self) -> [LabeledSeries<'_>; 2] {
        self.backends
            .each_ref()
            .map(|backend| LabeledSeries::new(&backend.name, &backend.series))
    }
}

/// Draws the number of actors uniformly from `min_actors..=max_actors`.
pub fn draw_actor_count(config: &RunConfig, rng: &mut SmallRng) -> Result<u32, ConfigError> {
    config.validate()?;
    let distribution = Uniform::new_inclusive(config.min_actors, config.max_actors)?;
    Ok(distribution.sample(rng))
}

/// A configured stress run.
#[derive(Debug)]
pub struct Stresstest {
    config: RunConfig,
    backends: Arc<[Backend; 2]>,
    shutdown: CancellationToken,
    progress: bool,
}

impl Stresstest {
    /// Creates a run writing to both backends.
    pub fn new(config: RunConfig, backends: [Backend; 2]) -> Self {
        Self {
            config,
            backends: Arc::new(backends),
            shutdown: CancellationToken::new(),
            progress: false,
        }
    }

    /// Aborts all pending actors once `shutdown` is cancelled.
    ///
    /// Aborted actors resolve immediately, so the run still completes and reports what was
    /// collected up to that point.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Shows a progress bar of finished actors on stderr.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    fn progress_bar(&self, actor_count: u32) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }

        let mut bar =
            ProgressBar::new(u64::from(actor_count)).with_message("Running stresstest:");
        if let Ok(style) = ProgressStyle::with_template(PROGRESS_TEMPLATE) {
            bar = bar.with_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    }

    /// Runs the stress test and renders the collected series to `output`.
    ///
    /// Fails before starting anything if the configuration is invalid. If rendering fails, the
    /// full [`RunResult`] is returned inside [`OrchestrationError::Render`].
    pub async fn run<R>(
        self,
        reporter: &R,
        output: &Path,
    ) -> Result<RunResult, OrchestrationError>
    where
        R: Reporter + ?Sized,
    {
        let result = self.execute().await?;

        let [a, b] = result.labeled();
        let rendered = reporter.render(a, b, output).await;
        if let Err(source) = rendered {
            return Err(OrchestrationError::Render {
                result: Box::new(result),
                source,
            });
        }

        tracing::info!(output = %output.display(), "report rendered");
        Ok(result)
    }

    /// Runs the stress test without rendering a report.
    pub async fn execute(self) -> Result<RunResult, ConfigError> {
        let config = &self.config;
        let seed = config.seed.unwrap_or_else(rand::random);
        let actor_count = draw_actor_count(config, &mut SmallRng::seed_from_u64(seed))?;
        let total_writes_expected = u64::from(actor_count) * u64::from(config.events_per_actor);

        tracing::info!(
            actor_count,
            events_per_actor = config.events_per_actor,
            seed,
            "starting stresstest"
        );
        let t0 = Instant::now();

        let stop = CancellationToken::new();
        let [sampler_a, sampler_b] = self.backends.each_ref().map(|backend| {
            let sampler = Sampler::new(
                backend.name.clone(),
                Arc::clone(&backend.probe),
                t0,
                config.sample_interval,
                stop.clone(),
            );
            tokio::spawn(sampler.run())
        });

        let bar = self.progress_bar(actor_count);
        let handles: Vec<_> = (0..actor_count)
            .map(|id| {
                let actor = ActorTask::new(
                    id,
                    config.events_per_actor,
                    config.event_interval,
                    Arc::clone(&self.backends),
                    self.shutdown.clone(),
                )
                .with_payload(config.message_size, seed);
                (id, tokio::spawn(actor.run()))
            })
            .collect();

        let reports = futures::future::join_all(handles.into_iter().map(|(id, handle)| {
            let bar = &bar;
            async move {
                let report = handle.await.unwrap_or_else(|error| {
                    tracing::error!(
                        actor = id,
                        error = &error as &dyn std::error::Error,
                        "actor task failed"
                    );
                    ActorReport::failed(id)
                });
                bar.inc(1);
                report
            }
        }))
        .await;
        bar.finish_and_clear();

        // Stop first, then take the timestamp: any observation stamped later sees the stop.
        stop.cancel();
        let sampling_stopped_at = t0.elapsed().as_secs_f64();
        let sampled = [join_sampler(sampler_a).await, join_sampler(sampler_b).await];
        let elapsed_seconds = t0.elapsed().as_secs_f64();

        let actors = ActorTally::count(&reports);
        tracing::info!(
            actor_count,
            total_writes_expected,
            completed = actors.completed,
            aborted = actors.aborted,
            failed = actors.failed,
            elapsed_seconds,
            "stresstest completed"
        );

        let mut flushed = [true; 2];
        for (backend, flushed) in self.backends.iter().zip(&mut flushed) {
            // Once aborted, a flush gets one settle delay to finish before it is abandoned.
            let abandon = async {
                self.shutdown.cancelled().await;
                tokio::time::sleep(config.settle_delay).await;
            };
            let result = tokio::select! {
                biased;
                result = backend.sink.flush() => result,
                _ = abandon => {
                    *flushed = false;
                    tracing::warn!(backend = %backend.name, "flush abandoned after shutdown");
                    continue;
                }
            };

            if let Err(error) = result {
                *flushed = false;
                tracing::warn!(
                    backend = %backend.name,
                    sink = backend.sink.name(),
                    error = &error as &dyn std::error::Error,
                    "failed to flush backend"
                );
            }
        }

        // Flushing covers our own buffers. The settle delay is a courtesy for anything the
        // backend does asynchronously after that; file sizes may still grow past this point.
        if !config.settle_delay.is_zero() {
            tokio::time::sleep(config.settle_delay).await;
        }

        let [sampled_a, sampled_b] = sampled;
        let backends = [
            backend_run(&self.backends[0], 0, sampled_a, &reports, flushed[0]),
            backend_run(&self.backends[1], 1, sampled_b, &reports, flushed[1]),
        ];

        Ok(RunResult {
            actor_count,
            total_writes_expected,
            elapsed_seconds,
            sampling_stopped_at,
            actors,
            backends,
        })
    }
}

fn backend_run(
    backend: &Backend,
    index: usize,
    sampled: SamplerReport,
    reports: &[ActorReport],
    flushed: bool,
) -> BackendRun {
    BackendRun {
        name: backend.name.clone(),
        series: sampled.series,
        write_failures: reports.iter().map(|r| r.write_failures[index]).sum(),
        sample_failures: sampled.failures,
        flushed,
    }
}

async fn join_sampler(handle: JoinHandle<SamplerReport>) -> SamplerReport {
    handle.await.unwrap_or_else(|error| {
        tracing::error!(
            error = &error as &dyn std::error::Error,
            "sampler task failed"
        );
        SamplerReport::default()
    })
}
