//! Periodic size sampling of a monitored backend.

use std::sync::Arc;
use std::time::Duration;

use logstress_sink::SizeProbe;
use logstress_types::{Observation, TimeSeries};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::SampleError;

/// Reads the current size of a resource and stamps it relative to `t0`.
pub async fn sample_once(probe: &dyn SizeProbe, t0: Instant) -> Result<Observation, SampleError> {
    let size_bytes = probe.size().await?;
    Ok(Observation {
        elapsed_seconds: t0.elapsed().as_secs_f64(),
        size_bytes,
    })
}

/// The data a sampler collected until it was stopped.
#[derive(Debug, Default)]
pub struct SamplerReport {
    /// All successful observations.
    pub series: TimeSeries,
    /// Number of ticks on which the resource could not be read.
    pub failures: u64,
}

/// Samples one backend on a fixed wall-clock period until stopped.
///
/// The sampler exclusively owns its [`TimeSeries`] and hands it back when it finishes.
#[derive(Debug)]
pub(crate) struct Sampler {
    name: String,
    probe: Arc<dyn SizeProbe>,
    t0: Instant,
    period: Duration,
    stop: CancellationToken,
}

impl Sampler {
    pub(crate) fn new(
        name: impl Into<String>,
        probe: Arc<dyn SizeProbe>,
        t0: Instant,
        period: Duration,
        stop: CancellationToken,
    ) -> Self {
        Self {
            name: name.into(),
            probe,
            t0,
            period,
            stop,
        }
    }

    /// Runs until the stop token is cancelled.
    ///
    /// Ticks are anchored to `t0`, with the first one a full period after it. No observation
    /// is appended once the stop token has been cancelled, even if a read was in flight.
    pub(crate) async fn run(self) -> SamplerReport {
        let mut ticker = tokio::time::interval_at(self.t0 + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut report = SamplerReport::default();
        loop {
            let result = tokio::select! {
                biased;
                _ = self.stop.cancelled() => break,
                result = async {
                    ticker.tick().await;
                    sample_once(self.probe.as_ref(), self.t0).await
                } => result,
            };

            if self.stop.is_cancelled() {
                break;
            }

            match result {
                Ok(observation) => report.series.push(observation),
                Err(error) => {
                    report.failures += 1;
                    tracing::warn!(
                        backend = %self.name,
                        error = &error as &dyn std::error::Error,
                        "failed to sample size"
                    );
                }
            }
        }

        tracing::debug!(
            backend = %self.name,
            samples = report.series.len(),
            failures = report.failures,
            "sampler stopped"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use logstress_test::probe::ScriptedSize;

    use super::*;

    async fn run_for(
        probe: Arc<ScriptedSize>,
        period: Duration,
        duration: Duration,
    ) -> SamplerReport {
        let stop = CancellationToken::new();
        let t0 = Instant::now();
        let sampler = Sampler::new("test", probe, t0, period, stop.clone());

        let handle = tokio::spawn(sampler.run());
        tokio::time::sleep(duration).await;
        stop.cancel();
        handle.await.unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn samples_once_per_period() {
        let probe = Arc::new(ScriptedSize::new([Some(10), Some(20), Some(30)], Some(40)));
        let report = run_for(probe, Duration::from_secs(1), Duration::from_millis(3500)).await;

        let sizes: Vec<_> = report.series.iter().map(|o| o.size_bytes).collect();
        assert_eq!(sizes, [10, 20, 30]);
        let elapsed: Vec<_> = report.series.iter().map(|o| o.elapsed_seconds).collect();
        assert_eq!(elapsed, [1.0, 2.0, 3.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_tick_is_skipped() {
        let probe = Arc::new(ScriptedSize::new([None, Some(128)], Some(256)));
        let report = run_for(
            probe.clone(),
            Duration::from_secs(1),
            Duration::from_millis(2500),
        )
        .await;

        assert_eq!(probe.calls(), 2);
        assert_eq!(report.failures, 1);
        assert_eq!(report.series.len(), 1);
        assert_eq!(report.series.last().unwrap().size_bytes, 128);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_resource_yields_empty_series() {
        let probe = Arc::new(ScriptedSize::missing());
        let report = run_for(probe, Duration::from_millis(100), Duration::from_secs(1)).await;

        assert!(report.series.is_empty());
        assert!(report.failures >= 9);
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_recorded_after_stop() {
        let stop = CancellationToken::new();
        let probe = Arc::new(ScriptedSize::fixed(1));
        let sampler = Sampler::new(
            "test",
            probe.clone(),
            Instant::now(),
            Duration::from_secs(1),
            stop.clone(),
        );
        let handle = tokio::spawn(sampler.run());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        stop.cancel();
        // Cancelling twice is a no-op.
        stop.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;

        let report = handle.await.unwrap();
        assert_eq!(report.series.len(), 1);
        assert_eq!(probe.calls(), 1);
    }

    #[tokio::test]
    async fn sample_once_stamps_elapsed_time() {
        let t0 = Instant::now();
        let observation = sample_once(&ScriptedSize::fixed(99), t0).await.unwrap();
        assert_eq!(observation.size_bytes, 99);
        assert!(observation.elapsed_seconds >= 0.0);

        let error = sample_once(&ScriptedSize::missing(), t0).await.unwrap_err();
        assert!(matches!(error, SampleError::Unreadable(_)));
    }
}
