//! A simulated user emitting a fixed number of log events to both backends.
//!
//! Every actor runs as its own task on a local timer. On each tick it writes one message to each
//! backend, in order, and stops after `events_per_actor` ticks. Write failures are logged and
//! counted but never stop the actor, so every actor reaches a terminal state.

use std::sync::Arc;
use std::time::Duration;

use rand::distr::Alphanumeric;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tokio::time::{Instant, Interval};
use tokio_util::sync::CancellationToken;

use crate::stresstest::Backend;

/// Progress of an actor towards its quota.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ActorState {
    /// The actor has completed the given number of ticks.
    Running(u32),
    /// The actor emitted its full quota.
    Done,
}

impl ActorState {
    /// Transitions after one more tick was emitted.
    ///
    /// Reaching `quota` ticks is terminal.
    pub(crate) fn advance(self, quota: u32) -> Self {
        match self {
            Self::Running(ticks) if ticks + 1 >= quota => Self::Done,
            Self::Running(ticks) => Self::Running(ticks + 1),
            Self::Done => Self::Done,
        }
    }
}

/// How an actor finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActorOutcome {
    /// All ticks were emitted.
    Completed,
    /// The run was aborted before the quota was reached.
    Aborted,
    /// The actor task panicked.
    Failed,
}

/// Result of a single actor.
#[derive(Clone, Debug)]
pub struct ActorReport {
    /// Actor id in `0..actor_count`.
    pub id: u32,
    /// Number of ticks that were emitted.
    pub ticks: u32,
    /// Failed writes per backend.
    pub write_failures: [u64; 2],
    /// How the actor finished.
    pub outcome: ActorOutcome,
}

impl ActorReport {
    /// Report for an actor whose task died without reporting back.
    pub(crate) fn failed(id: u32) -> Self {
        Self {
            id,
            ticks: 0,
            write_failures: [0; 2],
            outcome: ActorOutcome::Failed,
        }
    }
}

/// One simulated user.
#[derive(Debug)]
pub(crate) struct ActorTask {
    id: u32,
    events: u32,
    interval: Duration,
    message_size: usize,
    rng: SmallRng,
    backends: Arc<[Backend; 2]>,
    shutdown: CancellationToken,
}

impl ActorTask {
    pub(crate) fn new(
        id: u32,
        events: u32,
        interval: Duration,
        backends: Arc<[Backend; 2]>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            id,
            events,
            interval,
            message_size: 0,
            rng: SmallRng::seed_from_u64(u64::from(id)),
            backends,
            shutdown,
        }
    }

    /// Appends `message_size` random characters generated from `seed` to every message.
    pub(crate) fn with_payload(mut self, message_size: usize, seed: u64) -> Self {
        self.message_size = message_size;
        self.rng = SmallRng::seed_from_u64(seed ^ u64::from(self.id));
        self
    }

    fn message(&mut self, tick: u32) -> String {
        let mut message = format!(
            "User {}: Log entry #{tick} with random text of length {}",
            self.id, self.message_size
        );
        if self.message_size > 0 {
            message.push_str(": ");
            message.extend(
                (&mut self.rng)
                    .sample_iter(Alphanumeric)
                    .take(self.message_size)
                    .map(char::from),
            );
        }
        message
    }

    /// Waits for the next tick. Returns `false` if the run was aborted instead.
    async fn next_tick(&self, ticker: &mut Option<Interval>) -> bool {
        match ticker {
            Some(ticker) => tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => false,
                _ = ticker.tick() => true,
            },
            None => {
                tokio::task::yield_now().await;
                !self.shutdown.is_cancelled()
            }
        }
    }

    /// Emits ticks until the quota is reached or the run is aborted.
    pub(crate) async fn run(mut self) -> ActorReport {
        // The first tick fires one full interval after launch.
        let mut ticker = (!self.interval.is_zero())
            .then(|| tokio::time::interval_at(Instant::now() + self.interval, self.interval));

        let mut state = ActorState::Running(0);
        let mut write_failures = [0u64; 2];

        while let ActorState::Running(ticks) = state {
            if !self.next_tick(&mut ticker).await {
                tracing::debug!(actor = self.id, ticks, "actor aborted");
                return ActorReport {
                    id: self.id,
                    ticks,
                    write_failures,
                    outcome: ActorOutcome::Aborted,
                };
            }

            let tick = ticks + 1;
            let message = self.message(tick);
            for (index, backend) in self.backends.iter().enumerate() {
                // A sink that never returns must not keep an aborted run alive.
                let result = tokio::select! {
                    biased;
                    _ = self.shutdown.cancelled() => None,
                    result = backend.sink.write(&message) => Some(result),
                };

                let Some(result) = result else {
                    tracing::debug!(actor = self.id, ticks, "actor aborted during write");
                    return ActorReport {
                        id: self.id,
                        ticks,
                        write_failures,
                        outcome: ActorOutcome::Aborted,
                    };
                };

                if let Err(error) = result {
                    write_failures[index] += 1;
                    tracing::warn!(
                        actor = self.id,
                        tick,
                        backend = %backend.name,
                        sink = backend.sink.name(),
                        error = &error as &dyn std::error::Error,
                        "write failed"
                    );
                }
            }

            state = state.advance(self.events);
        }

        tracing::debug!(actor = self.id, "actor done");
        ActorReport {
            id: self.id,
            ticks: self.events,
            write_failures,
            outcome: ActorOutcome::Completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use logstress_test::probe::ScriptedSize;
    use logstress_test::sink::RecordingSink;

    use super::*;

    fn backends(a: Arc<RecordingSink>, b: Arc<RecordingSink>) -> Arc<[Backend; 2]> {
        Arc::new([
            Backend::new("a", a, Arc::new(ScriptedSize::missing())),
            Backend::new("b", b, Arc::new(ScriptedSize::missing())),
        ])
    }

    #[test]
    fn state_reaches_done_exactly_at_quota() {
        let mut state = ActorState::Running(0);
        state = state.advance(3);
        assert_eq!(state, ActorState::Running(1));
        state = state.advance(3);
        assert_eq!(state, ActorState::Running(2));
        state = state.advance(3);
        assert_eq!(state, ActorState::Done);
        assert_eq!(state.advance(3), ActorState::Done);
    }

    #[tokio::test]
    async fn writes_in_tick_order_without_delay() {
        let (a, b) = (Arc::new(RecordingSink::new()), Arc::new(RecordingSink::new()));
        let actor = ActorTask::new(
            7,
            3,
            Duration::ZERO,
            backends(a.clone(), b.clone()),
            CancellationToken::new(),
        );

        let report = actor.run().await;
        assert_eq!(report.outcome, ActorOutcome::Completed);
        assert_eq!(report.ticks, 3);

        let expected: Vec<_> = (1..=3)
            .map(|tick| format!("User 7: Log entry #{tick} with random text of length 0"))
            .collect();
        assert_eq!(a.messages(), expected);
        assert_eq!(b.messages(), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_on_interval() {
        let (a, b) = (Arc::new(RecordingSink::new()), Arc::new(RecordingSink::new()));
        let actor = ActorTask::new(
            0,
            4,
            Duration::from_millis(500),
            backends(a.clone(), b.clone()),
            CancellationToken::new(),
        );

        let start = Instant::now();
        actor.run().await;
        assert_eq!(start.elapsed(), Duration::from_millis(2000));
        assert_eq!(a.len(), 4);
    }

    #[tokio::test]
    async fn failed_write_does_not_block_other_backend() {
        let a = Arc::new(RecordingSink::new().fail_matching("#2 "));
        let b = Arc::new(RecordingSink::new());
        let actor = ActorTask::new(
            1,
            3,
            Duration::ZERO,
            backends(a.clone(), b.clone()),
            CancellationToken::new(),
        );

        let report = actor.run().await;
        assert_eq!(report.outcome, ActorOutcome::Completed);
        assert_eq!(report.write_failures, [1, 0]);
        assert_eq!(a.attempts(), 3);
        assert_eq!(a.len(), 2);
        assert_eq!(b.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn abort_resolves_pending_actor() {
        let (a, b) = (Arc::new(RecordingSink::new()), Arc::new(RecordingSink::new()));
        let shutdown = CancellationToken::new();
        let actor = ActorTask::new(
            0,
            10,
            Duration::from_secs(1),
            backends(a.clone(), b),
            shutdown.clone(),
        );

        let handle = tokio::spawn(actor.run());
        tokio::time::sleep(Duration::from_millis(2500)).await;
        shutdown.cancel();

        let report = handle.await.unwrap();
        assert_eq!(report.outcome, ActorOutcome::Aborted);
        assert_eq!(report.ticks, 2);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn payload_has_requested_length() {
        let actor = ActorTask::new(
            3,
            1,
            Duration::ZERO,
            backends(Arc::new(RecordingSink::new()), Arc::new(RecordingSink::new())),
            CancellationToken::new(),
        );
        let mut actor = actor.with_payload(100, 42);

        let message = actor.message(1);
        let (prefix, text) = message.rsplit_once(": ").unwrap();
        assert_eq!(prefix, "User 3: Log entry #1 with random text of length 100");
        assert_eq!(text.len(), 100);
        assert!(text.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
