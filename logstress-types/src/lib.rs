//! Shared data model for the log stress harness.
//!
//! A run produces one [`TimeSeries`] per monitored logging backend. Each series is a sequence of
//! [`Observation`]s, recorded by a single sampler in wall-clock order.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

use std::slice;

use serde::{Deserialize, Serialize};

/// The size of a monitored resource at one point in time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Seconds elapsed since the start of the run.
    pub elapsed_seconds: f64,
    /// Size of the resource in bytes.
    pub size_bytes: u64,
}

/// Ordered observations of a single monitored resource.
///
/// Observations are only ever appended. Since they are recorded by one sampler on a periodic
/// clock, `elapsed_seconds` is non-decreasing in insertion order. Observations are stored exactly
/// as recorded.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeSeries {
    observations: Vec<Observation>,
}

impl TimeSeries {
    /// Creates an empty series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an observation to the end of the series.
    ///
    /// The observation must not be older than the last one.
    pub fn push(&mut self, observation: Observation) {
        debug_assert!(
            self.observations
                .last()
                .is_none_or(|last| last.elapsed_seconds <= observation.elapsed_seconds),
            "observation at {}s recorded out of order",
            observation.elapsed_seconds
        );
        self.observations.push(observation);
    }

    /// Returns the number of recorded observations.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Returns the most recent observation.
    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    /// Iterates over the observations in recording order.
    pub fn iter(&self) -> slice::Iter<'_, Observation> {
        self.observations.iter()
    }

    /// Returns the largest recorded size, or `0` for an empty series.
    pub fn max_size(&self) -> u64 {
        self.iter().map(|o| o.size_bytes).max().unwrap_or(0)
    }

    /// Returns the elapsed time of the last observation, or `0.0` for an empty series.
    pub fn duration(&self) -> f64 {
        self.last().map_or(0.0, |o| o.elapsed_seconds)
    }
}

impl<'a> IntoIterator for &'a TimeSeries {
    type Item = &'a Observation;
    type IntoIter = slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Observation> for TimeSeries {
    fn from_iter<T: IntoIterator<Item = Observation>>(iter: T) -> Self {
        let mut series = Self::new();
        for observation in iter {
            series.push(observation);
        }
        series
    }
}

/// A [`TimeSeries`] together with the name of the backend it was sampled from.
#[derive(Clone, Copy, Debug)]
pub struct LabeledSeries<'a> {
    /// Display name of the backend, e.g. `"pino"`.
    pub label: &'a str,
    /// The recorded observations.
    pub series: &'a TimeSeries,
}

impl<'a> LabeledSeries<'a> {
    /// Pairs a series with its label.
    pub fn new(label: &'a str, series: &'a TimeSeries) -> Self {
        Self { label, series }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(elapsed_seconds: f64, size_bytes: u64) -> Observation {
        Observation {
            elapsed_seconds,
            size_bytes,
        }
    }

    #[test]
    fn push_stores_observations_as_recorded() {
        let mut series = TimeSeries::new();
        series.push(obs(1.0, 10));
        series.push(obs(1.0, 20));
        series.push(obs(2.25, 30));

        assert_eq!(
            series.iter().copied().collect::<Vec<_>>(),
            [obs(1.0, 10), obs(1.0, 20), obs(2.25, 30)]
        );
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "out of order")]
    fn push_rejects_older_observation() {
        let mut series = TimeSeries::new();
        series.push(obs(1.0, 10));
        series.push(obs(0.5, 20));
    }

    #[test]
    fn empty_series_summaries() {
        let series = TimeSeries::new();
        assert!(series.is_empty());
        assert_eq!(series.max_size(), 0);
        assert_eq!(series.duration(), 0.0);
    }

    #[test]
    fn serializes_as_plain_array() {
        let series: TimeSeries = [obs(1.0, 100), obs(2.0, 250)].into_iter().collect();
        let json = serde_json::to_string(&series).unwrap();
        assert_eq!(
            json,
            r#"[{"elapsed_seconds":1.0,"size_bytes":100},{"elapsed_seconds":2.0,"size_bytes":250}]"#
        );
    }
}
