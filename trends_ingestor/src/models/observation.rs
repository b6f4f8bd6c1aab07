//! Canonical in-memory representation of a relative-interest time series.
//!
//! [`Observation`] is the standard output of all
//! [`TrendsProvider`](crate::providers::TrendsProvider) implementations, and
//! [`SeriesData`] is what the sinks read and write.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// Maximum number of data rows retained per series. The downstream charting
/// platform rejects files with more rows, so the merge drops the oldest
/// observations beyond this cap.
pub const MAX_ROWS: usize = 6000;

/// A single (timestamp, score) data point.
///
/// The score is a relative-interest value in `[0, 100]`, or `None` when the
/// upstream reported no data for that point. Missing points stay missing;
/// they are never turned into zeros.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// The timestamp for this point (UTC, daily or coarser granularity).
    pub time: DateTime<Utc>,

    /// Relative interest in `[0, 100]`, or `None` if the upstream had no data.
    pub score: Option<f64>,
}

/// The full dataset for one series: observations ordered by strictly
/// ascending timestamp, with no duplicates, capped at [`MAX_ROWS`].
///
/// The only way to mutate a `SeriesData` is through [`SeriesData::merge`],
/// which maintains all three invariants.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesData {
    points: Vec<Observation>,
}

impl SeriesData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a dataset from arbitrary observations, sorting, de-duplicating
    /// (later entries win) and capping in the process.
    pub fn from_observations(observations: impl IntoIterator<Item = Observation>) -> Self {
        let incoming: Vec<Observation> = observations.into_iter().collect();
        let mut data = Self::new();
        data.merge(&incoming);
        data
    }

    /// Merges freshly fetched observations into this dataset.
    ///
    /// An incoming observation at an already-present timestamp replaces the
    /// stored one (the new response wins). The result is re-sorted and
    /// truncated to the newest [`MAX_ROWS`] points.
    pub fn merge(&mut self, incoming: &[Observation]) {
        let mut merged: BTreeMap<DateTime<Utc>, Option<f64>> =
            self.points.iter().map(|o| (o.time, o.score)).collect();
        for obs in incoming {
            merged.insert(obs.time, obs.score);
        }

        let dropped = merged.len().saturating_sub(MAX_ROWS);
        self.points = merged
            .into_iter()
            .skip(dropped)
            .map(|(time, score)| Observation { time, score })
            .collect();
    }

    pub fn points(&self) -> &[Observation] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The newest observation, if any.
    pub fn last(&self) -> Option<&Observation> {
        self.points.last()
    }
}
