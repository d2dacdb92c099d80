//! Indicator snapshots: the read-only view of indicator state for one bar.
//!
//! A snapshot is produced once per closed bar and never changes afterwards.
//! Each named series is stored most-recent-first: offset 0 is the bar that
//! just closed, offset 1 the bar before it, and so on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Series name under which snapshots carry the bar close itself.
pub const CLOSE: &str = "close";

/// Errors raised when a rule asks for indicator history the snapshot lacks.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SnapshotError {
    #[error("indicator '{0}' is not in the snapshot")]
    UnknownIndicator(String),

    #[error("indicator '{indicator}' has {available} values, offset {offset} requested")]
    InsufficientHistory {
        indicator: String,
        offset: usize,
        available: usize,
    },

    #[error("indicator '{indicator}' is not yet valid at offset {offset}")]
    NotReady { indicator: String, offset: usize },
}

/// Source of indicator values for one evaluation cycle.
///
/// The engine only reads through this trait, so a host platform can plug in
/// its own indicator objects without copying them into an [`IndicatorSnapshot`].
pub trait SnapshotProvider {
    /// Value of `indicator` at `offset` bars back (0 = current bar).
    fn history(&self, indicator: &str, offset: usize) -> Result<f64, SnapshotError>;

    /// Value of `indicator` on the current bar.
    fn latest(&self, indicator: &str) -> Result<f64, SnapshotError> {
        self.history(indicator, 0)
    }
}

/// Immutable per-bar container of indicator histories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    series: BTreeMap<String, Vec<f64>>,
}

impl IndicatorSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a named series, most-recent value first.
    pub fn insert(&mut self, name: impl Into<String>, most_recent_first: Vec<f64>) {
        self.series.insert(name.into(), most_recent_first);
    }

    /// Builder form of [`IndicatorSnapshot::insert`].
    pub fn with(mut self, name: impl Into<String>, most_recent_first: Vec<f64>) -> Self {
        self.insert(name, most_recent_first);
        self
    }

    /// Number of values held for `name` (0 when absent).
    pub fn depth(&self, name: &str) -> usize {
        self.series.get(name).map_or(0, Vec::len)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl SnapshotProvider for IndicatorSnapshot {
    fn history(&self, indicator: &str, offset: usize) -> Result<f64, SnapshotError> {
        let values = self
            .series
            .get(indicator)
            .ok_or_else(|| SnapshotError::UnknownIndicator(indicator.to_string()))?;

        let value = values
            .get(offset)
            .copied()
            .ok_or_else(|| SnapshotError::InsufficientHistory {
                indicator: indicator.to_string(),
                offset,
                available: values.len(),
            })?;

        if value.is_nan() {
            return Err(SnapshotError::NotReady {
                indicator: indicator.to_string(),
                offset,
            });
        }
        Ok(value)
    }
}
