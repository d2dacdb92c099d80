//! EMA computed on a coarser timeframe than the bar series.
//!
//! Bars are grouped into timeframe buckets by open time. Each finished bucket
//! commits its last close to the EMA; the value reported for a bar is the EMA
//! as it would stand with the still-forming bucket closing at that bar's
//! close, the way a chart shows the latest value of a higher-timeframe series.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ema::EmaState;
use super::Indicator;
use crate::domain::Bar;

/// Aggregation period for the trend EMA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    /// Same as the bar series, no aggregation.
    Bar,
    Minute15,
    Minute30,
    #[default]
    Hour,
    Hour4,
    Day,
}

impl Timeframe {
    /// Bucket length in seconds, `None` for [`Timeframe::Bar`].
    pub fn seconds(&self) -> Option<i64> {
        match self {
            Timeframe::Bar => None,
            Timeframe::Minute15 => Some(15 * 60),
            Timeframe::Minute30 => Some(30 * 60),
            Timeframe::Hour => Some(3600),
            Timeframe::Hour4 => Some(4 * 3600),
            Timeframe::Day => Some(86_400),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Timeframe::Bar => "bar",
            Timeframe::Minute15 => "minute15",
            Timeframe::Minute30 => "minute30",
            Timeframe::Hour => "hour",
            Timeframe::Hour4 => "hour4",
            Timeframe::Day => "day",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct HigherTimeframeEma {
    period: usize,
    timeframe: Timeframe,
    name: String,
    committed: EmaState,
    bucket: Option<i64>,
    bucket_close: f64,
}

impl HigherTimeframeEma {
    pub fn new(period: usize, timeframe: Timeframe) -> Self {
        Self {
            period,
            timeframe,
            name: Self::key(period, timeframe),
            committed: EmaState::new(period),
            bucket: None,
            bucket_close: f64::NAN,
        }
    }

    /// Snapshot key: `ema_50_hour`, or plain `ema_50` on the bar timeframe.
    pub fn key(period: usize, timeframe: Timeframe) -> String {
        match timeframe {
            Timeframe::Bar => format!("ema_{period}"),
            tf => format!("ema_{period}_{tf}"),
        }
    }
}

impl Indicator for HigherTimeframeEma {
    fn name(&self) -> &str {
        &self.name
    }

    /// Counted in timeframe buckets, not bars.
    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn update(&mut self, bar: &Bar) -> f64 {
        let Some(seconds) = self.timeframe.seconds() else {
            return self.committed.push(bar.close);
        };
        let bucket = bar.open_time.timestamp().div_euclid(seconds);
        if self.bucket != Some(bucket) {
            if self.bucket.is_some() {
                self.committed.push(self.bucket_close);
            }
            self.bucket = Some(bucket);
        }
        self.bucket_close = bar.close;
        self.committed.peek(self.bucket_close)
    }
}
