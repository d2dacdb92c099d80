//! Average True Range (ATR).
//!
//! True Range: max(high - low, |high - prev_close|, |low - prev_close|), with
//! plain high - low on the first bar. ATR is the simple average of the last
//! `period` true ranges. Lookback: period - 1.

use super::sma::RollingMean;
use super::Indicator;
use crate::domain::Bar;

/// True range of `bar` given the previous close, if any.
pub fn true_range(bar: &Bar, prev_close: Option<f64>) -> f64 {
    let high_low = bar.high - bar.low;
    match prev_close {
        Some(pc) => high_low
            .max((bar.high - pc).abs())
            .max((bar.low - pc).abs()),
        None => high_low,
    }
}

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
    prev_close: Option<f64>,
    mean: RollingMean,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
            prev_close: None,
            mean: RollingMean::new(period),
        }
    }
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn update(&mut self, bar: &Bar) -> f64 {
        if bar.is_void() {
            self.prev_close = None;
            return self.mean.push(f64::NAN);
        }
        let tr = true_range(bar, self.prev_close);
        self.prev_close = Some(bar.close);
        self.mean.push(tr)
    }
}
