//! Relative Strength Index (RSI).
//!
//! Wilder smoothing of average gains and losses:
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//! Seed: plain average of the first `period` changes. Lookback: period.
//! Edge cases: no movement → 50; avg_loss == 0 → 100; avg_gain == 0 → 0.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
    prev_close: Option<f64>,
    changes_seen: usize,
    avg_gain: f64,
    avg_loss: f64,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
            prev_close: None,
            changes_seen: 0,
            avg_gain: 0.0,
            avg_loss: 0.0,
        }
    }

    fn reset(&mut self) {
        self.prev_close = None;
        self.changes_seen = 0;
        self.avg_gain = 0.0;
        self.avg_loss = 0.0;
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn update(&mut self, bar: &Bar) -> f64 {
        if bar.close.is_nan() {
            self.reset();
            return f64::NAN;
        }
        let Some(prev) = self.prev_close.replace(bar.close) else {
            return f64::NAN;
        };

        let change = bar.close - prev;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        let n = self.period as f64;

        if self.changes_seen < self.period {
            self.avg_gain += gain / n;
            self.avg_loss += loss / n;
            self.changes_seen += 1;
            if self.changes_seen < self.period {
                return f64::NAN;
            }
        } else {
            self.avg_gain = (self.avg_gain * (n - 1.0) + gain) / n;
            self.avg_loss = (self.avg_loss * (n - 1.0) + loss) / n;
        }

        compute_rsi(self.avg_gain, self.avg_loss)
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
