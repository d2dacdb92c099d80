//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over the last `period` bars.
//! Lookback: period - 1.

use std::collections::VecDeque;

use super::Indicator;
use crate::domain::Bar;

/// Rolling mean over a fixed window of values.
///
/// Shared by [`Sma`], the ATR and the stochastic smoothing stages.
#[derive(Debug, Clone)]
pub struct RollingMean {
    period: usize,
    window: VecDeque<f64>,
    sum: f64,
}

impl RollingMean {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "rolling mean period must be >= 1");
        Self {
            period,
            window: VecDeque::with_capacity(period),
            sum: 0.0,
        }
    }

    /// Push a value; returns the mean once the window is full, NaN before.
    ///
    /// A NaN input resets the window.
    pub fn push(&mut self, value: f64) -> f64 {
        if value.is_nan() {
            self.window.clear();
            self.sum = 0.0;
            return f64::NAN;
        }
        self.window.push_back(value);
        self.sum += value;
        if self.window.len() > self.period {
            if let Some(leaving) = self.window.pop_front() {
                self.sum -= leaving;
            }
        }
        if self.window.len() == self.period {
            self.sum / self.period as f64
        } else {
            f64::NAN
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sma {
    mean: RollingMean,
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            mean: RollingMean::new(period),
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn update(&mut self, bar: &Bar) -> f64 {
        self.mean.push(bar.close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, run, DEFAULT_EPSILON};

    #[test]
    fn sma_basic() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let values = run(&mut Sma::new(3), &bars);
        assert!(values[0].is_nan());
        assert!(values[1].is_nan());
        assert_approx(values[2], 11.0, DEFAULT_EPSILON);
        assert_approx(values[3], 12.0, DEFAULT_EPSILON);
        assert_approx(values[4], 13.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_period_one_is_close() {
        let bars = make_bars(&[1.5, 2.5]);
        assert_eq!(run(&mut Sma::new(1), &bars), vec![1.5, 2.5]);
    }

    #[test]
    fn rolling_mean_nan_resets() {
        let mut m = RollingMean::new(2);
        assert!(m.push(1.0).is_nan());
        assert_approx(m.push(3.0), 2.0, DEFAULT_EPSILON);
        assert!(m.push(f64::NAN).is_nan());
        assert!(m.push(5.0).is_nan());
        assert_approx(m.push(7.0), 6.0, DEFAULT_EPSILON);
    }
}
