//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1],
//! alpha = 2 / (period + 1). Seed: SMA of the first `period` closes.
//! Lookback: period - 1.

use super::Indicator;
use crate::domain::Bar;

/// EMA state machine over an arbitrary value stream.
#[derive(Debug, Clone)]
pub struct EmaState {
    period: usize,
    alpha: f64,
    seed_sum: f64,
    seen: usize,
    value: Option<f64>,
}

impl EmaState {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            alpha: 2.0 / (period as f64 + 1.0),
            seed_sum: 0.0,
            seen: 0,
            value: None,
        }
    }

    /// Value the EMA would take if `x` were pushed, without committing it.
    pub fn peek(&self, x: f64) -> f64 {
        match self.value {
            Some(prev) => self.alpha * x + (1.0 - self.alpha) * prev,
            None if self.seen + 1 == self.period => (self.seed_sum + x) / self.period as f64,
            None => f64::NAN,
        }
    }

    /// Commit `x`. A NaN input restarts the seed.
    pub fn push(&mut self, x: f64) -> f64 {
        if x.is_nan() {
            *self = Self::new(self.period);
            return f64::NAN;
        }
        let next = self.peek(x);
        if self.value.is_none() {
            self.seed_sum += x;
            self.seen += 1;
        }
        if !next.is_nan() {
            self.value = Some(next);
        }
        next
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

#[derive(Debug, Clone)]
pub struct Ema {
    state: EmaState,
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self {
            state: EmaState::new(period),
            period,
            name: format!("ema_{period}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn update(&mut self, bar: &Bar) -> f64 {
        self.state.push(bar.close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, run, DEFAULT_EPSILON};

    #[test]
    fn ema_seed_is_sma() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0]);
        let values = run(&mut Ema::new(3), &bars);
        assert!(values[1].is_nan());
        assert_approx(values[2], 11.0, DEFAULT_EPSILON);
        // alpha = 0.5: 0.5 * 13 + 0.5 * 11
        assert_approx(values[3], 12.0, DEFAULT_EPSILON);
    }

    #[test]
    fn peek_does_not_commit() {
        let mut s = EmaState::new(2);
        s.push(10.0);
        assert_approx(s.peek(20.0), 15.0, DEFAULT_EPSILON);
        assert_approx(s.peek(30.0), 20.0, DEFAULT_EPSILON);
        assert!(s.value().is_none());
        assert_approx(s.push(20.0), 15.0, DEFAULT_EPSILON);
        assert_eq!(s.value(), Some(15.0));
    }

    #[test]
    fn ema_converges_to_constant() {
        let bars = make_bars(&[5.0; 40]);
        let values = run(&mut Ema::new(10), &bars);
        assert_approx(values[39], 5.0, DEFAULT_EPSILON);
    }
}
