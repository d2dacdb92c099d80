//! Stochastic oscillator.
//!
//! Raw %K = 100 * (close - lowest low) / (highest high - lowest low) over the
//! last `k_period` bars (50 when the range is flat). %K is the simple average
//! of raw %K over `slowing` bars, %D the simple average of %K over `d_period`.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::sma::RollingMean;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StochasticLine {
    K,
    D,
}

impl StochasticLine {
    /// Snapshot key, e.g. `stoch_k_8_3_3` for (K, 8, 3, 3).
    pub fn key(&self, k_period: usize, d_period: usize, slowing: usize) -> String {
        let line = match self {
            StochasticLine::K => "k",
            StochasticLine::D => "d",
        };
        format!("stoch_{line}_{k_period}_{d_period}_{slowing}")
    }
}

#[derive(Debug, Clone)]
pub struct Stochastic {
    k_period: usize,
    d_period: usize,
    slowing: usize,
    line: StochasticLine,
    name: String,
    range: VecDeque<(f64, f64)>,
    k_mean: RollingMean,
    d_mean: RollingMean,
}

impl Stochastic {
    pub fn new(k_period: usize, d_period: usize, slowing: usize, line: StochasticLine) -> Self {
        assert!(k_period >= 1, "stochastic K period must be >= 1");
        assert!(d_period >= 1, "stochastic D period must be >= 1");
        assert!(slowing >= 1, "stochastic slowing must be >= 1");
        Self {
            k_period,
            d_period,
            slowing,
            line,
            name: line.key(k_period, d_period, slowing),
            range: VecDeque::with_capacity(k_period),
            k_mean: RollingMean::new(slowing),
            d_mean: RollingMean::new(d_period),
        }
    }

    fn raw_k(&mut self, bar: &Bar) -> f64 {
        self.range.push_back((bar.high, bar.low));
        if self.range.len() > self.k_period {
            self.range.pop_front();
        }
        if self.range.len() < self.k_period {
            return f64::NAN;
        }
        let highest = self.range.iter().map(|r| r.0).fold(f64::MIN, f64::max);
        let lowest = self.range.iter().map(|r| r.1).fold(f64::MAX, f64::min);
        let span = highest - lowest;
        if span <= 0.0 {
            50.0
        } else {
            100.0 * (bar.close - lowest) / span
        }
    }
}

impl Indicator for Stochastic {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        let k = self.k_period - 1 + self.slowing - 1;
        match self.line {
            StochasticLine::K => k,
            StochasticLine::D => k + self.d_period - 1,
        }
    }

    fn update(&mut self, bar: &Bar) -> f64 {
        if bar.is_void() {
            self.range.clear();
            self.k_mean.push(f64::NAN);
            self.d_mean.push(f64::NAN);
            return f64::NAN;
        }
        let raw = self.raw_k(bar);
        if raw.is_nan() {
            return f64::NAN;
        }
        let k = self.k_mean.push(raw);
        if k.is_nan() {
            return f64::NAN;
        }
        let d = self.d_mean.push(k);
        match self.line {
            StochasticLine::K => k,
            StochasticLine::D => d,
        }
    }
}
