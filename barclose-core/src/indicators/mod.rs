//! Streaming indicators.
//!
//! Each indicator consumes one closed bar at a time and returns its value for
//! that bar, `f64::NAN` until it has seen enough bars. No value may depend on
//! a bar that has not closed yet.
//!
//! Multi-line indicators (the stochastic oscillator) are exposed as separate
//! named instances per line, keeping the single-series `Indicator` trait.
//!
//! [`IndicatorSet`] owns the indicators a strategy needs and turns every bar
//! into an [`IndicatorSnapshot`](crate::snapshot::IndicatorSnapshot).

pub mod atr;
pub mod ema;
pub mod higher_timeframe;
pub mod rsi;
pub mod set;
pub mod sma;
pub mod stochastic;

use serde::{Deserialize, Serialize};

use crate::domain::Bar;

pub use atr::Atr;
pub use ema::Ema;
pub use higher_timeframe::{HigherTimeframeEma, Timeframe};
pub use rsi::Rsi;
pub use set::IndicatorSet;
pub use sma::Sma;
pub use stochastic::{Stochastic, StochasticLine};

/// Streaming indicator.
pub trait Indicator: Send + Sync {
    /// Snapshot key (e.g., "sma_10", "atr_14").
    fn name(&self) -> &str;

    /// Number of bars consumed before the first valid value.
    fn lookback(&self) -> usize;

    /// Feed the next closed bar; returns the value for that bar or NaN.
    fn update(&mut self, bar: &Bar) -> f64;
}

/// Moving average flavor for the crossover pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaType {
    #[default]
    Sma,
    Ema,
}

impl MaType {
    /// Snapshot key for an average of this type over `period` bars.
    pub fn key(&self, period: usize) -> String {
        match self {
            MaType::Sma => format!("sma_{period}"),
            MaType::Ema => format!("ema_{period}"),
        }
    }

    pub fn build(&self, period: usize) -> Box<dyn Indicator> {
        match self {
            MaType::Sma => Box::new(Sma::new(period)),
            MaType::Ema => Box::new(Ema::new(period)),
        }
    }
}

/// Test bars from close prices: open = previous close, high/low one unit
/// outside the body.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    use chrono::{Duration, TimeZone, Utc};
    let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar::new(
                start + Duration::minutes(15 * i as i64),
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
                1000.0,
            )
        })
        .collect()
}

/// Feed every bar and collect the outputs.
#[cfg(test)]
pub fn run(indicator: &mut dyn Indicator, bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| indicator.update(b)).collect()
}

#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
