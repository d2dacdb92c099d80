//! Stochastic oscillator extremes filtered by a trend EMA.
//!
//! Buy when %K and %D are both below the oversold level, %K has turned above
//! %D, and the bar closed above the trend EMA. Sell mirrors it at the
//! overbought level with the close below the EMA.

use crate::snapshot::{SnapshotError, SnapshotProvider, CLOSE};

use super::Signal;

#[derive(Debug, Clone, PartialEq)]
pub struct StochasticEma {
    pub k_key: String,
    pub d_key: String,
    /// Trend EMA, possibly computed on a higher timeframe.
    pub trend_key: String,
    pub oversold: f64,
    pub overbought: f64,
}

impl StochasticEma {
    pub fn evaluate(&self, snapshot: &dyn SnapshotProvider) -> Result<Signal, SnapshotError> {
        let k = snapshot.latest(&self.k_key)?;
        let d = snapshot.latest(&self.d_key)?;
        let trend = snapshot.latest(&self.trend_key)?;
        let close = snapshot.latest(CLOSE)?;

        if k < self.oversold && d < self.oversold && k > d && close > trend {
            return Ok(Signal::Buy);
        }
        if k > self.overbought && d > self.overbought && k < d && close < trend {
            return Ok(Signal::Sell);
        }
        Ok(Signal::None)
    }
}
