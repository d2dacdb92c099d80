//! Moving average crossover confirmed by RSI persistence.
//!
//! Buy when the fast MA is above the slow MA and the RSI has stayed strictly
//! below the oversold level for the whole lookback window. Sell mirrors it
//! with the overbought level. The confirmed form also requires the MA
//! relation to have flipped on this bar, so the signal fires once per cross
//! instead of on every bar the averages stay crossed.

use crate::snapshot::{SnapshotError, SnapshotProvider};

use super::Signal;

/// True when RSI at every offset in `[0, lookback)` is strictly below `level`.
///
/// A value equal to the level breaks the window. A zero lookback is
/// vacuously true.
pub fn is_rsi_below_threshold(
    snapshot: &dyn SnapshotProvider,
    rsi_key: &str,
    level: f64,
    lookback: usize,
) -> Result<bool, SnapshotError> {
    for offset in 0..lookback {
        if snapshot.history(rsi_key, offset)? >= level {
            return Ok(false);
        }
    }
    Ok(true)
}

/// True when RSI at every offset in `[0, lookback)` is strictly above `level`.
pub fn is_rsi_above_threshold(
    snapshot: &dyn SnapshotProvider,
    rsi_key: &str,
    level: f64,
    lookback: usize,
) -> Result<bool, SnapshotError> {
    for offset in 0..lookback {
        if snapshot.history(rsi_key, offset)? <= level {
            return Ok(false);
        }
    }
    Ok(true)
}

/// MA/RSI crossover rule.
///
/// # Indicator dependencies
/// - Fast MA: `fast_key` (e.g., `sma_10`)
/// - Slow MA: `slow_key` (e.g., `sma_50`)
/// - RSI: `rsi_key` (e.g., `rsi_14`), `lookback` values deep
#[derive(Debug, Clone, PartialEq)]
pub struct MaRsiCrossover {
    pub fast_key: String,
    pub slow_key: String,
    pub rsi_key: String,
    pub oversold: f64,
    pub overbought: f64,
    pub lookback: usize,
    pub confirm_cross: bool,
}

impl MaRsiCrossover {
    pub fn required_depth(&self) -> usize {
        let ma_depth = if self.confirm_cross { 2 } else { 1 };
        self.lookback.max(ma_depth)
    }

    pub fn evaluate(&self, snapshot: &dyn SnapshotProvider) -> Result<Signal, SnapshotError> {
        let fast = snapshot.latest(&self.fast_key)?;
        let slow = snapshot.latest(&self.slow_key)?;

        if fast > slow {
            // Previous bar: fast <= slow.
            if self.confirm_cross && !self.previous(snapshot, |f, s| f <= s)? {
                return Ok(Signal::None);
            }
            if is_rsi_below_threshold(snapshot, &self.rsi_key, self.oversold, self.lookback)? {
                return Ok(Signal::Buy);
            }
        } else if fast < slow {
            // Previous bar: fast >= slow.
            if self.confirm_cross && !self.previous(snapshot, |f, s| f >= s)? {
                return Ok(Signal::None);
            }
            if is_rsi_above_threshold(snapshot, &self.rsi_key, self.overbought, self.lookback)? {
                return Ok(Signal::Sell);
            }
        }

        Ok(Signal::None)
    }

    fn previous(
        &self,
        snapshot: &dyn SnapshotProvider,
        relation: impl Fn(f64, f64) -> bool,
    ) -> Result<bool, SnapshotError> {
        let fast_prev = snapshot.history(&self.fast_key, 1)?;
        let slow_prev = snapshot.history(&self.slow_key, 1)?;
        Ok(relation(fast_prev, slow_prev))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::IndicatorSnapshot;

    fn rule(confirm_cross: bool) -> MaRsiCrossover {
        MaRsiCrossover {
            fast_key: "sma_10".into(),
            slow_key: "sma_50".into(),
            rsi_key: "rsi_14".into(),
            oversold: 30.0,
            overbought: 70.0,
            lookback: 5,
            confirm_cross,
        }
    }

    fn snapshot(fast: Vec<f64>, slow: Vec<f64>, rsi: Vec<f64>) -> IndicatorSnapshot {
        IndicatorSnapshot::new()
            .with("sma_10", fast)
            .with("sma_50", slow)
            .with("rsi_14", rsi)
    }

    const OVERSOLD_RUN: [f64; 5] = [29.0, 28.0, 25.0, 22.0, 20.0];
    const OVERBOUGHT_RUN: [f64; 5] = [71.0, 75.0, 80.0, 72.0, 70.5];

    #[test]
    fn below_threshold_all_strictly_below() {
        let s = snapshot(vec![], vec![], OVERSOLD_RUN.to_vec());
        assert_eq!(is_rsi_below_threshold(&s, "rsi_14", 30.0, 5), Ok(true));
    }

    #[test]
    fn below_threshold_equal_value_breaks_window() {
        let s = snapshot(vec![], vec![], vec![29.0, 28.0, 30.0, 22.0, 20.0]);
        assert_eq!(is_rsi_below_threshold(&s, "rsi_14", 30.0, 5), Ok(false));
    }

    #[test]
    fn above_threshold_equal_value_breaks_window() {
        let s = snapshot(vec![], vec![], vec![71.0, 70.0, 80.0, 72.0, 75.0]);
        assert_eq!(is_rsi_above_threshold(&s, "rsi_14", 70.0, 5), Ok(false));
    }

    #[test]
    fn values_past_lookback_are_ignored() {
        // Offset 5 is outside a 5-bar window.
        let s = snapshot(vec![], vec![], vec![29.0, 28.0, 25.0, 22.0, 20.0, 55.0]);
        assert_eq!(is_rsi_below_threshold(&s, "rsi_14", 30.0, 5), Ok(true));
    }

    #[test]
    fn zero_lookback_is_vacuous() {
        let s = IndicatorSnapshot::new();
        assert_eq!(is_rsi_below_threshold(&s, "rsi_14", 30.0, 0), Ok(true));
        assert_eq!(is_rsi_above_threshold(&s, "rsi_14", 70.0, 0), Ok(true));
    }

    #[test]
    fn short_history_is_an_error() {
        let s = snapshot(vec![], vec![], vec![29.0, 28.0]);
        assert!(matches!(
            is_rsi_below_threshold(&s, "rsi_14", 30.0, 5),
            Err(SnapshotError::InsufficientHistory { offset: 2, .. })
        ));
    }

    #[test]
    fn simple_buy_when_fast_above_and_oversold() {
        let s = snapshot(vec![1.1010], vec![1.1000], OVERSOLD_RUN.to_vec());
        assert_eq!(rule(false).evaluate(&s), Ok(Signal::Buy));
    }

    #[test]
    fn simple_sell_when_fast_below_and_overbought() {
        let s = snapshot(vec![1.0990], vec![1.1000], OVERBOUGHT_RUN.to_vec());
        assert_eq!(rule(false).evaluate(&s), Ok(Signal::Sell));
    }

    #[test]
    fn simple_refires_while_crossed() {
        // No flip required: fast was already above slow on the previous bar.
        let s = snapshot(
            vec![1.1010, 1.1008],
            vec![1.1000, 1.1000],
            OVERSOLD_RUN.to_vec(),
        );
        assert_eq!(rule(false).evaluate(&s), Ok(Signal::Buy));
    }

    #[test]
    fn confirmed_requires_flip() {
        let s = snapshot(
            vec![1.1010, 1.1008],
            vec![1.1000, 1.1000],
            OVERSOLD_RUN.to_vec(),
        );
        assert_eq!(rule(true).evaluate(&s), Ok(Signal::None));
    }

    #[test]
    fn confirmed_buy_on_flip_bar() {
        let s = snapshot(
            vec![1.1010, 1.0995],
            vec![1.1000, 1.1000],
            OVERSOLD_RUN.to_vec(),
        );
        assert_eq!(rule(true).evaluate(&s), Ok(Signal::Buy));
    }

    #[test]
    fn confirmed_buy_when_previous_equal() {
        let s = snapshot(
            vec![1.1010, 1.1000],
            vec![1.1000, 1.1000],
            OVERSOLD_RUN.to_vec(),
        );
        assert_eq!(rule(true).evaluate(&s), Ok(Signal::Buy));
    }

    #[test]
    fn confirmed_sell_on_flip_bar() {
        let s = snapshot(
            vec![1.0990, 1.1005],
            vec![1.1000, 1.1000],
            OVERBOUGHT_RUN.to_vec(),
        );
        assert_eq!(rule(true).evaluate(&s), Ok(Signal::Sell));
    }

    #[test]
    fn no_signal_when_rsi_not_persistent() {
        let s = snapshot(
            vec![1.1010],
            vec![1.1000],
            vec![29.0, 28.0, 25.0, 31.0, 20.0],
        );
        assert_eq!(rule(false).evaluate(&s), Ok(Signal::None));
    }

    #[test]
    fn no_signal_when_averages_equal() {
        // RSI is not consulted, so a missing series does not matter.
        let s = IndicatorSnapshot::new()
            .with("sma_10", vec![1.1])
            .with("sma_50", vec![1.1]);
        assert_eq!(rule(false).evaluate(&s), Ok(Signal::None));
    }

    #[test]
    fn missing_slow_average_is_an_error() {
        let s = IndicatorSnapshot::new().with("sma_10", vec![1.1]);
        assert_eq!(
            rule(false).evaluate(&s),
            Err(SnapshotError::UnknownIndicator("sma_50".into()))
        );
    }

    #[test]
    fn confirmed_without_previous_bar_is_an_error() {
        let s = snapshot(vec![1.1010], vec![1.1000], OVERSOLD_RUN.to_vec());
        assert!(matches!(
            rule(true).evaluate(&s),
            Err(SnapshotError::InsufficientHistory { offset: 1, .. })
        ));
    }

    #[test]
    fn required_depth() {
        assert_eq!(rule(false).required_depth(), 5);
        let mut r = rule(true);
        r.lookback = 0;
        assert_eq!(r.required_depth(), 2);
    }
}
