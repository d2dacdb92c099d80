//! Signal evaluation: turns one indicator snapshot into a trading signal.
//!
//! Signals are position-agnostic: they see the snapshot and their own
//! parameters, never the account or open positions. Evaluation is a pure
//! function, so re-running it on the same snapshot always yields the same
//! signal.

pub mod crossover;
pub mod stochastic;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::EngineConfig;
use crate::domain::TradeDirection;
use crate::snapshot::{SnapshotError, SnapshotProvider};

pub use crossover::{is_rsi_above_threshold, is_rsi_below_threshold, MaRsiCrossover};
pub use stochastic::StochasticEma;

/// Directional outcome of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Buy,
    Sell,
    None,
}

impl Signal {
    /// Position direction this signal asks for, if any.
    pub fn direction(&self) -> Option<TradeDirection> {
        match self {
            Signal::Buy => Some(TradeDirection::Long),
            Signal::Sell => Some(TradeDirection::Short),
            Signal::None => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Signal::None)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "buy"),
            Signal::Sell => write!(f, "sell"),
            Signal::None => write!(f, "none"),
        }
    }
}

/// Which rule the engine runs. Selected once from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalRule {
    /// MA relation plus RSI persistence, no crossing requirement.
    SimpleCrossover,
    /// As `SimpleCrossover`, but the MA relation must flip on this bar.
    ConfirmedCrossover,
    /// Stochastic %K/%D extremes filtered by a trend EMA.
    StochasticEma,
}

impl SignalRule {
    pub fn name(&self) -> &'static str {
        match self {
            SignalRule::SimpleCrossover => "simple_crossover",
            SignalRule::ConfirmedCrossover => "confirmed_crossover",
            SignalRule::StochasticEma => "stochastic_ema",
        }
    }
}

/// Configured signal evaluator: one variant per rule family.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalEvaluator {
    Crossover(MaRsiCrossover),
    StochasticEma(StochasticEma),
}

impl SignalEvaluator {
    pub fn from_config(config: &EngineConfig) -> Self {
        let keys = config.indicators.keys();
        let ind = &config.indicators;
        match config.strategy.rule {
            SignalRule::SimpleCrossover | SignalRule::ConfirmedCrossover => {
                SignalEvaluator::Crossover(MaRsiCrossover {
                    fast_key: keys.fast_ma,
                    slow_key: keys.slow_ma,
                    rsi_key: keys.rsi,
                    oversold: ind.rsi_oversold,
                    overbought: ind.rsi_overbought,
                    lookback: config.risk.rsi_lookback,
                    confirm_cross: config.strategy.rule == SignalRule::ConfirmedCrossover,
                })
            }
            SignalRule::StochasticEma => SignalEvaluator::StochasticEma(StochasticEma {
                k_key: keys.stoch_k,
                d_key: keys.stoch_d,
                trend_key: keys.trend_ema,
                oversold: ind.stoch_oversold,
                overbought: ind.stoch_overbought,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SignalEvaluator::Crossover(c) if c.confirm_cross => "confirmed_crossover",
            SignalEvaluator::Crossover(_) => "simple_crossover",
            SignalEvaluator::StochasticEma(_) => "stochastic_ema",
        }
    }

    /// Number of history values per series the rule may read.
    pub fn required_depth(&self) -> usize {
        match self {
            SignalEvaluator::Crossover(c) => c.required_depth(),
            SignalEvaluator::StochasticEma(_) => 1,
        }
    }

    pub fn evaluate(&self, snapshot: &dyn SnapshotProvider) -> Result<Signal, SnapshotError> {
        match self {
            SignalEvaluator::Crossover(c) => c.evaluate(snapshot),
            SignalEvaluator::StochasticEma(s) => s.evaluate(snapshot),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_direction() {
        assert_eq!(Signal::Buy.direction(), Some(TradeDirection::Long));
        assert_eq!(Signal::Sell.direction(), Some(TradeDirection::Short));
        assert_eq!(Signal::None.direction(), None);
        assert!(Signal::None.is_none());
    }

    #[test]
    fn evaluator_follows_configured_rule() {
        let mut config = EngineConfig::default();
        config.strategy.rule = SignalRule::SimpleCrossover;
        let eval = SignalEvaluator::from_config(&config);
        assert_eq!(eval.name(), "simple_crossover");
        assert_eq!(eval.required_depth(), config.risk.rsi_lookback.max(1));

        config.strategy.rule = SignalRule::ConfirmedCrossover;
        let eval = SignalEvaluator::from_config(&config);
        assert_eq!(eval.name(), "confirmed_crossover");
        assert_eq!(eval.required_depth(), config.risk.rsi_lookback.max(2));

        config.strategy.rule = SignalRule::StochasticEma;
        let eval = SignalEvaluator::from_config(&config);
        assert_eq!(eval.name(), "stochastic_ema");
    }

    #[test]
    fn rule_names_match_serde() {
        for rule in [
            SignalRule::SimpleCrossover,
            SignalRule::ConfirmedCrossover,
            SignalRule::StochasticEma,
        ] {
            let json = serde_json::to_string(&rule).unwrap();
            assert_eq!(json, format!("\"{}\"", rule.name()));
        }
    }
}
