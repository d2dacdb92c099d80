//! The indicators one strategy reads, advanced together bar by bar.

use std::collections::{BTreeMap, VecDeque};

use super::{Atr, HigherTimeframeEma, Indicator, Rsi, Stochastic, StochasticLine};
use crate::config::EngineConfig;
use crate::domain::Bar;
use crate::signal::{SignalEvaluator, SignalRule};
use crate::snapshot::{IndicatorSnapshot, CLOSE};

/// Streaming indicator bank that emits one [`IndicatorSnapshot`] per bar.
///
/// Each series keeps the last `depth` values, most recent first. The bar
/// close is recorded as the [`CLOSE`] series.
pub struct IndicatorSet {
    indicators: Vec<Box<dyn Indicator>>,
    histories: BTreeMap<String, VecDeque<f64>>,
    depth: usize,
    bars_seen: usize,
}

impl IndicatorSet {
    pub fn new(indicators: Vec<Box<dyn Indicator>>, depth: usize) -> Self {
        let depth = depth.max(1);
        let mut histories = BTreeMap::new();
        histories.insert(CLOSE.to_string(), VecDeque::new());
        for ind in &indicators {
            histories.insert(ind.name().to_string(), VecDeque::new());
        }
        Self {
            indicators,
            histories,
            depth,
            bars_seen: 0,
        }
    }

    /// Indicators required by the configured rule plus the ATR used for stops.
    pub fn from_config(config: &EngineConfig) -> Self {
        let ind = &config.indicators;
        let mut indicators: Vec<Box<dyn Indicator>> = Vec::new();
        match config.strategy.rule {
            SignalRule::SimpleCrossover | SignalRule::ConfirmedCrossover => {
                indicators.push(ind.ma_type.build(ind.fast_period));
                indicators.push(ind.ma_type.build(ind.slow_period));
                indicators.push(Box::new(Rsi::new(ind.rsi_period)));
            }
            SignalRule::StochasticEma => {
                for line in [StochasticLine::K, StochasticLine::D] {
                    indicators.push(Box::new(Stochastic::new(
                        ind.stoch_k_period,
                        ind.stoch_d_period,
                        ind.stoch_slowing,
                        line,
                    )));
                }
                indicators.push(Box::new(HigherTimeframeEma::new(
                    ind.ema_period,
                    ind.ema_timeframe,
                )));
            }
        }
        indicators.push(Box::new(Atr::new(ind.atr_period)));

        let depth = SignalEvaluator::from_config(config).required_depth();
        Self::new(indicators, depth)
    }

    /// Advance every indicator by one closed bar and snapshot the result.
    pub fn update(&mut self, bar: &Bar) -> IndicatorSnapshot {
        self.bars_seen += 1;
        self.record(CLOSE, bar.close);
        for i in 0..self.indicators.len() {
            let value = self.indicators[i].update(bar);
            let name = self.indicators[i].name().to_string();
            self.record(&name, value);
        }
        self.snapshot()
    }

    fn record(&mut self, name: &str, value: f64) {
        if let Some(history) = self.histories.get_mut(name) {
            history.push_front(value);
            history.truncate(self.depth);
        }
    }

    /// Current histories as an immutable snapshot.
    pub fn snapshot(&self) -> IndicatorSnapshot {
        let mut snapshot = IndicatorSnapshot::new();
        for (name, history) in &self.histories {
            snapshot.insert(name.clone(), history.iter().copied().collect());
        }
        snapshot
    }

    /// True once every series holds `depth` valid values.
    pub fn is_warm(&self) -> bool {
        self.histories
            .values()
            .all(|h| h.len() == self.depth && h.iter().all(|v| v.is_finite()))
    }

    pub fn bars_seen(&self) -> usize {
        self.bars_seen
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.histories.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for IndicatorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndicatorSet")
            .field("series", &self.histories.keys().collect::<Vec<_>>())
            .field("depth", &self.depth)
            .field("bars_seen", &self.bars_seen)
            .finish()
    }
}
