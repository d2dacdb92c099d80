//! Replay runner: drives the bar-closed engine over a bar series against the
//! paper venue.
//!
//! Per bar, in order:
//! 1. the venue settles stops/targets against the bar and quotes its close
//! 2. close notifications are delivered
//! 3. indicators advance by the bar
//! 4. once every series is warm, the orchestrator runs one cycle
//!
//! A failed cycle is counted by error kind and the replay moves on to the
//! next bar, the same way a live host keeps running after a bad bar.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use barclose_core::config::ConfigError;
use barclose_core::domain::Bar;
use barclose_core::engine::{Account, SignalMarker};
use barclose_core::indicators::IndicatorSet;
use barclose_core::notify::{LogNotifier, Notifier, PositionClosed};
use barclose_core::signal::Signal;
use barclose_core::{BarClosedOrchestrator, CycleReport, EngineConfig, EngineError};

use crate::marker::RecordingMarker;
use crate::paper::PaperVenue;

/// Current schema version for serialized summaries.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("no bars to replay")]
    NoBars,

    #[error("bar {index} at {time} does not follow the previous bar")]
    OutOfOrder { index: usize, time: DateTime<Utc> },
}

/// Paper account settings for a replay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplayOptions {
    pub balance: f64,
    /// Ask minus bid, in pips.
    pub spread_pips: f64,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            balance: 10_000.0,
            spread_pips: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalCounts {
    pub buy: usize,
    pub sell: usize,
}

/// Everything a replay did, in a serializable form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaySummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// BLAKE3 fingerprint of the engine configuration.
    pub config_fingerprint: String,
    pub symbol: String,
    pub rule: String,
    pub sizing: String,
    pub first_bar: Option<DateTime<Utc>>,
    pub last_bar: Option<DateTime<Utc>>,
    pub bars: usize,
    /// Bars consumed before every indicator series was valid.
    pub warmup_bars: usize,
    pub cycles: usize,
    pub signals: SignalCounts,
    pub orders: usize,
    /// Positions closed by the engine on reversal.
    pub reversal_closes: usize,
    pub markers: Vec<SignalMarker>,
    /// Failed cycles by error kind.
    pub errors: BTreeMap<String, usize>,
    pub notifications_failed: usize,
    pub starting_balance: f64,
    pub final_balance: f64,
    pub open_positions: usize,
    pub trades: Vec<PositionClosed>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl ReplaySummary {
    pub fn net_profit(&self) -> f64 {
        self.final_balance - self.starting_balance
    }

    pub fn error_count(&self) -> usize {
        self.errors.values().sum()
    }

    pub fn winning_trades(&self) -> usize {
        self.trades.iter().filter(|t| t.profit_loss > 0.0).count()
    }
}

pub struct Replay {
    orchestrator: BarClosedOrchestrator,
    indicators: IndicatorSet,
    venue: PaperVenue,
    chart: RecordingMarker,
    notifier: Box<dyn Notifier>,
    summary: ReplaySummary,
}

impl Replay {
    /// Build a replay from a validated configuration.
    pub fn new(config: &EngineConfig, options: ReplayOptions) -> Result<Self, ReplayError> {
        config.validate()?;
        let orchestrator = BarClosedOrchestrator::from_config(config);
        let summary = ReplaySummary {
            schema_version: SCHEMA_VERSION,
            config_fingerprint: config.fingerprint()?,
            symbol: config.instrument.symbol.clone(),
            rule: orchestrator.evaluator().name().to_string(),
            sizing: config.strategy.sizing.name().to_string(),
            first_bar: None,
            last_bar: None,
            bars: 0,
            warmup_bars: 0,
            cycles: 0,
            signals: SignalCounts::default(),
            orders: 0,
            reversal_closes: 0,
            markers: Vec::new(),
            errors: BTreeMap::new(),
            notifications_failed: 0,
            starting_balance: options.balance,
            final_balance: options.balance,
            open_positions: 0,
            trades: Vec::new(),
        };
        Ok(Self {
            orchestrator,
            indicators: IndicatorSet::from_config(config),
            venue: PaperVenue::new(config.instrument.clone(), options.balance, options.spread_pips),
            chart: RecordingMarker::default(),
            notifier: Box::new(LogNotifier),
            summary,
        })
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn venue(&self) -> &PaperVenue {
        &self.venue
    }

    pub fn venue_mut(&mut self) -> &mut PaperVenue {
        &mut self.venue
    }

    /// Feed one closed bar. Returns the cycle outcome, or `None` during warmup.
    pub fn step(&mut self, bar: &Bar) -> Option<Result<CycleReport, EngineError>> {
        self.summary.first_bar.get_or_insert(bar.open_time);
        self.summary.last_bar = Some(bar.open_time);
        self.summary.bars += 1;

        self.venue.on_bar(bar);
        self.deliver_events();

        let snapshot = self.indicators.update(bar);
        if !self.indicators.is_warm() {
            self.summary.warmup_bars += 1;
            return None;
        }

        self.summary.cycles += 1;
        let outcome = self.orchestrator.cycle(
            self.indicators.bars_seen(),
            bar,
            &snapshot,
            &mut self.venue,
            &mut self.chart,
        );
        // Failed cycles still count their signal and any close that went through.
        self.tally(&outcome.report);
        if let Some(err) = &outcome.error {
            *self.summary.errors.entry(err.kind().to_string()).or_default() += 1;
        }
        self.deliver_events();
        Some(outcome.into_result())
    }

    /// Replay every bar and return the summary.
    pub fn run(mut self, bars: &[Bar]) -> Result<ReplaySummary, ReplayError> {
        if bars.is_empty() {
            return Err(ReplayError::NoBars);
        }
        info!(
            bars = bars.len(),
            symbol = %self.summary.symbol,
            rule = %self.summary.rule,
            sizing = %self.summary.sizing,
            "replay started"
        );
        for (index, bar) in bars.iter().enumerate() {
            if index > 0 && bar.open_time <= bars[index - 1].open_time {
                return Err(ReplayError::OutOfOrder {
                    index,
                    time: bar.open_time,
                });
            }
            self.step(bar);
        }
        Ok(self.finish())
    }

    /// Close the books on the summary without closing open positions.
    pub fn finish(mut self) -> ReplaySummary {
        self.summary.final_balance = self.venue.balance();
        self.summary.open_positions = self.venue.positions().len();
        self.summary.markers = self.chart.into_markers();
        info!(
            cycles = self.summary.cycles,
            orders = self.summary.orders,
            trades = self.summary.trades.len(),
            errors = self.summary.error_count(),
            final_balance = self.summary.final_balance,
            "replay finished"
        );
        self.summary
    }

    fn tally(&mut self, report: &CycleReport) {
        match report.signal {
            Signal::Buy => self.summary.signals.buy += 1,
            Signal::Sell => self.summary.signals.sell += 1,
            Signal::None => {}
        }
        self.summary.reversal_closes += report.closed.len();
        if report.opened.is_some() {
            self.summary.orders += 1;
        }
        if report.signal != Signal::None {
            debug!(bar_time = %report.bar_time, signal = %report.signal, "cycle done");
        }
    }

    fn deliver_events(&mut self) {
        for event in self.venue.take_events() {
            if !self
                .orchestrator
                .on_position_closed(&event, self.notifier.as_ref())
            {
                self.summary.notifications_failed += 1;
                warn!(position = %event.position_id, "close notification dropped");
            }
            self.summary.trades.push(event);
        }
    }
}

impl std::fmt::Debug for Replay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Replay")
            .field("indicators", &self.indicators)
            .field("venue", &self.venue)
            .field("notifier", &self.notifier.name())
            .finish()
    }
}
