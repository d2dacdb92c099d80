//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use barclose_core::domain::{Bar, Instrument, OrderRequest, Position, PositionId, Quote};
use barclose_core::engine::{Account, ChartMarker, OrderExecution, SignalMarker, VenueError};
use barclose_core::snapshot::IndicatorSnapshot;
use barclose_core::EngineConfig;
use chrono::{DateTime, Duration, TimeZone, Utc};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap()
}

pub fn bar_at(i: i64, close: f64) -> Bar {
    Bar::new(t0() + Duration::hours(i), close, close + 0.0005, close - 0.0005, close, 1000.0)
}

/// In-memory venue with a fixed quote and scripted failures.
pub struct MockVenue {
    pub instrument: Instrument,
    pub quote: Quote,
    pub balance: f64,
    pub positions: Vec<Position>,
    pub submitted: Vec<OrderRequest>,
    pub closed: Vec<PositionId>,
    pub reject_submit: bool,
    pub reject_close: bool,
    next_id: u64,
}

impl MockVenue {
    pub fn new(balance: f64) -> Self {
        Self {
            instrument: EngineConfig::default().instrument,
            quote: Quote::new(1.1000, 1.1002),
            balance,
            positions: Vec::new(),
            submitted: Vec::new(),
            closed: Vec::new(),
            reject_submit: false,
            reject_close: false,
            next_id: 1,
        }
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.positions.push(position);
        self
    }

    /// Total venue calls that changed state.
    pub fn mutations(&self) -> usize {
        self.submitted.len() + self.closed.len()
    }
}

impl Account for MockVenue {
    fn balance(&self) -> f64 {
        self.balance
    }

    fn instrument(&self, symbol: &str) -> Result<Instrument, VenueError> {
        if symbol == self.instrument.symbol {
            Ok(self.instrument.clone())
        } else {
            Err(VenueError::UnknownInstrument(symbol.to_string()))
        }
    }

    fn quote(&self, _symbol: &str) -> Result<Quote, VenueError> {
        Ok(self.quote)
    }

    fn open_positions(&self, symbol: &str) -> Vec<Position> {
        self.positions
            .iter()
            .filter(|p| p.symbol == symbol)
            .cloned()
            .collect()
    }
}

impl OrderExecution for MockVenue {
    fn submit(&mut self, request: &OrderRequest) -> Result<PositionId, VenueError> {
        if self.reject_submit {
            return Err(VenueError::Rejected("not enough money".into()));
        }
        let id = PositionId(self.next_id);
        self.next_id += 1;
        self.submitted.push(request.clone());
        self.positions.push(Position {
            id,
            symbol: request.symbol.clone(),
            direction: request.direction,
            volume: request.volume,
            entry_price: self.quote.ask,
            stop_price: None,
            target_price: None,
            open_time: t0(),
            label: request.label.clone(),
        });
        Ok(id)
    }

    fn close(&mut self, position: &Position) -> Result<(), VenueError> {
        if self.reject_close {
            return Err(VenueError::Rejected("market closed".into()));
        }
        let before = self.positions.len();
        self.positions.retain(|p| p.id != position.id);
        if self.positions.len() == before {
            return Err(VenueError::UnknownPosition(position.id));
        }
        self.closed.push(position.id);
        Ok(())
    }
}

#[derive(Default)]
pub struct Markers(pub Vec<SignalMarker>);

impl ChartMarker for Markers {
    fn mark(&mut self, marker: SignalMarker) {
        self.0.push(marker);
    }
}

pub fn position(id: u64, direction: barclose_core::domain::TradeDirection) -> Position {
    Position {
        id: PositionId(id),
        symbol: "EURUSD".into(),
        direction,
        volume: 10_000.0,
        entry_price: 1.1,
        stop_price: None,
        target_price: None,
        open_time: t0(),
        label: direction.to_string(),
    }
}

/// Crossover snapshot for the default configuration.
///
/// `rsi` is most recent first.
pub fn crossover_snapshot(config: &EngineConfig, fast: f64, slow: f64, rsi: &[f64]) -> IndicatorSnapshot {
    let keys = config.indicators.keys();
    IndicatorSnapshot::new()
        .with(keys.fast_ma, vec![fast, fast])
        .with(keys.slow_ma, vec![slow, slow])
        .with(keys.rsi, rsi.to_vec())
        .with(keys.atr, vec![0.0015])
}

/// Crossover snapshot with the last two MA values, most recent first, so a
/// cross between the previous bar and this one can be expressed.
pub fn crossing_snapshot(
    config: &EngineConfig,
    fast: [f64; 2],
    slow: [f64; 2],
    rsi: &[f64],
) -> IndicatorSnapshot {
    let keys = config.indicators.keys();
    IndicatorSnapshot::new()
        .with(keys.fast_ma, fast.to_vec())
        .with(keys.slow_ma, slow.to_vec())
        .with(keys.rsi, rsi.to_vec())
        .with(keys.atr, vec![0.0015])
}
