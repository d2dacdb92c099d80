//! Ports to the host trading platform.
//!
//! The engine owns none of the state behind these traits. It reads account
//! and position state once per cycle and issues close/submit requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Instrument, OrderRequest, Position, PositionId, Quote, TradeDirection};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum VenueError {
    #[error("order rejected: {0}")]
    Rejected(String),

    #[error("position {0} not found")]
    UnknownPosition(PositionId),

    #[error("unknown instrument '{0}'")]
    UnknownInstrument(String),

    #[error("no quote for '{0}'")]
    NoQuote(String),
}

/// Read side of the venue: balance, instrument metadata, quotes, positions.
pub trait Account {
    fn balance(&self) -> f64;

    fn instrument(&self, symbol: &str) -> Result<Instrument, VenueError>;

    fn quote(&self, symbol: &str) -> Result<Quote, VenueError>;

    /// Positions currently open on `symbol`.
    fn open_positions(&self, symbol: &str) -> Vec<Position>;

    fn pip_value(&self, symbol: &str) -> Result<f64, VenueError> {
        Ok(self.instrument(symbol)?.pip_value)
    }

    fn price_precision(&self, symbol: &str) -> Result<u32, VenueError> {
        Ok(self.instrument(symbol)?.digits)
    }
}

/// Write side of the venue. Calls are synchronous: a returned `Ok` means the
/// venue has applied the request.
pub trait OrderExecution {
    fn submit(&mut self, request: &OrderRequest) -> Result<PositionId, VenueError>;

    fn close(&mut self, position: &Position) -> Result<(), VenueError>;
}

/// A full venue.
pub trait Venue: Account + OrderExecution {}

impl<T: Account + OrderExecution> Venue for T {}

/// Chart annotation drawn instead of an order when trading is disabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalMarker {
    /// `BuySignal<n>` / `SellSignal<n>`, n = bars seen so far.
    pub name: String,
    pub direction: TradeDirection,
    pub time: DateTime<Utc>,
    pub price: f64,
}

impl SignalMarker {
    pub fn new(direction: TradeDirection, bar_count: usize, time: DateTime<Utc>, price: f64) -> Self {
        Self {
            name: format!("{direction}Signal{bar_count}"),
            direction,
            time,
            price,
        }
    }
}

pub trait ChartMarker {
    fn mark(&mut self, marker: SignalMarker);
}

/// Marker sink for hosts without a chart.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMarker;

impl ChartMarker for NoopMarker {
    fn mark(&mut self, _marker: SignalMarker) {}
}
