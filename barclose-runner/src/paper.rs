//! Paper venue: an in-memory account that fills at the last close.
//!
//! Market orders fill immediately at the ask (Long) or bid (Short). Stops and
//! targets are checked against each new bar's range before the quote moves
//! to that bar's close; when a bar touches both, the stop wins.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use barclose_core::domain::{
    Bar, Instrument, OrderRequest, Position, PositionId, Quote, TradeDirection,
};
use barclose_core::engine::{Account, OrderExecution, VenueError};
use barclose_core::notify::{CloseReason, PositionClosed};

#[derive(Debug, Clone)]
pub struct PaperVenue {
    instrument: Instrument,
    balance: f64,
    spread_pips: f64,
    quote: Option<Quote>,
    now: DateTime<Utc>,
    positions: Vec<Position>,
    events: Vec<PositionClosed>,
    next_id: u64,
    reject_orders: bool,
    reject_closes: bool,
}

impl PaperVenue {
    pub fn new(instrument: Instrument, balance: f64, spread_pips: f64) -> Self {
        Self {
            instrument,
            balance,
            spread_pips: spread_pips.max(0.0),
            quote: None,
            now: DateTime::<Utc>::default(),
            positions: Vec::new(),
            events: Vec::new(),
            next_id: 1,
            reject_orders: false,
            reject_closes: false,
        }
    }

    /// Refuse every subsequent order.
    pub fn reject_orders(&mut self, reject: bool) {
        self.reject_orders = reject;
    }

    /// Refuse every subsequent close request.
    pub fn reject_closes(&mut self, reject: bool) {
        self.reject_closes = reject;
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Settle protective levels against `bar`, then quote its close.
    pub fn on_bar(&mut self, bar: &Bar) {
        self.now = bar.open_time;
        let mut still_open = Vec::with_capacity(self.positions.len());
        for position in std::mem::take(&mut self.positions) {
            match protective_hit(&position, bar) {
                Some((reason, price)) => self.realize(position, price, reason),
                None => still_open.push(position),
            }
        }
        self.positions = still_open;

        let bid = self.instrument.normalize_price(bar.close);
        let ask = self
            .instrument
            .normalize_price(bar.close + self.instrument.from_pips(self.spread_pips));
        self.quote = Some(Quote::new(bid, ask));
    }

    /// Close events since the last call, oldest first.
    pub fn take_events(&mut self) -> Vec<PositionClosed> {
        std::mem::take(&mut self.events)
    }

    fn realize(&mut self, position: Position, exit_price: f64, reason: CloseReason) {
        let moved = position.favorable_move(exit_price);
        let profit_loss =
            self.instrument.to_pips(moved) * self.instrument.pip_value * position.volume;
        self.balance += profit_loss;
        info!(
            position = %position.id,
            direction = %position.direction,
            exit_price,
            profit_loss,
            %reason,
            balance = self.balance,
            "position closed"
        );
        self.events.push(PositionClosed {
            position_id: position.id,
            symbol: position.symbol,
            direction: position.direction,
            volume: position.volume,
            entry_price: position.entry_price,
            exit_price,
            profit_loss,
            reason,
            close_time: self.now,
        });
    }

    fn current_quote(&self) -> Result<Quote, VenueError> {
        self.quote
            .ok_or_else(|| VenueError::NoQuote(self.instrument.symbol.clone()))
    }
}

/// Exit reason and price if `bar` reaches a stop or target. Stop first.
fn protective_hit(position: &Position, bar: &Bar) -> Option<(CloseReason, f64)> {
    let (stop_hit, target_hit) = match position.direction {
        TradeDirection::Long => (
            position.stop_price.filter(|&s| bar.low <= s),
            position.target_price.filter(|&t| bar.high >= t),
        ),
        TradeDirection::Short => (
            position.stop_price.filter(|&s| bar.high >= s),
            position.target_price.filter(|&t| bar.low <= t),
        ),
    };
    stop_hit
        .map(|p| (CloseReason::StopLoss, p))
        .or_else(|| target_hit.map(|p| (CloseReason::TakeProfit, p)))
}

impl Account for PaperVenue {
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

    fn quote(&self, symbol: &str) -> Result<Quote, VenueError> {
        self.instrument(symbol)?;
        self.current_quote()
    }

    fn open_positions(&self, symbol: &str) -> Vec<Position> {
        self.positions
            .iter()
            .filter(|p| p.symbol == symbol)
            .cloned()
            .collect()
    }
}

impl OrderExecution for PaperVenue {
    fn submit(&mut self, request: &OrderRequest) -> Result<PositionId, VenueError> {
        if self.reject_orders {
            return Err(VenueError::Rejected("paper venue is rejecting orders".into()));
        }
        self.instrument(&request.symbol)?;
        if !self.instrument.is_tradeable_volume(request.volume) {
            return Err(VenueError::Rejected(format!(
                "volume {} outside [{}, {}]",
                request.volume, self.instrument.volume_min, self.instrument.volume_max
            )));
        }

        let quote = self.current_quote()?;
        let fill = match request.direction {
            TradeDirection::Long => quote.ask,
            TradeDirection::Short => quote.bid,
        };
        let pip = self.instrument.pip_size;
        let stop = request.stop.resolve(request.direction, fill, pip, true);
        let target = request.target.resolve(request.direction, fill, pip, false);

        let id = PositionId(self.next_id);
        self.next_id += 1;
        let position = Position {
            id,
            symbol: request.symbol.clone(),
            direction: request.direction,
            volume: request.volume,
            entry_price: fill,
            stop_price: Some(self.instrument.normalize_price(stop)),
            target_price: Some(self.instrument.normalize_price(target)),
            open_time: self.now,
            label: request.label.clone(),
        };
        debug!(position = %id, fill, ?position.stop_price, ?position.target_price, "filled");
        self.positions.push(position);
        Ok(id)
    }

    fn close(&mut self, position: &Position) -> Result<(), VenueError> {
        if self.reject_closes {
            return Err(VenueError::Rejected("paper venue is rejecting closes".into()));
        }
        let idx = self
            .positions
            .iter()
            .position(|p| p.id == position.id)
            .ok_or(VenueError::UnknownPosition(position.id))?;
        let quote = self.current_quote()?;
        let open = self.positions.remove(idx);
        let exit = match open.direction {
            TradeDirection::Long => quote.bid,
            TradeDirection::Short => quote.ask,
        };
        self.realize(open, exit, CloseReason::Closed);
        Ok(())
    }
}
