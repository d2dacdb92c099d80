use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::PositionId;

/// Direction of an open exposure or an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeDirection {
    Long,
    Short,
}

impl TradeDirection {
    pub fn opposite(&self) -> Self {
        match self {
            TradeDirection::Long => TradeDirection::Short,
            TradeDirection::Short => TradeDirection::Long,
        }
    }

    /// +1.0 for Long, -1.0 for Short.
    pub fn sign(&self) -> f64 {
        match self {
            TradeDirection::Long => 1.0,
            TradeDirection::Short => -1.0,
        }
    }
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeDirection::Long => write!(f, "Buy"),
            TradeDirection::Short => write!(f, "Sell"),
        }
    }
}

/// One open exposure as reported by the venue.
///
/// The engine never mutates positions; it reads the venue's view once per
/// cycle and asks the venue to close the ones it no longer wants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub symbol: String,
    pub direction: TradeDirection,
    pub volume: f64,
    pub entry_price: f64,
    pub stop_price: Option<f64>,
    pub target_price: Option<f64>,
    pub open_time: DateTime<Utc>,
    pub label: String,
}

impl Position {
    /// Signed price move in the position's favor.
    pub fn favorable_move(&self, exit_price: f64) -> f64 {
        self.direction.sign() * (exit_price - self.entry_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn position(direction: TradeDirection) -> Position {
        Position {
            id: PositionId(1),
            symbol: "EURUSD".into(),
            direction,
            volume: 10_000.0,
            entry_price: 1.1000,
            stop_price: Some(1.0970),
            target_price: Some(1.1030),
            open_time: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
            label: "Buy".into(),
        }
    }

    #[test]
    fn direction_opposite() {
        assert_eq!(TradeDirection::Long.opposite(), TradeDirection::Short);
        assert_eq!(TradeDirection::Short.opposite(), TradeDirection::Long);
    }

    #[test]
    fn direction_display_matches_order_labels() {
        assert_eq!(TradeDirection::Long.to_string(), "Buy");
        assert_eq!(TradeDirection::Short.to_string(), "Sell");
    }

    #[test]
    fn favorable_move_is_signed() {
        let long = position(TradeDirection::Long);
        assert!((long.favorable_move(1.1010) - 0.0010).abs() < 1e-12);
        let short = position(TradeDirection::Short);
        assert!((short.favorable_move(1.1010) + 0.0010).abs() < 1e-12);
    }
}
