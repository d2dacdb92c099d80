use serde::{Deserialize, Serialize};

use super::position::TradeDirection;

/// Protective level attached to a market order.
///
/// The stop-distance-first protocol sends absolute prices; the volume-first
/// protocol sends pip distances measured from the fill price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Protection {
    Price(f64),
    Pips(f64),
}

impl Protection {
    /// Absolute price for this level given the fill price.
    pub fn resolve(
        &self,
        direction: TradeDirection,
        fill_price: f64,
        pip_size: f64,
        is_stop: bool,
    ) -> f64 {
        match *self {
            Protection::Price(price) => price,
            Protection::Pips(pips) => {
                // Stops sit against the trade, targets with it.
                let side = if is_stop { -1.0 } else { 1.0 };
                fill_price + side * direction.sign() * pips * pip_size
            }
        }
    }
}

/// Market order the engine hands to the execution venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub direction: TradeDirection,
    pub volume: f64,
    pub stop: Protection,
    pub target: Protection,
    pub label: String,
}
