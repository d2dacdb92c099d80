//! Stop/target calculator.
//!
//! Levels are derived from a volatility measure (ATR) times configured
//! multipliers. Prices are normalized exactly once, after the arithmetic:
//! rounding the reference price or the offset first would drift the stop
//! distance that volume sizing later reads back.

use serde::{Deserialize, Serialize};

use crate::domain::{round_to_precision, Quote, TradeDirection};
use crate::sizers::RiskError;

/// Absolute stop-loss and take-profit prices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopLevels {
    pub stop: f64,
    pub target: f64,
}

/// Stop-loss and take-profit distances in pips.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipDistances {
    pub stop_pips: f64,
    pub target_pips: f64,
}

/// Price a new position is measured from: bid for Long, ask for Short.
pub fn reference_price(direction: TradeDirection, quote: &Quote) -> f64 {
    match direction {
        TradeDirection::Long => quote.bid,
        TradeDirection::Short => quote.ask,
    }
}

fn check_inputs(volatility: f64, stop_mult: f64, target_mult: f64) -> Result<(), RiskError> {
    if !(volatility.is_finite() && volatility > 0.0) {
        return Err(RiskError::NonPositiveVolatility(volatility));
    }
    if !(stop_mult > 0.0 && target_mult > 0.0) {
        return Err(RiskError::NonPositiveMultiplier {
            stop: stop_mult,
            target: target_mult,
        });
    }
    Ok(())
}

/// Stop and target prices around `reference_price`, rounded to `price_precision` digits.
///
/// Long: stop below, target above. Short: mirrored.
pub fn stops_for(
    direction: TradeDirection,
    reference_price: f64,
    volatility: f64,
    stop_mult: f64,
    target_mult: f64,
    price_precision: u32,
) -> Result<StopLevels, RiskError> {
    check_inputs(volatility, stop_mult, target_mult)?;

    let sign = direction.sign();
    let stop = reference_price - sign * volatility * stop_mult;
    let target = reference_price + sign * volatility * target_mult;

    Ok(StopLevels {
        stop: round_to_precision(stop, price_precision),
        target: round_to_precision(target, price_precision),
    })
}

/// Stop and target distances in pips, for venues that take relative protection.
pub fn pip_distances(
    volatility: f64,
    stop_mult: f64,
    target_mult: f64,
    pip_size: f64,
) -> Result<PipDistances, RiskError> {
    check_inputs(volatility, stop_mult, target_mult)?;
    Ok(PipDistances {
        stop_pips: volatility * stop_mult / pip_size,
        target_pips: volatility * target_mult / pip_size,
    })
}
