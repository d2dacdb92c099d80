//! Stop-distance-first sizing.
//!
//! Stop and target are placed as absolute prices from the reference quote.
//! Volume comes from the distance between the reference and the *rounded*
//! stop, then is floored to the lot step. Flooring only shrinks the position,
//! so realized risk stays at or under the budget without moving the stop.

use crate::config::RiskParameters;
use crate::domain::{Instrument, Protection};
use crate::stops::{reference_price, stops_for};

use super::{check_volume, risk_amount, size, RiskError, SizedOrder, SizingInputs};

pub fn size_stop_first(
    inputs: &SizingInputs,
    instrument: &Instrument,
    risk: &RiskParameters,
) -> Result<SizedOrder, RiskError> {
    let reference = reference_price(inputs.direction, &inputs.quote);
    let levels = stops_for(
        inputs.direction,
        reference,
        inputs.volatility,
        risk.atr_stop_multiplier,
        risk.atr_target_multiplier,
        instrument.digits,
    )?;

    let stop_pips = instrument.to_pips(inputs.direction.sign() * (reference - levels.stop));
    let raw = size(inputs.equity, risk.risk_percent, stop_pips, instrument.pip_value)?;
    let volume = instrument.normalize_volume(raw);
    check_volume(instrument, raw, volume)?;

    Ok(SizedOrder {
        volume,
        stop: Protection::Price(levels.stop),
        target: Protection::Price(levels.target),
        stop_pips,
        risk_amount: risk_amount(inputs.equity, risk.risk_percent),
    })
}
