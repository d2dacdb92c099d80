//! Volume-first sizing.
//!
//! The volatility stop distance fixes a provisional volume. After flooring
//! that volume to the lot step, the stop distance is recomputed as
//! `risk_amount / (volume * pip_value)`, which widens the stop just enough
//! that a stop-out loses the budget and no more. Protection is sent as pip
//! distances from the fill.

use crate::config::RiskParameters;
use crate::domain::{Instrument, Protection};
use crate::stops::pip_distances;

use super::{check_volume, risk_amount, size, RiskError, SizedOrder, SizingInputs};

pub fn size_volume_first(
    inputs: &SizingInputs,
    instrument: &Instrument,
    risk: &RiskParameters,
) -> Result<SizedOrder, RiskError> {
    let distances = pip_distances(
        inputs.volatility,
        risk.atr_stop_multiplier,
        risk.atr_target_multiplier,
        instrument.pip_size,
    )?;

    let raw = size(
        inputs.equity,
        risk.risk_percent,
        distances.stop_pips,
        instrument.pip_value,
    )?;
    let volume = instrument.normalize_volume(raw);
    check_volume(instrument, raw, volume)?;

    let budget = risk_amount(inputs.equity, risk.risk_percent);
    let stop_pips = budget / (volume * instrument.pip_value);

    Ok(SizedOrder {
        volume,
        stop: Protection::Pips(stop_pips),
        target: Protection::Pips(distances.target_pips),
        stop_pips,
        risk_amount: budget,
    })
}
