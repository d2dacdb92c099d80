//! Position sizers: translate a risk budget into an order volume.
//!
//! Both protocols start from the same budget (`equity * risk_percent / 100`)
//! and differ in which quantity is fixed first:
//!
//! - [`SizingProtocol::StopDistanceFirst`] places absolute stop/target prices,
//!   derives volume from the rounded stop distance and rounds the volume down
//!   to the lot step. The stop is not moved afterwards.
//! - [`SizingProtocol::VolumeFirst`] derives volume from a volatility stop
//!   distance, rounds it down, then recomputes the stop distance from the
//!   rounded volume so the position risks exactly the budget.
//!
//! Sizers never decide entry or exit and never see open positions.

pub mod stop_first;
pub mod volume_first;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RiskParameters;
use crate::domain::{Instrument, OrderRequest, Protection, Quote, TradeDirection};

pub use stop_first::size_stop_first;
pub use volume_first::size_volume_first;

/// Reasons a cycle cannot produce a sized order.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RiskError {
    #[error("stop distance must be > 0 pips, got {0}")]
    NonPositiveStopDistance(f64),

    #[error("risk percent must be > 0, got {0}")]
    NonPositiveRiskPercent(f64),

    #[error("pip value must be > 0, got {0}")]
    NonPositivePipValue(f64),

    #[error("equity must be > 0, got {0}")]
    NonPositiveEquity(f64),

    #[error("volatility must be finite and > 0, got {0}")]
    NonPositiveVolatility(f64),

    #[error("stop/target multipliers must be > 0, got {stop}/{target}")]
    NonPositiveMultiplier { stop: f64, target: f64 },

    #[error("volume {volume} rounds below the instrument minimum {minimum}")]
    VolumeBelowMinimum { volume: f64, minimum: f64 },
}

/// Account-currency amount a single trade may lose.
pub fn risk_amount(equity: f64, risk_percent: f64) -> f64 {
    equity * risk_percent / 100.0
}

/// Volume that loses `risk_amount(equity, risk_percent)` when the stop is hit.
///
/// ```text
/// volume = equity * risk_percent / 100 / (stop_distance_pips * pip_value)
/// ```
///
/// The result is not rounded to a lot step.
pub fn size(
    equity: f64,
    risk_percent: f64,
    stop_distance_pips: f64,
    pip_value: f64,
) -> Result<f64, RiskError> {
    if !(stop_distance_pips > 0.0 && stop_distance_pips.is_finite()) {
        return Err(RiskError::NonPositiveStopDistance(stop_distance_pips));
    }
    if !(risk_percent > 0.0) {
        return Err(RiskError::NonPositiveRiskPercent(risk_percent));
    }
    if !(pip_value > 0.0) {
        return Err(RiskError::NonPositivePipValue(pip_value));
    }
    if !(equity > 0.0) {
        return Err(RiskError::NonPositiveEquity(equity));
    }
    Ok(risk_amount(equity, risk_percent) / (stop_distance_pips * pip_value))
}

/// Market state a sizer works from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingInputs {
    pub direction: TradeDirection,
    pub quote: Quote,
    /// Volatility measure (ATR) in price units.
    pub volatility: f64,
    pub equity: f64,
}

/// Volume and protection levels ready to be turned into an [`OrderRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizedOrder {
    pub volume: f64,
    pub stop: Protection,
    pub target: Protection,
    /// Stop distance the volume was sized against.
    pub stop_pips: f64,
    /// Budget the order was sized for.
    pub risk_amount: f64,
}

impl SizedOrder {
    /// Loss if the stop is hit at exactly `stop_pips`.
    pub fn realized_risk(&self, pip_value: f64) -> f64 {
        self.volume * self.stop_pips * pip_value
    }

    pub fn into_request(
        self,
        symbol: impl Into<String>,
        direction: TradeDirection,
        label: impl Into<String>,
    ) -> OrderRequest {
        OrderRequest {
            symbol: symbol.into(),
            direction,
            volume: self.volume,
            stop: self.stop,
            target: self.target,
            label: label.into(),
        }
    }
}

/// Reject a lot-step-rounded volume the venue would refuse.
pub(crate) fn check_volume(
    instrument: &Instrument,
    raw: f64,
    rounded: f64,
) -> Result<(), RiskError> {
    if instrument.is_tradeable_volume(rounded) {
        Ok(())
    } else {
        Err(RiskError::VolumeBelowMinimum {
            volume: raw,
            minimum: instrument.volume_min,
        })
    }
}

/// Sizing protocol. Selected once from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingProtocol {
    #[default]
    StopDistanceFirst,
    VolumeFirst,
}

impl SizingProtocol {
    pub fn name(&self) -> &'static str {
        match self {
            SizingProtocol::StopDistanceFirst => "stop_distance_first",
            SizingProtocol::VolumeFirst => "volume_first",
        }
    }

    pub fn size_order(
        &self,
        inputs: &SizingInputs,
        instrument: &Instrument,
        risk: &RiskParameters,
    ) -> Result<SizedOrder, RiskError> {
        match self {
            SizingProtocol::StopDistanceFirst => size_stop_first(inputs, instrument, risk),
            SizingProtocol::VolumeFirst => size_volume_first(inputs, instrument, risk),
        }
    }
}
