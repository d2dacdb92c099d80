use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tolerance applied before flooring a volume to its lot step, so that
/// `2.9999999999` lots of a `1.0` step is treated as 3 rather than 2.
const VOLUME_EPSILON: f64 = 1e-9;

/// Decimal places kept on a normalized volume.
const VOLUME_DIGITS: u32 = 8;

/// Round `value` to `digits` decimal places.
///
/// Used for every price the engine hands to the venue. Applying it twice is a
/// no-op: `round_to_precision(round_to_precision(x, p), p) == round_to_precision(x, p)`.
pub fn round_to_precision(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (value * factor).round() / factor
}

/// Instrument metadata: price precision, pip geometry and lot constraints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Instrument {
    pub symbol: String,
    /// Price precision in decimal places (5 for EURUSD).
    pub digits: u32,
    /// Price increment of one pip (0.0001 for EURUSD).
    pub pip_size: f64,
    /// Account-currency value of one pip per unit of volume.
    pub pip_value: f64,
    /// Smallest tradeable volume increment.
    #[serde(default = "unit_volume")]
    pub volume_step: f64,
    #[serde(default = "unit_volume")]
    pub volume_min: f64,
    #[serde(default = "unbounded_volume")]
    pub volume_max: f64,
}

fn unit_volume() -> f64 {
    1.0
}

fn unbounded_volume() -> f64 {
    f64::MAX
}

impl Instrument {
    /// Create an instrument with a unit lot step and no upper volume bound.
    pub fn new(symbol: impl Into<String>, digits: u32, pip_size: f64, pip_value: f64) -> Self {
        Self {
            symbol: symbol.into(),
            digits,
            pip_size,
            pip_value,
            volume_step: unit_volume(),
            volume_min: unit_volume(),
            volume_max: unbounded_volume(),
        }
    }

    pub fn with_volume_limits(mut self, step: f64, min: f64, max: f64) -> Self {
        self.volume_step = step;
        self.volume_min = min;
        self.volume_max = max;
        self
    }

    /// Round a price to the instrument's precision.
    pub fn normalize_price(&self, price: f64) -> f64 {
        round_to_precision(price, self.digits)
    }

    /// Convert a price distance into pips.
    pub fn to_pips(&self, distance: f64) -> f64 {
        distance / self.pip_size
    }

    /// Convert a pip count into a price distance.
    pub fn from_pips(&self, pips: f64) -> f64 {
        pips * self.pip_size
    }

    /// Floor a volume to the lot step and clamp it to `volume_max`. Flooring
    /// never risks more than requested.
    ///
    /// The result may fall below `volume_min`; callers decide whether that is
    /// an error (see [`Instrument::is_tradeable_volume`]).
    pub fn normalize_volume(&self, volume: f64) -> f64 {
        if !volume.is_finite() || volume <= 0.0 {
            return 0.0;
        }
        let rounded_steps = (volume / self.volume_step + VOLUME_EPSILON).floor();
        let snapped = round_to_precision(rounded_steps * self.volume_step, VOLUME_DIGITS);
        snapped.min(self.volume_max)
    }

    pub fn is_tradeable_volume(&self, volume: f64) -> bool {
        volume > 0.0 && volume >= self.volume_min && volume <= self.volume_max
    }

    /// Reject metadata that would make price or volume arithmetic meaningless.
    pub fn validate(&self) -> Result<(), InstrumentError> {
        if self.symbol.trim().is_empty() {
            return Err(InstrumentError::EmptySymbol);
        }
        if !(self.pip_size > 0.0 && self.pip_size.is_finite()) {
            return Err(InstrumentError::InvalidPipSize(self.pip_size));
        }
        if !(self.pip_value > 0.0 && self.pip_value.is_finite()) {
            return Err(InstrumentError::InvalidPipValue(self.pip_value));
        }
        if self.digits > 10 {
            return Err(InstrumentError::InvalidDigits(self.digits));
        }
        if self.volume_step.is_nan()
            || self.volume_step <= 0.0
            || self.volume_min < 0.0
            || self.volume_max < self.volume_min
        {
            return Err(InstrumentError::InvalidVolumeLimits {
                step: self.volume_step,
                min: self.volume_min,
                max: self.volume_max,
            });
        }
        Ok(())
    }
}

/// Best bid/ask at cycle time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub bid: f64,
    pub ask: f64,
}

impl Quote {
    pub fn new(bid: f64, ask: f64) -> Self {
        Self { bid, ask }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum InstrumentError {
    #[error("instrument symbol is empty")]
    EmptySymbol,

    #[error("pip_size must be > 0, got {0}")]
    InvalidPipSize(f64),

    #[error("pip_value must be > 0, got {0}")]
    InvalidPipValue(f64),

    #[error("digits must be <= 10, got {0}")]
    InvalidDigits(u32),

    #[error("invalid volume limits: step {step}, min {min}, max {max}")]
    InvalidVolumeLimits { step: f64, min: f64, max: f64 },
}
