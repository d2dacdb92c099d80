//! Engine configuration.
//!
//! One TOML document with `[instrument]`, `[strategy]`, `[indicators]` and
//! `[risk]` tables. Every field has a default, so an empty document is a
//! valid configuration. The configuration is read once at start-up and never
//! reloaded.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::domain::{Instrument, InstrumentError};
use crate::indicators::{HigherTimeframeEma, MaType, StochasticLine, Timeframe};
use crate::reconcile::ExposurePolicy;
use crate::signal::SignalRule;
use crate::sizers::SizingProtocol;

/// Names of the built-in presets accepted by [`EngineConfig::preset`].
pub const PRESETS: [&str; 3] = ["ma_rsi_crossover", "ma_rsi_confirmed", "stochastic_ema"];

/// Upper bound on indicator periods and the RSI persistence lookback.
pub const MAX_LOOKBACK: usize = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(String),

    #[error("invalid instrument: {0}")]
    Instrument(#[from] InstrumentError),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Complete configuration for one engine instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub instrument: Instrument,
    pub strategy: StrategySettings,
    pub indicators: IndicatorSettings,
    pub risk: RiskParameters,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            instrument: Instrument::new("EURUSD", 5, 0.0001, 0.0001).with_volume_limits(
                1000.0,
                1000.0,
                10_000_000.0,
            ),
            strategy: StrategySettings::default(),
            indicators: IndicatorSettings::default(),
            risk: RiskParameters::default(),
        }
    }
}

/// Which rule, sizing protocol and exposure policy the engine runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySettings {
    pub rule: SignalRule,
    pub sizing: SizingProtocol,
    pub exposure: ExposurePolicy,
    /// Order label. When unset, orders are labelled "Buy" / "Sell".
    pub label: Option<String>,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            rule: SignalRule::SimpleCrossover,
            sizing: SizingProtocol::StopDistanceFirst,
            exposure: ExposurePolicy::PerDirection,
            label: None,
        }
    }
}

/// Indicator periods and signal levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSettings {
    pub fast_period: usize,
    pub slow_period: usize,
    pub ma_type: MaType,
    pub rsi_period: usize,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub atr_period: usize,
    pub stoch_k_period: usize,
    pub stoch_d_period: usize,
    pub stoch_slowing: usize,
    pub stoch_overbought: f64,
    pub stoch_oversold: f64,
    pub ema_period: usize,
    pub ema_timeframe: Timeframe,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            fast_period: 10,
            slow_period: 50,
            ma_type: MaType::Sma,
            rsi_period: 14,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            atr_period: 14,
            stoch_k_period: 8,
            stoch_d_period: 3,
            stoch_slowing: 3,
            stoch_overbought: 70.0,
            stoch_oversold: 30.0,
            ema_period: 50,
            ema_timeframe: Timeframe::Hour,
        }
    }
}

/// Snapshot keys derived from [`IndicatorSettings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorKeys {
    pub fast_ma: String,
    pub slow_ma: String,
    pub rsi: String,
    pub atr: String,
    pub stoch_k: String,
    pub stoch_d: String,
    pub trend_ema: String,
}

impl IndicatorSettings {
    pub fn keys(&self) -> IndicatorKeys {
        let (k, d, s) = (self.stoch_k_period, self.stoch_d_period, self.stoch_slowing);
        IndicatorKeys {
            fast_ma: self.ma_type.key(self.fast_period),
            slow_ma: self.ma_type.key(self.slow_period),
            rsi: format!("rsi_{}", self.rsi_period),
            atr: format!("atr_{}", self.atr_period),
            stoch_k: StochasticLine::K.key(k, d, s),
            stoch_d: StochasticLine::D.key(k, d, s),
            trend_ema: HigherTimeframeEma::key(self.ema_period, self.ema_timeframe),
        }
    }
}

/// Per-trade risk settings. Immutable for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskParameters {
    /// Percent of balance risked per trade (1.0 = 1%).
    pub risk_percent: f64,
    pub atr_stop_multiplier: f64,
    pub atr_target_multiplier: f64,
    /// Bars the RSI must stay beyond its level before a crossover counts.
    pub rsi_lookback: usize,
    /// Close opposing positions when a reversal signal fires.
    pub close_on_reversal: bool,
    /// When false, entry signals are drawn as chart markers instead of orders.
    pub trading_enabled: bool,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            risk_percent: 1.0,
            atr_stop_multiplier: 2.0,
            atr_target_multiplier: 2.0,
            rsi_lookback: 5,
            close_on_reversal: true,
            trading_enabled: true,
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Built-in configurations mirroring the three reference strategies.
    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        match name {
            "ma_rsi_crossover" => {}
            "ma_rsi_confirmed" => {
                config.strategy.rule = SignalRule::ConfirmedCrossover;
            }
            "stochastic_ema" => {
                config.strategy = StrategySettings {
                    rule: SignalRule::StochasticEma,
                    sizing: SizingProtocol::VolumeFirst,
                    exposure: ExposurePolicy::Single,
                    label: Some("StochasticCrossover".into()),
                };
                config.risk.atr_stop_multiplier = 1.0;
                config.risk.atr_target_multiplier = 3.0;
                config.risk.close_on_reversal = false;
            }
            other => return Err(ConfigError::UnknownPreset(other.to_string())),
        }
        Ok(config)
    }

    /// Reject settings no run could trade with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.instrument.validate()?;

        let ind = &self.indicators;
        for (field, period) in [
            ("indicators.fast_period", ind.fast_period),
            ("indicators.slow_period", ind.slow_period),
            ("indicators.rsi_period", ind.rsi_period),
            ("indicators.atr_period", ind.atr_period),
            ("indicators.stoch_k_period", ind.stoch_k_period),
            ("indicators.stoch_d_period", ind.stoch_d_period),
            ("indicators.stoch_slowing", ind.stoch_slowing),
            ("indicators.ema_period", ind.ema_period),
        ] {
            if period == 0 {
                return Err(invalid(field, "period must be >= 1"));
            }
            if period > MAX_LOOKBACK {
                return Err(invalid(
                    field,
                    format!("period {period} exceeds {MAX_LOOKBACK}"),
                ));
            }
        }
        if ind.fast_period >= ind.slow_period {
            return Err(invalid(
                "indicators.fast_period",
                format!(
                    "fast period {} must be shorter than slow period {}",
                    ind.fast_period, ind.slow_period
                ),
            ));
        }
        check_levels("indicators.rsi_oversold", ind.rsi_oversold, ind.rsi_overbought)?;
        check_levels(
            "indicators.stoch_oversold",
            ind.stoch_oversold,
            ind.stoch_overbought,
        )?;

        let risk = &self.risk;
        if risk.rsi_lookback > MAX_LOOKBACK {
            return Err(invalid(
                "risk.rsi_lookback",
                format!("lookback {} exceeds {MAX_LOOKBACK}", risk.rsi_lookback),
            ));
        }
        if !(risk.risk_percent > 0.0 && risk.risk_percent <= 100.0) {
            return Err(invalid(
                "risk.risk_percent",
                format!("must be in (0, 100], got {}", risk.risk_percent),
            ));
        }
        if !(risk.atr_stop_multiplier > 0.0 && risk.atr_stop_multiplier.is_finite()) {
            return Err(invalid(
                "risk.atr_stop_multiplier",
                format!("must be > 0, got {}", risk.atr_stop_multiplier),
            ));
        }
        if !(risk.atr_target_multiplier > 0.0 && risk.atr_target_multiplier.is_finite()) {
            return Err(invalid(
                "risk.atr_target_multiplier",
                format!("must be > 0, got {}", risk.atr_target_multiplier),
            ));
        }

        if let Some(label) = &self.strategy.label {
            if label.trim().is_empty() {
                return Err(invalid("strategy.label", "must not be blank"));
            }
        }
        Ok(())
    }

    /// BLAKE3 hash of the canonical JSON form, for identifying runs.
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let json =
            serde_json::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

fn check_levels(field: &'static str, oversold: f64, overbought: f64) -> Result<(), ConfigError> {
    let in_range = |v: f64| (0.0..=100.0).contains(&v);
    if !(in_range(oversold) && in_range(overbought) && oversold < overbought) {
        return Err(invalid(
            field,
            format!("need 0 <= oversold < overbought <= 100, got {oversold}/{overbought}"),
        ));
    }
    Ok(())
}
