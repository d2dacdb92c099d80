//! Position reconciler: decides what a signal means given open positions.
//!
//! Per (instrument, direction) the state is Flat or Open:
//!
//! - Flat + matching signal + trading enabled → open.
//! - Open + opposing signal + reversal close → close, then the new direction
//!   is evaluated from Flat in the same cycle.
//! - Open + matching signal → nothing (never a second position).
//! - Flat + matching signal + trading disabled → chart marker only.
//!
//! Reconciliation is pure: it reads a frozen view of the venue's positions
//! and returns a [`DispatchPlan`]. The orchestrator carries the plan out.

use serde::{Deserialize, Serialize};

use crate::config::RiskParameters;
use crate::domain::{Position, TradeDirection};
use crate::signal::Signal;

/// Which existing positions block a new open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposurePolicy {
    /// At most one position per direction on the instrument.
    #[default]
    PerDirection,
    /// At most one position in total carrying the strategy label.
    Single,
}

/// Actions for one cycle, in execution order: closes first, then the open.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchPlan {
    pub closes: Vec<Position>,
    pub open: Option<TradeDirection>,
    /// Direction to mark on the chart instead of opening.
    pub marker: Option<TradeDirection>,
}

impl DispatchPlan {
    pub fn is_empty(&self) -> bool {
        self.closes.is_empty() && self.open.is_none() && self.marker.is_none()
    }
}

/// Strategy identity the reconciler filters positions by.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub symbol: &'a str,
    /// Fixed order label, if the strategy uses one.
    pub label: Option<&'a str>,
    pub exposure: ExposurePolicy,
}

impl Scope<'_> {
    fn owns(&self, position: &Position) -> bool {
        position.symbol == self.symbol
    }

    /// Positions this strategy may close or count against itself.
    fn manages(&self, position: &Position) -> bool {
        match (self.exposure, self.label) {
            (ExposurePolicy::Single, Some(label)) => position.label == label,
            _ => true,
        }
    }

    fn blocks(&self, position: &Position, direction: TradeDirection) -> bool {
        match self.exposure {
            ExposurePolicy::PerDirection => position.direction == direction,
            ExposurePolicy::Single => self.manages(position),
        }
    }
}

pub fn reconcile(
    signal: Signal,
    positions: &[Position],
    risk: &RiskParameters,
    scope: Scope<'_>,
) -> DispatchPlan {
    let Some(direction) = signal.direction() else {
        return DispatchPlan::default();
    };

    let ours = positions.iter().filter(|p| scope.owns(p));
    let (closes, remaining): (Vec<&Position>, Vec<&Position>) = ours.partition(|p| {
        risk.close_on_reversal && p.direction == direction.opposite() && scope.manages(p)
    });

    let blocked = remaining.iter().any(|p| scope.blocks(p, direction));

    let (open, marker) = match (blocked, risk.trading_enabled) {
        (true, _) => (None, None),
        (false, true) => (Some(direction), None),
        (false, false) => (None, Some(direction)),
    };

    DispatchPlan {
        closes: closes.into_iter().cloned().collect(),
        open,
        marker,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PositionId;
    use chrono::{TimeZone, Utc};

    fn position(id: u64, symbol: &str, direction: TradeDirection, label: &str) -> Position {
        Position {
            id: PositionId(id),
            symbol: symbol.into(),
            direction,
            volume: 10_000.0,
            entry_price: 1.1,
            stop_price: None,
            target_price: None,
            open_time: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            label: label.into(),
        }
    }

    fn scope() -> Scope<'static> {
        Scope {
            symbol: "EURUSD",
            label: None,
            exposure: ExposurePolicy::PerDirection,
        }
    }

    #[test]
    fn no_signal_is_empty_plan() {
        let open = [position(1, "EURUSD", TradeDirection::Short, "Sell")];
        let plan = reconcile(Signal::None, &open, &RiskParameters::default(), scope());
        assert!(plan.is_empty());
    }

    #[test]
    fn flat_buy_opens_long() {
        let plan = reconcile(Signal::Buy, &[], &RiskParameters::default(), scope());
        assert!(plan.closes.is_empty());
        assert_eq!(plan.open, Some(TradeDirection::Long));
        assert_eq!(plan.marker, None);
    }

    #[test]
    fn duplicate_is_suppressed() {
        let open = [position(1, "EURUSD", TradeDirection::Long, "Buy")];
        let plan = reconcile(Signal::Buy, &open, &RiskParameters::default(), scope());
        assert!(plan.is_empty());
    }

    #[test]
    fn reversal_closes_then_opens() {
        let open = [position(7, "EURUSD", TradeDirection::Short, "Sell")];
        let plan = reconcile(Signal::Buy, &open, &RiskParameters::default(), scope());
        assert_eq!(plan.closes.len(), 1);
        assert_eq!(plan.closes[0].id, PositionId(7));
        assert_eq!(plan.open, Some(TradeDirection::Long));
    }

    #[test]
    fn reversal_disabled_keeps_opposite_and_opens() {
        let risk = RiskParameters {
            close_on_reversal: false,
            ..RiskParameters::default()
        };
        let open = [position(7, "EURUSD", TradeDirection::Short, "Sell")];
        let plan = reconcile(Signal::Buy, &open, &risk, scope());
        assert!(plan.closes.is_empty());
        assert_eq!(plan.open, Some(TradeDirection::Long));
    }

    #[test]
    fn other_symbols_are_ignored() {
        let open = [
            position(1, "GBPUSD", TradeDirection::Long, "Buy"),
            position(2, "GBPUSD", TradeDirection::Short, "Sell"),
        ];
        let plan = reconcile(Signal::Buy, &open, &RiskParameters::default(), scope());
        assert!(plan.closes.is_empty());
        assert_eq!(plan.open, Some(TradeDirection::Long));
    }

    #[test]
    fn trading_disabled_marks_but_still_closes() {
        let risk = RiskParameters {
            trading_enabled: false,
            ..RiskParameters::default()
        };
        let open = [position(3, "EURUSD", TradeDirection::Long, "Buy")];
        let plan = reconcile(Signal::Sell, &open, &risk, scope());
        assert_eq!(plan.closes.len(), 1);
        assert_eq!(plan.open, None);
        assert_eq!(plan.marker, Some(TradeDirection::Short));
    }

    #[test]
    fn trading_disabled_no_marker_when_already_open() {
        let risk = RiskParameters {
            trading_enabled: false,
            ..RiskParameters::default()
        };
        let open = [position(3, "EURUSD", TradeDirection::Short, "Sell")];
        let plan = reconcile(Signal::Sell, &open, &risk, scope());
        assert!(plan.is_empty());
    }

    #[test]
    fn single_exposure_blocks_any_labelled_position() {
        let risk = RiskParameters {
            close_on_reversal: false,
            ..RiskParameters::default()
        };
        let scope = Scope {
            symbol: "EURUSD",
            label: Some("StochasticCrossover"),
            exposure: ExposurePolicy::Single,
        };
        let open = [position(4, "EURUSD", TradeDirection::Short, "StochasticCrossover")];
        assert!(reconcile(Signal::Buy, &open, &risk, scope).is_empty());

        // A manual position without the label does not count.
        let manual = [position(5, "EURUSD", TradeDirection::Short, "manual")];
        let plan = reconcile(Signal::Buy, &manual, &risk, scope);
        assert_eq!(plan.open, Some(TradeDirection::Long));
    }

    #[test]
    fn single_exposure_with_reversal_closes_labelled_only() {
        let scope = Scope {
            symbol: "EURUSD",
            label: Some("Stoch"),
            exposure: ExposurePolicy::Single,
        };
        let open = [
            position(4, "EURUSD", TradeDirection::Short, "Stoch"),
            position(5, "EURUSD", TradeDirection::Short, "manual"),
        ];
        let plan = reconcile(Signal::Buy, &open, &RiskParameters::default(), scope);
        assert_eq!(plan.closes.len(), 1);
        assert_eq!(plan.closes[0].id, PositionId(4));
        assert_eq!(plan.open, Some(TradeDirection::Long));
    }
}
