//! Position-closed notifications.
//!
//! Delivery is best effort. A failing notifier is logged and otherwise
//! ignored; it can never change what the engine trades.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{PositionId, TradeDirection};
use crate::error::EngineError;

/// Why a position left the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    StopLoss,
    TakeProfit,
    /// Closed on request (reversal or manual).
    Closed,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::StopLoss => write!(f, "StopLoss"),
            CloseReason::TakeProfit => write!(f, "TakeProfit"),
            CloseReason::Closed => write!(f, "Closed"),
        }
    }
}

/// Event payload emitted by the venue when a position is closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionClosed {
    pub position_id: PositionId,
    pub symbol: String,
    pub direction: TradeDirection,
    pub volume: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    /// Realized profit or loss in account currency.
    pub profit_loss: f64,
    pub reason: CloseReason,
    pub close_time: DateTime<Utc>,
}

impl PositionClosed {
    pub fn subject(&self) -> String {
        format!("Position Closed: {}", self.direction)
    }

    pub fn body(&self) -> String {
        format!(
            "Position {} closed.\nSymbol: {}\nVolume: {}\nProfit/Loss: {:.2}\nClosed by: {}",
            self.direction, self.symbol, self.volume, self.profit_loss, self.reason
        )
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Unavailable(String),

    #[error("notification rejected: {0}")]
    Rejected(String),
}

/// Outbound notification channel (email, chat, ...).
pub trait Notifier: Send + Sync {
    fn notify(&self, event: &PositionClosed) -> Result<(), NotifyError>;

    fn name(&self) -> &str;
}

/// Writes every notification to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: &PositionClosed) -> Result<(), NotifyError> {
        info!(
            position = %event.position_id,
            symbol = %event.symbol,
            profit_loss = event.profit_loss,
            reason = %event.reason,
            subject = %event.subject(),
            "position closed"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Send `event` through `notifier`, mapping failures into the engine taxonomy.
pub fn try_deliver(notifier: &dyn Notifier, event: &PositionClosed) -> Result<(), EngineError> {
    notifier
        .notify(event)
        .map_err(|source| EngineError::NotificationFailure {
            position: event.position_id,
            source,
        })
}

/// Send `event` and discard any failure after logging it.
///
/// Returns whether delivery succeeded, for run statistics.
pub fn deliver(notifier: &dyn Notifier, event: &PositionClosed) -> bool {
    match try_deliver(notifier, event) {
        Ok(()) => true,
        Err(err) => {
            warn!(notifier = notifier.name(), error = %err, "notification dropped");
            false
        }
    }
}
