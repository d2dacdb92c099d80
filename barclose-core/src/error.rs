//! Engine error taxonomy.
//!
//! Every failure inside a bar-close cycle surfaces as one of these variants.
//! None of them is fatal: the cycle ends and the next bar is the retry point.

use thiserror::Error;

use crate::domain::{PositionId, TradeDirection};
use crate::engine::VenueError;
use crate::notify::NotifyError;
use crate::sizers::RiskError;
use crate::snapshot::SnapshotError;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Sizing or stop placement cannot produce a valid order.
    #[error("invalid risk: {0}")]
    InvalidRisk(#[from] RiskError),

    /// The snapshot lacks a value a rule or sizer needs.
    #[error("missing indicator history: {0}")]
    MissingIndicatorHistory(#[from] SnapshotError),

    /// The venue refused a close or an order.
    #[error("dispatch failed ({action}): {source}")]
    DispatchFailure {
        action: DispatchAction,
        #[source]
        source: VenueError,
    },

    /// A position-closed notification could not be delivered.
    #[error("notification for position {position} failed: {source}")]
    NotificationFailure {
        position: PositionId,
        #[source]
        source: NotifyError,
    },
}

/// Venue call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchAction {
    Close(PositionId),
    Open(TradeDirection),
    /// Reading account state before acting.
    Query,
}

impl std::fmt::Display for DispatchAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchAction::Close(id) => write!(f, "close {id}"),
            DispatchAction::Open(direction) => write!(f, "open {direction}"),
            DispatchAction::Query => write!(f, "account query"),
        }
    }
}

impl EngineError {
    pub fn dispatch(action: DispatchAction, source: VenueError) -> Self {
        EngineError::DispatchFailure { action, source }
    }

    /// Short stable name, used as a counter key in run summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::InvalidRisk(_) => "invalid_risk",
            EngineError::MissingIndicatorHistory(_) => "missing_indicator_history",
            EngineError::DispatchFailure { .. } => "dispatch_failure",
            EngineError::NotificationFailure { .. } => "notification_failure",
        }
    }
}
