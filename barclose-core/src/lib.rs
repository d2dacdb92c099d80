//! barclose core: bar-close trading decision engine.
//!
//! This crate contains the decision logic and the types around it:
//! - Domain types (bars, instruments, quotes, positions, order requests)
//! - Indicator snapshots and streaming indicators
//! - Signal rules (MA/RSI crossover, stochastic/EMA trend)
//! - Stop/target placement and the two risk-sizing protocols
//! - Position reconciliation and the bar-closed orchestrator
//! - Configuration, notifications and the engine error taxonomy

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod notify;
pub mod reconcile;
pub mod signal;
pub mod sizers;
pub mod snapshot;
pub mod stops;

pub use config::{ConfigError, EngineConfig, RiskParameters};
pub use engine::{BarClosedOrchestrator, CycleOutcome, CycleReport};
pub use error::EngineError;
