//! barclose runner: replays bar series through the decision engine.
//!
//! This crate builds on `barclose-core` to provide:
//! - CSV bar loading and seeded synthetic bars
//! - A paper venue with stop/target settlement and close events
//! - The replay loop and its serializable run summary
//! - JSON and CSV export of run artifacts

pub mod data_loader;
pub mod export;
pub mod marker;
pub mod paper;
pub mod replay;
pub mod synthetic;

pub use data_loader::{load_bars_csv, parse_bars_csv, LoadError};
pub use export::{import_summary, summary_json, trades_csv, ExportError};
pub use marker::RecordingMarker;
pub use paper::PaperVenue;
pub use replay::{Replay, ReplayError, ReplayOptions, ReplaySummary, SignalCounts};
pub use synthetic::synthetic_bars;
