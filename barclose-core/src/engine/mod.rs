//! Bar-close engine: the orchestrator and the ports it drives.
//!
//! Once per closed bar the orchestrator runs, in order:
//!
//! 1. Signal evaluation against the bar's indicator snapshot
//! 2. Reconciliation against the venue's open positions
//! 3. Reversal closes
//! 4. Sizing and stop placement from the post-close balance
//! 5. Order submission, or a chart marker when trading is disabled

pub mod orchestrator;
pub mod ports;

pub use orchestrator::{BarClosedOrchestrator, CycleOutcome, CycleReport};
pub use ports::{Account, ChartMarker, NoopMarker, OrderExecution, SignalMarker, Venue, VenueError};
