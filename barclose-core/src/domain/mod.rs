//! Domain types for the bar-close engine

pub mod bar;
pub mod ids;
pub mod instrument;
pub mod order;
pub mod position;

pub use bar::Bar;
pub use ids::PositionId;
pub use instrument::{round_to_precision, Instrument, InstrumentError, Quote};
pub use order::{OrderRequest, Protection};
pub use position::{Position, TradeDirection};

/// Symbol type alias
pub type Symbol = String;
