//! Run artifacts: JSON summaries and a CSV trade tape.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use barclose_core::notify::PositionClosed;

use crate::replay::{ReplaySummary, SCHEMA_VERSION};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to flush CSV writer: {0}")]
    Flush(String),

    #[error("CSV output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported schema version {found} (max supported: {supported})")]
    SchemaVersion { found: u32, supported: u32 },
}

pub fn summary_json(summary: &ReplaySummary) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(summary)?)
}

/// Parse a summary, rejecting versions newer than this build writes.
pub fn import_summary(json: &str) -> Result<ReplaySummary, ExportError> {
    let summary: ReplaySummary = serde_json::from_str(json)?;
    if summary.schema_version > SCHEMA_VERSION {
        return Err(ExportError::SchemaVersion {
            found: summary.schema_version,
            supported: SCHEMA_VERSION,
        });
    }
    Ok(summary)
}

/// Trade tape, one row per closed position.
pub fn trades_csv(trades: &[PositionClosed]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "position",
        "symbol",
        "direction",
        "volume",
        "entry_price",
        "exit_price",
        "profit_loss",
        "reason",
        "close_time",
    ])?;
    for t in trades {
        wtr.write_record([
            &t.position_id.0.to_string(),
            &t.symbol,
            &t.direction.to_string(),
            &t.volume.to_string(),
            &format!("{:.6}", t.entry_price),
            &format!("{:.6}", t.exit_price),
            &format!("{:.2}", t.profit_loss),
            &t.reason.to_string(),
            &t.close_time.to_rfc3339(),
        ])?;
    }
    let data = wtr.into_inner().map_err(|e| ExportError::Flush(e.to_string()))?;
    Ok(String::from_utf8(data)?)
}

pub fn write_file(path: &Path, contents: &str) -> Result<(), ExportError> {
    fs::write(path, contents).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}
