//! Bar loading from CSV files.
//!
//! Expected header: `time,open,high,low,close,volume`. Times are RFC 3339
//! (`2024-01-02T09:00:00Z`) or naive `%Y-%m-%d %H:%M:%S`, read as UTC.
//! Rows must be strictly increasing in time; a replay over unordered bars
//! would feed indicators out of sequence.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use barclose_core::domain::Bar;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: unparseable time '{value}'")]
    BadTime { row: usize, value: String },

    #[error("row {row}: bar at {current} does not follow {previous}")]
    NotIncreasing {
        row: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    #[error("row {row}: inconsistent OHLC values")]
    InsaneBar { row: usize },

    #[error("no bars in input")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    time: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

/// Load bars from a CSV file.
pub fn load_bars_csv(path: &Path) -> Result<Vec<Bar>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let bars = parse_bars_csv(file)?;
    debug!(path = %path.display(), bars = bars.len(), "bars loaded");
    Ok(bars)
}

/// Parse bars from any CSV reader. Row numbers in errors are 1-based data rows.
pub fn parse_bars_csv<R: Read>(reader: R) -> Result<Vec<Bar>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars: Vec<Bar> = Vec::new();

    for (i, record) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = i + 1;
        let r = record?;
        let open_time = parse_time(&r.time).ok_or_else(|| LoadError::BadTime {
            row,
            value: r.time.clone(),
        })?;

        if let Some(prev) = bars.last() {
            if open_time <= prev.open_time {
                return Err(LoadError::NotIncreasing {
                    row,
                    previous: prev.open_time,
                    current: open_time,
                });
            }
        }

        let bar = Bar::new(open_time, r.open, r.high, r.low, r.close, r.volume);
        if !bar.is_sane() {
            return Err(LoadError::InsaneBar { row });
        }
        bars.push(bar);
    }

    if bars.is_empty() {
        return Err(LoadError::Empty);
    }
    if bars.iter().any(|b| b.volume == 0.0) {
        warn!("input contains zero-volume bars");
    }
    Ok(bars)
}

fn parse_time(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|t| t.and_utc())
}
