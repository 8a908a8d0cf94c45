//! OHLCV bar representation and input normalization.
//!
//! Raw tabular input (column names plus string cells) is turned into a
//! strictly increasing series of [`Bar`]s before anything else sees it.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::error::AlgoTraderError;

pub const REQUIRED_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// A flat bar where every price equals `close`.
    pub fn from_close(timestamp: NaiveDateTime, close: f64) -> Self {
        Bar {
            timestamp,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
        }
    }
}

/// Parse a timestamp cell. Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM:SS` and bare `YYYY-MM-DD` (midnight).
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn parse_number(cell: Option<&String>) -> Option<f64> {
    cell.and_then(|c| c.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Sort ascending by timestamp and drop repeated timestamps (first wins).
pub fn sort_and_dedup(bars: &mut Vec<Bar>) {
    bars.sort_by_key(|b| b.timestamp);
    bars.dedup_by_key(|b| b.timestamp);
}

/// Normalize a raw table into a bar series.
///
/// Column names are trimmed and lower-cased. The index is the `date` or
/// `timestamp` column, falling back to the first column. Non-numeric cells
/// are treated as missing; rows without a close are dropped.
pub fn normalize_bars(
    columns: &[String],
    rows: &[Vec<String>],
) -> Result<Vec<Bar>, AlgoTraderError> {
    let columns: Vec<String> = columns.iter().map(|c| c.trim().to_lowercase()).collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|req| !columns.iter().any(|c| c == *req))
        .map(|req| req.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(AlgoTraderError::MissingColumns { columns: missing });
    }

    let col = |name: &str| columns.iter().position(|c| c == name);
    let ts_idx = col("date").or_else(|| col("timestamp")).unwrap_or(0);
    // Presence was checked above.
    let [open_idx, high_idx, low_idx, close_idx, volume_idx] =
        REQUIRED_COLUMNS.map(|name| col(name).unwrap_or(usize::MAX));

    let mut bars = Vec::with_capacity(rows.len());
    for (row_no, row) in rows.iter().enumerate() {
        let Some(close) = parse_number(row.get(close_idx)) else {
            continue;
        };

        let raw_ts = row.get(ts_idx).map(String::as_str).unwrap_or("");
        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| AlgoTraderError::InvalidBar {
            row: row_no + 1,
            reason: format!("unparseable timestamp '{raw_ts}'"),
        })?;

        bars.push(Bar {
            timestamp,
            open: parse_number(row.get(open_idx)).unwrap_or(close),
            high: parse_number(row.get(high_idx)).unwrap_or(close),
            low: parse_number(row.get(low_idx)).unwrap_or(close),
            close,
            volume: parse_number(row.get(volume_idx)).unwrap_or(0.0),
        });
    }

    sort_and_dedup(&mut bars);
    Ok(bars)
}
