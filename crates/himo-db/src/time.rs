//! Timestamp storage format.
//!
//! Timestamps are stored as UTC text with a fixed six-digit fraction so that
//! SQL text comparison and `ORDER BY` agree with chronological order.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};

const STORE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Lower bound used for users that never logged in.
pub const EPOCH: &str = "1970-01-01 00:00:00.000000";

pub fn to_db(at: DateTime<Utc>) -> String {
    at.format(STORE_FORMAT).to_string()
}

pub fn from_db(raw: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .map(|ndt| ndt.and_utc())
        .with_context(|| format!("Corrupt timestamp '{}'", raw))
}

/// `HH:MM` wall-clock rendering (UTC) used by chat and message lists.
pub fn clock(raw: &str) -> Result<String> {
    Ok(from_db(raw)?.format("%H:%M").to_string())
}
