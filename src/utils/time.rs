// src/utils/time.rs

//! Timestamp helpers for the `last_run` field.
//!
//! User files store `last_run` as a naive `YYYY-MM-DD HH:MM:SS` string.
//! Values are interpreted and written as UTC so they compare directly with
//! the `published` dates arXiv reports.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{AppError, Result};

/// On-disk format of `last_run`.
pub const LAST_RUN_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a `last_run` value. Blank input means "never run".
pub fn parse_last_run(raw: &str) -> Result<Option<DateTime<Utc>>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDateTime::parse_from_str(raw, LAST_RUN_FORMAT)
        .map(|naive| Some(naive.and_utc()))
        .map_err(|e| {
            AppError::config(format!(
                "last_run '{raw}' is not in YYYY-MM-DD HH:MM:SS form: {e}"
            ))
        })
}

/// Format a timestamp for `last_run`.
pub fn format_last_run(at: &DateTime<Utc>) -> String {
    at.format(LAST_RUN_FORMAT).to_string()
}
