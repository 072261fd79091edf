//! Freshness filter.
//!
//! Decides which entries a user has not been told about yet. The only state
//! is the user's `last_run`; there is no per-paper deduplication store.

use chrono::{DateTime, Utc};

use crate::models::PaperEntry;

/// Whether an entry is newer than the previous cycle.
pub fn is_fresh(entry: &PaperEntry, last_run: Option<DateTime<Utc>>) -> bool {
    last_run.is_none_or(|cutoff| entry.published > cutoff)
}

/// Keep entries published strictly after `last_run`, preserving order.
///
/// With no `last_run` every entry is fresh.
pub fn filter_fresh(entries: &[PaperEntry], last_run: Option<DateTime<Utc>>) -> Vec<PaperEntry> {
    entries
        .iter()
        .filter(|entry| is_fresh(entry, last_run))
        .cloned()
        .collect()
}
