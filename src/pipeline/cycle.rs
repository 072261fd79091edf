// src/pipeline/cycle.rs

//! Per-user notification cycle and the batch loop around it.
//!
//! A cycle is `Load → Query → Filter → (Notify?) → Persist` and stops at the
//! first failing step. Failures stay inside the user's cycle: the batch logs
//! them and moves on to the next file.

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::UserRecord;
use crate::pipeline::filter::filter_fresh;
use crate::pipeline::notify::{Notification, SearchWindow};
use crate::services::{Mailer, PaperSource};
use crate::storage::UserStore;

/// Batch-wide settings.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Run start; becomes each successful user's new `last_run`
    pub started_at: DateTime<Utc>,
    /// Persist `last_run` after a successful cycle
    pub update_state: bool,
}

impl RunOptions {
    /// Options for a normal run that persists state.
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            update_state: true,
        }
    }
}

/// How a successful cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A message listing `count` papers was handed to the mailer
    Notified { count: usize },
    /// Nothing new since `last_run`; no message sent
    UpToDate,
}

/// Counts for the end-of-run log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub users: usize,
    pub notified: usize,
    pub up_to_date: usize,
    pub failed: usize,
}

/// Query, filter, notify and persist for one user.
pub async fn run_cycle(
    record: &UserRecord,
    store: &UserStore,
    source: &dyn PaperSource,
    mailer: &dyn Mailer,
    options: &RunOptions,
) -> Result<CycleOutcome> {
    let entries = source
        .search(&record.search_query, record.last_run)
        .await?;
    let fresh = filter_fresh(&entries, record.last_run);
    log::info!(
        "Found {} results for {} ({} new)",
        entries.len(),
        record.display_name,
        fresh.len()
    );

    let outcome = if fresh.is_empty() {
        log::info!("No new papers for {}", record.display_name);
        CycleOutcome::UpToDate
    } else {
        let window = SearchWindow::new(record.last_run, options.started_at);
        let notification = Notification::compose(record, &fresh, &window)?;
        mailer.send(&notification).await?;
        CycleOutcome::Notified { count: fresh.len() }
    };

    if options.update_state {
        store.write_last_run(record, options.started_at).await?;
        log::info!("Updated last run timestamp for {}", record.display_name);
    }

    Ok(outcome)
}

/// Run a cycle for every user file in the store, one after another.
pub async fn run_batch(
    store: &UserStore,
    source: &dyn PaperSource,
    mailer: &dyn Mailer,
    options: &RunOptions,
) -> RunSummary {
    let mut summary = RunSummary::default();

    let files = match store.list_files().await {
        Ok(files) => files,
        Err(e) => {
            log::error!(
                "Cannot read users directory {}: {e}",
                store.root().display()
            );
            return summary;
        }
    };
    log::info!(
        "Found {} user files in {}",
        files.len(),
        store.root().display()
    );

    for path in files {
        summary.users += 1;

        let record = match store.load(&path).await {
            Ok(record) => record,
            Err(e) => {
                log::error!("Skipping {}: {e}", path.display());
                summary.failed += 1;
                continue;
            }
        };

        log::info!("Processing user: {}", record.display_name);
        match run_cycle(&record, store, source, mailer, options).await {
            Ok(CycleOutcome::Notified { .. }) => summary.notified += 1,
            Ok(CycleOutcome::UpToDate) => summary.up_to_date += 1,
            Err(e) => {
                summary.failed += 1;
                report_failure(&record, &e);
            }
        }
    }

    summary
}

fn report_failure(record: &UserRecord, error: &AppError) {
    let user = &record.display_name;
    match error {
        AppError::Persistence { .. } => {
            log::error!("{user}: {error}");
            log::warn!("{user}: last_run was not saved; the same papers will be sent again next run");
        }
        e if e.is_network() => {
            log::error!("Error fetching arXiv results for {user}: {e}");
        }
        AppError::Mail(_) => {
            log::error!("Failed to send email to {}: {error}", record.email_address);
        }
        _ => log::error!("{user}: {error}"),
    }
}
