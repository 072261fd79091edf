//! Pipeline entry points for the notification run.
//!
//! - `filter_fresh`: Drop entries the user has already been told about
//! - `Notification::compose`: Render the message for the fresh entries
//! - `run_cycle` / `run_batch`: Drive one user, or every user in turn

pub mod cycle;
pub mod filter;
pub mod notify;

pub use cycle::{CycleOutcome, RunOptions, RunSummary, run_batch, run_cycle};
pub use filter::filter_fresh;
pub use notify::{Notification, SearchWindow};
