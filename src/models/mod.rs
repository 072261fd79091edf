// src/models/mod.rs

//! Domain models for the notifier.

mod config;
mod paper;
mod user;

// Re-export all public types
pub use config::{ArxivConfig, SharedConfig};
pub use paper::PaperEntry;
pub use user::UserRecord;
