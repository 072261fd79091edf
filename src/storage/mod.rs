//! Storage for per-user subscription state.
//!
//! Users are plain YAML files in a directory; the only persisted state is
//! each file's `last_run` timestamp.

pub mod local;

// Re-export for convenience
pub use local::UserStore;
