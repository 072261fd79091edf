//! Utility functions and helpers.

pub mod http;
pub mod time;

/// Collapse runs of whitespace (including newlines) into single spaces.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
