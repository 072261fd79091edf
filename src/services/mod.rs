//! Service layer for the notifier.
//!
//! - Paper search against the arXiv API (`ArxivClient`)
//! - Atom feed parsing (`atom`)
//! - Notification delivery (`SmtpMailer`, `ConsoleMailer`)

pub mod arxiv;
pub mod atom;
pub mod mailer;

pub use arxiv::{ArxivClient, PaperSource};
pub use mailer::{ConsoleMailer, Mailer, SmtpMailer};
