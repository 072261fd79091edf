//! Notification formatting.
//!
//! Both bodies are Handlebars templates. The HTML template relies on the
//! registry's default escaping; the plain-text one uses triple-stash
//! expressions so nothing is escaped.

use chrono::{DateTime, Utc};
use handlebars::Handlebars;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{PaperEntry, UserRecord};
use crate::utils::time::format_last_run;

const TEXT_TEMPLATE: &str = include_str!("templates/notification.txt.hbs");
const HTML_TEMPLATE: &str = include_str!("templates/notification.html.hbs");

/// Time span a notification covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    /// Previous `last_run`, `None` on a user's first cycle
    pub from: Option<DateTime<Utc>>,
    /// Start of the current run
    pub to: DateTime<Utc>,
}

impl SearchWindow {
    /// Window from the previous `last_run` (if any) up to `to`.
    pub fn new(from: Option<DateTime<Utc>>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    fn from_label(&self) -> String {
        self.from
            .as_ref()
            .map(format_last_run)
            .unwrap_or_else(|| "the beginning".to_string())
    }

    fn to_label(&self) -> String {
        format_last_run(&self.to)
    }
}

/// A rendered message ready for a `Mailer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Template data for one message.
#[derive(Debug, Serialize)]
struct MessageContext<'a> {
    name: &'a str,
    query: &'a str,
    from: String,
    to: String,
    count: usize,
    papers: Vec<PaperContext<'a>>,
}

#[derive(Debug, Serialize)]
struct PaperContext<'a> {
    number: usize,
    title: &'a str,
    authors: String,
    published: String,
    updated: Option<String>,
    categories: Option<String>,
    comment: Option<&'a str>,
    link: &'a str,
    summary: &'a str,
}

impl<'a> PaperContext<'a> {
    fn new(number: usize, entry: &'a PaperEntry) -> Self {
        Self {
            number,
            title: &entry.title,
            authors: entry.authors_line(),
            published: format_last_run(&entry.published),
            // Only revisions are worth mentioning.
            updated: entry
                .updated
                .filter(|updated| *updated > entry.published)
                .map(|updated| format_last_run(&updated)),
            categories: (!entry.categories.is_empty()).then(|| entry.categories_line()),
            comment: entry.comment.as_deref(),
            link: &entry.link,
            summary: &entry.summary,
        }
    }
}

impl Notification {
    /// Render the message listing `entries` for `user`.
    ///
    /// Callers skip this entirely when `entries` is empty.
    pub fn compose(
        user: &UserRecord,
        entries: &[PaperEntry],
        window: &SearchWindow,
    ) -> Result<Self> {
        let subject = format!(
            "Your arXiv SONAR ({} to {}, {})",
            window.from_label(),
            window.to_label(),
            user.display_name
        );

        let context = MessageContext {
            name: &user.display_name,
            query: &user.search_query,
            from: window.from_label(),
            to: window.to_label(),
            count: entries.len(),
            papers: entries
                .iter()
                .enumerate()
                .map(|(i, entry)| PaperContext::new(i + 1, entry))
                .collect(),
        };

        let templates = templates()?;
        let text_body = templates
            .render("text", &context)
            .map_err(AppError::template)?;
        let html_body = templates
            .render("html", &context)
            .map_err(AppError::template)?;

        Ok(Self {
            to: user.email_address.clone(),
            subject,
            text_body: text_body.trim_end().to_string(),
            html_body,
        })
    }
}

fn templates() -> Result<Handlebars<'static>> {
    let mut registry = Handlebars::new();
    registry
        .register_template_string("text", TEXT_TEMPLATE)
        .map_err(AppError::template)?;
    registry
        .register_template_string("html", HTML_TEMPLATE)
        .map_err(AppError::template)?;
    Ok(registry)
}
