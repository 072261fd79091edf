// src/services/atom.rs

//! Atom feed parsing for arXiv API responses.
//!
//! Elements are matched by local name, so the `opensearch:` and `arxiv:`
//! extension prefixes need no namespace bookkeeping.

use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{AppError, Result};
use crate::models::PaperEntry;
use crate::utils::normalize_whitespace;

/// One page of search results.
#[derive(Debug, Default)]
pub struct FeedPage {
    /// `opensearch:totalResults`, the size of the full result set
    pub total_results: Option<usize>,
    /// Entries on this page in feed order
    pub entries: Vec<PaperEntry>,
}

/// Parse an arXiv Atom response into a page of entries.
pub fn parse_feed(xml: &str) -> Result<FeedPage> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut page = FeedPage::default();
    let mut entry: Option<EntryBuilder> = None;
    let mut in_author = false;
    let mut text = String::new();

    loop {
        let event = reader.read_event().map_err(|e| {
            AppError::parse(format!(
                "malformed Atom near byte {}: {e}",
                reader.buffer_position()
            ))
        })?;

        match event {
            Event::Start(e) => {
                text.clear();
                match e.local_name().as_ref() {
                    b"entry" => entry = Some(EntryBuilder::default()),
                    b"author" => in_author = true,
                    _ => {}
                }
                if let Some(builder) = entry.as_mut() {
                    builder.absorb_attributes(&e);
                }
            }
            Event::Empty(e) => {
                if let Some(builder) = entry.as_mut() {
                    builder.absorb_attributes(&e);
                }
            }
            Event::Text(t) => {
                let unescaped = t.unescape().map_err(AppError::parse)?;
                text.push_str(&unescaped);
            }
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
            Event::End(e) => {
                let value = normalize_whitespace(&text);
                text.clear();

                let name = e.local_name();
                if name.as_ref() == b"entry" {
                    if let Some(builder) = entry.take() {
                        page.entries.push(builder.finish()?);
                    }
                    continue;
                }

                match (name.as_ref(), entry.as_mut()) {
                    (b"author", _) => in_author = false,
                    (b"name", Some(builder)) if in_author => {
                        if !value.is_empty() {
                            builder.authors.push(value);
                        }
                    }
                    (b"id", Some(builder)) => builder.id = Some(value),
                    (b"title", Some(builder)) => builder.title = Some(value),
                    (b"summary", Some(builder)) => builder.summary = Some(value),
                    (b"published", Some(builder)) => builder.published = Some(value),
                    (b"updated", Some(builder)) => builder.updated = Some(value),
                    (b"comment", Some(builder)) => {
                        builder.comment = (!value.is_empty()).then_some(value)
                    }
                    (b"totalResults", None) => {
                        page.total_results = value.parse().ok();
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(page)
}

/// Fields collected while inside an `<entry>`.
#[derive(Debug, Default)]
struct EntryBuilder {
    id: Option<String>,
    title: Option<String>,
    summary: Option<String>,
    published: Option<String>,
    updated: Option<String>,
    comment: Option<String>,
    authors: Vec<String>,
    link: Option<String>,
    primary_category: Option<String>,
    categories: Vec<String>,
}

impl EntryBuilder {
    /// Pick up attribute-carried data: categories and the abstract link.
    fn absorb_attributes(&mut self, e: &BytesStart<'_>) {
        let local = e.local_name();
        let name = local.as_ref();
        if !matches!(name, b"category" | b"primary_category" | b"link") {
            return;
        }

        let mut term = None;
        let mut href = None;
        let mut rel = None;
        for attr in e.attributes().flatten() {
            let Ok(value) = attr.unescape_value() else {
                continue;
            };
            match attr.key.local_name().as_ref() {
                b"term" => term = Some(value.trim().to_string()),
                b"href" => href = Some(value.to_string()),
                b"rel" => rel = Some(value.to_string()),
                _ => {}
            }
        }

        match name {
            b"category" => {
                if let Some(term) = term.filter(|t| !t.is_empty()) {
                    if !self.categories.contains(&term) {
                        self.categories.push(term);
                    }
                }
            }
            b"primary_category" => self.primary_category = term.filter(|t| !t.is_empty()),
            _ => {
                if rel.as_deref().is_none_or(|r| r == "alternate") {
                    self.link = href.or(self.link.take());
                }
            }
        }
    }

    fn finish(mut self) -> Result<PaperEntry> {
        let id = self
            .id
            .take()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::parse("entry without <id>"))?;

        // arXiv reports query errors as a 200 feed with a single error entry.
        if id.contains("arxiv.org/api/errors") {
            return Err(AppError::parse(format!(
                "arXiv rejected the query: {}",
                self.summary.unwrap_or_default()
            )));
        }

        let published = match self.published.as_deref() {
            Some(raw) => parse_timestamp(raw)?,
            None => return Err(AppError::parse(format!("entry {id} has no <published>"))),
        };
        let updated = self.updated.as_deref().map(parse_timestamp).transpose()?;

        if let Some(primary) = &self.primary_category {
            self.categories.retain(|c| c != primary);
            self.categories.insert(0, primary.clone());
        }

        Ok(PaperEntry {
            link: self.link.unwrap_or_else(|| id.clone()),
            id,
            title: self.title.unwrap_or_default(),
            authors: self.authors,
            summary: self.summary.unwrap_or_default(),
            published,
            updated,
            comment: self.comment,
            primary_category: self.primary_category,
            categories: self.categories,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::parse(format!("bad timestamp '{raw}': {e}")))
}
