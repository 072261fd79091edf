// src/services/arxiv.rs

//! arXiv search API client.
//!
//! Results are requested newest-first (`sortBy=submittedDate`) and paged
//! until the feed is exhausted, the configured cap is hit, or a page reaches
//! entries the user has already seen.
//!
//! Every request made through one client, across all searches, is spaced at
//! least `request_delay_secs` after the previous one.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{ArxivConfig, PaperEntry};
use crate::services::atom::{self, FeedPage};
use crate::utils::{http, normalize_whitespace};

/// Source of papers for a search query.
#[async_trait]
pub trait PaperSource: Send + Sync {
    /// Run `query` and return matching papers in source order.
    ///
    /// `since` is a paging hint only; callers still filter the result.
    async fn search(&self, query: &str, since: Option<DateTime<Utc>>) -> Result<Vec<PaperEntry>>;
}

/// Client for the public arXiv query endpoint.
pub struct ArxivClient {
    config: ArxivConfig,
    client: Client,
    last_request: Mutex<Option<Instant>>,
}

impl ArxivClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ArxivConfig) -> Result<Self> {
        let client = http::create_client(&config)?;
        Ok(Self {
            config,
            client,
            last_request: Mutex::new(None),
        })
    }

    /// Build the request URL for one page.
    pub fn page_url(&self, query: &str, start: usize, count: usize) -> Result<Url> {
        let mut url = Url::parse(&self.config.base_url).map_err(|e| {
            AppError::config(format!("invalid arXiv URL '{}': {e}", self.config.base_url))
        })?;
        url.query_pairs_mut()
            .append_pair("search_query", query)
            .append_pair("start", &start.to_string())
            .append_pair("max_results", &count.to_string())
            .append_pair("sortBy", "submittedDate")
            .append_pair("sortOrder", "descending");
        Ok(url)
    }

    /// Wait until the request delay has passed since the previous request.
    async fn pace(&self) {
        let delay = Duration::from_secs(self.config.request_delay_secs);
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let wait = (previous + delay).saturating_duration_since(Instant::now());
            if !wait.is_zero() {
                log::debug!("Waiting {wait:?} before the next arXiv request");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn fetch_page(&self, url: Url) -> Result<FeedPage> {
        self.pace().await;
        log::debug!("GET {url}");
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        atom::parse_feed(&body)
    }
}

#[async_trait]
impl PaperSource for ArxivClient {
    async fn search(&self, query: &str, since: Option<DateTime<Utc>>) -> Result<Vec<PaperEntry>> {
        // Multi-line YAML scalars keep their newlines; the API wants one line.
        let query = normalize_whitespace(query);
        let cap = self.config.max_results;

        let mut entries = Vec::new();
        let mut start = 0;

        loop {
            let count = self.config.page_size.min(cap - start);
            let page = self.fetch_page(self.page_url(&query, start, count)?).await?;

            let received = page.entries.len();
            let reached_seen = match (since, page.entries.last()) {
                (Some(since), Some(last)) => last.published <= since,
                _ => false,
            };
            entries.extend(page.entries);
            start += received;

            if received < count || reached_seen {
                break;
            }
            if page.total_results.is_some_and(|total| start >= total) {
                break;
            }
            if start >= cap {
                log::warn!(
                    "Result cap of {cap} reached for query '{query}'; older matches were not fetched"
                );
                break;
            }
        }

        log::debug!("arXiv returned {} entries for '{query}'", entries.len());
        Ok(entries)
    }
}
