use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use reqwest::header::ACCEPT;

use super::clock::{Clock, SystemClock};
use super::entry::normalize_entry;
use super::error::FeedError;
use super::links::resolve_links;
use super::model::{Book, Catalog, Link};
use super::text::{optional_text, text};
use super::xml::{parse_document, Element};
use crate::util::http::{content_type, read_limited_bytes, BodyError, FEED_ACCEPT};

const FEED_TIMEOUT: Duration = Duration::from_secs(10);
const DETAIL_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Time and size budgets for catalog requests.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Budget for the top-level feed request, body included.
    pub feed_timeout: Duration,
    /// Budget for each per-entry sub-feed request, body included.
    pub detail_timeout: Duration,
    /// Largest feed body accepted, in bytes.
    pub max_feed_bytes: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            feed_timeout: FEED_TIMEOUT,
            detail_timeout: DETAIL_TIMEOUT,
            max_feed_bytes: MAX_FEED_SIZE,
        }
    }
}

impl From<BodyError> for FeedError {
    fn from(e: BodyError) -> Self {
        match e {
            BodyError::Network(e) => FeedError::Network(e),
            BodyError::TooLarge(limit) => FeedError::ResponseTooLarge(limit),
        }
    }
}

/// Fetches OPDS feeds and turns them into [`Catalog`]s.
///
/// Cheap to clone; the HTTP client and clock are shared.
#[derive(Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    settings: FetchSettings,
    clock: Arc<dyn Clock>,
}

impl CatalogClient {
    pub fn new(http: reqwest::Client, settings: FetchSettings) -> Self {
        Self {
            http,
            settings,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock used to synthesize ids for entries without one.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Fetches a top-level feed and normalizes all of its entries.
    ///
    /// Entries are normalized concurrently; each may issue one sub-feed
    /// request of its own. A failing sub-feed only shrinks that entry's link
    /// set. Books are returned in feed order, minus any left untitled.
    ///
    /// # Errors
    ///
    /// - [`FeedError::Network`] / [`FeedError::Timeout`] / [`FeedError::HttpStatus`]
    /// - [`FeedError::ResponseTooLarge`] - Body exceeded `max_feed_bytes`
    /// - [`FeedError::InvalidContentType`] / [`FeedError::EmptyBody`] / [`FeedError::Xml`]
    /// - [`FeedError::MissingFeedElement`] - Root element is not `<feed>`
    pub async fn fetch_catalog(&self, url: &str) -> Result<Catalog, FeedError> {
        let root = self.fetch_document(url, self.settings.feed_timeout).await?;
        if root.name != "feed" {
            return Err(FeedError::MissingFeedElement);
        }

        let entries: Vec<&Element> = root.children_named("entry").collect();
        tracing::debug!(url = %url, entries = entries.len(), "Fetched catalog feed");

        let books: Vec<Book> = join_all(
            entries
                .into_iter()
                .map(|entry| normalize_entry(self, entry, url)),
        )
        .await;

        let total = books.len();
        let books: Vec<Book> = books.into_iter().filter(|book| !book.is_untitled()).collect();
        if books.len() < total {
            tracing::warn!(
                url = %url,
                filtered = total - books.len(),
                "Untitled entries skipped"
            );
        }

        Ok(Catalog {
            title: text(root.child("title")),
            updated: optional_text(root.child("updated")),
            books,
            links: resolve_links(&root, url),
        })
    }

    /// Fetches an entry's sub-feed and returns its links, resolved against
    /// the sub-feed's own URL.
    ///
    /// Accepts either a `<feed>` or a bare `<entry>` document.
    pub async fn fetch_detail_links(&self, url: &str) -> Result<Vec<Link>, FeedError> {
        let root = self.fetch_document(url, self.settings.detail_timeout).await?;
        if root.name != "feed" && root.name != "entry" {
            return Err(FeedError::MissingFeedOrEntry);
        }

        let links = resolve_links(&root, url);
        tracing::debug!(url = %url, links = links.len(), "Fetched detail feed");
        Ok(links)
    }

    /// One GET, bounded by `budget`, validated as a non-empty XML document.
    async fn fetch_document(&self, url: &str, budget: Duration) -> Result<Element, FeedError> {
        let body = tokio::time::timeout(budget, self.fetch_xml_body(url))
            .await
            .map_err(|_| FeedError::Timeout(budget))??;

        if body.trim().is_empty() {
            return Err(FeedError::EmptyBody);
        }

        Ok(parse_document(&body)?)
    }

    async fn fetch_xml_body(&self, url: &str) -> Result<String, FeedError> {
        let response = self.http.get(url).header(ACCEPT, FEED_ACCEPT).send().await?;

        if !response.status().is_success() {
            return Err(FeedError::HttpStatus(response.status().as_u16()));
        }

        let content_type = content_type(&response);
        if !content_type.contains("xml") {
            return Err(FeedError::InvalidContentType(content_type));
        }

        let bytes = read_limited_bytes(response, self.settings.max_feed_bytes).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
