//! OPDS catalog fetching and normalization.
//!
//! Turns an OPDS (Atom) feed into a [`Catalog`] of [`Book`]s with resolved,
//! de-duplicated, classified links:
//!
//! - **Fetching**: one bounded request per document, validated as XML
//! - **Normalization**: each `<entry>` becomes a [`Book`], optionally enriched
//!   with the links of its own sub-feed
//! - **Classification**: cover, primary EPUB download, alternative downloads,
//!   and the entry's catalog link for navigation
//!
//! # Architecture
//!
//! - [`xml`] - quick-xml event stream to a small owned element tree
//! - [`text`] - plain-text extraction from text-bearing elements
//! - [`links`] - link resolution, merging, and classification rules
//! - `entry` - per-entry normalization and sub-feed enrichment
//! - `fetcher` - HTTP fetching and catalog assembly
//!
//! # Example
//!
//! ```ignore
//! use shelf::catalog::{CatalogClient, FetchSettings};
//!
//! let client = CatalogClient::new(reqwest::Client::new(), FetchSettings::default());
//! let catalog = client.fetch_catalog("https://example.com/opds").await?;
//! for book in &catalog.books {
//!     println!("{} by {}", book.title, book.author);
//! }
//! ```

mod clock;
mod entry;
mod error;
mod fetcher;
pub mod links;
mod model;
pub mod text;
pub mod xml;

pub use clock::{Clock, FixedClock, SystemClock};
pub use entry::{build_book, normalize_entry};
pub use error::{FailureKind, FeedError};
pub use fetcher::{CatalogClient, FetchSettings};
pub use model::{Book, Catalog, Link, ALTERNATIVE_DOWNLOAD_LABEL, UNKNOWN_AUTHOR, UNTITLED};
