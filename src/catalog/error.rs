use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while fetching and validating an OPDS document.
///
/// Raised to the caller for the root feed; swallowed (and logged) by the
/// per-entry detail fetch.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Request exceeded its timeout budget
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// HTTP response with non-2xx status code
    #[error("Failed to fetch OPDS feed (HTTP {0})")]
    HttpStatus(u16),
    /// Response body exceeded the configured size limit
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    /// Content-Type header absent or not an XML type
    #[error("Invalid content type - Expected XML, got {0:?}")]
    InvalidContentType(String),
    /// Body was empty or whitespace only
    #[error("Empty OPDS feed")]
    EmptyBody,
    /// Body was not well-formed XML
    #[error("Invalid XML: {0}")]
    Xml(String),
    /// Top-level document has no `<feed>` root
    #[error("Invalid OPDS feed format - Missing feed element")]
    MissingFeedElement,
    /// Detail document has neither a `<feed>` nor an `<entry>` root
    #[error("Invalid feed structure - Missing feed or entry element")]
    MissingFeedOrEntry,
}

/// Coarse classification of a [`FeedError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Unreachable host, non-2xx status, timeout, or oversized body
    Transport,
    /// Wrong content type, empty body, or unparsable XML
    Format,
    /// Parsed XML lacks the expected root element
    Structure,
}

impl FeedError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FeedError::Network(_)
            | FeedError::Timeout(_)
            | FeedError::HttpStatus(_)
            | FeedError::ResponseTooLarge(_) => FailureKind::Transport,
            FeedError::InvalidContentType(_) | FeedError::EmptyBody | FeedError::Xml(_) => {
                FailureKind::Format
            }
            FeedError::MissingFeedElement | FeedError::MissingFeedOrEntry => {
                FailureKind::Structure
            }
        }
    }
}

impl From<super::xml::XmlError> for FeedError {
    fn from(e: super::xml::XmlError) -> Self {
        FeedError::Xml(e.to_string())
    }
}
