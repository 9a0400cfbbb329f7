use serde::Serialize;

/// Title given to entries whose `<title>` is missing or blank.
///
/// Books still carrying this title after normalization are treated as
/// malformed and are dropped from the [`Catalog`].
pub const UNTITLED: &str = "Untitled";

/// Author given to entries with no usable `<author>` element.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// Label shown for alternative downloads that carry no `title` attribute.
pub const ALTERNATIVE_DOWNLOAD_LABEL: &str = "Alternative Download";

/// A resolved `<link>` element.
///
/// `href` is always absolute (or, if it could not be resolved, the raw
/// value as written). Links without an `href` are never constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub href: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Link {
    /// True if `rel` is present and equals `value` exactly.
    pub fn rel_is(&self, value: &str) -> bool {
        self.rel.as_deref() == Some(value)
    }

    /// True if `rel` is present and contains `needle`.
    pub fn rel_mentions(&self, needle: &str) -> bool {
        self.rel.as_deref().is_some_and(|rel| rel.contains(needle))
    }

    /// True if the MIME type is present and contains `needle`.
    pub fn type_mentions(&self, needle: &str) -> bool {
        self.media_type
            .as_deref()
            .is_some_and(|media_type| media_type.contains(needle))
    }

    /// Display label for an alternative download button.
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .filter(|title| !title.trim().is_empty())
            .unwrap_or(ALTERNATIVE_DOWNLOAD_LABEL)
    }
}

/// One publication, normalized from a feed `<entry>` and its optional sub-feed.
///
/// Invariants:
/// - `links` never holds two links with the same `href`
/// - `cover_url`, `download_url` and `catalog_url` are each either `None`
///   or the `href` of a link in `links`
/// - every link in `alternate_downloads` is also in `links`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub summary: String,
    pub cover_url: Option<String>,
    pub download_url: Option<String>,
    /// Address of this entry's own sub-feed, for "open catalog" navigation.
    pub catalog_url: Option<String>,
    pub alternate_downloads: Vec<Link>,
    /// Raw timestamp text, passed through uninterpreted.
    pub published: Option<String>,
    /// Raw timestamp text, passed through uninterpreted.
    pub updated: Option<String>,
    pub links: Vec<Link>,
}

impl Book {
    pub fn is_untitled(&self) -> bool {
        self.title == UNTITLED
    }
}

/// A parsed top-level OPDS feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Catalog {
    pub title: String,
    pub updated: Option<String>,
    /// Entries in feed order, excluding any whose title fell back to [`UNTITLED`].
    pub books: Vec<Book>,
    /// The feed's own `<link>` elements.
    pub links: Vec<Link>,
}
