//! Link resolution, merging, and classification.
use std::collections::HashSet;

use url::Url;

use super::model::Link;
use super::xml::Element;

/// MIME marker identifying an Atom (OPDS) feed document.
pub const ATOM_FEED_MARKER: &str = "application/atom+xml";
/// MIME markers identifying an EPUB payload.
pub const EPUB_MARKERS: [&str; 2] = ["application/epub+zip", "application/epub"];
pub const OPDS_IMAGE_REL: &str = "http://opds-spec.org/image";
pub const OPDS_THUMBNAIL_REL: &str = "http://opds-spec.org/image/thumbnail";

/// Resolves one `<link>` element against the document's base URL.
///
/// Returns `None` when the element has no (or an empty) `href`. An `href`
/// that cannot be resolved is kept as written.
pub fn resolve_link(element: &Element, base_url: &str) -> Option<Link> {
    let raw = element.attr("href").map(str::trim).filter(|h| !h.is_empty())?;

    Some(Link {
        href: resolve_href(raw, base_url),
        rel: attr_string(element, "rel"),
        media_type: attr_string(element, "type"),
        title: attr_string(element, "title"),
    })
}

/// Resolves every `<link>` child of `parent`, dropping unusable ones.
pub fn resolve_links(parent: &Element, base_url: &str) -> Vec<Link> {
    parent
        .children_named("link")
        .filter_map(|element| resolve_link(element, base_url))
        .collect()
}

/// Resolves a potentially relative reference against a base URL.
///
/// Absolute references come back unchanged (modulo URL normalization).
pub fn resolve_href(href: &str, base_url: &str) -> String {
    let resolved = match Url::parse(base_url) {
        Ok(base) => base.join(href),
        Err(_) => Url::parse(href),
    };

    match resolved {
        Ok(url) => url.to_string(),
        Err(e) => {
            tracing::debug!(
                href = %href,
                base = %base_url,
                error = %e,
                "Keeping unresolvable href as written"
            );
            href.to_owned()
        }
    }
}

fn attr_string(element: &Element, name: &str) -> Option<String> {
    element.attr(name).map(str::to_string)
}

/// Concatenates link sets, keeping the first link seen for each `href`.
pub fn merge_links(primary: Vec<Link>, detail: Vec<Link>) -> Vec<Link> {
    let mut seen = HashSet::new();
    primary
        .into_iter()
        .chain(detail)
        .filter(|link| seen.insert(link.href.clone()))
        .collect()
}

/// The entry's own sub-feed: an Atom `alternate` or any `subsection` link.
pub fn find_catalog_link(links: &[Link]) -> Option<&Link> {
    links.iter().find(|link| {
        (link.type_mentions(ATOM_FEED_MARKER) && link.rel_is("alternate"))
            || link.rel_is("subsection")
    })
}

fn is_epub(link: &Link) -> bool {
    EPUB_MARKERS.iter().any(|marker| link.type_mentions(marker))
}

/// The primary EPUB download; preview links never qualify.
pub fn find_download_link(links: &[Link]) -> Option<&Link> {
    links
        .iter()
        .find(|link| is_epub(link) && !link.rel_mentions("preview"))
}

/// The cover image; inline `data:` images never qualify.
pub fn find_cover_link(links: &[Link]) -> Option<&Link> {
    links.iter().find(|link| {
        let is_image = link
            .media_type
            .as_deref()
            .is_some_and(|media_type| media_type.starts_with("image/"))
            || link.rel_is(OPDS_IMAGE_REL)
            || link.rel_is(OPDS_THUMBNAIL_REL);
        is_image && !link.href.contains("data:")
    })
}

/// Other acquisition options besides the chosen download.
pub fn find_alternate_downloads(links: &[Link], download_href: Option<&str>) -> Vec<Link> {
    links
        .iter()
        .filter(|link| {
            (link.type_mentions("application/epub") || link.rel_mentions("acquisition"))
                && Some(link.href.as_str()) != download_href
                && !link.rel_mentions("preview")
        })
        .cloned()
        .collect()
}
