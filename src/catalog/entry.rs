use super::clock::Clock;
use super::fetcher::CatalogClient;
use super::links::{
    find_alternate_downloads, find_catalog_link, find_cover_link, find_download_link,
    merge_links, resolve_links,
};
use super::model::{Book, Link, UNTITLED};
use super::text::{author, optional_text, summary, text};
use super::xml::Element;

/// Normalizes one feed `<entry>` into a [`Book`].
///
/// If the entry links to its own sub-feed, that document is fetched once and
/// its links are merged after the entry's inline links. A failed sub-feed
/// fetch is logged and otherwise ignored.
pub async fn normalize_entry(client: &CatalogClient, entry: &Element, base_url: &str) -> Book {
    let primary = resolve_links(entry, base_url);

    let detail = match find_catalog_link(&primary) {
        Some(catalog_link) => match client.fetch_detail_links(&catalog_link.href).await {
            Ok(links) => links,
            Err(e) => {
                tracing::warn!(
                    url = %catalog_link.href,
                    kind = ?e.kind(),
                    error = %e,
                    "Detail feed unavailable, using inline links only"
                );
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    build_book(entry, base_url, primary, detail, client.clock())
}

/// Assembles a [`Book`] from an entry and its already-fetched link sets.
pub fn build_book(
    entry: &Element,
    base_url: &str,
    primary: Vec<Link>,
    detail: Vec<Link>,
    clock: &dyn Clock,
) -> Book {
    let catalog_url = find_catalog_link(&primary).map(|link| link.href.clone());

    let links = merge_links(primary, detail);
    let download_url = find_download_link(&links).map(|link| link.href.clone());
    let cover_url = find_cover_link(&links).map(|link| link.href.clone());
    let alternate_downloads = find_alternate_downloads(&links, download_url.as_deref());

    let title = Some(text(entry.child("title")))
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    let id = optional_text(entry.child("id"))
        .unwrap_or_else(|| format!("{}-{}", base_url, clock.now_millis()));

    Book {
        id,
        title,
        author: author(entry),
        summary: summary(entry),
        cover_url,
        download_url,
        catalog_url,
        alternate_downloads,
        published: optional_text(entry.child("published")),
        updated: optional_text(entry.child("updated")),
        links,
    }
}
