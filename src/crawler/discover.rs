//! Link discovery on fetched pages
//!
//! Only anchors pointing at course detail pages are followed. Links carrying
//! the exclusion marker are "request a place" actions and are dropped before
//! they can reach the frontier.

use crate::url::normalize_url;
use scraper::{Html, Selector};
use url::Url;

/// Extracts the detail-page addresses linked from a document
///
/// # Selection Rules
///
/// **Include:**
/// - `<a href="...">` whose raw `href` starts with `detail_prefix`
///
/// **Exclude:**
/// - any such `href` containing `exclude_marker`
/// - hrefs that do not resolve to an http(s) URL with a host
///
/// Relative hrefs are resolved against `base_url` (the page's own address)
/// and normalized. Order follows the document; duplicates are left to the
/// frontier.
///
/// # Example
///
/// ```
/// use course_watch::crawler::discover_links;
/// use scraper::Html;
/// use url::Url;
///
/// let html = r#"<a href="/cursos/1">Uno</a><a href="/cursos/1/solicitud">Pedir</a>"#;
/// let doc = Html::parse_document(html);
/// let base = Url::parse("https://example.com/").unwrap();
///
/// let links = discover_links(&doc, &base, "/cursos/", "solicitud");
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].as_str(), "https://example.com/cursos/1");
/// ```
pub fn discover_links(
    document: &Html,
    base_url: &Url,
    detail_prefix: &str,
    exclude_marker: &str,
) -> Vec<Url> {
    let Ok(anchor_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&anchor_selector)
        .filter_map(|element| element.value().attr("href"))
        .filter(|href| href.starts_with(detail_prefix))
        .filter(|href| {
            let excluded = href.contains(exclude_marker);
            if excluded {
                tracing::trace!("Skipping action link {}", href);
            }
            !excluded
        })
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Resolves an href against the page address and normalizes the result
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let absolute = base_url.join(href.trim()).ok()?;
    normalize_url(absolute.as_str()).ok()
}
