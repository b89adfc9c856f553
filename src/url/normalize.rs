use crate::UrlError;
use url::Url;

/// Query parameters that never identify a different course page
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid"];

/// Normalizes an address into the canonical form used as the store key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only HTTP and HTTPS
/// 3. Require a host (the `url` crate lowercases it and resolves dot segments)
/// 4. Remove the fragment
/// 5. Remove tracking query parameters; the other segments keep their order
///    and their exact encoding
/// 6. Remove an empty query string
///
/// Scheme, `www.` prefix and trailing slashes are left alone: the site serves
/// detail pages under exactly the addresses it links to.
///
/// # Examples
///
/// ```
/// use course_watch::url::normalize_url;
///
/// let url = normalize_url("https://Example.com/acfor-fo/actividades/12#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/acfor-fo/actividades/12");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    let stripped = url.query().and_then(|query| {
        let segments: Vec<&str> = query.split('&').filter(|s| !s.is_empty()).collect();
        let kept: Vec<&str> = segments
            .iter()
            .copied()
            .filter(|segment| !is_tracking_segment(segment))
            .collect();

        // None leaves the query exactly as linked
        (kept.len() < segments.len() || segments.is_empty()).then(|| kept.join("&"))
    });

    if let Some(query) = stripped {
        url.set_query((!query.is_empty()).then_some(query.as_str()));
    }

    Ok(url)
}

/// Checks if a raw `key=value` query segment carries a tracking parameter
fn is_tracking_segment(segment: &str) -> bool {
    url::form_urlencoded::parse(segment.as_bytes())
        .next()
        .map_or(false, |(key, _)| is_tracking_param(&key))
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
