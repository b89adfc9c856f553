use url::Url;

/// Extracts the lowercase host from a URL
///
/// Returns None for URLs without a host, which can never be crawled.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use course_watch::url::extract_domain;
///
/// let url = Url::parse("https://FormacionAgraria.Tenerife.es/acfor-fo/").unwrap();
/// assert_eq!(extract_domain(&url), Some("formacionagraria.tenerife.es".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}
