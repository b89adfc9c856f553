//! URL handling module for course-watch
//!
//! This module provides address normalization, domain extraction, wildcard
//! matching and the allowed-domain check that keeps the crawl on one site.

mod domain;
mod matcher;
mod normalize;

// Re-export main functions
pub use domain::extract_domain;
pub use matcher::matches_wildcard;
pub use normalize::normalize_url;

use url::Url;

/// Returns true if the URL's host matches one of the allowed-domain patterns
///
/// URLs without a host are never allowed.
///
/// # Examples
///
/// ```
/// use course_watch::url::is_allowed_domain;
/// use url::Url;
///
/// let allowed = vec!["formacionagraria.tenerife.es".to_string()];
/// let inside = Url::parse("https://formacionagraria.tenerife.es/acfor-fo/").unwrap();
/// let outside = Url::parse("https://www.tenerife.es/").unwrap();
///
/// assert!(is_allowed_domain(&inside, &allowed));
/// assert!(!is_allowed_domain(&outside, &allowed));
/// ```
pub fn is_allowed_domain(url: &Url, allowed: &[String]) -> bool {
    match extract_domain(url) {
        Some(domain) => allowed
            .iter()
            .any(|pattern| matches_wildcard(&pattern.to_lowercase(), &domain)),
        None => false,
    }
}
