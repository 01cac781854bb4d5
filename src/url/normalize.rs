use crate::UrlError;
use url::Url;

/// Resolves an `href` against the page it was found on
///
/// Returns None if the link should be excluded:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel:, data: schemes
/// - anything that does not resolve to an HTTP(S) URL
pub fn resolve_href(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
        Some(absolute_url)
    } else {
        None
    }
}

/// Canonicalizes a product URL for comparison
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or not HTTP(S)
/// 2. Drop the query string (tracking and ranking parameters)
/// 3. Drop the fragment
///
/// Host and path are kept as-is: product paths are case-sensitive.
///
/// # Examples
///
/// ```
/// use shelf_scout::url::canonicalize_url;
///
/// let url = canonicalize_url("https://www.amazon.com/Sony/dp/B0863TXGM3/ref=sr_1_1?keywords=x#reviews").unwrap();
/// assert_eq!(url.as_str(), "https://www.amazon.com/Sony/dp/B0863TXGM3/ref=sr_1_1");
/// ```
pub fn canonicalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;
    canonicalize_parsed(url)
}

/// Canonicalizes an already parsed URL (see [`canonicalize_url`])
pub fn canonicalize_parsed(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}
