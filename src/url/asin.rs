use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Product identifiers live in the `/dp/<ASIN>` path segment
    static ref ASIN_PATTERN: Regex =
        Regex::new(r"/dp/([A-Z0-9]{10})").expect("Invalid ASIN regex");
}

/// Extracts the 10-character ASIN from a product URL
///
/// Returns None when the URL carries no `/dp/` identifier; such products are
/// still processed but cannot be deduplicated.
///
/// # Examples
///
/// ```
/// use shelf_scout::url::extract_asin;
///
/// assert_eq!(
///     extract_asin("https://www.amazon.com/Sony/dp/B0863TXGM3/ref=sr_1_1"),
///     Some("B0863TXGM3".to_string())
/// );
/// assert_eq!(extract_asin("https://www.amazon.com/gp/help"), None);
/// ```
pub fn extract_asin(url: &str) -> Option<String> {
    ASIN_PATTERN
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
