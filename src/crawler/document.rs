//! Parsed HTML documents
//!
//! A response body is decoded strictly as UTF-8 first; bodies that are not
//! valid UTF-8 are decoded lossily instead. Neither path fails, so a parser
//! problem never turns into a fetch failure.

use scraper::Html;
use url::Url;

/// A fetched and parsed page
pub struct Document {
    /// Final URL after redirects, used to resolve relative links
    url: Url,

    html: Html,

    /// True when the lenient decoder had to be used
    lenient: bool,
}

impl Document {
    /// Parses a response body
    ///
    /// # Example
    ///
    /// ```
    /// use shelf_scout::crawler::Document;
    /// use url::Url;
    ///
    /// let url = Url::parse("https://www.amazon.com/dp/B0863TXGM3").unwrap();
    /// let doc = Document::parse(url, b"<html><head><title>Test</title></head></html>");
    /// assert!(!doc.used_lenient_parser());
    /// ```
    pub fn parse(url: Url, body: &[u8]) -> Self {
        match std::str::from_utf8(body) {
            Ok(text) => Self {
                url,
                html: Html::parse_document(text),
                lenient: false,
            },
            Err(e) => {
                tracing::debug!(
                    "Strict decode failed for {} ({}), falling back to lenient parser",
                    url,
                    e
                );
                let text = String::from_utf8_lossy(body);
                Self {
                    url,
                    html: Html::parse_document(&text),
                    lenient: true,
                }
            }
        }
    }

    /// Parses an HTML string (always strict)
    pub fn from_html(url: Url, html: &str) -> Self {
        Self::parse(url, html.as_bytes())
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    pub fn used_lenient_parser(&self) -> bool {
        self.lenient
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("url", &self.url.as_str())
            .field("lenient", &self.lenient)
            .finish_non_exhaustive()
    }
}
