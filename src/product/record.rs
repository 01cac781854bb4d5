use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A numeric field as extracted from markup
///
/// Extraction is best-effort: when the matched text does not parse as a
/// number the original text is kept instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue<T> {
    /// The parsed number
    Number(T),
    /// The matched text, which did not parse
    Raw(String),
}

impl<T: Copy> FieldValue<T> {
    /// The parsed number, if parsing succeeded
    pub fn number(&self) -> Option<T> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Raw(_) => None,
        }
    }
}

impl<T: fmt::Display> fmt::Display for FieldValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Raw(s) => write!(f, "{}", s),
        }
    }
}

/// One scraped product
///
/// Constructed once per product page and never modified after it is emitted.
/// Only `url` and `scraped_at` are guaranteed; everything else is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub url: String,
    pub asin: Option<String>,
    pub title: Option<String>,
    pub price: Option<FieldValue<f64>>,
    pub rating: Option<FieldValue<f64>>,
    pub review_count: Option<FieldValue<u64>>,
    pub brand: Option<String>,
    pub availability: Option<String>,
    pub image_url: Option<String>,
    pub scraped_at: DateTime<Utc>,

    /// Set when the price exceeds the ceiling and the flag policy is active
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub over_price_ceiling: bool,
}

impl ProductRecord {
    /// Creates a record with only the mandatory fields set
    pub fn new(url: impl Into<String>, asin: Option<String>) -> Self {
        Self {
            url: url.into(),
            asin,
            title: None,
            price: None,
            rating: None,
            review_count: None,
            brand: None,
            availability: None,
            image_url: None,
            scraped_at: Utc::now(),
            over_price_ceiling: false,
        }
    }

    /// The price as a number, if one was parsed
    pub fn numeric_price(&self) -> Option<f64> {
        self.price.as_ref().and_then(FieldValue::number)
    }

    /// Short human-readable label for logs
    pub fn summary(&self) -> String {
        let title = self.title.as_deref().unwrap_or("Unknown");
        match &self.price {
            Some(price) => format!("{} - ${}", title, price),
            None => format!("{} - $N/A", title),
        }
    }
}
