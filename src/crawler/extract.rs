//! Field extractors for search result and product pages
//!
//! Each field has an ordered chain of candidate selectors covering the page
//! layouts in circulation. Candidates are tried in priority order and the
//! first one producing non-empty text wins. Numeric fields prefer the first
//! candidate whose text contains a parseable number and otherwise keep the
//! first non-empty text as a raw value.

use crate::crawler::Document;
use crate::product::{FieldValue, ProductRecord};
use crate::url::{canonicalize_parsed, extract_asin, resolve_href};
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

/// An ordered list of selectors tried in priority order
pub struct SelectorChain {
    selectors: Vec<Selector>,
}

impl SelectorChain {
    /// Compiles the chain; patterns that fail to parse are skipped
    pub fn new(patterns: &[&str]) -> Self {
        let selectors = patterns
            .iter()
            .filter_map(|pattern| match Selector::parse(pattern) {
                Ok(selector) => Some(selector),
                Err(e) => {
                    tracing::warn!("Skipping invalid selector '{}': {:?}", pattern, e);
                    None
                }
            })
            .collect();
        Self { selectors }
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// The first element matched by each selector, in priority order
    pub fn candidates<'a>(&'a self, html: &'a Html) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.selectors
            .iter()
            .filter_map(move |selector| html.select(selector).next())
    }

    /// Every element matched by every selector, in priority order
    pub fn all_matches<'a>(&'a self, html: &'a Html) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.selectors
            .iter()
            .flat_map(move |selector| html.select(selector))
    }

    /// Non-empty candidate texts, in priority order
    pub fn texts<'a>(&'a self, html: &'a Html) -> impl Iterator<Item = String> + 'a {
        self.candidates(html)
            .map(element_text)
            .filter(|text| !text.is_empty())
    }

    /// The first non-empty candidate text
    pub fn first_text(&self, html: &Html) -> Option<String> {
        self.texts(html).next()
    }

    /// The first non-empty value of any of `attrs` on a candidate element
    pub fn first_attr(&self, html: &Html, attrs: &[&str]) -> Option<String> {
        self.candidates(html).find_map(|element| {
            attrs
                .iter()
                .filter_map(|attr| element.value().attr(attr))
                .map(str::trim)
                .find(|value| !value.is_empty())
                .map(str::to_string)
        })
    }
}

/// Element text with whitespace runs collapsed
fn element_text(element: ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

lazy_static! {
    static ref TITLE: SelectorChain = SelectorChain::new(&[
        "#productTitle",
        "[data-feature-name=\"title\"] h1",
        ".product-title",
    ]);
    static ref PRICE: SelectorChain = SelectorChain::new(&[
        ".a-price-whole",
        ".a-price .a-offscreen",
        ".a-price-range .a-price .a-offscreen",
        "#price_inside_buybox",
        ".a-color-price",
    ]);
    static ref RATING: SelectorChain = SelectorChain::new(&[
        "[data-hook=\"average-star-rating\"] .a-icon-alt",
        "#acrPopover .a-icon-alt",
        ".a-icon-star .a-icon-alt",
    ]);
    static ref REVIEW_COUNT: SelectorChain = SelectorChain::new(&[
        "[data-hook=\"total-review-count\"]",
        "#acrCustomerReviewText",
        ".a-size-base",
    ]);
    static ref BRAND: SelectorChain = SelectorChain::new(&[
        "#bylineInfo",
        "[data-feature-name=\"bylineInfo\"] a",
        ".a-text-bold",
    ]);
    static ref AVAILABILITY: SelectorChain = SelectorChain::new(&[
        "#availability span",
        "#availability .a-color-success",
        "#availability .a-color-state",
    ]);
    static ref IMAGE: SelectorChain =
        SelectorChain::new(&["#landingImage", ".a-dynamic-image", "#main-image"]);
    static ref PRODUCT_LINKS: SelectorChain = SelectorChain::new(&[
        "[data-component-type=\"s-search-result\"] h2 a",
        "[data-component-type=\"s-search-result\"] .a-link-normal",
        ".s-result-item h2 a",
        ".s-result-item .a-link-normal",
    ]);
    static ref NEXT_PAGE: SelectorChain = SelectorChain::new(&[
        "a[aria-label=\"Go to next page\"]",
        ".s-pagination-next",
        ".pagnNextLink",
    ]);
    static ref DECIMAL: Regex = Regex::new(r"\d+(?:\.\d+)?").expect("Invalid decimal regex");
    static ref INTEGER: Regex = Regex::new(r"\d+").expect("Invalid integer regex");
    static ref BRAND_PREFIX: Regex =
        Regex::new(r"(?i)^(brand:|visit the|by)\s*").expect("Invalid brand prefix regex");
    static ref BRAND_SUFFIX: Regex =
        Regex::new(r"(?i)\s*store$").expect("Invalid brand suffix regex");
}

/// Parses a price such as `$1,299.99`
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned = text.replace(',', "");
    DECIMAL
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Parses a star rating such as `4.5 out of 5 stars`; values outside `[0, 5]` are rejected
pub fn parse_rating(text: &str) -> Option<f64> {
    DECIMAL
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|rating| (0.0..=5.0).contains(rating))
}

/// Parses a review count such as `12,345 ratings`
pub fn parse_review_count(text: &str) -> Option<u64> {
    let cleaned = text.replace(',', "");
    INTEGER
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<u64>().ok())
}

/// Strips the byline decoration around a brand name
pub fn clean_brand(text: &str) -> String {
    let without_prefix = BRAND_PREFIX.replace(text.trim(), "");
    BRAND_SUFFIX.replace(&without_prefix, "").trim().to_string()
}

/// Extracts a numeric field from a selector chain
fn numeric_field<T>(
    chain: &SelectorChain,
    html: &Html,
    parse: fn(&str) -> Option<T>,
) -> Option<FieldValue<T>> {
    let mut first_raw = None;

    for text in chain.texts(html) {
        if let Some(number) = parse(&text) {
            return Some(FieldValue::Number(number));
        }
        if first_raw.is_none() {
            first_raw = Some(text);
        }
    }

    first_raw.map(FieldValue::Raw)
}

pub fn extract_title(html: &Html) -> Option<String> {
    TITLE.first_text(html)
}

pub fn extract_price(html: &Html) -> Option<FieldValue<f64>> {
    numeric_field(&PRICE, html, parse_price)
}

pub fn extract_rating(html: &Html) -> Option<FieldValue<f64>> {
    numeric_field(&RATING, html, parse_rating)
}

pub fn extract_review_count(html: &Html) -> Option<FieldValue<u64>> {
    numeric_field(&REVIEW_COUNT, html, parse_review_count)
}

pub fn extract_brand(html: &Html) -> Option<String> {
    BRAND
        .texts(html)
        .map(|text| clean_brand(&text))
        .find(|brand| !brand.is_empty())
}

pub fn extract_availability(html: &Html) -> Option<String> {
    AVAILABILITY.first_text(html)
}

/// Main product image, resolved against the page URL when relative
pub fn extract_image_url(doc: &Document) -> Option<String> {
    IMAGE
        .first_attr(doc.html(), &["src", "data-src"])
        .map(|src| match resolve_href(&src, doc.url()) {
            Some(absolute) => absolute.to_string(),
            None => src,
        })
}

/// Product links on a search result page
///
/// Only `/dp/` links are kept; each is made absolute, stripped of its query
/// string and fragment, and deduplicated in page order.
pub fn extract_product_links(doc: &Document) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in PRODUCT_LINKS.all_matches(doc.html()) {
        let href = match element.value().attr("href") {
            Some(href) if href.contains("/dp/") => href,
            _ => continue,
        };

        let canonical = match resolve_href(href, doc.url()).map(canonicalize_parsed) {
            Some(Ok(url)) => url.to_string(),
            _ => continue,
        };

        if seen.insert(canonical.clone()) {
            links.push(canonical);
        }
    }

    links
}

/// Absolute URL of the next search result page, if the page links one
pub fn extract_next_page(doc: &Document) -> Option<String> {
    NEXT_PAGE
        .candidates(doc.html())
        .filter_map(|element| element.value().attr("href"))
        .find_map(|href| resolve_href(href, doc.url()))
        .map(|url| url.to_string())
}

/// Everything the crawl loop needs from a search result page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub product_links: Vec<String>,
    pub next_page: Option<String>,
}

pub fn extract_search_page(doc: &Document) -> SearchPage {
    SearchPage {
        product_links: extract_product_links(doc),
        next_page: extract_next_page(doc),
    }
}

/// Builds a record from a product page fetched from `product_url`
pub fn extract_product(doc: &Document, product_url: &str) -> ProductRecord {
    let html = doc.html();
    let mut record = ProductRecord::new(product_url, extract_asin(product_url));

    record.title = extract_title(html);
    record.price = extract_price(html);
    record.rating = extract_rating(html);
    record.review_count = extract_review_count(html);
    record.brand = extract_brand(html);
    record.availability = extract_availability(html);
    record.image_url = extract_image_url(doc);

    record
}
