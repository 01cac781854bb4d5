//! Shelf-Scout: a polite marketplace product harvester
//!
//! This crate walks a marketplace's search result pages, follows product
//! links, extracts structured product attributes, and emits price-filtered
//! records. Requests are paced with jittered delays and issued under rotating
//! identities (user agent, cookie jar, optional proxy session) that are
//! replaced on schedule or as soon as the site signals a block.

pub mod config;
pub mod crawler;
pub mod identity;
pub mod output;
pub mod product;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Shelf-Scout operations
///
/// Individual fetch failures are not errors; they are reported as
/// [`crawler::FetchOutcome`] values. Only failures that end a run surface here.
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Identity error: {0}")]
    Identity(String),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to parse actor input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Shelf-Scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlReport, FetchOutcome, Fetcher, StopReason};
pub use product::{FieldValue, PriceFilter, ProductRecord};
pub use state::{CrawlPhase, CrawlState, RotationReason, Session, SessionRotator};
pub use url::{canonicalize_url, extract_asin};
