//! Configuration module for Shelf-Scout
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, plus the flat JSON actor input that can be overlaid on top of them.
//!
//! # Example
//!
//! ```no_run
//! use shelf_scout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scout.toml")).unwrap();
//! println!("Crawl starts at: {}", config.crawl.start_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ActorInput, Config, CrawlConfig, OutputConfig, OverCeilingPolicy, PacingConfig, ProxyConfig,
    SessionConfig, DEFAULT_START_URL,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, hash_content, load_config, load_config_with_hash, load_input,
    resolve_config,
};
pub use validation::{validate, MAX_DELAY_SECS};
