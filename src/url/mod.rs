//! URL handling module for Shelf-Scout
//!
//! This module provides link resolution, product URL canonicalization, and
//! ASIN extraction.

mod asin;
mod normalize;

// Re-export main functions
pub use asin::extract_asin;
pub use normalize::{canonicalize_parsed, canonicalize_url, resolve_href};
