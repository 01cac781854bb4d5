//! State module for tracking crawl progress
//!
//! This module provides the state owned by the crawl loop for the duration of
//! a run.
//!
//! # Components
//!
//! - `Session` / `SessionRotator`: the active identity lifetime and the policy
//!   deciding when it is replaced
//! - `CrawlState`: seen ASINs, visited search pages and emission counts
//! - `CrawlPhase`: the phases of the crawl loop state machine

mod crawl_state;
mod phase;
mod session;

// Re-export main types
pub use crawl_state::CrawlState;
pub use phase::CrawlPhase;
pub use session::{RotationPolicy, RotationReason, Session, SessionRotator};
