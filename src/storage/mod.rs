//! Storage module for persisting the product dataset
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Run tracking (config hash, status, stop reason)
//! - Product persistence and dataset statistics

mod dataset;
mod schema;
mod sqlite;
mod traits;

pub use dataset::SqliteDataset;
pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::output::StopReason;

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub emitted: u64,
    pub stop_reason: Option<StopReason>,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Aggregate over numeric prices
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PriceSummary {
    pub priced: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

pub(crate) fn stop_reason_from_db(s: &str) -> Option<StopReason> {
    match s {
        "max_products" => Some(StopReason::MaxProducts),
        "no_next_page" => Some(StopReason::NoNextPage),
        "pagination_loop" => Some(StopReason::PaginationLoop),
        "max_pages" => Some(StopReason::MaxPages),
        "search_page_failed" => Some(StopReason::SearchPageFailed),
        "sink_failed" => Some(StopReason::SinkFailed),
        _ => None,
    }
}
