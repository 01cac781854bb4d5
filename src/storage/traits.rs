//! Storage traits and error types

use crate::output::StopReason;
use crate::product::ProductRecord;
use crate::storage::{PriceSummary, RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for dataset storage backends
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new run in the `running` state and returns its id
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Marks a run finished with its final status, count and stop reason
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        emitted: u64,
        stop_reason: Option<StopReason>,
    ) -> StorageResult<()>;

    fn count_runs(&self) -> StorageResult<u64>;

    // ===== Products =====

    fn insert_product(&mut self, run_id: i64, record: &ProductRecord) -> StorageResult<i64>;

    fn count_products(&self) -> StorageResult<u64>;

    fn count_products_for_run(&self, run_id: i64) -> StorageResult<u64>;

    fn count_distinct_asins(&self) -> StorageResult<u64>;

    fn count_flagged(&self) -> StorageResult<u64>;

    /// Minimum, maximum and mean over records with a numeric price
    fn price_summary(&self) -> StorageResult<PriceSummary>;

    /// Records of one run in insertion order
    fn load_products(&self, run_id: i64) -> StorageResult<Vec<ProductRecord>>;
}
