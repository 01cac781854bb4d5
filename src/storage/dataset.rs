use crate::output::{CrawlReport, OutputResult, RecordSink, StopReason};
use crate::product::ProductRecord;
use crate::storage::{RunStatus, SqliteStorage, Storage, StorageResult};
use std::path::Path;

/// A record sink that stores one run's records in SQLite
///
/// The run row is created on open and finished by `complete`.
pub struct SqliteDataset {
    storage: SqliteStorage,
    run_id: i64,
    inserted: u64,
}

impl SqliteDataset {
    /// Opens the database and starts a run tagged with `config_hash`
    pub fn open(path: &Path, config_hash: &str) -> StorageResult<Self> {
        Self::start(SqliteStorage::new(path)?, config_hash)
    }

    /// Starts a run on an existing storage handle
    pub fn start(mut storage: SqliteStorage, config_hash: &str) -> StorageResult<Self> {
        let run_id = storage.create_run(config_hash)?;
        tracing::debug!("Started dataset run {}", run_id);
        Ok(Self {
            storage,
            run_id,
            inserted: 0,
        })
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }
}

impl RecordSink for SqliteDataset {
    fn push(&mut self, record: &ProductRecord) -> OutputResult<()> {
        self.storage.insert_product(self.run_id, record)?;
        self.inserted += 1;
        Ok(())
    }

    fn complete(&mut self, report: &CrawlReport) -> OutputResult<()> {
        let status = match report.stop_reason {
            StopReason::SinkFailed => RunStatus::Failed,
            StopReason::SearchPageFailed if report.emitted == 0 => RunStatus::Failed,
            _ => RunStatus::Completed,
        };

        self.storage
            .finish_run(self.run_id, status, self.inserted, Some(report.stop_reason))?;
        tracing::info!(
            "Stored {} records in dataset run {} ({})",
            self.inserted,
            self.run_id,
            status.to_db_string()
        );
        Ok(())
    }
}
