//! Statistics generation from the dataset database
//!
//! This module provides functionality for extracting and displaying
//! dataset statistics from the storage layer.

use crate::storage::{PriceSummary, RunRecord, Storage};
use crate::ScoutError;

/// Dataset statistics summary
#[derive(Debug, Clone)]
pub struct DatasetStatistics {
    pub total_runs: u64,

    /// Records stored across all runs
    pub total_products: u64,

    pub distinct_asins: u64,

    /// Records kept despite exceeding the price ceiling
    pub flagged_products: u64,

    pub prices: PriceSummary,

    pub latest_run: Option<RunRecord>,

    /// Records stored by the latest run
    pub latest_run_products: u64,
}

/// Loads statistics from storage
pub fn load_statistics(storage: &dyn Storage) -> Result<DatasetStatistics, ScoutError> {
    let latest_run = storage.get_latest_run()?;
    let latest_run_products = match &latest_run {
        Some(run) => storage.count_products_for_run(run.id)?,
        None => 0,
    };

    Ok(DatasetStatistics {
        total_runs: storage.count_runs()?,
        total_products: storage.count_products()?,
        distinct_asins: storage.count_distinct_asins()?,
        flagged_products: storage.count_flagged()?,
        prices: storage.price_summary()?,
        latest_run,
        latest_run_products,
    })
}

fn money(value: Option<f64>) -> String {
    value
        .map(|v| format!("${:.2}", v))
        .unwrap_or_else(|| "N/A".to_string())
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &DatasetStatistics) {
    println!("=== Dataset Statistics ===\n");

    println!("Overview:");
    println!("  Runs: {}", stats.total_runs);
    println!("  Products stored: {}", stats.total_products);
    println!("  Distinct ASINs: {}", stats.distinct_asins);
    println!("  Over price ceiling (flagged): {}", stats.flagged_products);
    println!();

    println!("Prices:");
    println!("  With numeric price: {}", stats.prices.priced);
    println!("  Min: {}", money(stats.prices.min));
    println!("  Max: {}", money(stats.prices.max));
    println!("  Mean: {}", money(stats.prices.mean));
    println!();

    if let Some(run) = &stats.latest_run {
        println!("Latest run (#{}):", run.id);
        println!("  Started: {}", run.started_at);
        println!(
            "  Finished: {}",
            run.finished_at.as_deref().unwrap_or("not finished")
        );
        println!("  Status: {}", run.status.to_db_string());
        println!(
            "  Stop reason: {}",
            run.stop_reason
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string())
        );
        println!("  Records: {}", stats.latest_run_products);
        println!("  Config hash: {}", run.config_hash);
    } else {
        println!("No runs recorded yet.");
    }
}
