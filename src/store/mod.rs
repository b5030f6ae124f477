pub mod disk;
pub mod memory;

use crate::core::ReportStore;
use crate::core::config::ReportsConfig;
use anyhow::Result;
use disk::DiskReportStore;
use memory::{DEFAULT_CAPACITY, MemoryReportStore};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Picks the on-disk store when a data path is configured, memory otherwise.
pub fn open_report_store(config: &ReportsConfig) -> Result<Arc<dyn ReportStore>> {
    match &config.data_path {
        Some(path) => {
            info!("Persisting reports under {}", path);
            Ok(Arc::new(DiskReportStore::open(Path::new(path))?))
        }
        None => {
            info!("No reports.data_path configured; reports are kept in memory");
            let capacity = config.max_in_memory.unwrap_or(DEFAULT_CAPACITY);
            Ok(Arc::new(MemoryReportStore::with_capacity(capacity)))
        }
    }
}
