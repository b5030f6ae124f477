use crate::core::{Report, ReportStore};
use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::{debug, warn};
use uuid::Uuid;

const REPORTS_PARTITION: &str = "reports";

/// Report store backed by a fjall keyspace on disk. Reports are keyed by id
/// and stored as JSON.
pub struct DiskReportStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskReportStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create report directory: {}", path.display()))?;
        let keyspace = Config::new(path)
            .open()
            .with_context(|| format!("Failed to open report store at {}", path.display()))?;
        let partition = keyspace
            .open_partition(REPORTS_PARTITION, PartitionCreateOptions::default())
            .context("Failed to open reports partition")?;
        debug!("Opened report store at {}", path.display());
        Ok(Self {
            keyspace,
            partition,
        })
    }
}

#[async_trait]
impl ReportStore for DiskReportStore {
    async fn save(&self, report: &Report) -> Result<()> {
        let value = serde_json::to_vec(report).context("Failed to serialize report")?;
        self.partition.insert(report.id.as_bytes().as_slice(), value)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!("Report PUT for id: {}", report.id);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Report>> {
        match self.partition.get(id.as_bytes().as_slice())? {
            Some(bytes) => Ok(Some(
                serde_json::from_slice(&bytes).context("Failed to deserialize report")?,
            )),
            None => Ok(None),
        }
    }

    async fn list(&self, limit: usize) -> Result<Vec<Report>> {
        let mut reports = Vec::new();
        for entry in self.partition.iter() {
            let (key, value) = entry?;
            match serde_json::from_slice::<Report>(&value) {
                Ok(report) => reports.push(report),
                Err(e) => warn!("Skipping unreadable report {:?}: {}", key, e),
            }
        }
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        reports.truncate(limit);
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::tests::sample_report;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_disk_store_save_get_list() {
        let dir = tempdir().unwrap();
        let store = DiskReportStore::open(dir.path()).unwrap();

        let older = sample_report(1);
        let newer = sample_report(2);
        store.save(&older).await.unwrap();
        store.save(&newer).await.unwrap();

        assert_eq!(store.get(older.id).await.unwrap(), Some(older.clone()));
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());

        let listed = store.list(10).await.unwrap();
        assert_eq!(listed, vec![newer, older]);
    }

    #[tokio::test]
    async fn test_disk_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let report = sample_report(0);
        {
            let store = DiskReportStore::open(dir.path()).unwrap();
            store.save(&report).await.unwrap();
        }

        let reopened = DiskReportStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get(report.id).await.unwrap(), Some(report));
    }
}
