use crate::core::{Report, ReportStore};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_CAPACITY: usize = 100;

/// In-memory report store, used when no data path is configured. Only the
/// newest `capacity` reports are kept.
#[derive(Clone)]
pub struct MemoryReportStore {
    inner: Arc<Mutex<HashMap<Uuid, Report>>>,
    capacity: usize,
}

impl Default for MemoryReportStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn save(&self, report: &Report) -> Result<()> {
        let mut reports = self.inner.lock().await;
        debug!("Report PUT for id: {}", report.id);
        reports.insert(report.id, report.clone());
        while reports.len() > self.capacity {
            let Some(oldest) = reports
                .values()
                .min_by_key(|r| r.created_at)
                .map(|r| r.id)
            else {
                break;
            };
            reports.remove(&oldest);
            debug!("Evicted report {oldest}");
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Report>> {
        let reports = self.inner.lock().await;
        Ok(reports.get(&id).cloned())
    }

    async fn list(&self, limit: usize) -> Result<Vec<Report>> {
        let reports = self.inner.lock().await;
        let mut all: Vec<Report> = reports.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all.truncate(limit);
        Ok(all)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::{IndexValue, Interval, PriceRecord, ReportSnapshot};
    use chrono::{Duration, TimeZone, Utc};

    pub(crate) fn sample_report(minutes_after: i64) -> Report {
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let record = PriceRecord::new("soja", 130.0, "BRL", base);
        Report {
            id: Uuid::new_v4(),
            narrative: format!("Report {minutes_after}"),
            snapshot: ReportSnapshot {
                index: IndexValue {
                    value: 130.0,
                    interval: Interval::OneDay,
                    computed_at: base,
                    as_of: base,
                    series: Vec::new(),
                    components: vec![record.clone()],
                },
                prices: vec![record],
            },
            created_at: base + Duration::minutes(minutes_after),
            requested_by: Some("u1".to_string()),
        }
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let store = MemoryReportStore::new();
        let report = sample_report(0);

        assert!(store.get(report.id).await.unwrap().is_none());
        store.save(&report).await.unwrap();
        assert_eq!(store.get(report.id).await.unwrap(), Some(report));
    }

    #[tokio::test]
    async fn test_list_newest_first_with_limit() {
        let store = MemoryReportStore::new();
        for minutes in [5, 1, 10] {
            store.save(&sample_report(minutes)).await.unwrap();
        }

        let listed = store.list(2).await.unwrap();
        let narratives: Vec<&str> = listed.iter().map(|r| r.narrative.as_str()).collect();
        assert_eq!(narratives, vec!["Report 10", "Report 5"]);
    }

    #[tokio::test]
    async fn test_oldest_reports_are_evicted() {
        let store = MemoryReportStore::with_capacity(2);
        let oldest = sample_report(1);
        for report in [sample_report(3), oldest.clone(), sample_report(2)] {
            store.save(&report).await.unwrap();
        }

        assert!(store.get(oldest.id).await.unwrap().is_none());
        let listed = store.list(10).await.unwrap();
        let narratives: Vec<&str> = listed.iter().map(|r| r.narrative.as_str()).collect();
        assert_eq!(narratives, vec!["Report 3", "Report 2"]);
    }
}
