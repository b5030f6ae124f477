//! Narrative reports over the index and the store they are persisted into

use crate::core::flow::{FlowError, FlowRunner};
use crate::core::index::{IndexAggregator, IndexError, IndexValue};
use crate::core::interval::Interval;
use crate::core::price::{PriceRecord, PriceSource, SourceError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Data the narrative was written from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSnapshot {
    pub index: IndexValue,
    pub prices: Vec<PriceRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: Uuid,
    pub narrative: String,
    pub snapshot: ReportSnapshot,
    pub created_at: DateTime<Utc>,
    pub requested_by: Option<String>,
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn save(&self, report: &Report) -> anyhow::Result<()>;

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Report>>;

    /// Most recent reports first.
    async fn list(&self, limit: usize) -> anyhow::Result<Vec<Report>>;
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("AI generation failed: {0}")]
    Generation(#[from] FlowError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// What a report should cover and who asked for it.
#[derive(Debug, Clone, Default)]
pub struct ReportContext {
    pub interval: Interval,
    pub requested_by: Option<String>,
}

pub struct ReportGenerator {
    source: Arc<dyn PriceSource>,
    flows: Arc<dyn FlowRunner>,
    aggregator: IndexAggregator,
    store: Arc<dyn ReportStore>,
    flow_name: String,
}

impl ReportGenerator {
    pub fn new(
        source: Arc<dyn PriceSource>,
        flows: Arc<dyn FlowRunner>,
        aggregator: IndexAggregator,
        store: Arc<dyn ReportStore>,
        flow_name: impl Into<String>,
    ) -> Self {
        Self {
            source,
            flows,
            aggregator,
            store,
            flow_name: flow_name.into(),
        }
    }

    /// Fetches prices, computes the index and asks the report flow for a
    /// narrative. The finished report is saved; a failed save is logged and
    /// the report is still returned.
    #[instrument(name = "GenerateReport", skip(self, context), fields(interval = %context.interval))]
    pub async fn generate_report(&self, context: ReportContext) -> Result<Report, ReportError> {
        let prices = self.source.fetch_prices().await?;
        let index = self.aggregator.compute(&prices, context.interval)?;

        let input = json!({
            "interval": index.interval,
            "indexValue": index.value,
            "components": index.components,
            "series": index.series,
        });
        let result = self.flows.run_flow(&self.flow_name, input).await?;
        let narrative = extract_narrative(&result).ok_or_else(|| FlowError::Malformed {
            flow: self.flow_name.clone(),
            message: "empty narrative".to_string(),
        })?;

        let report = Report {
            id: Uuid::new_v4(),
            narrative,
            snapshot: ReportSnapshot { index, prices },
            created_at: Utc::now(),
            requested_by: context.requested_by,
        };

        if let Err(e) = self.store.save(&report).await {
            warn!(report_id = %report.id, "Failed to persist report: {e:#}");
        }
        info!(report_id = %report.id, "Generated report");
        Ok(report)
    }

    pub async fn list_reports(&self, limit: usize) -> Result<Vec<Report>, ReportError> {
        Ok(self.store.list(limit).await?)
    }

    pub async fn get_report(&self, id: Uuid) -> Result<Option<Report>, ReportError> {
        Ok(self.store.get(id).await?)
    }
}

/// Accepts either a bare string result or an object carrying `narrative`
/// (or `report`).
fn extract_narrative(result: &Value) -> Option<String> {
    let text = match result {
        Value::String(text) => text.as_str(),
        Value::Object(fields) => fields
            .get("narrative")
            .or_else(|| fields.get("report"))
            .and_then(Value::as_str)?,
        _ => return None,
    };
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
