//! UCS index aggregation over an interval window

use crate::core::interval::Interval;
use crate::core::price::PriceRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq)]
pub enum IndexError {
    #[error("Index computation failed: no usable price records for interval {0}")]
    NoData(Interval),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexValue {
    pub value: f64,
    pub interval: Interval,
    pub computed_at: DateTime<Utc>,
    /// Newest record timestamp; the window ends here.
    pub as_of: DateTime<Utc>,
    pub series: Vec<SeriesPoint>,
    /// Latest record per commodity that fed `value`.
    pub components: Vec<PriceRecord>,
}

impl IndexValue {
    pub fn window_start(&self) -> DateTime<Utc> {
        self.as_of - self.interval.to_duration()
    }
}

/// Computes the index as the weighted mean of the latest price of each
/// commodity inside the window. Commodities without a configured weight
/// count as 1.0; a non-positive weight leaves the commodity out.
#[derive(Debug, Clone, Default)]
pub struct IndexAggregator {
    weights: HashMap<String, f64>,
}

impl IndexAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: &HashMap<String, f64>) -> Self {
        Self {
            weights: weights
                .iter()
                .map(|(commodity, weight)| (commodity.to_lowercase(), *weight))
                .collect(),
        }
    }

    fn weight(&self, commodity: &str) -> f64 {
        self.weights
            .get(&commodity.to_lowercase())
            .copied()
            .unwrap_or(1.0)
    }

    pub fn compute(
        &self,
        records: &[PriceRecord],
        interval: Interval,
    ) -> Result<IndexValue, IndexError> {
        let usable: Vec<&PriceRecord> = records.iter().filter(|r| r.is_usable()).collect();
        let as_of = usable
            .iter()
            .map(|r| r.timestamp)
            .max()
            .ok_or(IndexError::NoData(interval))?;
        let start = as_of - interval.to_duration();

        let in_window: Vec<&PriceRecord> = usable
            .into_iter()
            .filter(|r| r.timestamp >= start && r.timestamp <= as_of)
            .collect();

        let mut latest: BTreeMap<&str, &PriceRecord> = BTreeMap::new();
        for &record in &in_window {
            carry_forward(&mut latest, record);
        }
        let (value, used) = self
            .weighted_mean(&latest)
            .ok_or(IndexError::NoData(interval))?;

        // Records stamped exactly at `as_of` fold into the last bucket
        let step_secs = interval.step().num_seconds().max(1);
        let window_secs = interval.to_duration().num_seconds();
        let last_bucket = (window_secs + step_secs - 1) / step_secs - 1;
        let mut buckets: BTreeMap<i64, Vec<&PriceRecord>> = BTreeMap::new();
        for &record in &in_window {
            let offset = (record.timestamp - start).num_seconds();
            let bucket = (offset / step_secs).min(last_bucket);
            buckets.entry(bucket).or_default().push(record);
        }

        // Each point is the index as known at the end of its bucket
        let mut known: BTreeMap<&str, &PriceRecord> = BTreeMap::new();
        let mut series = Vec::with_capacity(buckets.len());
        for bucket in buckets.values() {
            for &record in bucket {
                carry_forward(&mut known, record);
            }
            let Some(timestamp) = bucket.iter().map(|r| r.timestamp).max() else {
                continue;
            };
            if let Some((value, _)) = self.weighted_mean(&known) {
                series.push(SeriesPoint { timestamp, value });
            }
        }

        debug!(
            interval = %interval,
            records = in_window.len(),
            points = series.len(),
            value,
            "Computed index"
        );

        Ok(IndexValue {
            value,
            interval,
            computed_at: Utc::now(),
            as_of,
            series,
            components: used.into_iter().cloned().collect(),
        })
    }

    /// Weighted mean over one record per commodity, or `None` when nothing
    /// carries weight.
    fn weighted_mean<'a>(
        &self,
        latest: &BTreeMap<&str, &'a PriceRecord>,
    ) -> Option<(f64, Vec<&'a PriceRecord>)> {
        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;
        let mut used = Vec::with_capacity(latest.len());
        for &record in latest.values() {
            let weight = self.weight(&record.commodity);
            if weight <= 0.0 {
                continue;
            }
            weighted_sum += record.price * weight;
            total_weight += weight;
            used.push(record);
        }

        if total_weight > 0.0 {
            Some((weighted_sum / total_weight, used))
        } else {
            None
        }
    }
}

/// Keeps the newest record per commodity. The BTreeMap keeps the summation
/// order stable between calls.
fn carry_forward<'a>(
    latest: &mut BTreeMap<&'a str, &'a PriceRecord>,
    record: &'a PriceRecord,
) {
    latest
        .entry(record.commodity.as_str())
        .and_modify(|current| {
            if record.timestamp >= current.timestamp {
                *current = record;
            }
        })
        .or_insert(record);
}
