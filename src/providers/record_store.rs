use crate::core::config::StoreConfig;
use crate::core::{PriceRecord, PriceSource, SourceError};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use futures::future::try_join_all;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const DEFAULT_CURRENCY: &str = "BRL";

const COMMODITY_KEYS: [&str; 4] = ["commodity", "ativo", "name", "id"];
const PRICE_KEYS: [&str; 4] = ["price", "preco", "valor", "value"];
const CURRENCY_KEYS: [&str; 2] = ["currency", "moeda"];
const TIMESTAMP_KEYS: [&str; 4] = ["timestamp", "data", "date", "updatedAt"];

/// Reads commodity quotes from the record store's REST interface.
///
/// Each configured collection is fetched from
/// `{base_url}/collections/{collection}/records`. Collections are fetched
/// concurrently and merged; there is no caching and no retry.
pub struct StorePriceSource {
    base_url: String,
    collections: Vec<String>,
    api_key: Option<String>,
    client: Client,
}

impl StorePriceSource {
    pub fn new(
        base_url: &str,
        collections: Vec<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .user_agent("ucs-monitor/0.3")
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        StorePriceSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            collections,
            api_key,
            client,
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(
            &config.base_url,
            config.collections.clone(),
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    async fn fetch_collection(&self, collection: &str) -> Result<Vec<PriceRecord>, SourceError> {
        let url = format!("{}/collections/{}/records", self.base_url, collection);
        debug!("Requesting price records from {}", url);

        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Unavailable(format!(
                "collection '{collection}' returned status {status}"
            )));
        }

        let body: Value = response.json().await.map_err(|e| {
            SourceError::Malformed(format!("collection '{collection}' is not valid JSON: {e}"))
        })?;

        let items = extract_items(body).ok_or_else(|| {
            SourceError::Malformed(format!(
                "collection '{collection}' response has no record list"
            ))
        })?;

        let total = items.len();
        let records: Vec<PriceRecord> = items
            .iter()
            .filter_map(|item| {
                let record = normalize_record(item);
                if record.is_none() {
                    warn!(collection, "Skipping record that cannot be normalized: {}", item);
                }
                record
            })
            .collect();

        debug!(
            collection,
            total,
            normalized = records.len(),
            "Fetched price records"
        );
        Ok(records)
    }
}

#[async_trait]
impl PriceSource for StorePriceSource {
    #[instrument(name = "StoreFetchPrices", skip(self))]
    async fn fetch_prices(&self) -> Result<Vec<PriceRecord>, SourceError> {
        let batches =
            try_join_all(self.collections.iter().map(|c| self.fetch_collection(c))).await?;

        let mut records: Vec<PriceRecord> = batches.into_iter().flatten().collect();
        records.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.commodity.cmp(&b.commodity))
        });
        Ok(records)
    }
}

/// Accepts a bare array, `{"records": [...]}` or `{"documents": [...]}`.
fn extract_items(body: Value) -> Option<Vec<Value>> {
    match body {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => ["records", "documents"]
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            }),
        _ => None,
    }
}

/// Looks a field up on the record itself, then inside a nested `fields` object.
fn field<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let nested = item.get("fields");
    keys.iter().find_map(|key| {
        item.get(*key)
            .or_else(|| nested.and_then(|f| f.get(*key)))
            .filter(|v| !v.is_null())
    })
}

fn normalize_record(item: &Value) -> Option<PriceRecord> {
    let commodity = field(item, &COMMODITY_KEYS)?.as_str()?.trim().to_string();
    let price = parse_price(field(item, &PRICE_KEYS)?)?;
    let currency = field(item, &CURRENCY_KEYS)
        .and_then(Value::as_str)
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
    let timestamp = parse_timestamp(field(item, &TIMESTAMP_KEYS)?)?;

    let record = PriceRecord {
        commodity,
        price,
        currency,
        timestamp,
    };
    record.is_usable().then_some(record)
}

fn parse_price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<f64>().ok().or_else(|| {
                // "1.234,56" style decimals
                s.replace('.', "").replace(',', ".").parse::<f64>().ok()
            })
        }
        _ => None,
    }
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => Utc.timestamp_millis_opt(n.as_i64()?).single(),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            ["%Y-%m-%d", "%d/%m/%Y"].iter().find_map(|fmt| {
                NaiveDate::parse_from_str(s, fmt)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|naive| naive.and_utc())
            })
        }
        // Serialized store timestamps: {"seconds": .., "nanoseconds": ..}
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            Utc.timestamp_opt(seconds, u32::try_from(nanos).ok()?).single()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_store_mock_server(
        collection: &str,
        mock_response: &str,
        status_code: u16,
    ) -> MockServer {
        let mock_server = MockServer::start().await;
        let expected_path = format!("/collections/{collection}/records");

        Mock::given(method("GET"))
            .and(path(&expected_path))
            .respond_with(ResponseTemplate::new(status_code).set_body_string(mock_response))
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn source(uri: &str, collections: &[&str]) -> StorePriceSource {
        StorePriceSource::new(
            uri,
            collections.iter().map(|c| c.to_string()).collect(),
            None,
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_successful_fetch_normalizes_and_sorts() {
        let mock_response = r#"[
            {"commodity": "soja", "price": 132.5, "currency": "brl", "timestamp": "2024-06-02T10:00:00Z"},
            {"ativo": "milho", "preco": "58,40", "data": "01/06/2024"},
            {"id": "boi", "fields": {"valor": 231.0, "moeda": "BRL", "updatedAt": {"_seconds": 1717236000, "_nanoseconds": 0}}}
        ]"#;
        let mock_server = create_store_mock_server("commodity_prices", mock_response, 200).await;

        let records = source(&mock_server.uri(), &["commodity_prices"])
            .fetch_prices()
            .await
            .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].commodity, "milho");
        assert_eq!(records[0].price, 58.40);
        assert_eq!(records[0].currency, "BRL");
        assert_eq!(records[1].commodity, "boi");
        assert_eq!(records[1].timestamp, Utc.timestamp_opt(1717236000, 0).unwrap());
        assert_eq!(records[2].commodity, "soja");
        assert_eq!(records[2].currency, "BRL");
        assert!(records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test]
    async fn test_wrapped_records_and_skipped_entries() {
        let mock_response = r#"{"records": [
            {"commodity": "cafe", "price": 1200.0, "timestamp": 1717236000000},
            {"commodity": "cafe", "price": "n/a", "timestamp": 1717236000000},
            {"price": 10.0, "timestamp": 1717236000000},
            {"commodity": "acucar", "price": -1.0, "timestamp": 1717236000000}
        ]}"#;
        let mock_server = create_store_mock_server("cotacoes", mock_response, 200).await;

        let records = source(&mock_server.uri(), &["cotacoes"])
            .fetch_prices()
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].commodity, "cafe");
        assert_eq!(records[0].price, 1200.0);
    }

    #[tokio::test]
    async fn test_multiple_collections_are_merged() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections/a/records"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"commodity": "soja", "price": 1.0, "timestamp": "2024-06-02"}
            ])))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/collections/b/records"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"documents": [
                {"commodity": "milho", "price": 2.0, "timestamp": "2024-06-01"}
            ]})))
            .mount(&mock_server)
            .await;

        let records = source(&mock_server.uri(), &["a", "b"])
            .fetch_prices()
            .await
            .unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.commodity.as_str()).collect();
        assert_eq!(names, vec!["milho", "soja"]);
    }

    #[tokio::test]
    async fn test_api_key_is_sent_as_bearer() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections/commodity_prices/records"))
            .and(header("authorization", "Bearer store-key"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = StorePriceSource::new(
            &mock_server.uri(),
            vec!["commodity_prices".to_string()],
            Some("store-key".to_string()),
            Duration::from_secs(5),
        );
        let records = provider.fetch_prices().await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_store_error_status() {
        let mock_server = create_store_mock_server("commodity_prices", "Server Error", 500).await;

        let result = source(&mock_server.uri(), &["commodity_prices"])
            .fetch_prices()
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)));
        assert!(err.to_string().contains("returned status 500"));
    }

    #[tokio::test]
    async fn test_store_malformed_response() {
        let mock_server =
            create_store_mock_server("commodity_prices", r#"{"not_records": 1}"#, 200).await;

        let result = source(&mock_server.uri(), &["commodity_prices"])
            .fetch_prices()
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
        assert!(err.to_string().contains("has no record list"));
    }

    #[tokio::test]
    async fn test_unreachable_store() {
        let result = source("http://127.0.0.1:9", &["commodity_prices"])
            .fetch_prices()
            .await;
        assert!(matches!(result, Err(SourceError::Unavailable(_))));
    }

    #[test]
    fn test_parse_price_variants() {
        assert_eq!(parse_price(&json!(12.5)), Some(12.5));
        assert_eq!(parse_price(&json!("12.5")), Some(12.5));
        assert_eq!(parse_price(&json!("1.234,56")), Some(1234.56));
        assert_eq!(parse_price(&json!(true)), None);
    }
}
