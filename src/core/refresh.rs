//! Triggers the flow that pulls fresh commodity prices into the record store

use crate::core::flow::{FlowError, FlowRunner};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, instrument};

pub const DEFAULT_REFRESH_MESSAGE: &str = "Prices updated successfully";

pub struct PriceRefresher {
    flows: Arc<dyn FlowRunner>,
    flow_name: String,
}

impl PriceRefresher {
    pub fn new(flows: Arc<dyn FlowRunner>, flow_name: impl Into<String>) -> Self {
        Self {
            flows,
            flow_name: flow_name.into(),
        }
    }

    /// Runs the update flow and returns its message. The flow writes the new
    /// prices itself; nothing is read back here.
    #[instrument(name = "RefreshPrices", skip(self))]
    pub async fn refresh_prices(&self) -> Result<String, FlowError> {
        let result = self.flows.run_flow(&self.flow_name, json!({})).await?;

        let message = match &result {
            Value::String(text) => Some(text.trim().to_string()),
            Value::Object(fields) => fields
                .get("message")
                .and_then(Value::as_str)
                .map(|m| m.trim().to_string()),
            _ => None,
        }
        .filter(|m| !m.is_empty());

        if result.get("success").and_then(Value::as_bool) == Some(false) {
            return Err(FlowError::Rejected {
                flow: self.flow_name.clone(),
                message: message.unwrap_or_else(|| "no message".to_string()),
            });
        }

        let message = message.unwrap_or_else(|| DEFAULT_REFRESH_MESSAGE.to_string());
        info!("{}", message);
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Answer(Result<Value, u16>);

    #[async_trait]
    impl FlowRunner for Answer {
        async fn run_flow(&self, flow: &str, _input: Value) -> Result<Value, FlowError> {
            assert_eq!(flow, "updateCommodityPrices");
            self.0.clone().map_err(|status| FlowError::Status {
                flow: flow.to_string(),
                status,
            })
        }
    }

    fn refresher(answer: Result<Value, u16>) -> PriceRefresher {
        PriceRefresher::new(Arc::new(Answer(answer)), "updateCommodityPrices")
    }

    #[tokio::test]
    async fn test_flow_message_is_returned() {
        let message = refresher(Ok(json!({"success": true, "message": "12 prices stored"})))
            .refresh_prices()
            .await
            .unwrap();
        assert_eq!(message, "12 prices stored");
    }

    #[tokio::test]
    async fn test_default_message() {
        let message = refresher(Ok(json!({"updated": 3})))
            .refresh_prices()
            .await
            .unwrap();
        assert_eq!(message, DEFAULT_REFRESH_MESSAGE);
    }

    #[tokio::test]
    async fn test_reported_failure() {
        let err = refresher(Ok(json!({"success": false, "message": "quota"})))
            .refresh_prices()
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::Rejected { ref message, .. } if message == "quota"));
    }

    #[tokio::test]
    async fn test_status_error_propagates() {
        let err = refresher(Err(500)).refresh_prices().await.unwrap_err();
        assert!(matches!(err, FlowError::Status { status: 500, .. }));
    }
}
