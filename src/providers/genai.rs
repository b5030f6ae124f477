use crate::core::config::AiConfig;
use crate::core::{FlowError, FlowRunner};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, instrument};

/// Model settings sent along with every flow invocation.
#[derive(Debug, Clone, Serialize)]
pub struct FlowSettings {
    pub model: String,
    pub plugin: String,
    pub version: String,
}

/// HTTP client for the generative flow service.
///
/// Built once at startup and shared; flows are invoked with
/// `POST {base_url}/{flow}` and a `{"data": .., "config": ..}` body, and
/// answer with `{"result": ..}`.
pub struct HttpFlowClient {
    base_url: String,
    api_key: Option<String>,
    settings: FlowSettings,
    client: Client,
}

impl HttpFlowClient {
    pub fn new(
        base_url: &str,
        settings: FlowSettings,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .user_agent("ucs-monitor/0.3")
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        HttpFlowClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            settings,
            client,
        }
    }

    pub fn from_config(config: &AiConfig) -> Self {
        Self::new(
            &config.base_url,
            FlowSettings {
                model: config.model.clone(),
                plugin: config.plugin.clone(),
                version: config.version.clone(),
            },
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl FlowRunner for HttpFlowClient {
    #[instrument(name = "RunFlow", skip(self, input))]
    async fn run_flow(&self, flow: &str, input: Value) -> Result<Value, FlowError> {
        let url = format!("{}/{}", self.base_url, flow);
        debug!("Invoking flow at {}", url);

        let body = json!({ "data": input, "config": self.settings });
        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| FlowError::Transport {
            flow: flow.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FlowError::Status {
                flow: flow.to_string(),
                status: status.as_u16(),
            });
        }

        let mut payload: Value = response.json().await.map_err(|e| FlowError::Malformed {
            flow: flow.to_string(),
            message: e.to_string(),
        })?;

        match payload.get_mut("result").map(Value::take) {
            Some(result) if !result.is_null() => Ok(result),
            _ => Err(FlowError::Malformed {
                flow: flow.to_string(),
                message: "missing 'result' field".to_string(),
            }),
        }
    }
}
