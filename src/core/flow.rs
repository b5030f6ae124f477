//! Generative flow abstraction used for narratives and price refreshes

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Flow '{flow}' request failed: {message}")]
    Transport { flow: String, message: String },

    #[error("Flow '{flow}' returned status {status}")]
    Status { flow: String, status: u16 },

    #[error("Flow '{flow}' returned a malformed response: {message}")]
    Malformed { flow: String, message: String },

    #[error("Flow '{flow}' reported failure: {message}")]
    Rejected { flow: String, message: String },
}

#[async_trait]
pub trait FlowRunner: Send + Sync {
    /// Runs a named flow with a JSON input and returns its `result` payload.
    async fn run_flow(&self, flow: &str, input: Value) -> Result<Value, FlowError>;
}
