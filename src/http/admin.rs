//! Placeholder endpoints kept for client compatibility. They acknowledge the
//! call and change nothing.

use axum::Json;
use axum::body::Bytes;
use serde_json::{Value, json};
use tracing::info;

pub async fn migrate_data() -> Json<Value> {
    info!("Data migration requested; nothing to migrate");
    Json(json!({
        "success": true,
        "message": "Data migration is not required; no changes were made"
    }))
}

/// Echoes the JSON body back under `data`; a non-JSON body echoes `null`.
pub async fn reorganize_webhook(body: Bytes) -> Json<Value> {
    let data = serde_json::from_slice::<Value>(&body).unwrap_or(Value::Null);
    info!("Reorganization webhook received");
    Json(json!({
        "success": true,
        "message": "Reorganization webhook processed successfully",
        "data": data
    }))
}

pub async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
