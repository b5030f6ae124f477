use crate::core::{IndexValue, Interval, PriceRecord};
use crate::http::AppState;
use crate::http::error::ApiError;
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::http::header::CACHE_CONTROL;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    pub interval: Option<String>,
}

/// Serves `/api/commodity-prices` and its `/api/cotacoes` alias.
pub async fn commodity_prices(State(state): State<AppState>) -> Result<Response, ApiError> {
    let prices: Vec<PriceRecord> = state.source.fetch_prices().await?;
    Ok(([(CACHE_CONTROL, "no-store")], Json(prices)).into_response())
}

pub async fn ucs_index(
    State(state): State<AppState>,
    query: Result<Query<IndexQuery>, QueryRejection>,
) -> Result<Json<IndexValue>, ApiError> {
    let Query(query) = query?;
    let interval = Interval::from_query(query.interval.as_deref())?;
    let prices = state.source.fetch_prices().await?;
    let index = state.aggregator.compute(&prices, interval)?;
    Ok(Json(index))
}

pub async fn update_prices(State(state): State<AppState>) -> Response {
    match state.refresher.refresh_prices().await {
        Ok(message) => Json(json!({ "success": true, "message": message })).into_response(),
        Err(e) => {
            error!("Price refresh failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "message": "Failed to update prices" })),
            )
                .into_response()
        }
    }
}
