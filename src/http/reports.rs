use crate::core::{Interval, Report, ReportContext};
use crate::http::AppState;
use crate::http::error::ApiError;
use crate::http::session::RequestContext;
use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use uuid::Uuid;

const DEFAULT_LIST_LIMIT: usize = 20;
const MAX_LIST_LIMIT: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub struct GenerateReportRequest {
    pub interval: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

pub async fn create_report(
    State(state): State<AppState>,
    context: RequestContext,
    body: Bytes,
) -> Result<Json<Report>, ApiError> {
    let request: GenerateReportRequest = if body.iter().all(u8::is_ascii_whitespace) {
        GenerateReportRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::Validation(format!("Invalid report request: {e}")))?
    };
    let interval = Interval::from_query(request.interval.as_deref())?;

    let report = state
        .reports
        .generate_report(ReportContext {
            interval,
            requested_by: Some(context.user.uid),
        })
        .await?;
    Ok(Json(report))
}

pub async fn list_reports(
    State(state): State<AppState>,
    _context: RequestContext,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Report>>, ApiError> {
    let Query(query) = query?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    Ok(Json(state.reports.list_reports(limit).await?))
}

pub async fn get_report(
    State(state): State<AppState>,
    _context: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<Report>, ApiError> {
    let not_found = || ApiError::NotFound("Report not found".to_string());
    let id = Uuid::parse_str(&id).map_err(|_| not_found())?;
    state
        .reports
        .get_report(id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}
