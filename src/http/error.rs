use crate::core::{AuthError, FlowError, IndexError, IntervalError, ReportError, SourceError};
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

/// Every handler failure ends up here. Upstream and internal details are
/// logged and replaced by a fixed message in the `{error}` envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(#[from] AuthError),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}: {detail}")]
    Upstream {
        message: &'static str,
        detail: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream { .. } | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::Unauthenticated(_) => "Not authenticated".to_string(),
            ApiError::Validation(message) | ApiError::NotFound(message) => message.clone(),
            ApiError::Upstream { message, .. } => message.to_string(),
            ApiError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Unauthenticated(reason) => debug!("Rejected request: {reason}"),
            ApiError::Validation(_) | ApiError::NotFound(_) => debug!("{self}"),
            ApiError::Upstream { .. } | ApiError::Internal(_) => error!("{self}"),
        }
        let body = Json(json!({ "error": self.public_message() }));
        (self.status(), body).into_response()
    }
}

impl From<IntervalError> for ApiError {
    fn from(e: IntervalError) -> Self {
        ApiError::Validation(e.to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        ApiError::Validation(format!("Invalid query string: {}", e.body_text()))
    }
}

impl From<SourceError> for ApiError {
    fn from(e: SourceError) -> Self {
        ApiError::Upstream {
            message: "Failed to fetch commodity prices",
            detail: e.to_string(),
        }
    }
}

impl From<IndexError> for ApiError {
    fn from(e: IndexError) -> Self {
        ApiError::Upstream {
            message: "Failed to compute UCS index",
            detail: e.to_string(),
        }
    }
}

impl From<FlowError> for ApiError {
    fn from(e: FlowError) -> Self {
        ApiError::Upstream {
            message: "AI generation failed",
            detail: e.to_string(),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(e: ReportError) -> Self {
        match e {
            ReportError::Source(e) => e.into(),
            ReportError::Index(e) => e.into(),
            ReportError::Generation(e) => e.into(),
            ReportError::Storage(e) => ApiError::Internal(format!("{e:#}")),
        }
    }
}
