use crate::core::AuthenticatedUser;
use crate::http::AppState;
use crate::http::error::ApiError;
use crate::http::session::{RequestContext, cleared_cookie, session_cookie};
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub token: String,
}

pub async fn verify(context: RequestContext) -> Json<AuthenticatedUser> {
    Json(context.user)
}

/// Exchanges a signed token for the `auth-token` cookie.
pub async fn create_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: SessionRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::Validation(format!("Invalid session request: {e}")))?;
    let user = state.verifier.authenticate(&request.token)?;
    info!(uid = %user.uid, "Session started");

    let cookie = session_cookie(request.token.trim(), &state.cookies);
    Ok(([(SET_COOKIE, cookie)], Json(user)).into_response())
}

pub async fn logout(State(state): State<AppState>) -> Response {
    (
        [(SET_COOKIE, cleared_cookie(&state.cookies))],
        Json(json!({ "message": "Logged out successfully" })),
    )
        .into_response()
}

pub async fn forgot_password() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Password reset is no longer handled by this server. Request it directly from the identity provider SDK on the client."
    }))
}
