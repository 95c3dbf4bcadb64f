//! Login and logout: the only mutation points of the session store.

use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

use super::{require_body, require_field};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// POST /login - validate credentials and issue a session token.
///
/// Field validation happens before any credential work, so a request with
/// a missing password is answered 400 without touching the hash.
pub async fn login(
    State(state): State<AppState>,
    payload: Option<Json<LoginRequest>>,
) -> Result<Json<Value>, ApiError> {
    let payload = require_body(payload)?;
    let username = require_field(&payload.username, "username")?;
    let password = require_field(&payload.password, "password")?;

    if !state.credentials.validate(username, password) {
        tracing::warn!(user = username, "failed login attempt");
        return Err(ApiError::unauthorized("invalid credentials"));
    }

    let token = state.sessions.create(username).await;
    tracing::info!(user = username, "session opened");

    Ok(Json(json!({ "status": "success", "token": token })))
}

/// POST /logout - revoke the presented token. The auth middleware has
/// already resolved it, so revocation cannot miss.
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<()> {
    state.sessions.revoke(&user.token).await;
    tracing::info!(user = user.username, "session closed");
    Ok(ApiResponse::message("logged out"))
}
