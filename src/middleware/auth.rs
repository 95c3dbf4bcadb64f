use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method},
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::state::AppState;

/// Endpoints reachable without a session token.
const PUBLIC_PATHS: &[&str] = &["/", "/health", "/login"];

/// Authenticated user context resolved from the session token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub username: String,
    pub token: String,
}

/// Session authentication middleware. This is the sole admission-control
/// point: it runs ahead of every handler, passes the public whitelist and
/// pre-flight requests through untouched, and otherwise requires a live
/// `Bearer <token>` resolved against the session store.
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if request.method() == Method::OPTIONS || PUBLIC_PATHS.contains(&request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let token = extract_bearer_token(request.headers())
        .map_err(ApiError::unauthorized)?
        .to_string();

    let session = state
        .sessions
        .lookup(&token)
        .await
        .ok_or_else(|| ApiError::unauthorized("invalid or expired token"))?;

    // Attach the resolved user so downstream handlers can audit per-user
    let mut request = request;
    request.extensions_mut().insert(AuthUser {
        username: session.username,
        token,
    });

    Ok(next.run(request).await)
}

/// Extract the token from a literal `Bearer <token>` Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let auth_header = headers
        .get("authorization")
        .ok_or("authentication required: missing Authorization header")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "invalid Authorization header encoding")?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token),
        Some(_) => Err("empty bearer token"),
        None => Err("Authorization header must use the Bearer scheme"),
    }
}
