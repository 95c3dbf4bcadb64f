pub mod auth;
pub mod feeds;
pub mod inventory;
pub mod recap;

use axum::Json;

use crate::error::ApiError;

/// Unwrap the optional Json extractor so a missing or malformed body
/// becomes this API's uniform 400 instead of the framework default.
pub(crate) fn require_body<T>(payload: Option<Json<T>>) -> Result<T, ApiError> {
    payload
        .map(|Json(inner)| inner)
        .ok_or_else(|| ApiError::bad_request("invalid or missing JSON body"))
}

/// Validation shortcut: a required string field must be present and
/// non-empty before any database work happens.
pub(crate) fn require_field<'a>(
    value: &'a Option<String>,
    name: &str,
) -> Result<&'a str, ApiError> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::missing_field(name)),
    }
}

/// Same for fields that may be numbers or strings (reference ids).
pub(crate) fn require_value<'a>(
    value: &'a Option<serde_json::Value>,
    name: &str,
) -> Result<&'a serde_json::Value, ApiError> {
    match value {
        Some(serde_json::Value::Null) | None => Err(ApiError::missing_field(name)),
        Some(v) => Ok(v),
    }
}

/// Success envelope around a gateway row set.
pub(crate) fn rows_response(
    outcome: crate::gateway::GatewayOutcome,
) -> crate::middleware::ApiResult<serde_json::Value> {
    match outcome {
        crate::gateway::GatewayOutcome::Rows(rows) => Ok(
            crate::middleware::ApiResponse::success(serde_json::json!(rows)),
        ),
        outcome => unexpected_outcome(outcome),
    }
}

/// A handler asked the gateway for one outcome kind and got another; that
/// is a server bug, not a client error.
pub(crate) fn unexpected_outcome<T>(
    outcome: crate::gateway::GatewayOutcome,
) -> Result<T, ApiError> {
    tracing::error!(?outcome, "gateway returned an unexpected outcome kind");
    Err(ApiError::internal("unexpected gateway outcome"))
}
