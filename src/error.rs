// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request - missing or malformed request fields
    BadRequest(String),

    // 401 Unauthorized - missing or invalid session token
    Unauthorized(String),

    // 404 Not Found - delete matched nothing, unknown recap server
    NotFound(String),

    // 409 Conflict - resource already registered
    Conflict(String),

    // 500 Internal Server Error - any backend failure
    Internal(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::Internal(msg) => msg,
        }
    }

    /// Convert to the JSON error body: {"status": "error", "message": ...}
    pub fn to_json(&self) -> Value {
        json!({
            "status": "error",
            "message": self.message(),
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }

    /// Missing-field shortcut used by handler input validation
    pub fn missing_field(field: &str) -> Self {
        ApiError::BadRequest(format!("missing required field: {}", field))
    }
}

// Convert gateway errors into API errors
impl From<crate::gateway::GatewayError> for ApiError {
    fn from(err: crate::gateway::GatewayError) -> Self {
        use crate::gateway::GatewayError;
        match err {
            GatewayError::InvalidTable(name) => {
                ApiError::bad_request(format!("unknown or invalid table: {}", name))
            }
            GatewayError::InvalidColumn(name) => {
                ApiError::bad_request(format!("invalid column name: {}", name))
            }
            GatewayError::InvalidProcedure(name) => {
                ApiError::bad_request(format!("unknown or invalid procedure: {}", name))
            }
            GatewayError::NotFound(msg) => ApiError::not_found(msg),
            GatewayError::Database(db_err) => {
                tracing::error!("database pool error: {}", db_err);
                ApiError::internal(format!("database unavailable: {}", db_err))
            }
            GatewayError::Timeout => {
                tracing::error!("database call exceeded the configured timeout");
                ApiError::internal("database call timed out")
            }
            GatewayError::Sqlx(sqlx_err) => {
                tracing::error!("sqlx error: {}", sqlx_err);
                ApiError::internal(format!("database error: {}", sqlx_err))
            }
        }
    }
}

impl From<crate::database::manager::DatabaseError> for ApiError {
    fn from(err: crate::database::manager::DatabaseError) -> Self {
        tracing::error!("database error: {}", err);
        ApiError::internal(format!("database unavailable: {}", err))
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(ApiError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::unauthorized("x").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::internal("x").status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_body_shape() {
        let body = ApiError::missing_field("password").to_json();
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "missing required field: password");
    }
}
