use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;

/// Wrapper for API responses that adds the success envelope:
/// `{"status": "success", "data": ...}` or `{"status": "success", "message": ...}`
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    body: Body<T>,
    status_code: StatusCode,
}

#[derive(Debug)]
enum Body<T: Serialize> {
    Data(T),
    Message(String),
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 response carrying a data payload
    pub fn success(data: T) -> Self {
        Self {
            body: Body::Data(data),
            status_code: StatusCode::OK,
        }
    }

    /// Response with a custom status code
    pub fn with_status(data: T, status_code: StatusCode) -> Self {
        Self {
            body: Body::Data(data),
            status_code,
        }
    }
}

impl ApiResponse<()> {
    /// 200 response carrying a human-readable message instead of data
    pub fn message(message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            body: Body::Message(message.into()),
            status_code: StatusCode::OK,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let envelope = match self.body {
            Body::Message(message) => json!({ "status": "success", "message": message }),
            Body::Data(data) => match serde_json::to_value(&data) {
                Ok(value) => json!({ "status": "success", "data": value }),
                Err(e) => {
                    tracing::error!("failed to serialize response data: {}", e);
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({
                            "status": "error",
                            "message": "failed to serialize response data"
                        })),
                    )
                        .into_response();
                }
            },
        };

        (self.status_code, Json(envelope)).into_response()
    }
}

/// Handler result alias: success envelope or ApiError
pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;
