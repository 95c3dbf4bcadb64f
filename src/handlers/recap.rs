//! Server recap endpoints. A recap row (one per server, natural key
//! `server_name`) owns `(value_name, value_data, timestamp)` tuples;
//! inserting values resolves the owning row's id by name first.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::ApiError;
use crate::gateway::{GatewayOutcome, OperationDescriptor};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

use super::{require_body, require_field, rows_response, unexpected_outcome};

const RECAP_TABLE: &str = "server_recap";
const RECAP_VALUES_TABLE: &str = "recap_values";
const RECAP_PROCEDURE: &str = "get_recap_values";

#[derive(Debug, Deserialize)]
pub struct ServerRecapRequest {
    pub server_name: Option<String>,
}

/// POST /insert_server_recap - register a server in the recap table.
/// Registration is not a feeder: an already-known server is a 409.
pub async fn insert_server_recap(
    State(state): State<AppState>,
    payload: Option<Json<ServerRecapRequest>>,
) -> ApiResult<Value> {
    let payload = require_body(payload)?;
    let server_name = require_field(&payload.server_name, "server_name")?;

    let descriptor = OperationDescriptor::insert_if_absent(
        RECAP_TABLE,
        vec![("server_name".to_string(), json!(server_name))],
    );

    match state.gateway.execute(descriptor).await? {
        GatewayOutcome::Inserted { id } => Ok(ApiResponse::success(json!({ "id": id }))),
        GatewayOutcome::Exists { .. } => Err(ApiError::conflict(format!(
            "server {} is already registered",
            server_name
        ))),
        outcome => unexpected_outcome(outcome),
    }
}

#[derive(Debug, Deserialize)]
pub struct RecapValuesRequest {
    pub server_name: Option<String>,
    pub value_data: Option<Map<String, Value>>,
}

/// POST /insert_recap_values - attach a batch of named values to a
/// registered server. Unknown server is 404; the owning recap row id is
/// resolved by name before any value insert.
pub async fn insert_recap_values(
    State(state): State<AppState>,
    payload: Option<Json<RecapValuesRequest>>,
) -> ApiResult<Value> {
    let payload = require_body(payload)?;
    let server_name = require_field(&payload.server_name, "server_name")?;
    let values = payload
        .value_data
        .as_ref()
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::missing_field("value_data"))?;

    // Foreign-key-by-lookup: find the owning recap row
    let lookup = OperationDescriptor::select(
        RECAP_TABLE,
        vec![("server_name".to_string(), json!(server_name))],
    );
    let id_server = match state.gateway.execute(lookup).await? {
        GatewayOutcome::Rows(rows) => rows
            .first()
            .and_then(|row| row.get("id").cloned())
            .ok_or_else(|| {
                ApiError::not_found(format!("server {} has no recap entry", server_name))
            })?,
        outcome => return unexpected_outcome(outcome),
    };

    let stamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let mut inserted = 0u64;
    for (value_name, value_data) in values {
        let descriptor = OperationDescriptor::insert(
            RECAP_VALUES_TABLE,
            vec![
                ("id_server".to_string(), id_server.clone()),
                ("value_name".to_string(), json!(value_name)),
                ("value_data".to_string(), value_data.clone()),
                ("created_at".to_string(), json!(stamp)),
            ],
        );
        state.gateway.execute(descriptor).await?;
        inserted += 1;
    }

    Ok(ApiResponse::success(json!({ "inserted": inserted })))
}

/// GET /get_recap_values - the aggregation procedure's full output,
/// every result set drained and flattened.
pub async fn get_recap_values(State(state): State<AppState>) -> ApiResult<Value> {
    let descriptor = OperationDescriptor::procedure_call(RECAP_PROCEDURE, vec![]);
    rows_response(state.gateway.execute(descriptor).await?)
}
