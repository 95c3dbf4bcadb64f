//! Inventory endpoints: dynamic inserts, lookups and deletes against the
//! caller-named table, plus the dedup feeders for databases and users.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::gateway::{GatewayOutcome, OperationDescriptor};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

use super::{require_body, require_field, require_value, rows_response, unexpected_outcome};

#[derive(Debug, Deserialize)]
pub struct InsertRequest {
    pub db_table: Option<String>,
    pub server_name: Option<String>,
    pub server_ip: Option<String>,
    pub sgbd_type: Option<String>,
}

/// POST /insert - register a server row in the caller-named table.
pub async fn insert(
    State(state): State<AppState>,
    payload: Option<Json<InsertRequest>>,
) -> ApiResult<Value> {
    let payload = require_body(payload)?;
    let table = require_field(&payload.db_table, "db_table")?;
    let server_name = require_field(&payload.server_name, "server_name")?;
    let server_ip = require_field(&payload.server_ip, "server_ip")?;
    let sgbd_type = require_field(&payload.sgbd_type, "sgbd_type")?;

    let descriptor = OperationDescriptor::insert(
        table,
        vec![
            ("server_name".to_string(), json!(server_name)),
            ("server_ip".to_string(), json!(server_ip)),
            ("sgbd_type".to_string(), json!(sgbd_type)),
        ],
    );

    match state.gateway.execute(descriptor).await? {
        GatewayOutcome::Inserted { id } => {
            Ok(ApiResponse::success(json!({ "last_insert_id": id })))
        }
        outcome => unexpected_outcome(outcome),
    }
}

#[derive(Debug, Deserialize)]
pub struct VersionQuery {
    pub db_table: Option<String>,
    pub version: Option<String>,
}

/// POST /get_info_version - rows matching a software version.
pub async fn get_info_version(
    State(state): State<AppState>,
    payload: Option<Json<VersionQuery>>,
) -> ApiResult<Value> {
    let payload = require_body(payload)?;
    let table = require_field(&payload.db_table, "db_table")?;
    let version = require_field(&payload.version, "version")?;

    let descriptor =
        OperationDescriptor::select(table, vec![("version".to_string(), json!(version))]);
    rows_response(state.gateway.execute(descriptor).await?)
}

#[derive(Debug, Deserialize)]
pub struct ServerQuery {
    pub db_table: Option<String>,
    pub server_name: Option<String>,
}

/// POST /get_info_server - rows matching a server name.
pub async fn get_info_server(
    State(state): State<AppState>,
    payload: Option<Json<ServerQuery>>,
) -> ApiResult<Value> {
    let payload = require_body(payload)?;
    let table = require_field(&payload.db_table, "db_table")?;
    let server_name = require_field(&payload.server_name, "server_name")?;

    let descriptor =
        OperationDescriptor::select(table, vec![("server_name".to_string(), json!(server_name))]);
    rows_response(state.gateway.execute(descriptor).await?)
}

#[derive(Debug, Deserialize)]
pub struct SetVersionRequest {
    pub db_table: Option<String>,
    pub software: Option<String>,
    pub version: Option<String>,
}

/// POST /set_info_version - record a software version.
pub async fn set_info_version(
    State(state): State<AppState>,
    payload: Option<Json<SetVersionRequest>>,
) -> ApiResult<Value> {
    let payload = require_body(payload)?;
    let table = require_field(&payload.db_table, "db_table")?;
    let software = require_field(&payload.software, "software")?;
    let version = require_field(&payload.version, "version")?;

    let descriptor = OperationDescriptor::insert(
        table,
        vec![
            ("software".to_string(), json!(software)),
            ("version".to_string(), json!(version)),
        ],
    );

    match state.gateway.execute(descriptor).await? {
        GatewayOutcome::Inserted { id } => {
            Ok(ApiResponse::success(json!({ "last_insert_id": id })))
        }
        outcome => unexpected_outcome(outcome),
    }
}

#[derive(Debug, Deserialize)]
pub struct SetServerRequest {
    pub db_table: Option<String>,
    pub server_name: Option<String>,
    pub server_ip: Option<String>,
    pub server_env: Option<String>,
    pub id_software: Option<Value>,
}

/// POST /set_info_server - record a server with its environment and
/// software reference.
pub async fn set_info_server(
    State(state): State<AppState>,
    payload: Option<Json<SetServerRequest>>,
) -> ApiResult<Value> {
    let payload = require_body(payload)?;
    let table = require_field(&payload.db_table, "db_table")?;
    let server_name = require_field(&payload.server_name, "server_name")?;
    let server_ip = require_field(&payload.server_ip, "server_ip")?;
    let server_env = require_field(&payload.server_env, "server_env")?;
    let id_software = require_value(&payload.id_software, "id_software")?;

    let descriptor = OperationDescriptor::insert(
        table,
        vec![
            ("server_name".to_string(), json!(server_name)),
            ("server_ip".to_string(), json!(server_ip)),
            ("server_env".to_string(), json!(server_env)),
            ("id_software".to_string(), id_software.clone()),
        ],
    );

    match state.gateway.execute(descriptor).await? {
        GatewayOutcome::Inserted { id } => {
            Ok(ApiResponse::success(json!({ "last_insert_id": id })))
        }
        outcome => unexpected_outcome(outcome),
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub db_table: Option<String>,
    pub server_ip: Option<String>,
}

/// DELETE /delete - remove rows by server IP. Zero matches is 404, not a
/// silent success.
pub async fn delete_entry(
    State(state): State<AppState>,
    payload: Option<Json<DeleteRequest>>,
) -> ApiResult<()> {
    let payload = require_body(payload)?;
    let table = require_field(&payload.db_table, "db_table")?;
    let server_ip = require_field(&payload.server_ip, "server_ip")?;

    let descriptor = OperationDescriptor::delete(table, "server_ip", json!(server_ip));
    state.gateway.execute(descriptor).await?;
    Ok(ApiResponse::message("entry deleted"))
}

#[derive(Debug, Deserialize)]
pub struct SetDbServerRequest {
    pub db_table: Option<String>,
    pub id_ref_server: Option<Value>,
    pub db_name: Option<String>,
}

/// POST /set_db_server - register a database on a server unless that pair
/// is already known; the envelope status distinguishes the two.
pub async fn set_db_server(
    State(state): State<AppState>,
    payload: Option<Json<SetDbServerRequest>>,
) -> Result<Json<Value>, ApiError> {
    let payload = require_body(payload)?;
    let table = require_field(&payload.db_table, "db_table")?;
    let id_ref_server = require_value(&payload.id_ref_server, "id_ref_server")?;
    let db_name = require_field(&payload.db_name, "db_name")?;

    let descriptor = OperationDescriptor::insert_if_absent(
        table,
        vec![
            ("id_ref_server".to_string(), id_ref_server.clone()),
            ("db_name".to_string(), json!(db_name)),
        ],
    );
    dedup_response(state.gateway.execute(descriptor).await?)
}

#[derive(Debug, Deserialize)]
pub struct SetUserDbRequest {
    pub db_table: Option<String>,
    pub id_ref_servers: Option<Value>,
    pub dbuser: Option<String>,
    pub dbhost: Option<String>,
}

/// POST /set_user_db - register a database account (user@host on a server)
/// unless already known.
pub async fn set_user_db(
    State(state): State<AppState>,
    payload: Option<Json<SetUserDbRequest>>,
) -> Result<Json<Value>, ApiError> {
    let payload = require_body(payload)?;
    let table = require_field(&payload.db_table, "db_table")?;
    let id_ref_servers = require_value(&payload.id_ref_servers, "id_ref_servers")?;
    let dbuser = require_field(&payload.dbuser, "dbuser")?;
    let dbhost = require_field(&payload.dbhost, "dbhost")?;

    let descriptor = OperationDescriptor::insert_if_absent(
        table,
        vec![
            ("id_ref_servers".to_string(), id_ref_servers.clone()),
            ("dbuser".to_string(), json!(dbuser)),
            ("dbhost".to_string(), json!(dbhost)),
        ],
    );
    dedup_response(state.gateway.execute(descriptor).await?)
}

/// The dedup feeders answer 200 either way; `status` carries the verdict
/// and `data.id` the surviving row in both cases.
fn dedup_response(outcome: GatewayOutcome) -> Result<Json<Value>, ApiError> {
    match outcome {
        GatewayOutcome::Inserted { id } => {
            Ok(Json(json!({ "status": "success", "data": { "id": id } })))
        }
        GatewayOutcome::Exists { id } => {
            Ok(Json(json!({ "status": "exists", "data": { "id": id } })))
        }
        outcome => {
            tracing::error!(?outcome, "gateway returned a non-dedup outcome");
            Err(ApiError::internal("unexpected gateway outcome"))
        }
    }
}

