//! Aggregation feeds backed by stored procedures: the BI feeder and the
//! two query-sniffer reports. Each endpoint is pinned to its procedure
//! name; the body may carry positional arguments.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::Value;

use crate::gateway::OperationDescriptor;
use crate::middleware::ApiResult;
use crate::state::AppState;

use super::rows_response;

#[derive(Debug, Deserialize, Default)]
pub struct FeedRequest {
    /// Positional procedure arguments; absent means none
    pub args: Option<Vec<Value>>,
}

/// POST /feed_dbai
pub async fn feed_dbai(
    State(state): State<AppState>,
    payload: Option<Json<FeedRequest>>,
) -> ApiResult<Value> {
    run_feed(state, "feed_dbai", payload).await
}

/// POST /mysql_sniffer
pub async fn mysql_sniffer(
    State(state): State<AppState>,
    payload: Option<Json<FeedRequest>>,
) -> ApiResult<Value> {
    run_feed(state, "mysql_sniffer", payload).await
}

/// POST /mysql_sniffer_hosts
pub async fn mysql_sniffer_hosts(
    State(state): State<AppState>,
    payload: Option<Json<FeedRequest>>,
) -> ApiResult<Value> {
    run_feed(state, "mysql_sniffer_hosts", payload).await
}

async fn run_feed(
    state: AppState,
    procedure: &str,
    payload: Option<Json<FeedRequest>>,
) -> ApiResult<Value> {
    // An absent body means a plain no-argument call
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let args = payload.args.unwrap_or_default();

    let descriptor = OperationDescriptor::procedure_call(procedure, args);
    rows_response(state.gateway.execute(descriptor).await?)
}
