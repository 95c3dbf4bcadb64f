use axum::{
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use dbmon_api::auth::CredentialStore;
use dbmon_api::database::DatabaseManager;
use dbmon_api::gateway::{QueryGateway, TableRegistry};
use dbmon_api::handlers;
use dbmon_api::middleware::session_auth_middleware;
use dbmon_api::state::AppState;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, DBMON_USERS, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = dbmon_api::config::config();
    tracing::info!("starting dbmon API in {:?} mode", config.environment);

    let credentials = CredentialStore::from_config(&config.security)
        .unwrap_or_else(|e| panic!("failed to load credentials: {}", e));
    if credentials.is_empty() {
        tracing::warn!("credential store is empty; every login will be rejected");
    } else {
        tracing::info!("loaded {} credential(s)", credentials.len());
    }

    let gateway = QueryGateway::new(TableRegistry::from_config(&config.gateway));
    let state = AppState::new(credentials, gateway);

    let app = app(state);

    let bind_addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("dbmon API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // API surface; the session middleware whitelists /login itself
        .merge(auth_routes())
        .merge(inventory_routes())
        .merge(recap_routes())
        .merge(feed_routes())
        // Global middleware
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    use handlers::auth;

    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

fn inventory_routes() -> Router<AppState> {
    use handlers::inventory;

    Router::new()
        .route("/insert", post(inventory::insert))
        .route("/get_info_version", post(inventory::get_info_version))
        .route("/get_info_server", post(inventory::get_info_server))
        .route("/set_info_version", post(inventory::set_info_version))
        .route("/set_info_server", post(inventory::set_info_server))
        .route("/delete", delete(inventory::delete_entry))
        .route("/set_db_server", post(inventory::set_db_server))
        .route("/set_user_db", post(inventory::set_user_db))
}

fn recap_routes() -> Router<AppState> {
    use handlers::recap;

    Router::new()
        .route("/insert_server_recap", post(recap::insert_server_recap))
        .route("/insert_recap_values", post(recap::insert_recap_values))
        .route("/get_recap_values", get(recap::get_recap_values))
}

fn feed_routes() -> Router<AppState> {
    use handlers::feeds;

    Router::new()
        .route("/feed_dbai", post(feeds::feed_dbai))
        .route("/mysql_sniffer", post(feeds::mysql_sniffer))
        .route("/mysql_sniffer_hosts", post(feeds::mysql_sniffer_hosts))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "status": "success",
        "data": {
            "name": "dbmon API",
            "version": version,
            "description": "Inventory and monitoring API for database server fleets",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "login": "/login (public - token acquisition)",
                "logout": "/logout (protected)",
                "inventory": "/insert, /get_info_version, /get_info_server, /set_info_version, /set_info_server, /delete, /set_db_server, /set_user_db (protected)",
                "recap": "/insert_server_recap, /insert_recap_values, /get_recap_values (protected)",
                "feeds": "/feed_dbai, /mysql_sniffer, /mysql_sniffer_hosts (protected)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "data": {
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "error",
                "message": format!("database unavailable: {}", e)
            })),
        ),
    }
}
