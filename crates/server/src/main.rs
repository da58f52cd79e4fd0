use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use server_api::{
    get_responses, get_stats, get_status_checks, record_response, record_status_check, ApiContext,
};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{
        CreateStatusCheckRequest, RecordResponseRequest, ResponsePayload, StatsPayload,
        StatusCheckPayload,
    },
};
use storage::Storage;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

mod config;

use config::{load_settings, normalize_database_url, Settings};

#[derive(Clone)]
struct AppState {
    api: ApiContext,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let database_url = normalize_database_url(&settings.database_url);
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let api = ApiContext { storage };

    let state = AppState { api };
    let app = build_router(Arc::new(state)).layer(cors_layer(&settings));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/", get(api_root))
        .route("/api/status", post(http_record_status_check))
        .route("/api/status", get(http_list_status_checks))
        .route("/api/confession/response", post(http_record_response))
        .route("/api/confession/responses", get(http_list_responses))
        .route("/api/confession/stats", get(http_stats))
        .with_state(state)
}

fn cors_layer(settings: &Settings) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if settings.cors_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = settings
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    layer.allow_origin(origins)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn api_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Hello World" }))
}

async fn http_record_response(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RecordResponseRequest>,
) -> Result<Json<ResponsePayload>, (StatusCode, Json<ApiError>)> {
    let payload = record_response(
        &state.api,
        &req.response,
        req.user_agent.as_deref(),
        req.ip_address.as_deref(),
    )
    .await
    .map_err(reject)?;
    Ok(Json(payload))
}

async fn http_list_responses(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ResponsePayload>>, (StatusCode, Json<ApiError>)> {
    let responses = get_responses(&state.api).await.map_err(reject)?;
    Ok(Json(responses))
}

async fn http_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsPayload>, (StatusCode, Json<ApiError>)> {
    let stats = get_stats(&state.api).await.map_err(reject)?;
    Ok(Json(stats))
}

async fn http_record_status_check(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateStatusCheckRequest>,
) -> Result<Json<StatusCheckPayload>, (StatusCode, Json<ApiError>)> {
    let payload = record_status_check(&state.api, &req.client_name)
        .await
        .map_err(reject)?;
    Ok(Json(payload))
}

async fn http_list_status_checks(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StatusCheckPayload>>, (StatusCode, Json<ApiError>)> {
    let checks = get_status_checks(&state.api).await.map_err(reject)?;
    Ok(Json(checks))
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(err))
}
