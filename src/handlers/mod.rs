//! # API Handlers
//!
//! HTTP endpoint handlers: the operational trigger and audit APIs, the
//! curated read API, and the root/health endpoints.

pub mod audit;
pub mod ingestion;
pub mod records;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde_json::{json, Value};

use crate::db;
use crate::models::ServiceInfo;
use crate::server::AppState;

/// Service identity, active profile, window zone, and registered method
/// count.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service identity and runtime profile", body = ServiceInfo)
    ),
    tag = "ops"
)]
pub async fn root(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        profile: state.config.profile.clone(),
        timezone: state.config.timezone.clone(),
        methods: state.job.registry().len(),
    })
}

/// Liveness probe backed by a `SELECT 1` against the database.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Database unreachable")
    ),
    tag = "ops"
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match db::health_check(&state.db).await {
        Ok(()) => (StatusCode::OK, Json(json!({"status": "UP"}))),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "DOWN", "error": err.to_string()})),
        ),
    }
}
