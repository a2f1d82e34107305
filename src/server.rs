//! # Server Configuration
//!
//! Axum router, shared application state, and the OpenAPI document.

use axum::{
    routing::{get, post},
    Json, Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;

use crate::config::AppConfig;
use crate::handlers;
use crate::ingestion::IngestionJob;

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub job: Arc<IngestionJob>,
}

/// Creates and configures the Axum application router.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route(
            "/internal/ingestion/run",
            post(handlers::ingestion::trigger_ingestion),
        )
        .route(
            "/internal/ingestion/methods",
            get(handlers::ingestion::available_methods),
        )
        .route(
            "/internal/audit/request/{request_id}",
            get(handlers::audit::by_request),
        )
        .route("/internal/audit/run/{run_id}", get(handlers::audit::by_run))
        .route("/internal/audit/recent", get(handlers::audit::recent))
        .route("/api/v1/city", get(handlers::records::list_city))
        .route("/api/v1/partial", get(handlers::records::list_partial))
        .route("/api/v1/weekly", get(handlers::records::list_weekly))
        .route("/api/v1/monthly", get(handlers::records::list_monthly))
        .route("/api/v1/supply", get(handlers::records::list_supply))
        .route("/openapi.json", get(openapi_json))
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Starts the server with the given configuration and state.
pub async fn run_server(config: Arc<AppConfig>, state: AppState) -> anyhow::Result<()> {
    let app = create_app(state);

    let addr = config
        .bind_addr()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {e}"))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, profile = %config.profile, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::ingestion::trigger_ingestion,
        crate::handlers::ingestion::available_methods,
        crate::handlers::audit::by_request,
        crate::handlers::audit::by_run,
        crate::handlers::audit::recent,
        crate::handlers::records::list_city,
        crate::handlers::records::list_partial,
        crate::handlers::records::list_weekly,
        crate::handlers::records::list_monthly,
        crate::handlers::records::list_supply,
    ),
    components(schemas(
        crate::models::ServiceInfo,
        crate::handlers::ingestion::TriggerAccepted,
        crate::handlers::ingestion::TriggerRejected,
        crate::handlers::ingestion::MethodsResponse,
        crate::handlers::audit::AuditEventDto,
        crate::handlers::audit::AuditTrailDto,
        crate::handlers::records::CityPriceDto,
        crate::handlers::records::PartialMarketDto,
        crate::handlers::records::WeeklyWholesaleDto,
        crate::handlers::records::MonthlyWholesaleDto,
        crate::handlers::records::MonthlySupplyDto,
    )),
    info(
        title = "SIPSA Ingestion API",
        description = "Ingestion control plane and curated read API for SIPSA pricing and supply data",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
