//! # Audit Query Handlers
//!
//! Read-only views over the append-only audit trail: by correlation id,
//! by run id, and the most recent events.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::models::ingestion_audit;
use crate::repositories::AuditRepository;
use crate::server::AppState;

const RECENT_LIMIT: u64 = 100;

/// One audit event as exposed by the API.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditEventDto {
    pub audit_id: i64,
    pub run_id: Option<i64>,
    pub request_id: Option<String>,
    pub request_source: String,
    pub event_type: String,
    pub message: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl From<ingestion_audit::Model> for AuditEventDto {
    fn from(model: ingestion_audit::Model) -> Self {
        Self {
            audit_id: model.audit_id,
            run_id: model.run_id,
            request_id: model.request_id,
            request_source: model.request_source,
            event_type: model.event_type,
            message: model.message,
            occurred_at: model.occurred_at,
        }
    }
}

/// Full lifecycle of one request, oldest event first.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditTrailDto {
    pub request_id: String,
    pub event_count: usize,
    pub first_event: DateTime<Utc>,
    pub last_event: DateTime<Utc>,
    pub events: Vec<AuditEventDto>,
}

/// Audit trail for one correlation id.
#[utoipa::path(
    get,
    path = "/internal/audit/request/{request_id}",
    params(("request_id" = String, Path, description = "Correlation id")),
    responses(
        (status = 200, description = "Audit trail", body = AuditTrailDto),
        (status = 404, description = "No events for this request id"),
    ),
    tag = "audit"
)]
pub async fn by_request(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> Result<Json<AuditTrailDto>, ApiError> {
    debug!(request_id, "Querying audit trail");

    let audits = AuditRepository::new(state.db.clone())
        .trail_by_request_id(&request_id)
        .await?;

    if audits.is_empty() {
        return Err(ApiError::not_found(format!(
            "No audit trail found for request {request_id}"
        )));
    }

    let first_event = audits[0].occurred_at;
    let last_event = audits[audits.len() - 1].occurred_at;
    let events: Vec<AuditEventDto> = audits.into_iter().map(AuditEventDto::from).collect();

    Ok(Json(AuditTrailDto {
        request_id,
        event_count: events.len(),
        first_event,
        last_event,
        events,
    }))
}

/// Audit events for one ingestion run.
#[utoipa::path(
    get,
    path = "/internal/audit/run/{run_id}",
    params(("run_id" = i64, Path, description = "Run id")),
    responses(
        (status = 200, description = "Events for the run", body = [AuditEventDto]),
        (status = 404, description = "No events for this run"),
    ),
    tag = "audit"
)]
pub async fn by_run(
    State(state): State<AppState>,
    Path(run_id): Path<i64>,
) -> Result<Json<Vec<AuditEventDto>>, ApiError> {
    debug!(run_id, "Querying audit trail by run");

    let audits = AuditRepository::new(state.db.clone())
        .trail_by_run_id(run_id)
        .await?;

    if audits.is_empty() {
        return Err(ApiError::not_found(format!(
            "No audit events found for run {run_id}"
        )));
    }

    Ok(Json(audits.into_iter().map(AuditEventDto::from).collect()))
}

/// The last 100 events across all requests, newest first.
#[utoipa::path(
    get,
    path = "/internal/audit/recent",
    responses(
        (status = 200, description = "Most recent events", body = [AuditEventDto])
    ),
    tag = "audit"
)]
pub async fn recent(
    State(state): State<AppState>,
) -> Result<Json<Vec<AuditEventDto>>, ApiError> {
    let audits = AuditRepository::new(state.db.clone())
        .recent(RECENT_LIMIT)
        .await?;
    Ok(Json(audits.into_iter().map(AuditEventDto::from).collect()))
}
