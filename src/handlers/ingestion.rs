//! # Ingestion Trigger Handlers
//!
//! Request-driven entry point into the orchestrator. The trigger records
//! `REQUEST_RECEIVED` synchronously, validates the method against the
//! registry, then hands off to a spawned task; the HTTP response returns
//! immediately with the correlation id and never waits for ingestion.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::ingestion::TriggerRequest;
use crate::models::{AuditEventType, RequestSource};
use crate::repositories::{AuditEvent, AuditRepository};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct TriggerQuery {
    /// SOAP method name to ingest
    pub method: Option<String>,
    /// Bypass window validation and restart non-successful runs
    #[serde(default)]
    pub force: bool,
}

/// Accepted trigger response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TriggerAccepted {
    pub request_id: String,
    pub status: String,
    pub method: String,
    pub force: bool,
}

/// Rejected trigger response carrying the valid method set.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRejected {
    pub error: String,
    pub available_methods: Vec<String>,
    pub request_id: String,
}

/// Available methods listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct MethodsResponse {
    pub methods: Vec<String>,
    pub count: usize,
}

/// Submits one ingestion request for asynchronous execution.
#[utoipa::path(
    post,
    path = "/internal/ingestion/run",
    params(
        ("method" = String, Query, description = "SOAP method name"),
        ("force" = Option<bool>, Query, description = "Bypass window and duplicate checks"),
    ),
    responses(
        (status = 202, description = "Request accepted for async processing", body = TriggerAccepted),
        (status = 400, description = "Blank or unknown method", body = TriggerRejected),
    ),
    tag = "ingestion"
)]
pub async fn trigger_ingestion(
    State(state): State<AppState>,
    Query(query): Query<TriggerQuery>,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = query.method.unwrap_or_default();
    let force = query.force;
    let audit = AuditRepository::new(state.db.clone());

    info!(request_id, method, force, "Ingestion request received");
    audit
        .log_event(AuditEvent::new(
            &request_id,
            None,
            RequestSource::Manual,
            AuditEventType::RequestReceived,
            format!("Method: {method}, Force: {force}"),
        ))
        .await;

    if method.trim().is_empty() {
        let message = "Method parameter is required and cannot be blank".to_string();
        audit
            .log_event(AuditEvent::new(
                &request_id,
                None,
                RequestSource::Manual,
                AuditEventType::RequestRejected,
                message.clone(),
            ))
            .await;
        return (
            StatusCode::BAD_REQUEST,
            Json(TriggerRejected {
                error: message,
                available_methods: state.job.registry().method_names(),
                request_id,
            }),
        )
            .into_response();
    }

    if !state.job.registry().contains(&method) {
        let message = format!("Invalid method: {method}");
        audit
            .log_event(AuditEvent::new(
                &request_id,
                None,
                RequestSource::Manual,
                AuditEventType::RequestRejected,
                message.clone(),
            ))
            .await;
        return (
            StatusCode::BAD_REQUEST,
            Json(TriggerRejected {
                error: message,
                available_methods: state.job.registry().method_names(),
                request_id,
            }),
        )
            .into_response();
    }

    audit
        .log_event(AuditEvent::new(
            &request_id,
            None,
            RequestSource::Manual,
            AuditEventType::RequestAccepted,
            format!("Request accepted for async processing - Method: {method}, Force: {force}"),
        ))
        .await;

    let job = state.job.clone();
    let request = if force {
        TriggerRequest::manual_forced(&method, &request_id)
    } else {
        TriggerRequest::manual(&method, &request_id)
    };
    let spawn_request_id = request_id.clone();
    let spawn_method = method.clone();
    tokio::spawn(async move {
        let started = Instant::now();
        info!(
            request_id = %spawn_request_id,
            method = %spawn_method,
            force,
            "Async ingestion started"
        );
        let outcome = job.execute(request).await;
        info!(
            request_id = %spawn_request_id,
            method = %spawn_method,
            outcome = ?outcome,
            duration_ms = started.elapsed().as_millis() as u64,
            "Async ingestion completed"
        );
    });

    (
        StatusCode::ACCEPTED,
        Json(TriggerAccepted {
            request_id,
            status: "ACCEPTED".to_string(),
            method,
            force,
        }),
    )
        .into_response()
}

/// Lists the registered ingestion methods.
#[utoipa::path(
    get,
    path = "/internal/ingestion/methods",
    responses(
        (status = 200, description = "Registered method names", body = MethodsResponse)
    ),
    tag = "ingestion"
)]
pub async fn available_methods(State(state): State<AppState>) -> Json<MethodsResponse> {
    let methods = state.job.registry().method_names();
    if methods.is_empty() {
        error!("No ingestion handlers registered");
    }
    Json(MethodsResponse {
        count: methods.len(),
        methods,
    })
}
