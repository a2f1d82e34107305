//! HTTP surface tests: trigger validation, audit queries, read API
//! pagination envelope, and health.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use sipsa_ingest::ingestion::{methods, IngestionJob, WindowPolicy};
use sipsa_ingest::repositories::AuditRepository;
use sipsa_ingest::server::{create_app, AppState};

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{open_config, setup_test_db, StubSoapSource};

async fn test_state() -> AppState {
    let db = setup_test_db().await;
    let config = Arc::new(open_config());
    let source = Arc::new(StubSoapSource::new());
    let registry = methods::build_registry(&db, source, &config);
    let policy = WindowPolicy::from_config(&config).expect("valid test config");
    let job = Arc::new(IngestionJob::new(db.clone(), registry, policy, 0.01, 5000));
    AppState { db, config, job }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn methods_endpoint_lists_all_five() {
    let app = create_app(test_state().await);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/internal/ingestion/methods")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["count"], 5);
    let methods: Vec<&str> = json["methods"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|m| m.as_str())
        .collect();
    assert!(methods.contains(&"promediosSipsaCiudad"));
    assert!(methods.contains(&"promedioAbasSipsaMesMadr"));
}

#[tokio::test]
async fn unknown_method_is_rejected_with_available_methods() {
    let state = test_state().await;
    let app = create_app(state.clone());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/internal/ingestion/run?method=bogusMethod")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid method: bogusMethod");
    assert_eq!(json["availableMethods"].as_array().unwrap().len(), 5);
    let request_id = json["requestId"].as_str().unwrap().to_string();

    // Both lifecycle events were recorded synchronously.
    let trail = AuditRepository::new(state.db.clone())
        .trail_by_request_id(&request_id)
        .await
        .unwrap();
    let event_types: Vec<&str> = trail.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(event_types, vec!["REQUEST_RECEIVED", "REQUEST_REJECTED"]);
}

#[tokio::test]
async fn blank_method_is_rejected() {
    let app = create_app(test_state().await);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/internal/ingestion/run")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Method parameter is required and cannot be blank");
}

#[tokio::test]
async fn valid_method_is_accepted_asynchronously() {
    let state = test_state().await;
    let app = create_app(state.clone());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/internal/ingestion/run?method=promediosSipsaCiudad&force=true")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ACCEPTED");
    assert_eq!(json["method"], "promediosSipsaCiudad");
    assert_eq!(json["force"], true);
    let request_id = json["requestId"].as_str().unwrap().to_string();

    let trail = AuditRepository::new(state.db.clone())
        .trail_by_request_id(&request_id)
        .await
        .unwrap();
    assert!(trail.iter().any(|e| e.event_type == "REQUEST_RECEIVED"));
    assert!(trail.iter().any(|e| e.event_type == "REQUEST_ACCEPTED"));
}

#[tokio::test]
async fn audit_trail_for_unknown_request_is_404() {
    let app = create_app(test_state().await);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/internal/audit/request/does-not-exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn read_api_returns_empty_envelope() {
    let app = create_app(test_state().await);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/city?fecha=2026-01-02")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["count"], 0);
    assert_eq!(json["pages"], 0);
    assert!(json["next"].is_null());
    assert!(json["prev"].is_null());
    assert_eq!(json["results"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn read_api_rejects_zero_page() {
    let app = create_app(test_state().await);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/weekly?page=0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn root_reports_identity_and_method_count() {
    let app = create_app(test_state().await);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["service"], "sipsa-ingest");
    assert_eq!(json["profile"], "local");
    assert_eq!(json["timezone"], "America/Bogota");
    assert_eq!(json["methods"], 5);
}

#[tokio::test]
async fn health_endpoint_reports_up() {
    let app = create_app(test_state().await);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "UP");
}
