//! End-to-end orchestrator tests: the full state machine against an
//! in-memory database and stubbed SOAP bodies.

use sea_orm::{EntityTrait, PaginatorTrait};
use std::sync::Arc;

use sipsa_ingest::ingestion::methods::{CITY_METHOD, MONTHLY_METHOD, PARTIAL_METHOD, SUPPLY_METHOD, WEEKLY_METHOD};
use sipsa_ingest::ingestion::{ExecutionOutcome, TriggerRequest};
use sipsa_ingest::models::{city_price, ingestion_run, partial_market};
use sipsa_ingest::repositories::{AuditRepository, RejectRepository, RunRepository};

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{
    build_job, build_job_closed_window, city_return, invalid_city_return, partial_return,
    setup_test_db, soap_envelope, soap_fault_envelope, StubSoapSource,
};

const CAPTURE_MS: i64 = 1_767_380_700_000;

#[tokio::test]
async fn happy_daily_path_succeeds_then_skips_duplicate() {
    let db = setup_test_db().await;
    let body = soap_envelope(&format!(
        "{}{}{}",
        city_return(1, 10, CAPTURE_MS),
        city_return(2, 11, CAPTURE_MS),
        city_return(3, 12, CAPTURE_MS),
    ));
    let source = Arc::new(StubSoapSource::new().with_body(CITY_METHOD, body));
    let job = build_job(&db, source, 0.01, 5000);

    let outcome = job
        .execute(TriggerRequest::manual(CITY_METHOD, "req-happy"))
        .await;
    assert_eq!(outcome, ExecutionOutcome::Succeeded);

    let runs = ingestion_run::Entity::find().all(&db).await.unwrap();
    assert_eq!(runs.len(), 1);
    let run = &runs[0];
    assert_eq!(run.status, "SUCCEEDED");
    assert_eq!(run.records_seen, 3);
    assert_eq!(run.records_inserted, 3);
    assert_eq!(run.records_updated, 0);
    assert_eq!(run.reject_count, 0);
    assert!(run.end_time.is_some());

    let rows = city_price::Entity::find().count(&db).await.unwrap();
    assert_eq!(rows, 3);

    // Audit ordering within the run.
    let trail = AuditRepository::new(db.clone())
        .trail_by_run_id(run.run_id)
        .await
        .unwrap();
    let event_types: Vec<&str> = trail.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(
        event_types,
        vec![
            "INGESTION_STARTED",
            "INGESTION_RUNNING",
            "INGESTION_SUCCEEDED",
            "METRICS_UPDATED",
        ]
    );

    // A second non-forced submission against the completed window skips.
    let outcome = job
        .execute(TriggerRequest::manual(CITY_METHOD, "req-happy-2"))
        .await;
    assert_eq!(outcome, ExecutionOutcome::SkippedDuplicate);

    assert_eq!(ingestion_run::Entity::find().count(&db).await.unwrap(), 1);
    let duplicate_trail = AuditRepository::new(db.clone())
        .trail_by_request_id("req-happy-2")
        .await
        .unwrap();
    assert_eq!(duplicate_trail.len(), 1);
    assert_eq!(duplicate_trail[0].event_type, "INGESTION_SKIPPED_DUPLICATE");
}

#[tokio::test]
async fn forced_restart_reuses_run_and_skips_existing_rows() {
    let db = setup_test_db().await;
    let enma = "2026-01-02T00:00:00Z";
    let valid = format!(
        "{}{}{}",
        partial_return("5001", 1, enma),
        partial_return("5002", 2, enma),
        partial_return("5003", 3, enma),
    );
    let invalid = "<return><muniNombre>Sin llaves</muniNombre></return>".repeat(2);

    // First attempt fails on the reject-count threshold after inserting
    // the valid rows.
    let failing_source = Arc::new(
        StubSoapSource::new()
            .with_body(PARTIAL_METHOD, soap_envelope(&format!("{valid}{invalid}"))),
    );
    let failing_job = build_job(&db, failing_source, 0.9, 1);
    let outcome = failing_job
        .execute(TriggerRequest::manual(PARTIAL_METHOD, "req-fail"))
        .await;
    assert_eq!(outcome, ExecutionOutcome::Failed);

    let runs = ingestion_run::Entity::find().all(&db).await.unwrap();
    assert_eq!(runs.len(), 1);
    let failed = &runs[0];
    assert_eq!(failed.status, "FAILED");
    assert_eq!(failed.records_seen, 5);
    assert_eq!(failed.records_inserted, 3);
    assert_eq!(failed.reject_count, 2);
    let failed_run_id = failed.run_id;

    // Forced restart with a clean body reuses the run id; prior curated
    // rows survive and collide on their hash keys.
    let clean_source =
        Arc::new(StubSoapSource::new().with_body(PARTIAL_METHOD, soap_envelope(&valid)));
    let retry_job = build_job(&db, clean_source, 0.01, 5000);
    let outcome = retry_job
        .execute(TriggerRequest::manual_forced(PARTIAL_METHOD, "req-retry"))
        .await;
    assert_eq!(outcome, ExecutionOutcome::Succeeded);

    let runs = ingestion_run::Entity::find().all(&db).await.unwrap();
    assert_eq!(runs.len(), 1);
    let restarted = &runs[0];
    assert_eq!(restarted.run_id, failed_run_id);
    assert_eq!(restarted.status, "SUCCEEDED");
    assert_eq!(restarted.records_seen, 3);
    assert_eq!(restarted.records_inserted, 0);
    assert_eq!(restarted.reject_count, 0);
    assert_eq!(restarted.request_id.as_deref(), Some("req-retry"));

    assert_eq!(partial_market::Entity::find().count(&db).await.unwrap(), 3);
}

#[tokio::test]
async fn threshold_breach_fails_run_but_keeps_partial_progress() {
    let db = setup_test_db().await;
    let mut returns = String::new();
    for i in 0..980i64 {
        returns.push_str(&city_return(i + 1, 1000 + i, CAPTURE_MS));
    }
    returns.push_str(&invalid_city_return().repeat(20));

    let source =
        Arc::new(StubSoapSource::new().with_body(CITY_METHOD, soap_envelope(&returns)));
    let job = build_job(&db, source, 0.9, 10);

    let outcome = job
        .execute(TriggerRequest::manual(CITY_METHOD, "req-threshold"))
        .await;
    assert_eq!(outcome, ExecutionOutcome::Failed);

    let runs = ingestion_run::Entity::find().all(&db).await.unwrap();
    let run = &runs[0];
    assert_eq!(run.status, "FAILED");
    assert_eq!(run.records_seen, 1000);
    assert_eq!(run.records_inserted, 980);
    assert_eq!(run.reject_count, 20);
    assert!(run
        .last_error_message
        .as_deref()
        .unwrap_or_default()
        .contains("Reject count exceeded threshold"));

    // Reject accounting: persisted rows match the counter.
    let rejects = RejectRepository::new(db.clone())
        .for_run(run.run_id)
        .await
        .unwrap();
    assert_eq!(rejects.len(), 20);
    assert!(rejects.iter().all(|r| !r.is_parse_error));

    // Metric consistency.
    assert!(run.records_seen >= run.records_inserted + run.reject_count);

    // Partial progress is kept.
    assert_eq!(city_price::Entity::find().count(&db).await.unwrap(), 980);

    // Failure and final metrics events close the trail.
    let trail = AuditRepository::new(db.clone())
        .trail_by_run_id(run.run_id)
        .await
        .unwrap();
    let event_types: Vec<&str> = trail.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(event_types[event_types.len() - 2], "INGESTION_FAILED");
    assert_eq!(event_types[event_types.len() - 1], "METRICS_UPDATED");
}

#[tokio::test]
async fn soap_fault_inside_2xx_fails_the_run() {
    let db = setup_test_db().await;
    let source = Arc::new(
        StubSoapSource::new().with_body(CITY_METHOD, soap_fault_envelope("Backend busy")),
    );
    let job = build_job(&db, source, 0.01, 5000);

    let outcome = job
        .execute(TriggerRequest::manual(CITY_METHOD, "req-fault"))
        .await;
    assert_eq!(outcome, ExecutionOutcome::Failed);

    let runs = ingestion_run::Entity::find().all(&db).await.unwrap();
    let run = &runs[0];
    assert_eq!(run.status, "FAILED");
    assert!(run
        .last_error_message
        .as_deref()
        .unwrap_or_default()
        .contains("Backend busy"));
    assert_eq!(run.soap_fault_code.as_deref(), Some("Backend busy"));
    assert_eq!(run.records_seen, 0);

    assert_eq!(city_price::Entity::find().count(&db).await.unwrap(), 0);

    let trail = AuditRepository::new(db.clone())
        .trail_by_run_id(run.run_id)
        .await
        .unwrap();
    assert!(trail.iter().any(|e| e.event_type == "INGESTION_FAILED"));
}

#[tokio::test]
async fn transport_exhaustion_fails_with_http_status() {
    let db = setup_test_db().await;
    // No body registered: the stub fails like an exhausted retry loop.
    let source = Arc::new(StubSoapSource::new());
    let job = build_job(&db, source, 0.01, 5000);

    let outcome = job
        .execute(TriggerRequest::manual(WEEKLY_METHOD, "req-unavailable"))
        .await;
    assert_eq!(outcome, ExecutionOutcome::Failed);

    let runs = ingestion_run::Entity::find().all(&db).await.unwrap();
    let run = &runs[0];
    assert_eq!(run.status, "FAILED");
    assert_eq!(run.http_status, Some(503));
}

#[tokio::test]
async fn window_violation_creates_no_run() {
    let db = setup_test_db().await;
    let source = Arc::new(StubSoapSource::new());
    let job = build_job_closed_window(&db, source);

    let outcome = job
        .execute(TriggerRequest::manual(SUPPLY_METHOD, "req-window"))
        .await;
    assert_eq!(outcome, ExecutionOutcome::SkippedWindow);

    assert_eq!(ingestion_run::Entity::find().count(&db).await.unwrap(), 0);

    let trail = AuditRepository::new(db.clone())
        .trail_by_request_id("req-window")
        .await
        .unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].event_type, "INGESTION_SKIPPED_WINDOW");
}

#[tokio::test]
async fn daily_window_violation_also_gates() {
    let db = setup_test_db().await;
    let source = Arc::new(StubSoapSource::new());
    let job = build_job_closed_window(&db, source);

    let outcome = job
        .execute(TriggerRequest::manual(CITY_METHOD, "req-daily-window"))
        .await;
    assert_eq!(outcome, ExecutionOutcome::SkippedWindow);
    assert_eq!(ingestion_run::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn concurrent_submissions_admit_exactly_one_success() {
    let db = setup_test_db().await;
    let body = soap_envelope(
        "<return><tmpMayoMesId>1</tmpMayoMesId><artiId>1</artiId><fuenId>40</fuenId>\
         <fechaMesIni>1767225600000</fechaMesIni><promedioKg>1200.00</promedioKg></return>",
    );
    let source = Arc::new(StubSoapSource::new().with_body(MONTHLY_METHOD, body));
    let job = Arc::new(build_job(&db, source, 0.01, 5000));

    let job_a = job.clone();
    let job_b = job.clone();
    let a = tokio::spawn(async move {
        job_a
            .execute(TriggerRequest::manual(MONTHLY_METHOD, "req-conc-a"))
            .await
    });
    let b = tokio::spawn(async move {
        job_b
            .execute(TriggerRequest::manual(MONTHLY_METHOD, "req-conc-b"))
            .await
    });

    let outcomes = [a.await.unwrap(), b.await.unwrap()];
    let succeeded = outcomes
        .iter()
        .filter(|o| **o == ExecutionOutcome::Succeeded)
        .count();
    let skipped = outcomes
        .iter()
        .filter(|o| **o == ExecutionOutcome::SkippedDuplicate)
        .count();
    assert_eq!(succeeded, 1);
    assert_eq!(skipped, 1);

    let runs = ingestion_run::Entity::find().all(&db).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, "SUCCEEDED");
}

#[tokio::test]
async fn idempotency_holds_across_many_submissions() {
    let db = setup_test_db().await;
    let body = soap_envelope(&city_return(1, 10, CAPTURE_MS));
    let source = Arc::new(StubSoapSource::new().with_body(CITY_METHOD, body));
    let job = Arc::new(build_job(&db, source, 0.01, 5000));

    let mut handles = Vec::new();
    for i in 0..5 {
        let job = job.clone();
        handles.push(tokio::spawn(async move {
            job.execute(TriggerRequest::manual(CITY_METHOD, format!("req-many-{i}")))
                .await
        }));
    }
    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap() == ExecutionOutcome::Succeeded {
            succeeded += 1;
        }
    }
    assert_eq!(succeeded, 1);

    let runs = RunRepository::new(db.clone());
    let complete = runs
        .is_window_complete(
            CITY_METHOD,
            &ingestion_run::Entity::find().all(&db).await.unwrap()[0].window_key,
        )
        .await
        .unwrap();
    assert!(complete);
    assert_eq!(ingestion_run::Entity::find().count(&db).await.unwrap(), 1);
}
