//! Integration tests for the run control store: create/restart semantics,
//! terminal bookkeeping, and the at-most-one-success-per-window invariant.

use sipsa_ingest::error::IngestError;
use sipsa_ingest::models::{RequestSource, RunStatus};
use sipsa_ingest::repositories::{CreateRunRequest, RejectRepository, RunRepository};

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::setup_test_db;

fn request(force: bool) -> CreateRunRequest {
    CreateRunRequest {
        method_name: "promediosSipsaCiudad".to_string(),
        window_key: "2026-01-02".to_string(),
        request_id: "req-1".to_string(),
        request_source: RequestSource::Manual,
        force,
    }
}

#[tokio::test]
async fn creates_a_started_run_with_zeroed_counters() {
    let db = setup_test_db().await;
    let runs = RunRepository::new(db.clone());

    let run_id = runs.create_or_restart_run(&request(false)).await.unwrap();
    let run = runs.find(run_id).await.unwrap().unwrap();

    assert_eq!(run.status, "STARTED");
    assert_eq!(run.records_seen, 0);
    assert_eq!(run.records_inserted, 0);
    assert_eq!(run.reject_count, 0);
    assert_eq!(run.request_id.as_deref(), Some("req-1"));
    assert_eq!(run.request_source, "MANUAL");
    assert!(run.end_time.is_none());
}

#[tokio::test]
async fn existing_started_run_blocks_without_force() {
    let db = setup_test_db().await;
    let runs = RunRepository::new(db.clone());

    runs.create_or_restart_run(&request(false)).await.unwrap();
    let second = runs.create_or_restart_run(&request(false)).await;

    assert!(matches!(second, Err(IngestError::DuplicateRun(_))));
}

#[tokio::test]
async fn succeeded_run_blocks_without_force() {
    let db = setup_test_db().await;
    let runs = RunRepository::new(db.clone());

    let run_id = runs.create_or_restart_run(&request(false)).await.unwrap();
    runs.update_status(run_id, RunStatus::Succeeded).await.unwrap();

    let second = runs.create_or_restart_run(&request(false)).await;
    match second {
        Err(IngestError::DuplicateRun(message)) => {
            assert!(message.contains("already succeeded"));
        }
        other => panic!("expected DuplicateRun, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_run_restarts_without_force_and_reuses_id() {
    let db = setup_test_db().await;
    let runs = RunRepository::new(db.clone());

    let run_id = runs.create_or_restart_run(&request(false)).await.unwrap();
    runs.update_metrics(run_id, 100, 40, 0, 60).await.unwrap();
    runs.log_error(run_id, "Server Error 503", Some(503), None)
        .await
        .unwrap();
    runs.update_status(run_id, RunStatus::Failed).await.unwrap();

    let restarted = runs.create_or_restart_run(&request(false)).await.unwrap();
    assert_eq!(restarted, run_id);

    let run = runs.find(run_id).await.unwrap().unwrap();
    assert_eq!(run.status, "STARTED");
    assert_eq!(run.records_seen, 0);
    assert_eq!(run.records_inserted, 0);
    assert_eq!(run.reject_count, 0);
    assert!(run.last_error_message.is_none());
    assert!(run.http_status.is_none());
    assert!(run.end_time.is_none());
}

#[tokio::test]
async fn force_restarts_a_succeeded_run() {
    let db = setup_test_db().await;
    let runs = RunRepository::new(db.clone());

    let run_id = runs.create_or_restart_run(&request(false)).await.unwrap();
    runs.update_status(run_id, RunStatus::Succeeded).await.unwrap();

    let restarted = runs.create_or_restart_run(&request(true)).await.unwrap();
    assert_eq!(restarted, run_id);

    let run = runs.find(run_id).await.unwrap().unwrap();
    assert_eq!(run.status, "STARTED");
}

#[tokio::test]
async fn terminal_status_stamps_end_time() {
    let db = setup_test_db().await;
    let runs = RunRepository::new(db.clone());

    let run_id = runs.create_or_restart_run(&request(false)).await.unwrap();
    runs.update_status(run_id, RunStatus::Running).await.unwrap();
    assert!(runs.find(run_id).await.unwrap().unwrap().end_time.is_none());

    runs.update_status(run_id, RunStatus::Failed).await.unwrap();
    assert!(runs.find(run_id).await.unwrap().unwrap().end_time.is_some());
}

#[tokio::test]
async fn window_completion_requires_a_success() {
    let db = setup_test_db().await;
    let runs = RunRepository::new(db.clone());

    assert!(!runs
        .is_window_complete("promediosSipsaCiudad", "2026-01-02")
        .await
        .unwrap());

    let run_id = runs.create_or_restart_run(&request(false)).await.unwrap();
    runs.update_status(run_id, RunStatus::Failed).await.unwrap();
    assert!(!runs
        .is_window_complete("promediosSipsaCiudad", "2026-01-02")
        .await
        .unwrap());

    runs.update_status(run_id, RunStatus::Succeeded).await.unwrap();
    assert!(runs
        .is_window_complete("promediosSipsaCiudad", "2026-01-02")
        .await
        .unwrap());
}

#[tokio::test]
async fn concurrent_creation_admits_exactly_one() {
    let db = setup_test_db().await;
    let runs_a = RunRepository::new(db.clone());
    let runs_b = RunRepository::new(db.clone());

    let a = tokio::spawn(async move { runs_a.create_or_restart_run(&request(false)).await });
    let b = tokio::spawn(async move { runs_b.create_or_restart_run(&request(false)).await });

    let results = [a.await.unwrap(), b.await.unwrap()];
    let winners = results.iter().filter(|r| r.is_ok()).count();
    let losers = results
        .iter()
        .filter(|r| matches!(r, Err(IngestError::DuplicateRun(_))))
        .count();

    assert_eq!(winners, 1);
    assert_eq!(losers, 1);
}

#[tokio::test]
async fn rejects_accumulate_per_run() {
    let db = setup_test_db().await;
    let runs = RunRepository::new(db.clone());
    let rejects = RejectRepository::new(db.clone());

    let run_id = runs.create_or_restart_run(&request(false)).await.unwrap();
    rejects
        .append(run_id, "regId=null", "Missing: regId", false)
        .await
        .unwrap();
    rejects
        .append(run_id, "<broken", "XML stream error", true)
        .await
        .unwrap();

    let rows = rejects.for_run(run_id).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(!rows[0].is_parse_error);
    assert!(rows[1].is_parse_error);
}
