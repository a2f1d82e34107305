//! The ingestion orchestrator.
//!
//! Drives one execution through its state machine: window validation,
//! duplicate gate, run creation/restart, the RUNNING pull itself,
//! threshold validation, terminal status, and the always-run finalizer
//! (metrics, reject flush, final audit event). Every control-store write
//! lands in its own transaction so a failed pull cannot erase its own
//! trail.

use metrics::{counter, histogram};
use sea_orm::DatabaseConnection;
use std::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};

use crate::error::IngestError;
use crate::ingestion::context::RunContext;
use crate::ingestion::registry::MethodRegistry;
use crate::ingestion::window::WindowPolicy;
use crate::models::{AuditEventType, RequestSource, RunStatus};
use crate::repositories::{AuditEvent, AuditRepository, CreateRunRequest, RejectRepository, RunRepository};

/// One submission to the orchestrator.
#[derive(Debug, Clone)]
pub struct TriggerRequest {
    pub method_name: String,
    pub request_id: String,
    pub request_source: RequestSource,
    pub force: bool,
}

impl TriggerRequest {
    pub fn manual(method_name: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            method_name: method_name.into(),
            request_id: request_id.into(),
            request_source: RequestSource::Manual,
            force: false,
        }
    }

    pub fn manual_forced(method_name: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            force: true,
            ..Self::manual(method_name, request_id)
        }
    }

    pub fn scheduled(method_name: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            method_name: method_name.into(),
            request_id: request_id.into(),
            request_source: RequestSource::Scheduled,
            force: false,
        }
    }
}

/// Where an execution ended up; useful for callers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Succeeded,
    Failed,
    SkippedWindow,
    SkippedDuplicate,
}

/// Orchestrator coordinating window policy, run lifecycle, method
/// handlers, thresholds, and the audit trail.
pub struct IngestionJob {
    registry: MethodRegistry,
    window_policy: WindowPolicy,
    runs: RunRepository,
    audit: AuditRepository,
    rejects: RejectRepository,
    max_reject_rate: f64,
    max_reject_count: i32,
}

impl IngestionJob {
    pub fn new(
        db: DatabaseConnection,
        registry: MethodRegistry,
        window_policy: WindowPolicy,
        max_reject_rate: f64,
        max_reject_count: i32,
    ) -> Self {
        Self {
            registry,
            window_policy,
            runs: RunRepository::new(db.clone()),
            audit: AuditRepository::new(db.clone()),
            rejects: RejectRepository::new(db),
            max_reject_rate,
            max_reject_count,
        }
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Executes the complete ingestion workflow for one request.
    pub async fn execute(&self, request: TriggerRequest) -> ExecutionOutcome {
        let window_key = match self
            .window_policy
            .validate_and_get_key(&request.method_name, request.force)
        {
            Ok(key) => key,
            Err(err) => {
                warn!(
                    method_name = %request.method_name,
                    error = %err,
                    "Skipping run: outside execution window"
                );
                self.audit
                    .log_event(AuditEvent::new(
                        &request.request_id,
                        None,
                        request.request_source,
                        AuditEventType::IngestionSkippedWindow,
                        format!("Method: {} - {}", request.method_name, err),
                    ))
                    .await;
                return ExecutionOutcome::SkippedWindow;
            }
        };

        match self
            .runs
            .is_window_complete(&request.method_name, &window_key)
            .await
        {
            Ok(true) if !request.force => {
                info!(
                    method_name = %request.method_name,
                    window_key = %window_key,
                    "Run already SUCCEEDED for window. Skipping."
                );
                self.audit
                    .log_event(skipped_duplicate(&request, &window_key, None))
                    .await;
                return ExecutionOutcome::SkippedDuplicate;
            }
            Ok(_) => {}
            Err(err) => {
                error!(error = %err, "Failed to check window completion");
                return ExecutionOutcome::Failed;
            }
        }

        let run_id = match self
            .runs
            .create_or_restart_run(&CreateRunRequest {
                method_name: request.method_name.clone(),
                window_key: window_key.clone(),
                request_id: request.request_id.clone(),
                request_source: request.request_source,
                force: request.force,
            })
            .await
        {
            Ok(run_id) => run_id,
            Err(IngestError::DuplicateRun(reason)) => {
                info!(
                    method_name = %request.method_name,
                    window_key = %window_key,
                    reason = %reason,
                    "Skipping run"
                );
                self.audit
                    .log_event(skipped_duplicate(&request, &window_key, Some(&reason)))
                    .await;
                return ExecutionOutcome::SkippedDuplicate;
            }
            Err(err) => {
                error!(error = %err, "Failed to create run");
                return ExecutionOutcome::Failed;
            }
        };

        self.audit
            .log_event(AuditEvent::new(
                &request.request_id,
                Some(run_id),
                request.request_source,
                AuditEventType::IngestionStarted,
                format!(
                    "Method: {}, Window: {}, Force: {}",
                    request.method_name, window_key, request.force
                ),
            ))
            .await;

        let mut context = RunContext::new(
            run_id,
            &request.method_name,
            &window_key,
            &request.request_id,
            request.request_source,
        );

        let span = info_span!(
            "ingestion",
            run_id,
            method_name = %request.method_name,
            window_key = %window_key,
            request_id = %request.request_id,
            request_source = %request.request_source,
        );
        self.run_to_completion(&request, &mut context)
            .instrument(span)
            .await
    }

    async fn run_to_completion(
        &self,
        request: &TriggerRequest,
        context: &mut RunContext,
    ) -> ExecutionOutcome {
        let run_id = context.run_id();
        let started = Instant::now();

        let result: Result<(), IngestError> = async {
            self.runs.update_status(run_id, RunStatus::Running).await?;
            self.audit
                .log_event(AuditEvent::new(
                    &request.request_id,
                    Some(run_id),
                    request.request_source,
                    AuditEventType::IngestionRunning,
                    format!("Starting data ingestion for method: {}", request.method_name),
                ))
                .await;
            info!(run_id, "Started ingestion job");

            let handler = self.registry.get(&request.method_name)?;
            handler.execute(context).await?;
            self.validate_thresholds(context)?;

            self.runs.update_status(run_id, RunStatus::Succeeded).await?;
            Ok(())
        }
        .await;

        let outcome = match result {
            Ok(()) => {
                self.audit
                    .log_event(AuditEvent::new(
                        &request.request_id,
                        Some(run_id),
                        request.request_source,
                        AuditEventType::IngestionSucceeded,
                        format!(
                            "Completed successfully - Seen: {}, Inserted: {}, Updated: {}, Rejected: {}",
                            context.records_seen(),
                            context.records_inserted(),
                            context.records_updated(),
                            context.reject_count(),
                        ),
                    ))
                    .await;
                info!(summary = %context.log_summary(), "Ingestion job SUCCEEDED");
                counter!("ingestion_runs_succeeded_total").increment(1);
                ExecutionOutcome::Succeeded
            }
            Err(err) => {
                error!(error = %err, "Ingestion job FAILED");
                if let Err(log_err) = self
                    .runs
                    .log_error(
                        run_id,
                        &err.to_string(),
                        err.upstream_status(),
                        err.fault_code(),
                    )
                    .await
                {
                    error!(error = %log_err, "Failed to record run error");
                }
                if let Err(status_err) = self.runs.update_status(run_id, RunStatus::Failed).await {
                    error!(error = %status_err, "Failed to mark run FAILED");
                }
                self.audit
                    .log_event(AuditEvent::new(
                        &request.request_id,
                        Some(run_id),
                        request.request_source,
                        AuditEventType::IngestionFailed,
                        format!("Error: {err}"),
                    ))
                    .await;
                counter!("ingestion_runs_failed_total").increment(1);
                ExecutionOutcome::Failed
            }
        };

        // Finalizer: always runs, regardless of outcome.
        if let Err(err) = self
            .runs
            .update_metrics(
                run_id,
                context.records_seen(),
                context.records_inserted(),
                context.records_updated(),
                context.reject_count(),
            )
            .await
        {
            error!(error = %err, "Failed to update run metrics");
        }

        self.persist_rejected_records(context).await;

        self.audit
            .log_event(AuditEvent::new(
                &request.request_id,
                Some(run_id),
                request.request_source,
                AuditEventType::MetricsUpdated,
                format!(
                    "Final metrics - Seen: {}, Inserted: {}, Updated: {}, Rejected: {}",
                    context.records_seen(),
                    context.records_inserted(),
                    context.records_updated(),
                    context.reject_count(),
                ),
            ))
            .await;

        histogram!("ingestion_run_duration_ms").record(started.elapsed().as_secs_f64() * 1000.0);
        outcome
    }

    /// Fails the run if rejections exceed the absolute count or rate.
    fn validate_thresholds(&self, context: &RunContext) -> Result<(), IngestError> {
        if context.reject_count() > self.max_reject_count {
            return Err(IngestError::ThresholdExceeded(format!(
                "Reject count exceeded threshold: {}",
                context.reject_count()
            )));
        }

        if context.records_seen() > 0 {
            let rate = f64::from(context.reject_count()) / f64::from(context.records_seen());
            if rate > self.max_reject_rate {
                return Err(IngestError::ThresholdExceeded(format!(
                    "Reject rate {:.2} exceeded threshold {}",
                    rate, self.max_reject_rate
                )));
            }
        }

        Ok(())
    }

    /// Flushes accumulated rejects; best-effort, never escalates.
    async fn persist_rejected_records(&self, context: &RunContext) {
        if context.rejected_records().is_empty() {
            return;
        }

        for rejected in context.rejected_records() {
            if let Err(err) = self
                .rejects
                .append(
                    context.run_id(),
                    &rejected.raw_data,
                    &rejected.reason,
                    rejected.is_parse_error,
                )
                .await
            {
                error!(
                    run_id = context.run_id(),
                    error = %err,
                    "Failed to persist rejected records"
                );
                return;
            }
        }
        info!(
            run_id = context.run_id(),
            count = context.rejected_records().len(),
            "Persisted rejected records"
        );
    }
}

fn skipped_duplicate(
    request: &TriggerRequest,
    window_key: &str,
    reason: Option<&str>,
) -> AuditEvent {
    let message = match reason {
        Some(reason) => format!(
            "Method: {}, Window: {} - {}",
            request.method_name, window_key, reason
        ),
        None => format!("Method: {}, Window: {}", request.method_name, window_key),
    };
    AuditEvent::new(
        &request.request_id,
        None,
        request.request_source,
        AuditEventType::IngestionSkippedDuplicate,
        message,
    )
}
