//! # Run Repository
//!
//! Lifecycle operations for ingestion runs. Each call runs as its own
//! statement-level transaction, independent of the ingestion's logical
//! unit, so run state survives a failed pull.
//!
//! The `(method_name, window_key)` unique constraint is the idempotency
//! backstop: two callers racing on the same window see exactly one
//! insert win; the loser gets a [`IngestError::DuplicateRun`].

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, PaginatorTrait,
    QueryFilter, Set, SqlErr,
};
use tracing::warn;

use crate::error::IngestError;
use crate::models::ingestion_run::{ActiveModel, Column, Entity, Model};
use crate::models::{RequestSource, RunStatus};

/// Parameters for creating or restarting a run.
#[derive(Debug, Clone)]
pub struct CreateRunRequest {
    pub method_name: String,
    pub window_key: String,
    pub request_id: String,
    pub request_source: RequestSource,
    pub force: bool,
}

/// Repository for ingestion run database operations.
#[derive(Clone)]
pub struct RunRepository {
    db: DatabaseConnection,
}

impl RunRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new run or restarts an existing one.
    ///
    /// * no row for `(method, window)` — insert with `STARTED` status;
    /// * existing `SUCCEEDED` row without force — `DuplicateRun`;
    /// * existing non-`FAILED` row without force — `DuplicateRun`;
    /// * otherwise — reset the row in place, reusing its run id.
    pub async fn create_or_restart_run(
        &self,
        request: &CreateRunRequest,
    ) -> Result<i64, IngestError> {
        let existing = Entity::find()
            .filter(Column::MethodName.eq(&request.method_name))
            .filter(Column::WindowKey.eq(&request.window_key))
            .one(&self.db)
            .await?;

        if let Some(run) = existing {
            if !request.force && run.status == RunStatus::Succeeded.as_str() {
                return Err(IngestError::DuplicateRun(format!(
                    "Run already succeeded for method: {}, window: {}",
                    request.method_name, request.window_key
                )));
            }
            if !request.force && run.status != RunStatus::Failed.as_str() {
                return Err(IngestError::DuplicateRun(format!(
                    "Run already exists (Status: {}). Use force=true to restart.",
                    run.status
                )));
            }

            warn!(
                method_name = %request.method_name,
                window_key = %request.window_key,
                run_id = run.run_id,
                "Restarting existing run"
            );

            let run_id = run.run_id;
            let mut active: ActiveModel = run.into();
            active.status = Set(RunStatus::Started.as_str().to_string());
            active.start_time = Set(Utc::now());
            active.end_time = Set(None);
            active.records_seen = Set(0);
            active.records_inserted = Set(0);
            active.records_updated = Set(0);
            active.reject_count = Set(0);
            active.last_error_message = Set(None);
            active.http_status = Set(None);
            active.soap_fault_code = Set(None);
            active.request_id = Set(Some(request.request_id.clone()));
            active.request_source = Set(request.request_source.as_str().to_string());
            active.update(&self.db).await?;

            return Ok(run_id);
        }

        let run = ActiveModel {
            run_id: NotSet,
            method_name: Set(request.method_name.clone()),
            window_key: Set(request.window_key.clone()),
            request_id: Set(Some(request.request_id.clone())),
            request_source: Set(request.request_source.as_str().to_string()),
            status: Set(RunStatus::Started.as_str().to_string()),
            start_time: Set(Utc::now()),
            end_time: Set(None),
            records_seen: Set(0),
            records_inserted: Set(0),
            records_updated: Set(0),
            reject_count: Set(0),
            last_error_message: Set(None),
            http_status: Set(None),
            soap_fault_code: Set(None),
        };

        match run.insert(&self.db).await {
            Ok(model) => Ok(model.run_id),
            Err(err) => match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    Err(IngestError::DuplicateRun(format!(
                        "Concurrent run creation for method: {}, window: {}",
                        request.method_name, request.window_key
                    )))
                }
                _ => Err(err.into()),
            },
        }
    }

    /// Updates run status; terminal statuses stamp `end_time`.
    pub async fn update_status(&self, run_id: i64, status: RunStatus) -> Result<(), IngestError> {
        let Some(run) = Entity::find_by_id(run_id).one(&self.db).await? else {
            return Ok(());
        };

        let mut active: ActiveModel = run.into();
        active.status = Set(status.as_str().to_string());
        if status.is_terminal() {
            active.end_time = Set(Some(Utc::now()));
        }
        active.update(&self.db).await?;
        Ok(())
    }

    /// Writes final counters onto the run row.
    pub async fn update_metrics(
        &self,
        run_id: i64,
        seen: i32,
        inserted: i32,
        updated: i32,
        rejected: i32,
    ) -> Result<(), IngestError> {
        let Some(run) = Entity::find_by_id(run_id).one(&self.db).await? else {
            return Ok(());
        };

        let mut active: ActiveModel = run.into();
        active.records_seen = Set(seen);
        active.records_inserted = Set(inserted);
        active.records_updated = Set(updated);
        active.reject_count = Set(rejected);
        active.update(&self.db).await?;
        Ok(())
    }

    /// Records the last error details on the run row.
    pub async fn log_error(
        &self,
        run_id: i64,
        message: &str,
        http_status: Option<i32>,
        fault_code: Option<String>,
    ) -> Result<(), IngestError> {
        let Some(run) = Entity::find_by_id(run_id).one(&self.db).await? else {
            return Ok(());
        };

        let mut active: ActiveModel = run.into();
        active.last_error_message = Set(Some(message.to_string()));
        active.http_status = Set(http_status);
        active.soap_fault_code = Set(fault_code);
        active.update(&self.db).await?;
        Ok(())
    }

    /// True iff a SUCCEEDED run exists for the window.
    pub async fn is_window_complete(
        &self,
        method_name: &str,
        window_key: &str,
    ) -> Result<bool, IngestError> {
        let count = Entity::find()
            .filter(Column::MethodName.eq(method_name))
            .filter(Column::WindowKey.eq(window_key))
            .filter(Column::Status.eq(RunStatus::Succeeded.as_str()))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    pub async fn find(&self, run_id: i64) -> Result<Option<Model>, IngestError> {
        Ok(Entity::find_by_id(run_id).one(&self.db).await?)
    }

    pub async fn find_by_window(
        &self,
        method_name: &str,
        window_key: &str,
    ) -> Result<Option<Model>, IngestError> {
        Ok(Entity::find()
            .filter(Column::MethodName.eq(method_name))
            .filter(Column::WindowKey.eq(window_key))
            .one(&self.db)
            .await?)
    }
}
