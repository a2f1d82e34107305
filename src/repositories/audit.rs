//! # Audit Repository
//!
//! Append-only audit trail persistence and queries. Every write runs in
//! its own transaction and failures are swallowed after logging: the
//! audit subsystem must never break ingestion.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use tracing::{debug, error};

use crate::error::IngestError;
use crate::models::ingestion_audit::{ActiveModel, Column, Entity, Model};
use crate::models::{AuditEventType, RequestSource};

/// One event to append to the timeline.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub request_id: String,
    pub run_id: Option<i64>,
    pub request_source: RequestSource,
    pub event_type: AuditEventType,
    pub message: String,
}

impl AuditEvent {
    pub fn new(
        request_id: impl Into<String>,
        run_id: Option<i64>,
        request_source: RequestSource,
        event_type: AuditEventType,
        message: impl Into<String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            run_id,
            request_source,
            event_type,
            message: message.into(),
        }
    }
}

/// Repository for the append-only audit trail.
#[derive(Clone)]
pub struct AuditRepository {
    db: DatabaseConnection,
}

impl AuditRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Appends one event. Persistence failures are logged and dropped.
    pub async fn log_event(&self, event: AuditEvent) {
        let row = ActiveModel {
            audit_id: NotSet,
            run_id: Set(event.run_id),
            request_id: Set(Some(event.request_id.clone())),
            request_source: Set(event.request_source.as_str().to_string()),
            event_type: Set(event.event_type.as_str().to_string()),
            message: Set(Some(event.message.clone())),
            occurred_at: Set(Utc::now()),
        };

        match row.insert(&self.db).await {
            Ok(_) => debug!(
                request_id = %event.request_id,
                event_type = %event.event_type,
                "Audit event logged"
            ),
            Err(err) => error!(
                request_id = %event.request_id,
                event_type = %event.event_type,
                error = %err,
                "Failed to log audit event"
            ),
        }
    }

    /// All events for one correlation id, oldest first.
    pub async fn trail_by_request_id(&self, request_id: &str) -> Result<Vec<Model>, IngestError> {
        Ok(Entity::find()
            .filter(Column::RequestId.eq(request_id))
            .order_by_asc(Column::OccurredAt)
            .order_by_asc(Column::AuditId)
            .all(&self.db)
            .await?)
    }

    /// All events for one run, oldest first.
    pub async fn trail_by_run_id(&self, run_id: i64) -> Result<Vec<Model>, IngestError> {
        Ok(Entity::find()
            .filter(Column::RunId.eq(run_id))
            .order_by_asc(Column::OccurredAt)
            .order_by_asc(Column::AuditId)
            .all(&self.db)
            .await?)
    }

    /// The most recent events across all requests, newest first.
    pub async fn recent(&self, limit: u64) -> Result<Vec<Model>, IngestError> {
        Ok(Entity::find()
            .order_by_desc(Column::OccurredAt)
            .order_by_desc(Column::AuditId)
            .limit(limit)
            .all(&self.db)
            .await?)
    }
}
