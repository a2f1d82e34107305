//! IngestionAudit entity model
//!
//! Append-only timeline of ingestion lifecycle events. Rows are never
//! modified or deleted.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ingestion_audit")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub audit_id: i64,

    /// Run this event belongs to, when one exists yet
    pub run_id: Option<i64>,

    pub request_id: Option<String>,

    pub request_source: String,

    /// One of the closed AuditEventType set
    pub event_type: String,

    pub message: Option<String>,

    pub occurred_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
