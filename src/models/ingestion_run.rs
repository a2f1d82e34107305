//! IngestionRun entity model
//!
//! One row per execution attempt of a `(method_name, window_key)` pair.
//! The unique constraint on that pair is what enforces at-most-one-success
//! semantics under concurrency.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ingestion_runs")]
pub struct Model {
    /// Monotone run identifier (primary key)
    #[sea_orm(primary_key)]
    pub run_id: i64,

    /// SOAP method this run pulls
    pub method_name: String,

    /// Stable key of the execution window (YYYY-MM-DD in the service zone)
    pub window_key: String,

    /// Correlation id supplied by the trigger
    pub request_id: Option<String>,

    /// MANUAL, SCHEDULED, or SYSTEM
    pub request_source: String,

    /// STARTED, RUNNING, SUCCEEDED, or FAILED
    pub status: String,

    pub start_time: DateTimeUtc,

    /// Stamped when the run reaches a terminal status
    pub end_time: Option<DateTimeUtc>,

    pub records_seen: i32,

    pub records_inserted: i32,

    /// Always zero under skip-on-conflict; retained for future revisions
    pub records_updated: i32,

    pub reject_count: i32,

    pub last_error_message: Option<String>,

    pub http_status: Option<i32>,

    pub soap_fault_code: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
