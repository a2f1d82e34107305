//! # Data Models
//!
//! SeaORM entities for the control tables (runs, audit, rejects) and the
//! five curated tables, plus the small closed enums persisted as text.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod city_price;
pub mod ingestion_audit;
pub mod ingestion_reject;
pub mod ingestion_run;
pub mod monthly_supply;
pub mod monthly_wholesale;
pub mod partial_market;
pub mod weekly_wholesale;

pub use city_price::Entity as CityPrice;
pub use ingestion_audit::Entity as IngestionAudit;
pub use ingestion_reject::Entity as IngestionReject;
pub use ingestion_run::Entity as IngestionRun;
pub use monthly_supply::Entity as MonthlySupply;
pub use monthly_wholesale::Entity as MonthlyWholesale;
pub use partial_market::Entity as PartialMarket;
pub use weekly_wholesale::Entity as WeeklyWholesale;

/// Logical origin of an ingestion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum RequestSource {
    Manual,
    Scheduled,
    System,
}

impl RequestSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "MANUAL",
            Self::Scheduled => "SCHEDULED",
            Self::System => "SYSTEM",
        }
    }
}

impl std::fmt::Display for RequestSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of an ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum RunStatus {
    Started,
    Running,
    Succeeded,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "STARTED",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of audit event types recorded on the ingestion timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum AuditEventType {
    RequestReceived,
    RequestAccepted,
    RequestRejected,
    IngestionStarted,
    IngestionRunning,
    IngestionSucceeded,
    IngestionFailed,
    IngestionSkippedWindow,
    IngestionSkippedDuplicate,
    MetricsUpdated,
    // Reserved per-record event types.
    RecordInserted,
    RecordUpdated,
    RecordRejected,
    ErrorValidation,
    ErrorParse,
    ErrorDatabase,
    ErrorSoap,
    ErrorThreshold,
    ForceRestart,
}

impl AuditEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequestReceived => "REQUEST_RECEIVED",
            Self::RequestAccepted => "REQUEST_ACCEPTED",
            Self::RequestRejected => "REQUEST_REJECTED",
            Self::IngestionStarted => "INGESTION_STARTED",
            Self::IngestionRunning => "INGESTION_RUNNING",
            Self::IngestionSucceeded => "INGESTION_SUCCEEDED",
            Self::IngestionFailed => "INGESTION_FAILED",
            Self::IngestionSkippedWindow => "INGESTION_SKIPPED_WINDOW",
            Self::IngestionSkippedDuplicate => "INGESTION_SKIPPED_DUPLICATE",
            Self::MetricsUpdated => "METRICS_UPDATED",
            Self::RecordInserted => "RECORD_INSERTED",
            Self::RecordUpdated => "RECORD_UPDATED",
            Self::RecordRejected => "RECORD_REJECTED",
            Self::ErrorValidation => "ERROR_VALIDATION",
            Self::ErrorParse => "ERROR_PARSE",
            Self::ErrorDatabase => "ERROR_DATABASE",
            Self::ErrorSoap => "ERROR_SOAP",
            Self::ErrorThreshold => "ERROR_THRESHOLD",
            Self::ForceRestart => "FORCE_RESTART",
        }
    }
}

impl std::fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service identity plus the runtime facts an operator checks first:
/// the active profile, the window-computation zone, and how many SOAP
/// methods are registered.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    /// Active configuration profile (local, test, prod)
    pub profile: String,
    /// Zone used for all window computations
    pub timezone: String,
    /// Registered ingestion method count
    pub methods: usize,
}
