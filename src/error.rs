//! # Error Handling
//!
//! Domain error taxonomy for the ingestion core plus the unified JSON error
//! envelope returned by the HTTP API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Errors raised by the ingestion core and its collaborators.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Bad inbound request or per-record field missing.
    #[error("{0}")]
    Validation(String),

    /// Current time is outside the method's execution window.
    #[error("{0}")]
    WindowViolation(String),

    /// Window already completed, or a live run exists without force.
    #[error("{0}")]
    DuplicateRun(String),

    /// Malformed XML or the body stream died mid-record.
    #[error("{0}")]
    Parse(String),

    /// A SOAP `<Fault>` element inside a 2xx body.
    #[error("SOAP Fault in response: {0}")]
    SoapFault(String),

    /// Transport failure after retry exhaustion, or a non-retryable status.
    #[error("{message}")]
    External {
        message: String,
        http_status: Option<u16>,
    },

    /// Reject count or rate beyond the configured limits.
    #[error("{0}")]
    ThresholdExceeded(String),

    /// Unique constraint violation outside the createRun path.
    #[error("{0}")]
    Integrity(String),

    /// Invalid static configuration; prevents startup.
    #[error("{0}")]
    Configuration(String),

    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),
}

impl IngestError {
    pub fn external<S: Into<String>>(message: S, http_status: Option<u16>) -> Self {
        Self::External {
            message: message.into(),
            http_status,
        }
    }

    /// HTTP status observed upstream, if this error carries one.
    pub fn upstream_status(&self) -> Option<i32> {
        match self {
            Self::External { http_status, .. } => http_status.map(i32::from),
            _ => None,
        }
    }

    /// SOAP fault text, if this error is a fault.
    pub fn fault_code(&self) -> Option<String> {
        match self {
            Self::SoapFault(text) => Some(text.clone()),
            _ => None,
        }
    }
}

/// Unified API error response structure.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiError {
    /// HTTP status code for the response
    #[serde(skip)]
    pub status: StatusCode,
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Additional error details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new<C: Into<String>, M: Into<String>>(status: StatusCode, code: C, message: M) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn with_details<V: Into<serde_json::Value>>(mut self, details: V) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, axum::Json(self)).into_response()
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match &err {
            IngestError::Validation(msg) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "VALIDATION_FAILED".to_string(),
                msg.clone(),
            ),
            IngestError::WindowViolation(msg) => ApiError::new(
                StatusCode::CONFLICT,
                "WINDOW_VIOLATION".to_string(),
                msg.clone(),
            ),
            IngestError::DuplicateRun(msg) => ApiError::new(
                StatusCode::CONFLICT,
                "DUPLICATE_RUN".to_string(),
                msg.clone(),
            ),
            IngestError::External { message, .. } => ApiError::new(
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR".to_string(),
                message.clone(),
            ),
            IngestError::Configuration(msg) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIGURATION_ERROR".to_string(),
                msg.clone(),
            ),
            other => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR".to_string(),
                other.to_string(),
            ),
        }
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(err: sea_orm::DbErr) -> Self {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR".to_string(),
            err.to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_status_only_on_external() {
        let err = IngestError::external("Server Error 503", Some(503));
        assert_eq!(err.upstream_status(), Some(503));
        assert!(IngestError::Parse("boom".into()).upstream_status().is_none());
    }

    #[test]
    fn fault_code_carries_fault_text() {
        let err = IngestError::SoapFault("Backend busy".into());
        assert_eq!(err.fault_code().as_deref(), Some("Backend busy"));
        assert!(err.to_string().contains("Backend busy"));
    }

    #[test]
    fn api_error_mapping() {
        let api: ApiError = IngestError::Validation("method is required".into()).into();
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.code, "VALIDATION_FAILED");

        let api: ApiError = IngestError::external("upstream down", Some(503)).into();
        assert_eq!(api.status, StatusCode::BAD_GATEWAY);
        assert_eq!(api.code, "UPSTREAM_ERROR");
    }

    #[test]
    fn api_error_status_preserved_in_response() {
        let response = ApiError::not_found("no audit trail").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
