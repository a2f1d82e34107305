//! Streaming HTTP client for the SIPSA SOAP web service.
//!
//! Bypasses any envelope object mapping: the request is a small fixed SOAP
//! 1.2 envelope and the response body is handed to the caller as an async
//! byte stream for incremental parsing. Memory stays flat regardless of
//! response size.
//!
//! Retry policy: 5xx statuses, timeouts, and connect failures retry with
//! exponential backoff (`retry_backoff_ms * 2^(attempt-1)`) up to
//! `max_retries`; 4xx statuses fail immediately. SOAP faults inside a 2xx
//! body are the parser's concern.

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tokio::io::AsyncBufRead;
use tokio_util::io::StreamReader;
use tracing::{info, warn};

use crate::config::SoapConfig;
use crate::error::IngestError;

/// Lazily consumed SOAP response body.
pub type BodyStream = Box<dyn AsyncBufRead + Send + Unpin>;

/// Streaming fetcher seam; one lazy byte stream per SOAP method.
#[async_trait]
pub trait SoapSource: Send + Sync {
    async fn stream(&self, method_name: &str) -> Result<BodyStream, IngestError>;
}

/// Production [`SoapSource`] backed by reqwest.
pub struct SoapClient {
    http: reqwest::Client,
    config: SoapConfig,
}

enum CallError {
    Retryable(IngestError),
    NonRetryable(IngestError),
}

impl SoapClient {
    pub fn new(config: SoapConfig) -> Result<Self, IngestError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .read_timeout(Duration::from_millis(config.read_timeout_ms))
            .gzip(true)
            .build()
            .map_err(|e| {
                IngestError::Configuration(format!("failed to build SOAP HTTP client: {e}"))
            })?;

        Ok(Self { http, config })
    }

    /// Wraps the named empty request element in a SOAP 1.2 envelope.
    fn envelope(&self, method_name: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
             <soap12:Envelope xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" \
             xmlns:xsd=\"http://www.w3.org/2001/XMLSchema\" \
             xmlns:soap12=\"http://www.w3.org/2003/05/soap-envelope\">\
             <soap12:Body>\
             <ns:{method_name} xmlns:ns=\"{namespace}\"/>\
             </soap12:Body>\
             </soap12:Envelope>",
            namespace = self.config.namespace,
        )
    }

    async fn execute_call(&self, envelope: &str) -> Result<BodyStream, CallError> {
        let response = self
            .http
            .post(&self.config.endpoint)
            .header(CONTENT_TYPE, "application/soap+xml; charset=utf-8")
            .body(envelope.to_string())
            .send()
            .await
            .map_err(|e| {
                CallError::Retryable(IngestError::external(
                    format!("SOAP transport error: {e}"),
                    None,
                ))
            })?;

        let status = response.status();
        if status.is_success() {
            // A 2xx body may still carry a SOAP fault; the stream cannot be
            // peeked without consuming it, so fault detection is delegated
            // to the pull parser.
            let stream = response
                .bytes_stream()
                .map_err(|e| std::io::Error::other(e.to_string()));
            Ok(Box::new(StreamReader::new(Box::pin(stream))) as BodyStream)
        } else if status.is_server_error() {
            Err(CallError::Retryable(IngestError::external(
                format!("Server Error {}", status.as_u16()),
                Some(status.as_u16()),
            )))
        } else {
            Err(CallError::NonRetryable(IngestError::external(
                format!("HTTP Client Error {}", status.as_u16()),
                Some(status.as_u16()),
            )))
        }
    }
}

#[async_trait]
impl SoapSource for SoapClient {
    async fn stream(&self, method_name: &str) -> Result<BodyStream, IngestError> {
        let envelope = self.envelope(method_name);
        let mut last_error: Option<IngestError> = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff = self.config.retry_backoff_ms * 2u64.pow(attempt - 1);
                info!(
                    method_name,
                    attempt,
                    max_retries = self.config.max_retries,
                    backoff_ms = backoff,
                    "Retrying SOAP call"
                );
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }

            match self.execute_call(&envelope).await {
                Ok(stream) => return Ok(stream),
                Err(CallError::NonRetryable(err)) => {
                    warn!(method_name, error = %err, "Non-retryable SOAP error");
                    return Err(err);
                }
                Err(CallError::Retryable(err)) => {
                    warn!(method_name, attempt, error = %err, "Retryable SOAP error");
                    last_error = Some(err);
                }
            }
        }

        let http_status = last_error.as_ref().and_then(|e| e.upstream_status());
        Err(IngestError::external(
            format!(
                "SOAP call failed after {} retries: {}",
                self.config.max_retries,
                last_error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "unknown error".to_string())
            ),
            http_status.map(|s| s as u16),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_wraps_method_in_configured_namespace() {
        let client = SoapClient::new(SoapConfig::default()).unwrap();
        let envelope = client.envelope("promediosSipsaCiudad");

        assert!(envelope.contains("<soap12:Envelope"));
        assert!(envelope.contains(
            "<ns:promediosSipsaCiudad xmlns:ns=\"http://ws.sipsa.dane.gov.co/\"/>"
        ));
        assert!(envelope.contains("<soap12:Body>"));
    }
}
