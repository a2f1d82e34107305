//! Tracing setup for the ingestion service.
//!
//! JSON lines with per-run correlation: the orchestrator opens an
//! `ingestion` span carrying run_id, method_name, window_key, and
//! request_id, and the formatter emits that span's fields on every event
//! recorded inside a run.

use crate::config::AppConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init_subscriber(config: &AppConfig) {
    // RUST_LOG wins outright; otherwise the configured level applies to
    // this crate and chatty dependencies stay at warn.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,sipsa_ingest={level},tokio_cron_scheduler={level}",
            level = config.log_level
        ))
    });

    let formatter = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(formatter)
        .init();
}
