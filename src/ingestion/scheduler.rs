//! # Ingestion Scheduler
//!
//! Cron-driven triggers for the ingestion job, all evaluated in the
//! configured timezone. The daily window fires three methods
//! sequentially (city, partial, weekly); a failure in one does not stop
//! the next. The two monthly triggers fire one method each.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::IngestError;
use crate::ingestion::job::{IngestionJob, TriggerRequest};
use crate::ingestion::methods::{
    CITY_METHOD, MONTHLY_METHOD, PARTIAL_METHOD, SUPPLY_METHOD, WEEKLY_METHOD,
};

pub struct IngestionScheduler {
    job: Arc<IngestionJob>,
    config: Arc<AppConfig>,
}

impl IngestionScheduler {
    pub fn new(job: Arc<IngestionJob>, config: Arc<AppConfig>) -> Self {
        Self { job, config }
    }

    /// Builds and starts the cron jobs. Returns `None` when scheduling is
    /// disabled; otherwise the returned scheduler must be kept alive.
    pub async fn start(&self) -> Result<Option<JobScheduler>, IngestError> {
        if !self.config.ingestion.scheduler_enabled {
            info!("Ingestion scheduler disabled by configuration");
            return Ok(None);
        }

        let zone = self
            .config
            .zone()
            .map_err(|e| IngestError::Configuration(e.to_string()))?;

        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| IngestError::Configuration(format!("failed to create scheduler: {e}")))?;

        let job = self.job.clone();
        let daily = Job::new_async_tz(
            self.config.ingestion.cron_daily.as_str(),
            zone,
            move |_uuid, _lock| {
                let job = job.clone();
                Box::pin(async move {
                    info!("Triggering Daily Ingestion Window");
                    run_safely(&job, CITY_METHOD).await;
                    run_safely(&job, PARTIAL_METHOD).await;
                    run_safely(&job, WEEKLY_METHOD).await;
                })
            },
        )
        .map_err(|e| {
            IngestError::Configuration(format!(
                "invalid daily cron '{}': {e}",
                self.config.ingestion.cron_daily
            ))
        })?;

        let job = self.job.clone();
        let monthly_mes = Job::new_async_tz(
            self.config.ingestion.cron_monthly_mes.as_str(),
            zone,
            move |_uuid, _lock| {
                let job = job.clone();
                Box::pin(async move {
                    info!("Triggering Monthly MesMadr");
                    run_safely(&job, MONTHLY_METHOD).await;
                })
            },
        )
        .map_err(|e| {
            IngestError::Configuration(format!(
                "invalid monthly-mes cron '{}': {e}",
                self.config.ingestion.cron_monthly_mes
            ))
        })?;

        let job = self.job.clone();
        let monthly_abas = Job::new_async_tz(
            self.config.ingestion.cron_monthly_abas.as_str(),
            zone,
            move |_uuid, _lock| {
                let job = job.clone();
                Box::pin(async move {
                    info!("Triggering Monthly AbasMes");
                    run_safely(&job, SUPPLY_METHOD).await;
                })
            },
        )
        .map_err(|e| {
            IngestError::Configuration(format!(
                "invalid monthly-abas cron '{}': {e}",
                self.config.ingestion.cron_monthly_abas
            ))
        })?;

        for cron_job in [daily, monthly_mes, monthly_abas] {
            scheduler
                .add(cron_job)
                .await
                .map_err(|e| IngestError::Configuration(format!("failed to add cron job: {e}")))?;
        }

        scheduler
            .start()
            .await
            .map_err(|e| IngestError::Configuration(format!("failed to start scheduler: {e}")))?;

        info!("Ingestion scheduler started");
        Ok(Some(scheduler))
    }
}

/// Runs one scheduled method; errors are logged so the next method in the
/// same window still fires.
async fn run_safely(job: &IngestionJob, method_name: &str) {
    let request_id = Uuid::new_v4().to_string();
    info!(
        method_name,
        request_id, "Scheduler triggering method (source=SCHEDULED)"
    );

    let outcome = job
        .execute(TriggerRequest::scheduled(method_name, &request_id))
        .await;
    if outcome == crate::ingestion::job::ExecutionOutcome::Failed {
        error!(method_name, request_id, "Scheduled ingestion failed");
    }
}
