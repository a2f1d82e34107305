//! Test utilities for database and orchestrator testing.
//!
//! Provides an in-memory SQLite database with all migrations applied, a
//! stub SOAP source serving canned XML bodies, and helpers to build an
//! orchestrator with deterministic window policies.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::collections::HashMap;
use std::sync::Arc;

use sipsa_ingest::config::AppConfig;
use sipsa_ingest::error::IngestError;
use sipsa_ingest::ingestion::{methods, IngestionJob, WindowPolicy};
use sipsa_ingest::soap::{BodyStream, SoapSource};

/// Sets up an in-memory SQLite database with all migrations applied.
///
/// A single pooled connection keeps every handle on the same in-memory
/// database.
pub async fn setup_test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("connect to in-memory sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

/// Stub [`SoapSource`] serving canned response bodies per method.
/// Methods without a body fail like an exhausted retry loop.
#[derive(Default)]
pub struct StubSoapSource {
    bodies: HashMap<String, String>,
}

impl StubSoapSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, method_name: &str, body: impl Into<String>) -> Self {
        self.bodies.insert(method_name.to_string(), body.into());
        self
    }
}

#[async_trait]
impl SoapSource for StubSoapSource {
    async fn stream(&self, method_name: &str) -> Result<BodyStream, IngestError> {
        match self.bodies.get(method_name) {
            Some(body) => Ok(Box::new(std::io::Cursor::new(body.clone().into_bytes()))),
            None => Err(IngestError::external(
                "SOAP call failed after 3 retries: Server Error 503",
                Some(503),
            )),
        }
    }
}

/// Wraps return blocks in a minimal SOAP 1.2 response envelope.
pub fn soap_envelope(returns: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
         <soap:Envelope xmlns:soap=\"http://www.w3.org/2003/05/soap-envelope\">\
         <soap:Body><ns2:response xmlns:ns2=\"http://ws.sipsa.example/\">{returns}\
         </ns2:response></soap:Body></soap:Envelope>"
    )
}

/// A SOAP fault body as returned inside an HTTP 200 response.
pub fn soap_fault_envelope(text: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
         <soap:Envelope xmlns:soap=\"http://www.w3.org/2003/05/soap-envelope\">\
         <soap:Body><soap:Fault><soap:Reason>\
         <soap:Text xml:lang=\"en\">{text}</soap:Text>\
         </soap:Reason></soap:Fault></soap:Body></soap:Envelope>"
    )
}

/// One valid city return block.
pub fn city_return(reg_id: i64, cod_producto: i64, fecha_captura_ms: i64) -> String {
    format!(
        "<return><regId>{reg_id}</regId><ciudad>Bogota</ciudad>\
         <codProducto>{cod_producto}</codProducto><producto>Papa criolla</producto>\
         <fechaCaptura>{fecha_captura_ms}</fechaCaptura>\
         <precioPromedio>2350.50</precioPromedio></return>"
    )
}

/// A city return block missing its required fields.
pub fn invalid_city_return() -> String {
    "<return><ciudad>Sin datos</ciudad><producto>Desconocido</producto></return>".to_string()
}

/// One valid partial return block.
pub fn partial_return(muni_id: &str, id_arti_semana: i64, enma_fecha: &str) -> String {
    format!(
        "<return><muniId>{muni_id}</muniId><muniNombre>Tunja</muniNombre>\
         <fuenId>40</fuenId><fuenNombre>Plaza mayor</fuenNombre><futiId>2</futiId>\
         <idArtiSemana>{id_arti_semana}</idArtiSemana><artiNombre>Cebolla</artiNombre>\
         <enmaFecha>{enma_fecha}</enmaFecha><promedioKg>980.00</promedioKg></return>"
    )
}

/// Configuration whose windows are always open, for deterministic tests.
pub fn open_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.ingestion.daily_window_start = "00:00".to_string();
    config.ingestion.daily_window_end = "23:59".to_string();
    config.ingestion.monthly_run_days = (1..=31)
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(",");
    config.ingestion.monthly_window_start = "00:00".to_string();
    config.ingestion.scheduler_enabled = false;
    config
}

/// A window policy that is guaranteed closed at the current instant for
/// both daily and monthly methods.
pub fn closed_window_policy() -> WindowPolicy {
    let zone: Tz = "America/Bogota".parse().expect("valid zone");
    let now = Utc::now().with_timezone(&zone);

    // Pick a daily window on the far side of the clock from now.
    let (start, end) = if now.time().hour() < 12 {
        (
            NaiveTime::from_hms_opt(20, 0, 0).expect("valid time"),
            NaiveTime::from_hms_opt(21, 0, 0).expect("valid time"),
        )
    } else {
        (
            NaiveTime::from_hms_opt(2, 0, 0).expect("valid time"),
            NaiveTime::from_hms_opt(3, 0, 0).expect("valid time"),
        )
    };

    // Pick a run day that is neither today nor yesterday.
    let today = chrono::Datelike::day(&now);
    let run_day = (1..=28)
        .find(|d| *d != today && d + 1 != today)
        .expect("some closed day exists");

    WindowPolicy::new(
        start,
        end,
        [run_day].into_iter().collect(),
        NaiveTime::from_hms_opt(6, 0, 0).expect("valid time"),
        zone,
    )
}

/// Builds an orchestrator over the given database and stub source.
pub fn build_job(
    db: &DatabaseConnection,
    source: Arc<dyn SoapSource>,
    max_reject_rate: f64,
    max_reject_count: i32,
) -> IngestionJob {
    let config = open_config();
    let registry = methods::build_registry(db, source, &config);
    let policy = WindowPolicy::from_config(&config).expect("valid test config");
    IngestionJob::new(db.clone(), registry, policy, max_reject_rate, max_reject_count)
}

/// Same as [`build_job`] but with the always-closed window policy.
pub fn build_job_closed_window(
    db: &DatabaseConnection,
    source: Arc<dyn SoapSource>,
) -> IngestionJob {
    let config = open_config();
    let registry = methods::build_registry(db, source, &config);
    IngestionJob::new(db.clone(), registry, closed_window_policy(), 0.01, 5000)
}
