//! Handler for municipality-level market data (`promediosSipsaParcial`).
//!
//! Each record gets a SHA-256 dedup key over
//! `muniId|fuenId|futiId|idArtiSemana|enmaFecha|artiNombre`, computed from
//! the raw survey-date text exactly as received. The curated column stores
//! the parsed instant; the hash keeps the original text so resubmissions
//! of identical wire data always collide.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::{display_opt, missing_reason, PARTIAL_METHOD};
use crate::error::IngestError;
use crate::ingestion::context::RunContext;
use crate::ingestion::registry::MethodHandler;
use crate::models::partial_market;
use crate::repositories::PartialMarketRepository;
use crate::soap::fields::parse_instant;
use crate::soap::{PartialRecord, RecordStream, SoapSource};

pub struct PartialHandler {
    source: Arc<dyn SoapSource>,
    repository: PartialMarketRepository,
    batch_size: usize,
    max_children: usize,
}

impl PartialHandler {
    pub fn new(
        source: Arc<dyn SoapSource>,
        repository: PartialMarketRepository,
        batch_size: usize,
        max_children: usize,
    ) -> Self {
        Self {
            source,
            repository,
            batch_size,
            max_children,
        }
    }

    async fn consume(
        &self,
        parser: &mut RecordStream<PartialRecord>,
        batch: &mut Vec<partial_market::Model>,
        context: &mut RunContext,
    ) -> Result<(), IngestError> {
        while let Some(record) = parser.next_record().await? {
            context.mark_seen();

            if record.muni_id.is_none()
                || record.fuen_id.is_none()
                || record.futi_id.is_none()
                || record.id_arti_semana.is_none()
                || record.enma_fecha.is_none()
            {
                let raw_data = format!(
                    "muniId={}, fuenId={}, futiId={}, idArtiSemana={}, enmaFecha={}, muniNombre={}, artiNombre={}",
                    display_opt(&record.muni_id),
                    display_opt(&record.fuen_id),
                    display_opt(&record.futi_id),
                    display_opt(&record.id_arti_semana),
                    display_opt(&record.enma_fecha),
                    display_opt(&record.muni_nombre),
                    display_opt(&record.arti_nombre),
                );
                let reason = missing_reason(&[
                    ("muniId", record.muni_id.is_some()),
                    ("fuenId", record.fuen_id.is_some()),
                    ("futiId", record.futi_id.is_some()),
                    ("idArtiSemana", record.id_arti_semana.is_some()),
                    ("enmaFecha", record.enma_fecha.is_some()),
                ]);
                context.add_reject(raw_data, reason);
                continue;
            }

            let (
                Some(muni_id),
                Some(fuen_id),
                Some(futi_id),
                Some(id_arti_semana),
                Some(enma_fecha_raw),
            ) = (
                record.muni_id,
                record.fuen_id,
                record.futi_id,
                record.id_arti_semana,
                record.enma_fecha,
            )
            else {
                continue;
            };

            let key_hash = dedup_hash(
                &muni_id,
                fuen_id,
                futi_id,
                id_arti_semana,
                &enma_fecha_raw,
                record.arti_nombre.as_deref(),
            );

            batch.push(partial_market::Model {
                id: 0,
                key_hash,
                muni_id,
                muni_nombre: record.muni_nombre,
                dept_nombre: record.dept_nombre,
                fuen_id,
                fuen_nombre: record.fuen_nombre,
                futi_id,
                id_arti_semana,
                arti_nombre: record.arti_nombre,
                grup_nombre: record.grup_nombre,
                enma_fecha: parse_instant(&enma_fecha_raw),
                promedio_kg: record.promedio_kg,
                maximo_kg: record.maximo_kg,
                minimo_kg: record.minimo_kg,
                last_updated: None,
                ingestion_run_id: context.run_id(),
            });

            if batch.len() >= self.batch_size {
                self.flush(batch, context).await?;
            }
        }
        Ok(())
    }

    async fn flush(
        &self,
        batch: &mut Vec<partial_market::Model>,
        context: &mut RunContext,
    ) -> Result<(), IngestError> {
        if batch.is_empty() {
            return Ok(());
        }
        let outcome = self.repository.flush(std::mem::take(batch)).await?;
        context.add_inserted(outcome.inserted);
        Ok(())
    }
}

#[async_trait]
impl MethodHandler for PartialHandler {
    fn method_name(&self) -> &'static str {
        PARTIAL_METHOD
    }

    async fn execute(&self, context: &mut RunContext) -> Result<(), IngestError> {
        let body = self.source.stream(PARTIAL_METHOD).await?;
        let mut parser: RecordStream<PartialRecord> = RecordStream::new(body, self.max_children);
        let mut batch: Vec<partial_market::Model> = Vec::with_capacity(self.batch_size);

        match self.consume(&mut parser, &mut batch, context).await {
            Ok(()) => {
                self.flush(&mut batch, context).await?;
                info!(
                    method_name = PARTIAL_METHOD,
                    seen = context.records_seen(),
                    rejected = context.reject_count(),
                    "SOAP method completed"
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    seen = context.records_seen(),
                    "Error during ingestion, attempting to save partial progress"
                );
                if let Err(flush_err) = self.flush(&mut batch, context).await {
                    error!(error = %flush_err, "Failed to save partial progress");
                } else {
                    info!(
                        inserted = context.records_inserted(),
                        "Saved partial progress before failure"
                    );
                }
                Err(err)
            }
        }
    }
}

/// SHA-256 over the pipe-joined business fields, lowercase hex.
pub fn dedup_hash(
    muni_id: &str,
    fuen_id: i64,
    futi_id: i64,
    id_arti_semana: i64,
    enma_fecha: &str,
    arti_nombre: Option<&str>,
) -> String {
    let raw_key = format!(
        "{muni_id}|{fuen_id}|{futi_id}|{id_arti_semana}|{enma_fecha}|{}",
        arti_nombre.unwrap_or("")
    );
    let mut hasher = Sha256::new();
    hasher.update(raw_key.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_64_hex_chars_and_deterministic() {
        let a = dedup_hash("5001", 10, 2, 77, "2026-01-02T00:00:00Z", Some("Papa criolla"));
        let b = dedup_hash("5001", 10, 2, 77, "2026-01-02T00:00:00Z", Some("Papa criolla"));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn hash_distinguishes_business_fields() {
        let base = dedup_hash("5001", 10, 2, 77, "2026-01-02T00:00:00Z", Some("Papa"));
        assert_ne!(
            base,
            dedup_hash("5002", 10, 2, 77, "2026-01-02T00:00:00Z", Some("Papa"))
        );
        assert_ne!(
            base,
            dedup_hash("5001", 10, 2, 77, "2026-01-03T00:00:00Z", Some("Papa"))
        );
    }

    #[test]
    fn missing_article_name_hashes_as_empty() {
        assert_eq!(
            dedup_hash("5001", 10, 2, 77, "x", None),
            dedup_hash("5001", 10, 2, 77, "x", Some(""))
        );
    }
}
