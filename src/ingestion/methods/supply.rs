//! Handler for monthly supply data (`promedioAbasSipsaMesMadr`).
//!
//! Supply volumes rather than prices; dual-strategy dedup on
//! tmpAbasMesId and (artiId, fuenId, fechaMesIni). The wire field is
//! `fechamesini` even though the validation table calls it fechaMes.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::{display_opt, missing_reason, SUPPLY_METHOD};
use crate::error::IngestError;
use crate::ingestion::context::RunContext;
use crate::ingestion::registry::MethodHandler;
use crate::models::monthly_supply;
use crate::repositories::MonthlySupplyRepository;
use crate::soap::fields::millis_to_datetime;
use crate::soap::{RecordStream, SoapSource, SupplyRecord};

pub struct SupplyHandler {
    source: Arc<dyn SoapSource>,
    repository: MonthlySupplyRepository,
    batch_size: usize,
    max_children: usize,
}

impl SupplyHandler {
    pub fn new(
        source: Arc<dyn SoapSource>,
        repository: MonthlySupplyRepository,
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
        parser: &mut RecordStream<SupplyRecord>,
        with_tmp: &mut Vec<monthly_supply::Model>,
        no_tmp: &mut Vec<monthly_supply::Model>,
        context: &mut RunContext,
    ) -> Result<(), IngestError> {
        while let Some(record) = parser.next_record().await? {
            context.mark_seen();

            let fecha_mes = record.fecha_mes.and_then(millis_to_datetime);
            if record.arti_id.is_none() || record.fuen_id.is_none() || fecha_mes.is_none() {
                let raw_data = format!(
                    "artiId={}, fuenId={}, fechaMes={}, artiNombre={}",
                    display_opt(&record.arti_id),
                    display_opt(&record.fuen_id),
                    display_opt(&record.fecha_mes),
                    display_opt(&record.arti_nombre),
                );
                let reason = missing_reason(&[
                    ("artiId", record.arti_id.is_some()),
                    ("fuenId", record.fuen_id.is_some()),
                    ("fechaMes", fecha_mes.is_some()),
                ]);
                context.add_reject(raw_data, reason);
                continue;
            }

            let (Some(arti_id), Some(fuen_id), Some(fecha_mes_ini)) =
                (record.arti_id, record.fuen_id, fecha_mes)
            else {
                continue;
            };

            let entity = monthly_supply::Model {
                id: 0,
                tmp_abas_mes_id: record.tmp_abas_mes_id,
                arti_id,
                arti_nombre: record.arti_nombre,
                fuen_id,
                fuen_nombre: record.fuen_nombre,
                futi_id: record.futi_id,
                fecha_mes_ini,
                fecha_creacion: record.fecha_creacion.and_then(millis_to_datetime),
                cantidad_ton: record.cantidad_ton,
                enviado: record.enviado,
                fecha_ingestion: None,
                ingestion_run_id: context.run_id(),
            };

            if entity.tmp_abas_mes_id.is_some() {
                with_tmp.push(entity);
            } else {
                no_tmp.push(entity);
            }

            if with_tmp.len() >= self.batch_size {
                self.flush_tmp(with_tmp, context).await?;
            }
            if no_tmp.len() >= self.batch_size {
                self.flush_fallback(no_tmp, context).await?;
            }
        }
        Ok(())
    }

    async fn flush_tmp(
        &self,
        batch: &mut Vec<monthly_supply::Model>,
        context: &mut RunContext,
    ) -> Result<(), IngestError> {
        if batch.is_empty() {
            return Ok(());
        }
        let outcome = self.repository.flush_tmp(std::mem::take(batch)).await?;
        context.add_inserted(outcome.inserted);
        Ok(())
    }

    async fn flush_fallback(
        &self,
        batch: &mut Vec<monthly_supply::Model>,
        context: &mut RunContext,
    ) -> Result<(), IngestError> {
        if batch.is_empty() {
            return Ok(());
        }
        let outcome = self.repository.flush_fallback(std::mem::take(batch)).await?;
        context.add_inserted(outcome.inserted);
        Ok(())
    }

    async fn flush_all(
        &self,
        with_tmp: &mut Vec<monthly_supply::Model>,
        no_tmp: &mut Vec<monthly_supply::Model>,
        context: &mut RunContext,
    ) -> Result<(), IngestError> {
        self.flush_tmp(with_tmp, context).await?;
        self.flush_fallback(no_tmp, context).await
    }
}

#[async_trait]
impl MethodHandler for SupplyHandler {
    fn method_name(&self) -> &'static str {
        SUPPLY_METHOD
    }

    async fn execute(&self, context: &mut RunContext) -> Result<(), IngestError> {
        let body = self.source.stream(SUPPLY_METHOD).await?;
        let mut parser: RecordStream<SupplyRecord> = RecordStream::new(body, self.max_children);
        let mut with_tmp: Vec<monthly_supply::Model> = Vec::with_capacity(self.batch_size);
        let mut no_tmp: Vec<monthly_supply::Model> = Vec::with_capacity(self.batch_size);

        match self
            .consume(&mut parser, &mut with_tmp, &mut no_tmp, context)
            .await
        {
            Ok(()) => {
                self.flush_all(&mut with_tmp, &mut no_tmp, context).await?;
                info!(
                    method_name = SUPPLY_METHOD,
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
                if let Err(flush_err) = self.flush_all(&mut with_tmp, &mut no_tmp, context).await {
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
