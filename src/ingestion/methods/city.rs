//! Handler for city-level pricing data (`promediosSipsaCiudad`).
//!
//! Single-batch strategy: every valid record goes through the business-key
//! upsert on (reg_id, cod_producto). Records missing regId, codProducto,
//! or a usable fechaCaptura are rejected without aborting the run.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::{display_opt, missing_reason, CITY_METHOD};
use crate::error::IngestError;
use crate::ingestion::context::RunContext;
use crate::ingestion::registry::MethodHandler;
use crate::models::city_price;
use crate::repositories::CityPriceRepository;
use crate::soap::fields::millis_to_datetime;
use crate::soap::{CityRecord, RecordStream, SoapSource};

pub struct CityHandler {
    source: Arc<dyn SoapSource>,
    repository: CityPriceRepository,
    batch_size: usize,
    max_children: usize,
}

impl CityHandler {
    pub fn new(
        source: Arc<dyn SoapSource>,
        repository: CityPriceRepository,
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
        parser: &mut RecordStream<CityRecord>,
        batch: &mut Vec<city_price::Model>,
        context: &mut RunContext,
    ) -> Result<(), IngestError> {
        while let Some(record) = parser.next_record().await? {
            context.mark_seen();

            let fecha_captura = record.fecha_captura.and_then(millis_to_datetime);
            if record.reg_id.is_none() || record.cod_producto.is_none() || fecha_captura.is_none()
            {
                let raw_data = format!(
                    "regId={}, codProducto={}, fechaCaptura={}, ciudad={}, producto={}",
                    display_opt(&record.reg_id),
                    display_opt(&record.cod_producto),
                    display_opt(&record.fecha_captura),
                    display_opt(&record.ciudad),
                    display_opt(&record.producto),
                );
                let reason = missing_reason(&[
                    ("regId", record.reg_id.is_some()),
                    ("codProducto", record.cod_producto.is_some()),
                    ("fechaCaptura", fecha_captura.is_some()),
                ]);
                context.add_reject(raw_data, reason);
                continue;
            }

            let (Some(reg_id), Some(cod_producto), Some(fecha_captura)) =
                (record.reg_id, record.cod_producto, fecha_captura)
            else {
                continue;
            };

            batch.push(city_price::Model {
                id: 0,
                reg_id,
                ciudad: record.ciudad,
                cod_producto,
                producto: record.producto,
                fecha_captura,
                fecha_creacion: record.fecha_creacion.and_then(millis_to_datetime),
                precio_promedio: record.precio_promedio,
                enviado: record.enviado,
                fecha_ingestion: None,
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
        batch: &mut Vec<city_price::Model>,
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
impl MethodHandler for CityHandler {
    fn method_name(&self) -> &'static str {
        CITY_METHOD
    }

    async fn execute(&self, context: &mut RunContext) -> Result<(), IngestError> {
        let body = self.source.stream(CITY_METHOD).await?;
        let mut parser: RecordStream<CityRecord> = RecordStream::new(body, self.max_children);
        let mut batch: Vec<city_price::Model> = Vec::with_capacity(self.batch_size);

        match self.consume(&mut parser, &mut batch, context).await {
            Ok(()) => {
                self.flush(&mut batch, context).await?;
                info!(
                    method_name = CITY_METHOD,
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
