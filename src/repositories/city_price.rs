//! # CityPrice Repository
//!
//! Batch upsert for city-level pricing rows on the (reg_id, cod_producto)
//! business key. Strategy: if the key exists, SKIP (no update); if absent,
//! INSERT with the ingestion timestamp stamped at flush time.

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, NotSet, QueryFilter, Set};
use std::collections::{HashMap, HashSet};

use super::UpsertOutcome;
use crate::error::IngestError;
use crate::models::city_price::{ActiveModel, Column, Entity, Model};

#[derive(Clone)]
pub struct CityPriceRepository {
    db: DatabaseConnection,
}

impl CityPriceRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Upserts a batch: in-batch dedup (last occurrence wins, first-seen
    /// order), one bulk existence probe, then a single conflict-tolerant
    /// multi-row insert. `inserted` counts rows actually written, so a
    /// concurrent run landing the same keys shows up as skips here.
    pub async fn flush(&self, items: Vec<Model>) -> Result<UpsertOutcome, IngestError> {
        if items.is_empty() {
            return Ok(UpsertOutcome::default());
        }

        let mut order: Vec<(i64, i64)> = Vec::new();
        let mut unique: HashMap<(i64, i64), Model> = HashMap::new();
        for item in items {
            let key = (item.reg_id, item.cod_producto);
            if unique.insert(key, item).is_none() {
                order.push(key);
            }
        }

        let mut probe = Condition::any();
        for (reg_id, cod_producto) in &order {
            probe = probe.add(
                Column::RegId
                    .eq(*reg_id)
                    .and(Column::CodProducto.eq(*cod_producto)),
            );
        }
        let existing: HashSet<(i64, i64)> = Entity::find()
            .filter(probe)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| (m.reg_id, m.cod_producto))
            .collect();

        let now = Utc::now();
        let mut to_insert = Vec::new();
        let mut skipped = 0usize;
        for key in &order {
            let Some(item) = unique.remove(key) else {
                continue;
            };
            if existing.contains(key) {
                skipped += 1;
            } else {
                to_insert.push(to_active(item, now));
            }
        }

        if to_insert.is_empty() {
            return Ok(UpsertOutcome { inserted: 0, skipped });
        }

        let attempted = to_insert.len();
        let inserted = Entity::insert_many(to_insert)
            .on_conflict(
                OnConflict::columns([Column::RegId, Column::CodProducto])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await? as usize;

        Ok(UpsertOutcome {
            inserted,
            skipped: skipped + (attempted - inserted),
        })
    }
}

fn to_active(model: Model, now: chrono::DateTime<Utc>) -> ActiveModel {
    ActiveModel {
        id: NotSet,
        reg_id: Set(model.reg_id),
        ciudad: Set(model.ciudad),
        cod_producto: Set(model.cod_producto),
        producto: Set(model.producto),
        fecha_captura: Set(model.fecha_captura),
        fecha_creacion: Set(model.fecha_creacion),
        precio_promedio: Set(model.precio_promedio),
        enviado: Set(model.enviado),
        fecha_ingestion: Set(Some(now)),
        ingestion_run_id: Set(model.ingestion_run_id),
    }
}
