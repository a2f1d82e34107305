//! # PartialMarket Repository
//!
//! Hash-keyed batch upsert for municipality-level market rows. The
//! SHA-256 key makes reprocessing idempotent across runs: if the hash
//! exists, SKIP; otherwise INSERT.

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter, Set};
use std::collections::{HashMap, HashSet};

use super::UpsertOutcome;
use crate::error::IngestError;
use crate::models::partial_market::{ActiveModel, Column, Entity, Model};

#[derive(Clone)]
pub struct PartialMarketRepository {
    db: DatabaseConnection,
}

impl PartialMarketRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn flush(&self, items: Vec<Model>) -> Result<UpsertOutcome, IngestError> {
        if items.is_empty() {
            return Ok(UpsertOutcome::default());
        }

        let mut order: Vec<String> = Vec::new();
        let mut unique: HashMap<String, Model> = HashMap::new();
        for item in items {
            let key = item.key_hash.clone();
            if unique.insert(key.clone(), item).is_none() {
                order.push(key);
            }
        }

        let existing: HashSet<String> = Entity::find()
            .filter(Column::KeyHash.is_in(order.clone()))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| m.key_hash)
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
            .on_conflict(OnConflict::column(Column::KeyHash).do_nothing().to_owned())
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
        key_hash: Set(model.key_hash),
        muni_id: Set(model.muni_id),
        muni_nombre: Set(model.muni_nombre),
        dept_nombre: Set(model.dept_nombre),
        fuen_id: Set(model.fuen_id),
        fuen_nombre: Set(model.fuen_nombre),
        futi_id: Set(model.futi_id),
        id_arti_semana: Set(model.id_arti_semana),
        arti_nombre: Set(model.arti_nombre),
        grup_nombre: Set(model.grup_nombre),
        enma_fecha: Set(model.enma_fecha),
        promedio_kg: Set(model.promedio_kg),
        maximo_kg: Set(model.maximo_kg),
        minimo_kg: Set(model.minimo_kg),
        last_updated: Set(Some(now)),
        ingestion_run_id: Set(model.ingestion_run_id),
    }
}
