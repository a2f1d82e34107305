//! # MonthlySupply Repository
//!
//! Dual-strategy batch upsert for monthly supply volumes. Keys are
//! `tmp_abas_mes_id` and (arti_id, fuen_id, fecha_mes_ini).

use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, NotSet, QueryFilter, Set};
use std::collections::{HashMap, HashSet};

use super::UpsertOutcome;
use crate::error::IngestError;
use crate::models::monthly_supply::{ActiveModel, Column, Entity, Model};

#[derive(Clone)]
pub struct MonthlySupplyRepository {
    db: DatabaseConnection,
}

impl MonthlySupplyRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn flush_tmp(&self, items: Vec<Model>) -> Result<UpsertOutcome, IngestError> {
        if items.is_empty() {
            return Ok(UpsertOutcome::default());
        }

        let mut seen: HashSet<i64> = HashSet::new();
        let mut unique: Vec<Model> = Vec::new();
        let mut skipped = 0usize;
        for item in items {
            let Some(tmp_id) = item.tmp_abas_mes_id else {
                continue;
            };
            if seen.insert(tmp_id) {
                unique.push(item);
            } else {
                skipped += 1;
            }
        }

        let existing: HashSet<i64> = Entity::find()
            .filter(Column::TmpAbasMesId.is_in(seen.iter().copied().collect::<Vec<_>>()))
            .all(&self.db)
            .await?
            .into_iter()
            .filter_map(|m| m.tmp_abas_mes_id)
            .collect();

        let now = Utc::now();
        let mut to_insert = Vec::new();
        for item in unique {
            match item.tmp_abas_mes_id {
                Some(tmp_id) if existing.contains(&tmp_id) => skipped += 1,
                _ => to_insert.push(to_active(item, now)),
            }
        }

        if to_insert.is_empty() {
            return Ok(UpsertOutcome { inserted: 0, skipped });
        }

        let attempted = to_insert.len();
        let inserted = Entity::insert_many(to_insert)
            .on_conflict(
                OnConflict::column(Column::TmpAbasMesId)
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

    pub async fn flush_fallback(&self, items: Vec<Model>) -> Result<UpsertOutcome, IngestError> {
        if items.is_empty() {
            return Ok(UpsertOutcome::default());
        }

        type Key = (i64, i64, DateTime<Utc>);
        let mut order: Vec<Key> = Vec::new();
        let mut unique: HashMap<Key, Model> = HashMap::new();
        for item in items {
            let key = (item.arti_id, item.fuen_id, item.fecha_mes_ini);
            if unique.insert(key, item).is_none() {
                order.push(key);
            }
        }

        let mut probe = Condition::any();
        for (arti_id, fuen_id, fecha_mes_ini) in &order {
            probe = probe.add(
                Column::ArtiId
                    .eq(*arti_id)
                    .and(Column::FuenId.eq(*fuen_id))
                    .and(Column::FechaMesIni.eq(*fecha_mes_ini)),
            );
        }
        let existing: HashSet<Key> = Entity::find()
            .filter(probe)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| (m.arti_id, m.fuen_id, m.fecha_mes_ini))
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
                OnConflict::columns([Column::ArtiId, Column::FuenId, Column::FechaMesIni])
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

fn to_active(model: Model, now: DateTime<Utc>) -> ActiveModel {
    ActiveModel {
        id: NotSet,
        tmp_abas_mes_id: Set(model.tmp_abas_mes_id),
        arti_id: Set(model.arti_id),
        arti_nombre: Set(model.arti_nombre),
        fuen_id: Set(model.fuen_id),
        fuen_nombre: Set(model.fuen_nombre),
        futi_id: Set(model.futi_id),
        fecha_mes_ini: Set(model.fecha_mes_ini),
        fecha_creacion: Set(model.fecha_creacion),
        cantidad_ton: Set(model.cantidad_ton),
        enviado: Set(model.enviado),
        fecha_ingestion: Set(Some(now)),
        ingestion_run_id: Set(model.ingestion_run_id),
    }
}
