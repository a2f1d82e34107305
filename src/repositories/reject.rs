//! # Reject Repository
//!
//! Persists rejected input records, one row per rejection, flushed at run
//! finalization.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter, Set};

use crate::error::IngestError;
use crate::models::ingestion_reject::{ActiveModel, Column, Entity, Model};

#[derive(Clone)]
pub struct RejectRepository {
    db: DatabaseConnection,
}

impl RejectRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn append(
        &self,
        run_id: i64,
        raw_data: &str,
        reason: &str,
        is_parse_error: bool,
    ) -> Result<(), IngestError> {
        let row = ActiveModel {
            reject_id: NotSet,
            run_id: Set(run_id),
            raw_data: Set(Some(raw_data.to_string())),
            reason: Set(Some(reason.to_string())),
            is_parse_error: Set(is_parse_error),
            created_at: Set(Utc::now()),
        };
        row.insert(&self.db).await?;
        Ok(())
    }

    pub async fn for_run(&self, run_id: i64) -> Result<Vec<Model>, IngestError> {
        Ok(Entity::find()
            .filter(Column::RunId.eq(run_id))
            .all(&self.db)
            .await?)
    }
}
