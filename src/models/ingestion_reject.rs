//! IngestionReject entity model
//!
//! One row per input record excluded by validation or parsing, flushed in
//! bulk at run finalization.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ingestion_rejects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub reject_id: i64,

    pub run_id: i64,

    /// Offending fields captured as text
    pub raw_data: Option<String>,

    pub reason: Option<String>,

    pub is_parse_error: bool,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
