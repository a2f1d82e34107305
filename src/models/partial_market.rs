//! PartialMarket entity model
//!
//! Municipality-level market rows from `promediosSipsaParcial`. The dedup
//! key is a SHA-256 over the business fields, including the raw survey-date
//! text exactly as it appeared on the wire.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "partial_markets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// 64-char hex SHA-256 of the business key fields
    pub key_hash: String,

    pub muni_id: String,

    pub muni_nombre: Option<String>,

    pub dept_nombre: Option<String>,

    pub fuen_id: i64,

    pub fuen_nombre: Option<String>,

    pub futi_id: i64,

    pub id_arti_semana: i64,

    pub arti_nombre: Option<String>,

    pub grup_nombre: Option<String>,

    /// Survey date materialized from the raw text, when it parses
    pub enma_fecha: Option<DateTimeUtc>,

    pub promedio_kg: Option<Decimal>,

    pub maximo_kg: Option<Decimal>,

    pub minimo_kg: Option<Decimal>,

    pub last_updated: Option<DateTimeUtc>,

    pub ingestion_run_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
