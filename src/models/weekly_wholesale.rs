//! WeeklyWholesale entity model
//!
//! Weekly wholesale market prices from `promediosSipsaSemanaMadr`.
//! Dedup is dual-strategy: tmp_mayo_sem_id when present, otherwise the
//! (arti_id, fuen_id, fecha_ini) business key.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "weekly_wholesale")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Usually null from SOAP
    pub tmp_mayo_sem_id: Option<i64>,

    pub arti_id: i64,

    pub arti_nombre: Option<String>,

    pub fuen_id: i64,

    pub fuen_nombre: Option<String>,

    pub futi_id: Option<i64>,

    pub fecha_ini: DateTimeUtc,

    pub fecha_creacion: Option<DateTimeUtc>,

    pub minimo_kg: Option<Decimal>,

    pub maximo_kg: Option<Decimal>,

    pub promedio_kg: Option<Decimal>,

    pub enviado: Option<Decimal>,

    pub last_updated: Option<DateTimeUtc>,

    pub ingestion_run_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
