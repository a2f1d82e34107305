//! MonthlySupply entity model
//!
//! Monthly supply volumes (tons) delivered to wholesale markets, from
//! `promedioAbasSipsaMesMadr`. Dual-strategy dedup on tmp_abas_mes_id /
//! (arti_id, fuen_id, fecha_mes_ini).

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "monthly_supply")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub tmp_abas_mes_id: Option<i64>,

    pub arti_id: i64,

    pub arti_nombre: Option<String>,

    pub fuen_id: i64,

    pub fuen_nombre: Option<String>,

    pub futi_id: Option<i64>,

    pub fecha_mes_ini: DateTimeUtc,

    pub fecha_creacion: Option<DateTimeUtc>,

    pub cantidad_ton: Option<Decimal>,

    pub enviado: Option<Decimal>,

    pub fecha_ingestion: Option<DateTimeUtc>,

    pub ingestion_run_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
