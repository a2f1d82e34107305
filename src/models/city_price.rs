//! CityPrice entity model
//!
//! Daily city-level average prices per product, pulled from the
//! `promediosSipsaCiudad` SOAP method. Deduplicated on the business key
//! (reg_id, cod_producto).

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "city_prices")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub reg_id: i64,

    pub ciudad: Option<String>,

    pub cod_producto: i64,

    pub producto: Option<String>,

    pub fecha_captura: DateTimeUtc,

    pub fecha_creacion: Option<DateTimeUtc>,

    pub precio_promedio: Option<Decimal>,

    pub enviado: Option<Decimal>,

    /// Stamped at flush time, not record time
    pub fecha_ingestion: Option<DateTimeUtc>,

    pub ingestion_run_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
