//! Migration to create the city_prices curated table.
//!
//! City-level daily pricing rows, deduplicated on (reg_id, cod_producto).

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CityPrices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CityPrices::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CityPrices::RegId).big_integer().not_null())
                    .col(ColumnDef::new(CityPrices::Ciudad).text().null())
                    .col(ColumnDef::new(CityPrices::CodProducto).big_integer().not_null())
                    .col(ColumnDef::new(CityPrices::Producto).text().null())
                    .col(
                        ColumnDef::new(CityPrices::FechaCaptura)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CityPrices::FechaCreacion)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CityPrices::PrecioPromedio)
                            .decimal_len(15, 2)
                            .null(),
                    )
                    .col(ColumnDef::new(CityPrices::Enviado).decimal_len(15, 2).null())
                    .col(
                        ColumnDef::new(CityPrices::FechaIngestion)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CityPrices::IngestionRunId)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_city_prices_business")
                    .table(CityPrices::Table)
                    .col(CityPrices::RegId)
                    .col(CityPrices::CodProducto)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_city_prices_fecha_captura")
                    .table(CityPrices::Table)
                    .col(CityPrices::FechaCaptura)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_city_prices_run_id")
                    .table(CityPrices::Table)
                    .col(CityPrices::IngestionRunId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_city_prices_run_id").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_city_prices_fecha_captura").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("ux_city_prices_business").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CityPrices::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CityPrices {
    Table,
    Id,
    RegId,
    Ciudad,
    CodProducto,
    Producto,
    FechaCaptura,
    FechaCreacion,
    PrecioPromedio,
    Enviado,
    FechaIngestion,
    IngestionRunId,
}
