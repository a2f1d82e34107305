//! Migration to create the monthly_supply curated table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MonthlySupply::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MonthlySupply::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MonthlySupply::TmpAbasMesId).big_integer().null())
                    .col(ColumnDef::new(MonthlySupply::ArtiId).big_integer().not_null())
                    .col(ColumnDef::new(MonthlySupply::ArtiNombre).text().null())
                    .col(ColumnDef::new(MonthlySupply::FuenId).big_integer().not_null())
                    .col(ColumnDef::new(MonthlySupply::FuenNombre).text().null())
                    .col(ColumnDef::new(MonthlySupply::FutiId).big_integer().null())
                    .col(
                        ColumnDef::new(MonthlySupply::FechaMesIni)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MonthlySupply::FechaCreacion)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(MonthlySupply::CantidadTon)
                            .decimal_len(19, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(MonthlySupply::Enviado)
                            .decimal_len(19, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(MonthlySupply::FechaIngestion)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(MonthlySupply::IngestionRunId)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_supply_tmp")
                    .table(MonthlySupply::Table)
                    .col(MonthlySupply::TmpAbasMesId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_supply_fallback")
                    .table(MonthlySupply::Table)
                    .col(MonthlySupply::ArtiId)
                    .col(MonthlySupply::FuenId)
                    .col(MonthlySupply::FechaMesIni)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_supply_fecha_mes_ini")
                    .table(MonthlySupply::Table)
                    .col(MonthlySupply::FechaMesIni)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_supply_run_id")
                    .table(MonthlySupply::Table)
                    .col(MonthlySupply::IngestionRunId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_supply_run_id").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_supply_fecha_mes_ini").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("ux_supply_fallback").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("ux_supply_tmp").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MonthlySupply::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MonthlySupply {
    Table,
    Id,
    TmpAbasMesId,
    ArtiId,
    ArtiNombre,
    FuenId,
    FuenNombre,
    FutiId,
    FechaMesIni,
    FechaCreacion,
    CantidadTon,
    Enviado,
    FechaIngestion,
    IngestionRunId,
}
