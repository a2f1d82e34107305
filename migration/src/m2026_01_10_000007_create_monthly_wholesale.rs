//! Migration to create the monthly_wholesale curated table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MonthlyWholesale::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MonthlyWholesale::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MonthlyWholesale::TmpMayoMesId).big_integer().null())
                    .col(ColumnDef::new(MonthlyWholesale::ArtiId).big_integer().not_null())
                    .col(ColumnDef::new(MonthlyWholesale::ArtiNombre).text().null())
                    .col(ColumnDef::new(MonthlyWholesale::FuenId).big_integer().not_null())
                    .col(ColumnDef::new(MonthlyWholesale::FuenNombre).text().null())
                    .col(ColumnDef::new(MonthlyWholesale::FutiId).big_integer().null())
                    .col(
                        ColumnDef::new(MonthlyWholesale::FechaMesIni)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MonthlyWholesale::FechaCreacion)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(MonthlyWholesale::MinimoKg)
                            .decimal_len(19, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(MonthlyWholesale::MaximoKg)
                            .decimal_len(19, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(MonthlyWholesale::PromedioKg)
                            .decimal_len(19, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(MonthlyWholesale::Enviado)
                            .decimal_len(19, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(MonthlyWholesale::LastUpdated)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(MonthlyWholesale::IngestionRunId)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_monthly_tmp")
                    .table(MonthlyWholesale::Table)
                    .col(MonthlyWholesale::TmpMayoMesId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_monthly_fallback")
                    .table(MonthlyWholesale::Table)
                    .col(MonthlyWholesale::ArtiId)
                    .col(MonthlyWholesale::FuenId)
                    .col(MonthlyWholesale::FechaMesIni)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_monthly_fecha_mes_ini")
                    .table(MonthlyWholesale::Table)
                    .col(MonthlyWholesale::FechaMesIni)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_monthly_run_id")
                    .table(MonthlyWholesale::Table)
                    .col(MonthlyWholesale::IngestionRunId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_monthly_run_id").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_monthly_fecha_mes_ini").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("ux_monthly_fallback").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("ux_monthly_tmp").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MonthlyWholesale::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MonthlyWholesale {
    Table,
    Id,
    TmpMayoMesId,
    ArtiId,
    ArtiNombre,
    FuenId,
    FuenNombre,
    FutiId,
    FechaMesIni,
    FechaCreacion,
    MinimoKg,
    MaximoKg,
    PromedioKg,
    Enviado,
    LastUpdated,
    IngestionRunId,
}
