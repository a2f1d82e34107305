//! Migration to create the weekly_wholesale curated table.
//!
//! Dual dedup constraints: the upstream temporary id when present, the
//! (arti_id, fuen_id, fecha_ini) business key otherwise.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WeeklyWholesale::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WeeklyWholesale::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WeeklyWholesale::TmpMayoSemId).big_integer().null())
                    .col(ColumnDef::new(WeeklyWholesale::ArtiId).big_integer().not_null())
                    .col(ColumnDef::new(WeeklyWholesale::ArtiNombre).text().null())
                    .col(ColumnDef::new(WeeklyWholesale::FuenId).big_integer().not_null())
                    .col(ColumnDef::new(WeeklyWholesale::FuenNombre).text().null())
                    .col(ColumnDef::new(WeeklyWholesale::FutiId).big_integer().null())
                    .col(
                        ColumnDef::new(WeeklyWholesale::FechaIni)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WeeklyWholesale::FechaCreacion)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WeeklyWholesale::MinimoKg)
                            .decimal_len(15, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WeeklyWholesale::MaximoKg)
                            .decimal_len(15, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WeeklyWholesale::PromedioKg)
                            .decimal_len(15, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WeeklyWholesale::Enviado)
                            .decimal_len(15, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WeeklyWholesale::LastUpdated)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WeeklyWholesale::IngestionRunId)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_weekly_tmp")
                    .table(WeeklyWholesale::Table)
                    .col(WeeklyWholesale::TmpMayoSemId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_weekly_fallback")
                    .table(WeeklyWholesale::Table)
                    .col(WeeklyWholesale::ArtiId)
                    .col(WeeklyWholesale::FuenId)
                    .col(WeeklyWholesale::FechaIni)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_weekly_fecha_ini")
                    .table(WeeklyWholesale::Table)
                    .col(WeeklyWholesale::FechaIni)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_weekly_run_id")
                    .table(WeeklyWholesale::Table)
                    .col(WeeklyWholesale::IngestionRunId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_weekly_run_id").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_weekly_fecha_ini").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("ux_weekly_fallback").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("ux_weekly_tmp").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WeeklyWholesale::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum WeeklyWholesale {
    Table,
    Id,
    TmpMayoSemId,
    ArtiId,
    ArtiNombre,
    FuenId,
    FuenNombre,
    FutiId,
    FechaIni,
    FechaCreacion,
    MinimoKg,
    MaximoKg,
    PromedioKg,
    Enviado,
    LastUpdated,
    IngestionRunId,
}
