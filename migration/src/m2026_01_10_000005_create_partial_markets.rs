//! Migration to create the partial_markets curated table.
//!
//! Municipality-level market rows deduplicated by a SHA-256 key hash.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PartialMarkets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PartialMarkets::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PartialMarkets::KeyHash).string_len(64).not_null())
                    .col(ColumnDef::new(PartialMarkets::MuniId).text().not_null())
                    .col(ColumnDef::new(PartialMarkets::MuniNombre).text().null())
                    .col(ColumnDef::new(PartialMarkets::DeptNombre).text().null())
                    .col(ColumnDef::new(PartialMarkets::FuenId).big_integer().not_null())
                    .col(ColumnDef::new(PartialMarkets::FuenNombre).text().null())
                    .col(ColumnDef::new(PartialMarkets::FutiId).big_integer().not_null())
                    .col(
                        ColumnDef::new(PartialMarkets::IdArtiSemana)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PartialMarkets::ArtiNombre).text().null())
                    .col(ColumnDef::new(PartialMarkets::GrupNombre).text().null())
                    .col(
                        ColumnDef::new(PartialMarkets::EnmaFecha)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PartialMarkets::PromedioKg)
                            .decimal_len(15, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PartialMarkets::MaximoKg)
                            .decimal_len(15, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PartialMarkets::MinimoKg)
                            .decimal_len(15, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PartialMarkets::LastUpdated)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PartialMarkets::IngestionRunId)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_partial_markets_hash")
                    .table(PartialMarkets::Table)
                    .col(PartialMarkets::KeyHash)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_partial_markets_enma_fecha")
                    .table(PartialMarkets::Table)
                    .col(PartialMarkets::EnmaFecha)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_partial_markets_run_id")
                    .table(PartialMarkets::Table)
                    .col(PartialMarkets::IngestionRunId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_partial_markets_run_id").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_partial_markets_enma_fecha").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("ux_partial_markets_hash").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PartialMarkets::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PartialMarkets {
    Table,
    Id,
    KeyHash,
    MuniId,
    MuniNombre,
    DeptNombre,
    FuenId,
    FuenNombre,
    FutiId,
    IdArtiSemana,
    ArtiNombre,
    GrupNombre,
    EnmaFecha,
    PromedioKg,
    MaximoKg,
    MinimoKg,
    LastUpdated,
    IngestionRunId,
}
