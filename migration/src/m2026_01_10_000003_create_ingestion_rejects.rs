//! Migration to create the ingestion_rejects table.
//!
//! One row per rejected input record, flushed at run finalization.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(IngestionRejects::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IngestionRejects::RejectId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(IngestionRejects::RunId).big_integer().not_null())
                    .col(ColumnDef::new(IngestionRejects::RawData).text().null())
                    .col(ColumnDef::new(IngestionRejects::Reason).text().null())
                    .col(
                        ColumnDef::new(IngestionRejects::IsParseError)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(IngestionRejects::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ingestion_rejects_run_id")
                    .table(IngestionRejects::Table)
                    .col(IngestionRejects::RunId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_ingestion_rejects_run_id").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(IngestionRejects::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum IngestionRejects {
    Table,
    RejectId,
    RunId,
    RawData,
    Reason,
    IsParseError,
    CreatedAt,
}
