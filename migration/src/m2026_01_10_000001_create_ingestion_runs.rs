//! Migration to create the ingestion_runs table.
//!
//! One row per execution attempt, unique per (method_name, window_key) so
//! that retries within the same window collide instead of duplicating work.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(IngestionRuns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IngestionRuns::RunId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(IngestionRuns::MethodName).text().not_null())
                    .col(ColumnDef::new(IngestionRuns::WindowKey).text().not_null())
                    .col(ColumnDef::new(IngestionRuns::RequestId).string_len(100).null())
                    .col(
                        ColumnDef::new(IngestionRuns::RequestSource)
                            .string_len(20)
                            .not_null()
                            .default("MANUAL"),
                    )
                    .col(ColumnDef::new(IngestionRuns::Status).text().not_null())
                    .col(
                        ColumnDef::new(IngestionRuns::StartTime)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(IngestionRuns::EndTime)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(IngestionRuns::RecordsSeen)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(IngestionRuns::RecordsInserted)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(IngestionRuns::RecordsUpdated)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(IngestionRuns::RejectCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(IngestionRuns::LastErrorMessage).text().null())
                    .col(ColumnDef::new(IngestionRuns::HttpStatus).integer().null())
                    .col(ColumnDef::new(IngestionRuns::SoapFaultCode).text().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_ingestion_runs_window")
                    .table(IngestionRuns::Table)
                    .col(IngestionRuns::MethodName)
                    .col(IngestionRuns::WindowKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ingestion_runs_status")
                    .table(IngestionRuns::Table)
                    .col(IngestionRuns::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_ingestion_runs_status").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uq_ingestion_runs_window").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(IngestionRuns::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum IngestionRuns {
    Table,
    RunId,
    MethodName,
    WindowKey,
    RequestId,
    RequestSource,
    Status,
    StartTime,
    EndTime,
    RecordsSeen,
    RecordsInserted,
    RecordsUpdated,
    RejectCount,
    LastErrorMessage,
    HttpStatus,
    SoapFaultCode,
}
