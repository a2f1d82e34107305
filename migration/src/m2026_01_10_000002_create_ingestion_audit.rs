//! Migration to create the append-only ingestion_audit table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(IngestionAudit::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IngestionAudit::AuditId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(IngestionAudit::RunId).big_integer().null())
                    .col(ColumnDef::new(IngestionAudit::RequestId).string_len(100).null())
                    .col(
                        ColumnDef::new(IngestionAudit::RequestSource)
                            .string_len(20)
                            .not_null()
                            .default("MANUAL"),
                    )
                    .col(
                        ColumnDef::new(IngestionAudit::EventType)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(ColumnDef::new(IngestionAudit::Message).text().null())
                    .col(
                        ColumnDef::new(IngestionAudit::OccurredAt)
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
                    .name("idx_ingestion_audit_request_id")
                    .table(IngestionAudit::Table)
                    .col(IngestionAudit::RequestId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ingestion_audit_run_id")
                    .table(IngestionAudit::Table)
                    .col(IngestionAudit::RunId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ingestion_audit_occurred_at")
                    .table(IngestionAudit::Table)
                    .col(IngestionAudit::OccurredAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_ingestion_audit_occurred_at").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_ingestion_audit_run_id").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_ingestion_audit_request_id").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(IngestionAudit::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum IngestionAudit {
    Table,
    AuditId,
    RunId,
    RequestId,
    RequestSource,
    EventType,
    Message,
    OccurredAt,
}
