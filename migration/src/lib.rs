//! Database migrations for the SIPSA ingestion service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2026_01_10_000001_create_ingestion_runs;
mod m2026_01_10_000002_create_ingestion_audit;
mod m2026_01_10_000003_create_ingestion_rejects;
mod m2026_01_10_000004_create_city_prices;
mod m2026_01_10_000005_create_partial_markets;
mod m2026_01_10_000006_create_weekly_wholesale;
mod m2026_01_10_000007_create_monthly_wholesale;
mod m2026_01_10_000008_create_monthly_supply;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_01_10_000001_create_ingestion_runs::Migration),
            Box::new(m2026_01_10_000002_create_ingestion_audit::Migration),
            Box::new(m2026_01_10_000003_create_ingestion_rejects::Migration),
            Box::new(m2026_01_10_000004_create_city_prices::Migration),
            Box::new(m2026_01_10_000005_create_partial_markets::Migration),
            Box::new(m2026_01_10_000006_create_weekly_wholesale::Migration),
            Box::new(m2026_01_10_000007_create_monthly_wholesale::Migration),
            Box::new(m2026_01_10_000008_create_monthly_supply::Migration),
        ]
    }
}
