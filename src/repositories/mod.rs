//! # Repository Layer
//!
//! Repositories encapsulating SeaORM operations for the control tables
//! (runs, audit, rejects) and the five curated upsert stores.

pub mod audit;
pub mod city_price;
pub mod monthly_supply;
pub mod monthly_wholesale;
pub mod partial_market;
pub mod reject;
pub mod run;
pub mod weekly_wholesale;

pub use audit::{AuditEvent, AuditRepository};
pub use city_price::CityPriceRepository;
pub use monthly_supply::MonthlySupplyRepository;
pub use monthly_wholesale::MonthlyWholesaleRepository;
pub use partial_market::PartialMarketRepository;
pub use reject::RejectRepository;
pub use run::{CreateRunRequest, RunRepository};
pub use weekly_wholesale::WeeklyWholesaleRepository;

/// Insert/skip metrics returned by every curated batch flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// Rows actually written
    pub inserted: usize,
    /// Rows dropped because their dedup key already existed
    pub skipped: usize,
}
