//! Per-method ingestion handlers.
//!
//! One handler per SOAP method, each owning its parser type, validation
//! rules, and upsert routing. Handlers are registered in the
//! [`MethodRegistry`] at startup.

pub mod city;
pub mod monthly;
pub mod partial;
pub mod supply;
pub mod weekly;

use sea_orm::DatabaseConnection;
use std::fmt::Display;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::ingestion::registry::MethodRegistry;
use crate::repositories::{
    CityPriceRepository, MonthlySupplyRepository, MonthlyWholesaleRepository,
    PartialMarketRepository, WeeklyWholesaleRepository,
};
use crate::soap::SoapSource;

pub const CITY_METHOD: &str = "promediosSipsaCiudad";
pub const PARTIAL_METHOD: &str = "promediosSipsaParcial";
pub const WEEKLY_METHOD: &str = "promediosSipsaSemanaMadr";
pub const MONTHLY_METHOD: &str = "promediosSipsaMesMadr";
pub const SUPPLY_METHOD: &str = "promedioAbasSipsaMesMadr";

/// Registers the five production method handlers.
pub fn build_registry(
    db: &DatabaseConnection,
    source: Arc<dyn SoapSource>,
    config: &AppConfig,
) -> MethodRegistry {
    let batch_size = config.ingestion.batch_size;
    let max_children = config.soap.max_child_elements;

    let mut registry = MethodRegistry::new();
    registry.register(Arc::new(city::CityHandler::new(
        source.clone(),
        CityPriceRepository::new(db.clone()),
        batch_size,
        max_children,
    )));
    registry.register(Arc::new(partial::PartialHandler::new(
        source.clone(),
        PartialMarketRepository::new(db.clone()),
        batch_size,
        max_children,
    )));
    registry.register(Arc::new(weekly::WeeklyHandler::new(
        source.clone(),
        WeeklyWholesaleRepository::new(db.clone()),
        batch_size,
        max_children,
    )));
    registry.register(Arc::new(monthly::MonthlyHandler::new(
        source.clone(),
        MonthlyWholesaleRepository::new(db.clone()),
        batch_size,
        max_children,
    )));
    registry.register(Arc::new(supply::SupplyHandler::new(
        source,
        MonthlySupplyRepository::new(db.clone()),
        batch_size,
        max_children,
    )));
    registry
}

/// Renders an optional field for reject raw dumps.
pub(crate) fn display_opt<T: Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "null".to_string(),
    }
}

/// Builds the `Missing: ...` reject reason from (name, present) pairs.
pub(crate) fn missing_reason(fields: &[(&str, bool)]) -> String {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| *name)
        .collect();
    format!("Missing: {}", missing.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_reason_lists_only_absent_fields() {
        let reason = missing_reason(&[("artiId", false), ("fuenId", true), ("fechaIni", false)]);
        assert_eq!(reason, "Missing: artiId fechaIni");
    }

    #[test]
    fn display_opt_renders_null() {
        assert_eq!(display_opt(&Some(7)), "7");
        assert_eq!(display_opt::<i64>(&None), "null");
    }
}
