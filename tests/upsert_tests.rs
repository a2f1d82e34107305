//! Integration tests for the curated upsert stores: skip-on-conflict,
//! in-batch dedup, and the dual tmp/fallback strategies.

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::EntityTrait;
use std::str::FromStr;

use sipsa_ingest::models::{city_price, monthly_supply, weekly_wholesale};
use sipsa_ingest::repositories::{
    CityPriceRepository, MonthlySupplyRepository, WeeklyWholesaleRepository,
};

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::setup_test_db;

fn city_row(reg_id: i64, cod_producto: i64, producto: &str) -> city_price::Model {
    city_price::Model {
        id: 0,
        reg_id,
        ciudad: Some("Bogota".to_string()),
        cod_producto,
        producto: Some(producto.to_string()),
        fecha_captura: Utc.with_ymd_and_hms(2026, 1, 2, 19, 25, 0).unwrap(),
        fecha_creacion: None,
        precio_promedio: Decimal::from_str("2350.50").ok(),
        enviado: None,
        fecha_ingestion: None,
        ingestion_run_id: 1,
    }
}

fn weekly_row(tmp_id: Option<i64>, arti_id: i64, fuen_id: i64) -> weekly_wholesale::Model {
    weekly_wholesale::Model {
        id: 0,
        tmp_mayo_sem_id: tmp_id,
        arti_id,
        arti_nombre: Some("Cebolla".to_string()),
        fuen_id,
        fuen_nombre: Some("Corabastos".to_string()),
        futi_id: Some(1),
        fecha_ini: Utc.with_ymd_and_hms(2026, 1, 5, 5, 0, 0).unwrap(),
        fecha_creacion: None,
        minimo_kg: None,
        maximo_kg: None,
        promedio_kg: Decimal::from_str("980.00").ok(),
        enviado: None,
        last_updated: None,
        ingestion_run_id: 1,
    }
}

fn supply_row(tmp_id: Option<i64>, arti_id: i64, fuen_id: i64) -> monthly_supply::Model {
    monthly_supply::Model {
        id: 0,
        tmp_abas_mes_id: tmp_id,
        arti_id,
        arti_nombre: Some("Papa".to_string()),
        fuen_id,
        fuen_nombre: Some("Cenabastos".to_string()),
        futi_id: Some(3),
        fecha_mes_ini: Utc.with_ymd_and_hms(2026, 1, 1, 5, 0, 0).unwrap(),
        fecha_creacion: None,
        cantidad_ton: Decimal::from_str("152.30").ok(),
        enviado: None,
        fecha_ingestion: None,
        ingestion_run_id: 1,
    }
}

#[tokio::test]
async fn second_application_of_a_batch_inserts_nothing() {
    let db = setup_test_db().await;
    let repo = CityPriceRepository::new(db.clone());

    let batch = vec![city_row(1, 10, "Papa"), city_row(2, 10, "Yuca")];
    let first = repo.flush(batch.clone()).await.unwrap();
    assert_eq!(first.inserted, 2);
    assert_eq!(first.skipped, 0);

    let second = repo.flush(batch).await.unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped, 2);

    let rows = city_price::Entity::find().all(&db).await.unwrap();
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn in_batch_duplicates_keep_the_last_occurrence() {
    let db = setup_test_db().await;
    let repo = CityPriceRepository::new(db.clone());

    let outcome = repo
        .flush(vec![
            city_row(1, 10, "first value"),
            city_row(1, 10, "last value"),
        ])
        .await
        .unwrap();
    assert_eq!(outcome.inserted, 1);
    assert_eq!(outcome.skipped, 0);

    let rows = city_price::Entity::find().all(&db).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].producto.as_deref(), Some("last value"));
}

#[tokio::test]
async fn flush_stamps_ingestion_timestamp() {
    let db = setup_test_db().await;
    let repo = CityPriceRepository::new(db.clone());

    let before = Utc::now();
    repo.flush(vec![city_row(7, 70, "Papa")]).await.unwrap();

    let rows = city_price::Entity::find().all(&db).await.unwrap();
    let stamped = rows[0].fecha_ingestion.expect("stamped at flush time");
    assert!(stamped >= before);
}

#[tokio::test]
async fn empty_batch_is_a_no_op() {
    let db = setup_test_db().await;
    let repo = CityPriceRepository::new(db.clone());

    let outcome = repo.flush(Vec::new()).await.unwrap();
    assert_eq!(outcome.inserted, 0);
    assert_eq!(outcome.skipped, 0);
}

#[tokio::test]
async fn weekly_tmp_branch_keeps_first_occurrence_and_skips_existing() {
    let db = setup_test_db().await;
    let repo = WeeklyWholesaleRepository::new(db.clone());

    let first = repo
        .flush_tmp(vec![
            weekly_row(Some(100), 1, 40),
            weekly_row(Some(100), 2, 41),
            weekly_row(Some(200), 3, 42),
        ])
        .await
        .unwrap();
    assert_eq!(first.inserted, 2);
    assert_eq!(first.skipped, 1);

    let again = repo.flush_tmp(vec![weekly_row(Some(200), 3, 42)]).await.unwrap();
    assert_eq!(again.inserted, 0);
    assert_eq!(again.skipped, 1);

    let rows = weekly_wholesale::Entity::find().all(&db).await.unwrap();
    assert_eq!(rows.len(), 2);
    // First occurrence of tmp id 100 won.
    let kept = rows
        .iter()
        .find(|r| r.tmp_mayo_sem_id == Some(100))
        .expect("tmp 100 present");
    assert_eq!(kept.arti_id, 1);
}

#[tokio::test]
async fn weekly_fallback_branch_dedups_on_business_key() {
    let db = setup_test_db().await;
    let repo = WeeklyWholesaleRepository::new(db.clone());

    let first = repo
        .flush_fallback(vec![weekly_row(None, 5, 40), weekly_row(None, 6, 40)])
        .await
        .unwrap();
    assert_eq!(first.inserted, 2);

    let second = repo
        .flush_fallback(vec![weekly_row(None, 5, 40), weekly_row(None, 7, 40)])
        .await
        .unwrap();
    assert_eq!(second.inserted, 1);
    assert_eq!(second.skipped, 1);

    let rows = weekly_wholesale::Entity::find().all(&db).await.unwrap();
    assert_eq!(rows.len(), 3);
}

#[tokio::test]
async fn supply_branches_are_independent() {
    let db = setup_test_db().await;
    let repo = MonthlySupplyRepository::new(db.clone());

    let tmp = repo
        .flush_tmp(vec![supply_row(Some(900), 1, 40)])
        .await
        .unwrap();
    assert_eq!(tmp.inserted, 1);

    let fallback = repo
        .flush_fallback(vec![supply_row(None, 2, 40), supply_row(None, 2, 40)])
        .await
        .unwrap();
    assert_eq!(fallback.inserted, 1);
    assert_eq!(fallback.skipped, 1);

    let rows = monthly_supply::Entity::find().all(&db).await.unwrap();
    assert_eq!(rows.len(), 2);
}
