//! # Curated Read Handlers
//!
//! Paginated, filterable views over the five curated tables. Date filters
//! are interpreted as full local-zone days converted to UTC instants;
//! the end date is inclusive via a half-open `< end + 1 day` comparison.
//! Page numbering is 1-based externally.

use axum::extract::{OriginalUri, Query, State};
use axum::http::{StatusCode, Uri};
use axum::Json;
use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult, PaginatorTrait,
    QueryFilter, QueryOrder, Select,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::models::{
    city_price, monthly_supply, monthly_wholesale, partial_market, weekly_wholesale,
};
use crate::server::AppState;

const DEFAULT_PAGE_SIZE: u64 = 50;
const MAX_PAGE_SIZE: u64 = 500;

fn default_page() -> u64 {
    1
}

fn default_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

/// Paginated response envelope shared by all curated endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub count: u64,
    pub next: Option<String>,
    pub prev: Option<String>,
    pub pages: u64,
    pub results: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityQuery {
    pub fecha: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub reg_id: Option<i64>,
    pub cod_producto: Option<i64>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_size")]
    pub size: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialQuery {
    pub fecha: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub muni_id: Option<String>,
    pub fuen_id: Option<i64>,
    pub id_arti_semana: Option<i64>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_size")]
    pub size: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WholesaleQuery {
    pub fecha: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub arti_id: Option<i64>,
    pub fuen_id: Option<i64>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_size")]
    pub size: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CityPriceDto {
    pub id: i64,
    pub reg_id: i64,
    pub ciudad: Option<String>,
    pub cod_producto: i64,
    pub producto: Option<String>,
    pub fecha_captura: DateTime<Utc>,
    pub fecha_creacion: Option<DateTime<Utc>>,
    pub precio_promedio: Option<Decimal>,
    pub enviado: Option<Decimal>,
    pub fecha_ingestion: Option<DateTime<Utc>>,
    pub ingestion_run_id: i64,
}

impl From<city_price::Model> for CityPriceDto {
    fn from(m: city_price::Model) -> Self {
        Self {
            id: m.id,
            reg_id: m.reg_id,
            ciudad: m.ciudad,
            cod_producto: m.cod_producto,
            producto: m.producto,
            fecha_captura: m.fecha_captura,
            fecha_creacion: m.fecha_creacion,
            precio_promedio: m.precio_promedio,
            enviado: m.enviado,
            fecha_ingestion: m.fecha_ingestion,
            ingestion_run_id: m.ingestion_run_id,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartialMarketDto {
    pub id: i64,
    pub muni_id: String,
    pub muni_nombre: Option<String>,
    pub dept_nombre: Option<String>,
    pub fuen_id: i64,
    pub fuen_nombre: Option<String>,
    pub futi_id: i64,
    pub id_arti_semana: i64,
    pub arti_nombre: Option<String>,
    pub grup_nombre: Option<String>,
    pub enma_fecha: Option<DateTime<Utc>>,
    pub promedio_kg: Option<Decimal>,
    pub maximo_kg: Option<Decimal>,
    pub minimo_kg: Option<Decimal>,
    pub last_updated: Option<DateTime<Utc>>,
    pub ingestion_run_id: i64,
}

impl From<partial_market::Model> for PartialMarketDto {
    fn from(m: partial_market::Model) -> Self {
        Self {
            id: m.id,
            muni_id: m.muni_id,
            muni_nombre: m.muni_nombre,
            dept_nombre: m.dept_nombre,
            fuen_id: m.fuen_id,
            fuen_nombre: m.fuen_nombre,
            futi_id: m.futi_id,
            id_arti_semana: m.id_arti_semana,
            arti_nombre: m.arti_nombre,
            grup_nombre: m.grup_nombre,
            enma_fecha: m.enma_fecha,
            promedio_kg: m.promedio_kg,
            maximo_kg: m.maximo_kg,
            minimo_kg: m.minimo_kg,
            last_updated: m.last_updated,
            ingestion_run_id: m.ingestion_run_id,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyWholesaleDto {
    pub id: i64,
    pub tmp_mayo_sem_id: Option<i64>,
    pub arti_id: i64,
    pub arti_nombre: Option<String>,
    pub fuen_id: i64,
    pub fuen_nombre: Option<String>,
    pub futi_id: Option<i64>,
    pub fecha_ini: DateTime<Utc>,
    pub fecha_creacion: Option<DateTime<Utc>>,
    pub minimo_kg: Option<Decimal>,
    pub maximo_kg: Option<Decimal>,
    pub promedio_kg: Option<Decimal>,
    pub enviado: Option<Decimal>,
    pub last_updated: Option<DateTime<Utc>>,
    pub ingestion_run_id: i64,
}

impl From<weekly_wholesale::Model> for WeeklyWholesaleDto {
    fn from(m: weekly_wholesale::Model) -> Self {
        Self {
            id: m.id,
            tmp_mayo_sem_id: m.tmp_mayo_sem_id,
            arti_id: m.arti_id,
            arti_nombre: m.arti_nombre,
            fuen_id: m.fuen_id,
            fuen_nombre: m.fuen_nombre,
            futi_id: m.futi_id,
            fecha_ini: m.fecha_ini,
            fecha_creacion: m.fecha_creacion,
            minimo_kg: m.minimo_kg,
            maximo_kg: m.maximo_kg,
            promedio_kg: m.promedio_kg,
            enviado: m.enviado,
            last_updated: m.last_updated,
            ingestion_run_id: m.ingestion_run_id,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyWholesaleDto {
    pub id: i64,
    pub tmp_mayo_mes_id: Option<i64>,
    pub arti_id: i64,
    pub arti_nombre: Option<String>,
    pub fuen_id: i64,
    pub fuen_nombre: Option<String>,
    pub futi_id: Option<i64>,
    pub fecha_mes_ini: DateTime<Utc>,
    pub fecha_creacion: Option<DateTime<Utc>>,
    pub minimo_kg: Option<Decimal>,
    pub maximo_kg: Option<Decimal>,
    pub promedio_kg: Option<Decimal>,
    pub enviado: Option<Decimal>,
    pub last_updated: Option<DateTime<Utc>>,
    pub ingestion_run_id: i64,
}

impl From<monthly_wholesale::Model> for MonthlyWholesaleDto {
    fn from(m: monthly_wholesale::Model) -> Self {
        Self {
            id: m.id,
            tmp_mayo_mes_id: m.tmp_mayo_mes_id,
            arti_id: m.arti_id,
            arti_nombre: m.arti_nombre,
            fuen_id: m.fuen_id,
            fuen_nombre: m.fuen_nombre,
            futi_id: m.futi_id,
            fecha_mes_ini: m.fecha_mes_ini,
            fecha_creacion: m.fecha_creacion,
            minimo_kg: m.minimo_kg,
            maximo_kg: m.maximo_kg,
            promedio_kg: m.promedio_kg,
            enviado: m.enviado,
            last_updated: m.last_updated,
            ingestion_run_id: m.ingestion_run_id,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySupplyDto {
    pub id: i64,
    pub tmp_abas_mes_id: Option<i64>,
    pub arti_id: i64,
    pub arti_nombre: Option<String>,
    pub fuen_id: i64,
    pub fuen_nombre: Option<String>,
    pub futi_id: Option<i64>,
    pub fecha_mes_ini: DateTime<Utc>,
    pub fecha_creacion: Option<DateTime<Utc>>,
    pub cantidad_ton: Option<Decimal>,
    pub enviado: Option<Decimal>,
    pub fecha_ingestion: Option<DateTime<Utc>>,
    pub ingestion_run_id: i64,
}

impl From<monthly_supply::Model> for MonthlySupplyDto {
    fn from(m: monthly_supply::Model) -> Self {
        Self {
            id: m.id,
            tmp_abas_mes_id: m.tmp_abas_mes_id,
            arti_id: m.arti_id,
            arti_nombre: m.arti_nombre,
            fuen_id: m.fuen_id,
            fuen_nombre: m.fuen_nombre,
            futi_id: m.futi_id,
            fecha_mes_ini: m.fecha_mes_ini,
            fecha_creacion: m.fecha_creacion,
            cantidad_ton: m.cantidad_ton,
            enviado: m.enviado,
            fecha_ingestion: m.fecha_ingestion,
            ingestion_run_id: m.ingestion_run_id,
        }
    }
}

/// City-level pricing rows.
#[utoipa::path(
    get,
    path = "/api/v1/city",
    responses((status = 200, description = "Paginated city prices", body = ApiResponse<CityPriceDto>)),
    tag = "records"
)]
pub async fn list_city(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<CityQuery>,
) -> Result<Json<ApiResponse<CityPriceDto>>, ApiError> {
    let zone = zone_of(&state)?;
    let mut condition = date_filter(
        city_price::Column::FechaCaptura,
        zone,
        query.fecha,
        query.start_date,
        query.end_date,
    )?;
    if let Some(reg_id) = query.reg_id {
        condition = condition.add(city_price::Column::RegId.eq(reg_id));
    }
    if let Some(cod_producto) = query.cod_producto {
        condition = condition.add(city_price::Column::CodProducto.eq(cod_producto));
    }

    let select = city_price::Entity::find()
        .filter(condition)
        .order_by_asc(city_price::Column::Id);
    paginate(&state.db, select, &uri, query.page, query.size)
        .await
        .map(Json)
}

/// Municipality-level partial market rows.
#[utoipa::path(
    get,
    path = "/api/v1/partial",
    responses((status = 200, description = "Paginated partial market rows", body = ApiResponse<PartialMarketDto>)),
    tag = "records"
)]
pub async fn list_partial(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<PartialQuery>,
) -> Result<Json<ApiResponse<PartialMarketDto>>, ApiError> {
    let zone = zone_of(&state)?;
    let mut condition = date_filter(
        partial_market::Column::EnmaFecha,
        zone,
        query.fecha,
        query.start_date,
        query.end_date,
    )?;
    if let Some(muni_id) = query.muni_id {
        condition = condition.add(partial_market::Column::MuniId.eq(muni_id));
    }
    if let Some(fuen_id) = query.fuen_id {
        condition = condition.add(partial_market::Column::FuenId.eq(fuen_id));
    }
    if let Some(id_arti_semana) = query.id_arti_semana {
        condition = condition.add(partial_market::Column::IdArtiSemana.eq(id_arti_semana));
    }

    let select = partial_market::Entity::find()
        .filter(condition)
        .order_by_asc(partial_market::Column::Id);
    paginate(&state.db, select, &uri, query.page, query.size)
        .await
        .map(Json)
}

/// Weekly wholesale rows.
#[utoipa::path(
    get,
    path = "/api/v1/weekly",
    responses((status = 200, description = "Paginated weekly wholesale rows", body = ApiResponse<WeeklyWholesaleDto>)),
    tag = "records"
)]
pub async fn list_weekly(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<WholesaleQuery>,
) -> Result<Json<ApiResponse<WeeklyWholesaleDto>>, ApiError> {
    let zone = zone_of(&state)?;
    let mut condition = date_filter(
        weekly_wholesale::Column::FechaIni,
        zone,
        query.fecha,
        query.start_date,
        query.end_date,
    )?;
    if let Some(arti_id) = query.arti_id {
        condition = condition.add(weekly_wholesale::Column::ArtiId.eq(arti_id));
    }
    if let Some(fuen_id) = query.fuen_id {
        condition = condition.add(weekly_wholesale::Column::FuenId.eq(fuen_id));
    }

    let select = weekly_wholesale::Entity::find()
        .filter(condition)
        .order_by_asc(weekly_wholesale::Column::Id);
    paginate(&state.db, select, &uri, query.page, query.size)
        .await
        .map(Json)
}

/// Monthly wholesale rows.
#[utoipa::path(
    get,
    path = "/api/v1/monthly",
    responses((status = 200, description = "Paginated monthly wholesale rows", body = ApiResponse<MonthlyWholesaleDto>)),
    tag = "records"
)]
pub async fn list_monthly(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<WholesaleQuery>,
) -> Result<Json<ApiResponse<MonthlyWholesaleDto>>, ApiError> {
    let zone = zone_of(&state)?;
    let mut condition = date_filter(
        monthly_wholesale::Column::FechaMesIni,
        zone,
        query.fecha,
        query.start_date,
        query.end_date,
    )?;
    if let Some(arti_id) = query.arti_id {
        condition = condition.add(monthly_wholesale::Column::ArtiId.eq(arti_id));
    }
    if let Some(fuen_id) = query.fuen_id {
        condition = condition.add(monthly_wholesale::Column::FuenId.eq(fuen_id));
    }

    let select = monthly_wholesale::Entity::find()
        .filter(condition)
        .order_by_asc(monthly_wholesale::Column::Id);
    paginate(&state.db, select, &uri, query.page, query.size)
        .await
        .map(Json)
}

/// Monthly supply rows.
#[utoipa::path(
    get,
    path = "/api/v1/supply",
    responses((status = 200, description = "Paginated monthly supply rows", body = ApiResponse<MonthlySupplyDto>)),
    tag = "records"
)]
pub async fn list_supply(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<WholesaleQuery>,
) -> Result<Json<ApiResponse<MonthlySupplyDto>>, ApiError> {
    let zone = zone_of(&state)?;
    let mut condition = date_filter(
        monthly_supply::Column::FechaMesIni,
        zone,
        query.fecha,
        query.start_date,
        query.end_date,
    )?;
    if let Some(arti_id) = query.arti_id {
        condition = condition.add(monthly_supply::Column::ArtiId.eq(arti_id));
    }
    if let Some(fuen_id) = query.fuen_id {
        condition = condition.add(monthly_supply::Column::FuenId.eq(fuen_id));
    }

    let select = monthly_supply::Entity::find()
        .filter(condition)
        .order_by_asc(monthly_supply::Column::Id);
    paginate(&state.db, select, &uri, query.page, query.size)
        .await
        .map(Json)
}

fn zone_of(state: &AppState) -> Result<Tz, ApiError> {
    state
        .config
        .zone()
        .map_err(|e| {
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIGURATION_ERROR",
                e.to_string(),
            )
        })
}

/// Builds the date condition: an exact local day, or an optional
/// [start, end] range with inclusive end.
fn date_filter<C: ColumnTrait>(
    column: C,
    zone: Tz,
    fecha: Option<NaiveDate>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<Condition, ApiError> {
    let mut condition = Condition::all();

    if let Some(day) = fecha {
        condition = condition
            .add(column.gte(local_day_start(zone, day)?))
            .add(column.lt(local_next_day_start(zone, day)?));
        return Ok(condition);
    }

    if let Some(start) = start_date {
        condition = condition.add(column.gte(local_day_start(zone, start)?));
    }
    if let Some(end) = end_date {
        condition = condition.add(column.lt(local_next_day_start(zone, end)?));
    }
    Ok(condition)
}

fn local_day_start(zone: Tz, day: NaiveDate) -> Result<DateTime<Utc>, ApiError> {
    let midnight = day.and_hms_opt(0, 0, 0).ok_or_else(invalid_date)?;
    zone.from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(invalid_date)
}

fn local_next_day_start(zone: Tz, day: NaiveDate) -> Result<DateTime<Utc>, ApiError> {
    let next = day.checked_add_days(Days::new(1)).ok_or_else(invalid_date)?;
    local_day_start(zone, next)
}

fn invalid_date() -> ApiError {
    ApiError::new(
        StatusCode::BAD_REQUEST,
        "VALIDATION_FAILED",
        "date is not representable in the configured timezone",
    )
}

async fn paginate<E, D>(
    db: &DatabaseConnection,
    select: Select<E>,
    uri: &Uri,
    page: u64,
    size: u64,
) -> Result<ApiResponse<D>, ApiError>
where
    E: EntityTrait,
    E::Model: FromQueryResult + Sized + Send + Sync + 'static,
    D: From<E::Model>,
{
    if page == 0 {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "page numbering is 1-based",
        ));
    }
    if size == 0 || size > MAX_PAGE_SIZE {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "size must be between 1 and 500",
        ));
    }

    let paginator = select.paginate(db, size);
    let totals = paginator.num_items_and_pages().await?;
    let results: Vec<D> = paginator
        .fetch_page(page - 1)
        .await?
        .into_iter()
        .map(D::from)
        .collect();

    let next = (page < totals.number_of_pages).then(|| page_url(uri, page + 1));
    let prev = (page > 1).then(|| page_url(uri, page - 1));

    Ok(ApiResponse {
        count: totals.number_of_items,
        next,
        prev,
        pages: totals.number_of_pages,
        results,
    })
}

/// Rebuilds the request URL with the `page` query parameter replaced.
fn page_url(uri: &Uri, page: u64) -> String {
    let mut pairs: Vec<(String, String)> = uri
        .query()
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default();

    let mut replaced = false;
    for (key, value) in pairs.iter_mut() {
        if key == "page" {
            *value = page.to_string();
            replaced = true;
        }
    }
    if !replaced {
        pairs.push(("page".to_string(), page.to_string()));
    }

    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    format!("{}?{}", uri.path(), query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::Bogota;

    #[test]
    fn local_day_converts_to_utc() {
        // Bogota is UTC-5 year-round.
        let day = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        let start = local_day_start(Bogota, day).unwrap();
        assert_eq!(start.to_rfc3339(), "2026-01-02T05:00:00+00:00");

        let next = local_next_day_start(Bogota, day).unwrap();
        assert_eq!(next.to_rfc3339(), "2026-01-03T05:00:00+00:00");
    }

    #[test]
    fn page_url_replaces_existing_page_param() {
        let uri: Uri = "/api/v1/city?fecha=2026-01-02&page=3&size=10"
            .parse()
            .unwrap();
        let url = page_url(&uri, 4);
        assert!(url.starts_with("/api/v1/city?"));
        assert!(url.contains("page=4"));
        assert!(!url.contains("page=3"));
        assert!(url.contains("size=10"));
    }

    #[test]
    fn page_url_appends_missing_page_param() {
        let uri: Uri = "/api/v1/weekly?artiId=7".parse().unwrap();
        let url = page_url(&uri, 2);
        assert!(url.contains("artiId=7"));
        assert!(url.contains("page=2"));
    }
}
