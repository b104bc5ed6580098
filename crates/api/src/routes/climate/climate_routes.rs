use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use log::error;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use time::Date;
use utoipa::ToSchema;

use crate::{db, AppState, TemperatureObservation, TemperatureSummary, DATE_FORMAT};

/// Error payload returned to API clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn invalid_date() -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: "Invalid date format. Please use YYYY-MM-DD format.".to_string(),
        }),
    )
}

/// Store failures are logged with their cause and surfaced opaque.
fn internal_error(err: db::Error) -> ApiError {
    error!("error querying climate store: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: "internal error".to_string(),
        }),
    )
}

fn parse_date(raw: &str) -> Result<Date, ApiError> {
    Date::parse(raw, DATE_FORMAT).map_err(|_| invalid_date())
}

/// List every recorded precipitation reading.
///
/// Each entry is a single-key `{date: prcp}` object; dates recorded by
/// several stations produce one entry per station row.
#[utoipa::path(
    get,
    path = "/api/v1.0/precipitation",
    responses(
        (status = OK, description = "One entry per measurement row, keyed by observation date"),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to query the observations store", body = ErrorBody)
    ))]
pub async fn precipitation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let readings = state
        .climate_db
        .precipitation()
        .await
        .map_err(internal_error)?;

    let body = readings
        .into_iter()
        .map(|reading| {
            let mut entry = Map::with_capacity(1);
            entry.insert(reading.date, json!(reading.prcp));
            Value::Object(entry)
        })
        .collect();

    Ok(Json(body))
}

/// List the station codes known to the store, one per station row.
#[utoipa::path(
    get,
    path = "/api/v1.0/stations",
    responses(
        (status = OK, description = "Station codes", body = Vec<String>),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to query the observations store", body = ErrorBody)
    ))]
pub async fn stations(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>, ApiError> {
    let stations = state.climate_db.stations().await.map_err(internal_error)?;

    let codes = stations.into_iter().map(|s| s.station).collect();

    Ok(Json(codes))
}

/// Temperature observations from the most active station's final year.
///
/// The most active station is the one with the most measurement rows; the
/// window covers the 365 days up to and including its latest observation.
/// An empty store yields an empty list.
#[utoipa::path(
    get,
    path = "/api/v1.0/tobs",
    responses(
        (status = OK, description = "Observations within the window", body = Vec<TemperatureObservation>),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to query the observations store", body = ErrorBody)
    ))]
pub async fn tobs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TemperatureObservation>>, ApiError> {
    let observations = state
        .climate_db
        .most_active_station_window()
        .await
        .map_err(internal_error)?;

    Ok(Json(observations))
}

/// Per-date temperature aggregates from a start date onwards.
#[utoipa::path(
    get,
    path = "/api/v1.0/{start_date}",
    params(
        ("start_date" = String, Path, description = "Inclusive lower bound, YYYY-MM-DD"),
    ),
    responses(
        (status = OK, description = "One min/avg/max triple per date on or after the start", body = Vec<TemperatureSummary>),
        (status = BAD_REQUEST, description = "Malformed start date", body = ErrorBody),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to query the observations store", body = ErrorBody)
    ))]
pub async fn temperature_from(
    State(state): State<Arc<AppState>>,
    Path(start_date): Path<String>,
) -> Result<Json<Vec<TemperatureSummary>>, ApiError> {
    let start = parse_date(&start_date)?;

    let summaries = state
        .climate_db
        .temperature_summaries(start, None)
        .await
        .map_err(internal_error)?;

    Ok(Json(summaries))
}

/// Per-date temperature aggregates over an inclusive date range.
#[utoipa::path(
    get,
    path = "/api/v1.0/{start_date}/{end_date}",
    params(
        ("start_date" = String, Path, description = "Inclusive lower bound, YYYY-MM-DD"),
        ("end_date" = String, Path, description = "Inclusive upper bound, YYYY-MM-DD"),
    ),
    responses(
        (status = OK, description = "One min/avg/max triple per date in the range", body = Vec<TemperatureSummary>),
        (status = BAD_REQUEST, description = "Malformed start or end date", body = ErrorBody),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to query the observations store", body = ErrorBody)
    ))]
pub async fn temperature_range(
    State(state): State<Arc<AppState>>,
    Path((start_date, end_date)): Path<(String, String)>,
) -> Result<Json<Vec<TemperatureSummary>>, ApiError> {
    let start = parse_date(&start_date)?;
    let end = parse_date(&end_date)?;

    let summaries = state
        .climate_db
        .temperature_summaries(start, Some(end))
        .await
        .map_err(internal_error)?;

    Ok(Json(summaries))
}
