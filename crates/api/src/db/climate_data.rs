use async_trait::async_trait;
use serde::Serialize;
use sqlx::{prelude::FromRow, SqlitePool};
use time::{
    format_description::BorrowedFormatItem, macros::format_description, Date, Duration,
};
use utoipa::ToSchema;

use super::Database;

/// The only date format the store and the API speak.
pub const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to query sqlite: {0}")]
    Query(#[from] sqlx::Error),
    #[error("Failed to format date string: {0}")]
    DateFormat(#[from] time::error::Format),
    #[error("Failed to parse date stored in measurement table: {0}")]
    DateParse(#[from] time::error::Parse),
}

/// One `station` table row.
#[derive(Debug, Clone, FromRow)]
pub struct Station {
    pub station: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
}

/// One raw `(date, prcp)` pair from the `measurement` table.
#[derive(Debug, Clone, FromRow)]
pub struct PrecipitationReading {
    pub date: String,
    pub prcp: Option<f64>,
}

/// A measurement row joined with its station's display name.
/// `station_name` is null when the measurement references an unknown station.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct TemperatureObservation {
    pub date: String,
    pub tobs: f64,
    pub station: String,
    pub station_name: Option<String>,
}

/// Min/avg/max of temperature observations over one date.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct TemperatureSummary {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
}

#[async_trait]
pub trait ClimateData: Sync + Send {
    /// Every `(date, prcp)` pair in the store, in store order, duplicates and
    /// null precipitation included.
    async fn precipitation(&self) -> Result<Vec<PrecipitationReading>, Error>;
    /// One row per `station` table row.
    async fn stations(&self) -> Result<Vec<Station>, Error>;
    /// The final year of observations recorded by the most active station.
    async fn most_active_station_window(&self) -> Result<Vec<TemperatureObservation>, Error>;
    /// Per-date min/avg/max of temperature from `start` on, optionally
    /// bounded by an inclusive `end`.
    async fn temperature_summaries(
        &self,
        start: Date,
        end: Option<Date>,
    ) -> Result<Vec<TemperatureSummary>, Error>;
}

#[derive(Clone)]
pub struct ClimateAccess {
    pool: SqlitePool,
}

impl ClimateAccess {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }
}

/// Exactly 365 days before `last`, regardless of calendar years.
fn year_prior(last: Date) -> Date {
    last.saturating_sub(Duration::days(365))
}

#[async_trait]
impl ClimateData for ClimateAccess {
    async fn precipitation(&self) -> Result<Vec<PrecipitationReading>, Error> {
        let readings =
            sqlx::query_as::<_, PrecipitationReading>("SELECT date, prcp FROM measurement")
                .fetch_all(&self.pool)
                .await?;

        Ok(readings)
    }

    async fn stations(&self) -> Result<Vec<Station>, Error> {
        let stations = sqlx::query_as::<_, Station>(
            "SELECT station, name, latitude, longitude, elevation FROM station",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(stations)
    }

    async fn most_active_station_window(&self) -> Result<Vec<TemperatureObservation>, Error> {
        // Ties on measurement count resolve to the lowest station code
        let most_active: Option<(String,)> = sqlx::query_as(
            "SELECT station FROM measurement
             GROUP BY station
             ORDER BY COUNT(station) DESC, station ASC
             LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        let Some((station,)) = most_active else {
            // No measurements recorded at all
            return Ok(vec![]);
        };

        let (last_date,): (String,) =
            sqlx::query_as("SELECT MAX(date) FROM measurement WHERE station = ?")
                .bind(&station)
                .fetch_one(&self.pool)
                .await?;

        let last = Date::parse(&last_date, DATE_FORMAT)?;
        let cutoff = year_prior(last).format(DATE_FORMAT)?;

        let observations = sqlx::query_as::<_, TemperatureObservation>(
            "SELECT m.date, m.tobs, m.station, s.name AS station_name
             FROM measurement m
             LEFT JOIN station s ON s.station = m.station
             WHERE m.station = ? AND m.date >= ?",
        )
        .bind(&station)
        .bind(&cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(observations)
    }

    async fn temperature_summaries(
        &self,
        start: Date,
        end: Option<Date>,
    ) -> Result<Vec<TemperatureSummary>, Error> {
        // Grouped aggregates come back in ascending date order
        let summaries = match end {
            Some(end) => {
                sqlx::query_as::<_, TemperatureSummary>(
                    "SELECT MIN(tobs) AS min, AVG(tobs) AS avg, MAX(tobs) AS max
                     FROM measurement
                     WHERE date >= ? AND date <= ?
                     GROUP BY date
                     ORDER BY date",
                )
                .bind(start.format(DATE_FORMAT)?)
                .bind(end.format(DATE_FORMAT)?)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, TemperatureSummary>(
                    "SELECT MIN(tobs) AS min, AVG(tobs) AS avg, MAX(tobs) AS max
                     FROM measurement
                     WHERE date >= ?
                     GROUP BY date
                     ORDER BY date",
                )
                .bind(start.format(DATE_FORMAT)?)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(summaries)
    }
}
