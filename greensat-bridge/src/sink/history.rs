//! Append-only reading history in SQLite
//!
//! ## Schema
//!
//! ```sql
//! CREATE TABLE mesures (
//!     id        INTEGER PRIMARY KEY AUTOINCREMENT,
//!     date_time DATETIME,     -- '%Y-%m-%d %H:%M:%S', bridge receipt time
//!     temp REAL, hum REAL, gaz_pct REAL, lux REAL, press REAL, air_pct REAL
//! );
//! CREATE INDEX idx_date ON mesures(date_time);
//! ```
//!
//! Timestamps are stored as text in a format whose lexical order is time
//! order, so every range scan is a plain `BETWEEN` on the index. A faulted
//! field is `NULL`; `AVG` skips it, so daily means only cover real samples.
//!
//! ## Access patterns
//!
//! | Query            | Used for                         |
//! |------------------|----------------------------------|
//! | `latest`         | live value                       |
//! | `range`          | raw history between two times    |
//! | `recent`         | history when no range is given   |
//! | `daily_means`    | long ranges, one point per day   |
//! | `bounds`         | first and last stored timestamps |

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use log::debug;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

use greensat_core::math::round1;

use super::ReadingSink;
use crate::clock::{format_timestamp, parse_timestamp};
use crate::error::SinkError;
use crate::reading::Reading;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS mesures (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date_time DATETIME,
    temp REAL,
    hum REAL,
    gaz_pct REAL,
    lux REAL,
    press REAL,
    air_pct REAL
)";

const CREATE_INDEX: &str = "CREATE INDEX IF NOT EXISTS idx_date ON mesures(date_time)";

const COLUMNS: &str = "date_time, temp, hum, gaz_pct, lux, press, air_pct";

/// Per-day means over a range
///
/// Each mean is `None` when the field was faulted in every sample of the day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    /// Calendar day of the bridge receipt time
    pub day: NaiveDate,
    /// Readings stored that day
    pub samples: i64,
    /// Mean °C
    pub temperature_c: Option<f64>,
    /// Mean % RH
    pub humidity_pct: Option<f64>,
    /// Mean gas level, %
    pub gas_pct: Option<f64>,
    /// Mean lux
    pub lux: Option<f64>,
    /// Mean hPa
    pub pressure_hpa: Option<f64>,
    /// Mean air quality %
    pub air_quality_pct: Option<f64>,
}

/// Earliest and latest stored timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBounds {
    /// Oldest row
    pub first: NaiveDateTime,
    /// Newest row
    pub last: NaiveDateTime,
}

fn decode_error(column: &str, e: chrono::ParseError) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    }
}

fn summary_from_row(row: &SqliteRow) -> Result<DailySummary, sqlx::Error> {
    let day: String = row.try_get("day")?;
    let day = NaiveDate::parse_from_str(&day, "%Y-%m-%d").map_err(|e| decode_error("day", e))?;
    let mean = |column: &str| row.try_get::<Option<f64>, _>(column).map(|m| m.map(round1));

    Ok(DailySummary {
        day,
        samples: row.try_get("samples")?,
        temperature_c: mean("temp")?,
        humidity_pct: mean("hum")?,
        gas_pct: mean("gaz_pct")?,
        lux: mean("lux")?,
        pressure_hpa: mean("press")?,
        air_quality_pct: mean("air_pct")?,
    })
}

/// SQLite-backed history
#[derive(Debug, Clone)]
pub struct HistoryStore {
    pool: SqlitePool,
}

impl HistoryStore {
    /// Open (creating if needed) the database at `url` and ensure the schema
    pub async fn open(url: &str) -> Result<Self, SinkError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        // One writer, one connection. Also keeps a `:memory:` database alive.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Private in-memory database
    pub async fn in_memory() -> Result<Self, SinkError> {
        Self::open("sqlite::memory:").await
    }

    async fn migrate(&self) -> Result<(), SinkError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_INDEX).execute(&self.pool).await?;
        Ok(())
    }

    /// Insert one row, returning its id
    pub async fn append(&self, reading: &Reading) -> Result<i64, SinkError> {
        let result = sqlx::query(
            "INSERT INTO mesures (date_time, temp, hum, gaz_pct, lux, press, air_pct)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(format_timestamp(&reading.captured_at))
        .bind(reading.temperature_c)
        .bind(reading.humidity_pct)
        .bind(reading.gas_pct)
        .bind(reading.lux)
        .bind(reading.pressure_hpa)
        .bind(reading.air_quality_pct)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Stored rows
    pub async fn count(&self) -> Result<i64, SinkError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM mesures")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Newest reading
    pub async fn latest(&self) -> Result<Option<Reading>, SinkError> {
        let sql = format!("SELECT {COLUMNS} FROM mesures ORDER BY date_time DESC, id DESC LIMIT 1");
        let reading = sqlx::query_as::<_, Reading>(&sql)
            .fetch_optional(&self.pool)
            .await?;
        Ok(reading)
    }

    /// Readings with `start <= date_time <= end`, oldest first
    ///
    /// An inverted range is empty, not an error.
    pub async fn range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Reading>, SinkError> {
        if start > end {
            debug!("inverted range {} > {}", start, end);
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {COLUMNS} FROM mesures WHERE date_time BETWEEN ? AND ?
             ORDER BY date_time ASC, id ASC"
        );
        let rows = sqlx::query_as::<_, Reading>(&sql)
            .bind(format_timestamp(&start))
            .bind(format_timestamp(&end))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// The newest `limit` readings, oldest first
    pub async fn recent(&self, limit: u32) -> Result<Vec<Reading>, SinkError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM (
                SELECT id, {COLUMNS} FROM mesures ORDER BY date_time DESC, id DESC LIMIT ?
             ) ORDER BY date_time ASC, id ASC"
        );
        let rows = sqlx::query_as::<_, Reading>(&sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// One row per calendar day in range, each field the day's mean (one decimal)
    pub async fn daily_means(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<DailySummary>, SinkError> {
        if start > end {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT substr(date_time, 1, 10) AS day,
                    COUNT(*)      AS samples,
                    AVG(temp)     AS temp,
                    AVG(hum)      AS hum,
                    AVG(gaz_pct)  AS gaz_pct,
                    AVG(lux)      AS lux,
                    AVG(press)    AS press,
                    AVG(air_pct)  AS air_pct
             FROM mesures
             WHERE date_time BETWEEN ? AND ?
             GROUP BY day
             ORDER BY day ASC",
        )
        .bind(format_timestamp(&start))
        .bind(format_timestamp(&end))
        .fetch_all(&self.pool)
        .await?;

        let summaries = rows
            .iter()
            .map(summary_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(summaries)
    }

    /// First and last stored timestamps; `None` when empty
    pub async fn bounds(&self) -> Result<Option<TimeBounds>, SinkError> {
        let row = sqlx::query("SELECT MIN(date_time) AS first, MAX(date_time) AS last FROM mesures")
            .fetch_one(&self.pool)
            .await?;

        let first: Option<String> = row.try_get("first")?;
        let last: Option<String> = row.try_get("last")?;

        match (first, last) {
            (Some(first), Some(last)) => Ok(Some(TimeBounds {
                first: parse_timestamp(&first).map_err(|e| decode_error("first", e))?,
                last: parse_timestamp(&last).map_err(|e| decode_error("last", e))?,
            })),
            _ => Ok(None),
        }
    }

    /// Close the pool, waiting for open connections to finish
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ReadingSink for HistoryStore {
    async fn write(&mut self, reading: &Reading) -> Result<(), SinkError> {
        let id = self.append(reading).await?;
        debug!("stored reading #{}", id);
        Ok(())
    }
}
