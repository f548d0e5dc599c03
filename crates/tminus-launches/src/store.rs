//! SQLite-backed launch storage.
//!
//! `LaunchStore` is the persistence boundary for launch records. Every write
//! is its own autocommitted statement, and the connection sits behind a
//! mutex so concurrent refresh cycles serialise here.

use std::ops::RangeInclusive;
use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tminus_weather::PadWeather;

use crate::error::StoreResult;
use crate::filter::{LaunchFilter, SortOrder};
use crate::launch::{Launch, Location};

const SELECT_COLUMNS: &str = "code, net_ms, vehicle, mission, details, orbit, pad, country_code, \
     location_name, longitude, latitude, timezone_name, \
     weather_cloud_cover, weather_symbol_name, weather_precipitation_chance, weather_temperature_celsius";

/// Whether an upsert created a new record or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

pub struct LaunchStore {
    conn: Mutex<Connection>,
}

impl LaunchStore {
    /// Open (or create) the launch database at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store.
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        self.conn.lock().execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS launches (
                code TEXT PRIMARY KEY NOT NULL,
                net_ms INTEGER NOT NULL,
                vehicle TEXT NOT NULL,
                mission TEXT NOT NULL,
                details TEXT NOT NULL,
                orbit TEXT NOT NULL,
                pad TEXT NOT NULL,
                country_code TEXT NOT NULL,
                location_name TEXT NOT NULL,
                longitude REAL NOT NULL,
                latitude REAL NOT NULL,
                timezone_name TEXT NOT NULL,
                weather_cloud_cover REAL,
                weather_symbol_name TEXT,
                weather_precipitation_chance REAL,
                weather_temperature_celsius REAL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_launches_net ON launches(net_ms);
            "#,
        )?;
        Ok(())
    }

    /// Insert a launch, or replace the stored record with the same code.
    ///
    /// Stored weather survives an update that carries none.
    pub fn upsert(&self, launch: &Launch) -> StoreResult<UpsertOutcome> {
        let conn = self.conn.lock();

        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM launches WHERE code = ?1)",
            params![launch.code],
            |row| row.get(0),
        )?;

        let weather = launch.weather.as_ref();
        conn.execute(
            r#"
            INSERT INTO launches (
                code, net_ms, vehicle, mission, details, orbit, pad, country_code,
                location_name, longitude, latitude, timezone_name,
                weather_cloud_cover, weather_symbol_name,
                weather_precipitation_chance, weather_temperature_celsius,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            ON CONFLICT(code) DO UPDATE SET
                net_ms = excluded.net_ms,
                vehicle = excluded.vehicle,
                mission = excluded.mission,
                details = excluded.details,
                orbit = excluded.orbit,
                pad = excluded.pad,
                country_code = excluded.country_code,
                location_name = excluded.location_name,
                longitude = excluded.longitude,
                latitude = excluded.latitude,
                timezone_name = excluded.timezone_name,
                weather_cloud_cover = CASE WHEN excluded.weather_symbol_name IS NULL
                    THEN launches.weather_cloud_cover ELSE excluded.weather_cloud_cover END,
                weather_symbol_name = COALESCE(excluded.weather_symbol_name, launches.weather_symbol_name),
                weather_precipitation_chance = CASE WHEN excluded.weather_symbol_name IS NULL
                    THEN launches.weather_precipitation_chance ELSE excluded.weather_precipitation_chance END,
                weather_temperature_celsius = CASE WHEN excluded.weather_symbol_name IS NULL
                    THEN launches.weather_temperature_celsius ELSE excluded.weather_temperature_celsius END,
                updated_at = excluded.updated_at
            "#,
            params![
                launch.code,
                launch.net.timestamp_millis(),
                launch.vehicle,
                launch.mission,
                launch.details,
                launch.orbit,
                launch.pad,
                launch.country_code,
                launch.location.name,
                launch.location.longitude,
                launch.location.latitude,
                launch.timezone_name,
                weather.map(|w| w.cloud_cover),
                weather.map(|w| w.symbol_name.as_str()),
                weather.map(|w| w.precipitation_chance),
                weather.map(|w| w.temperature_celsius),
                Utc::now().to_rfc3339(),
            ],
        )?;

        Ok(if exists {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        })
    }

    /// Launches matching `filter`, evaluated against the current time.
    pub fn query(&self, filter: &LaunchFilter, order: SortOrder) -> StoreResult<Vec<Launch>> {
        self.query_at(filter, order, Utc::now())
    }

    /// Launches matching `filter` with future/past judged against `now`, sorted by NET.
    pub fn query_at(
        &self,
        filter: &LaunchFilter,
        order: SortOrder,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<Launch>> {
        let direction = match order {
            SortOrder::Forward => "ASC",
            SortOrder::Reverse => "DESC",
        };
        let sql = format!(
            "SELECT {} FROM launches ORDER BY net_ms {}, code {}",
            SELECT_COLUMNS, direction, direction
        );

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::row_to_launch)?;

        let mut launches = Vec::new();
        for row in rows {
            let launch = row?;
            if filter.matches(&launch, now) {
                launches.push(launch);
            }
        }
        Ok(launches)
    }

    pub fn get(&self, code: &str) -> StoreResult<Option<Launch>> {
        let conn = self.conn.lock();
        let launch = conn
            .query_row(
                &format!("SELECT {} FROM launches WHERE code = ?1", SELECT_COLUMNS),
                params![code],
                Self::row_to_launch,
            )
            .optional()?;
        Ok(launch)
    }

    /// Earliest to latest stored NET. An empty store yields the widest range.
    pub fn date_range(&self) -> StoreResult<RangeInclusive<DateTime<Utc>>> {
        let conn = self.conn.lock();
        let (min, max): (Option<i64>, Option<i64>) = conn.query_row(
            "SELECT MIN(net_ms), MAX(net_ms) FROM launches",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        match (min, max) {
            (Some(min), Some(max)) => Ok(millis_to_datetime(0, min)?..=millis_to_datetime(0, max)?),
            _ => Ok(DateTime::<Utc>::MIN_UTC..=DateTime::<Utc>::MAX_UTC),
        }
    }

    pub fn count(&self) -> StoreResult<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM launches", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Delete launches with NET strictly before `cutoff`. Returns how many were removed.
    pub fn prune_before(&self, cutoff: DateTime<Utc>) -> StoreResult<usize> {
        let conn = self.conn.lock();
        let removed = conn.execute(
            "DELETE FROM launches WHERE net_ms < ?1",
            params![cutoff.timestamp_millis()],
        )?;
        Ok(removed)
    }

    fn row_to_launch(row: &rusqlite::Row) -> rusqlite::Result<Launch> {
        let net_ms: i64 = row.get(1)?;
        let symbol_name: Option<String> = row.get(13)?;

        let weather = match symbol_name {
            Some(symbol_name) => Some(PadWeather {
                cloud_cover: row.get(12)?,
                symbol_name,
                precipitation_chance: row.get(14)?,
                temperature_celsius: row.get(15)?,
            }),
            None => None,
        };

        Ok(Launch {
            code: row.get(0)?,
            net: millis_to_datetime(1, net_ms)?,
            vehicle: row.get(2)?,
            mission: row.get(3)?,
            details: row.get(4)?,
            orbit: row.get(5)?,
            pad: row.get(6)?,
            country_code: row.get(7)?,
            location: Location {
                name: row.get(8)?,
                longitude: row.get(9)?,
                latitude: row.get(10)?,
            },
            timezone_name: row.get(11)?,
            weather,
        })
    }
}

fn millis_to_datetime(column: usize, ms: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or(rusqlite::Error::IntegralValueOutOfRange(column, ms))
}
