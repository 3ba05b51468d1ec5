//! SQLite Location Store
//!
//! Implements LocationStore using a single-row SQLite table holding the
//! current location record.

use crate::domain::entities::LocationRecord;
use crate::domain::ports::LocationStore;
use crate::domain::value_objects::ErrorType;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Arc;

/// Id of the one row that holds the current record.
const CURRENT_ROW: i64 = 0;

/// SQLite-backed location store.
///
/// Calls run on the blocking pool; the connection is shared behind a mutex.
pub struct SqliteLocationStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLocationStore {
    /// Open (or create) the database file and ensure the schema exists.
    pub fn open(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn)
    }

    /// In-memory store, mostly for tests.
    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS location (
                id INTEGER PRIMARY KEY,
                latitude REAL,
                longitude REAL,
                location_name TEXT,
                error TEXT,
                error_message TEXT,
                time INTEGER NOT NULL
            )",
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&*guard)
        })
        .await?
    }

    fn select_current(conn: &Connection) -> Result<Option<LocationRecord>> {
        let record = conn
            .query_row(
                "SELECT latitude, longitude, location_name, error, error_message, time
                 FROM location WHERE id = ?1",
                params![CURRENT_ROW],
                |row| Self::row_to_record(row),
            )
            .optional()?;
        Ok(record)
    }

    /// Convert a SQLite row to a LocationRecord.
    fn row_to_record(row: &Row) -> rusqlite::Result<LocationRecord> {
        let error: Option<String> = row.get(3)?;
        let millis: i64 = row.get(5)?;

        Ok(LocationRecord {
            latitude: row.get(0)?,
            longitude: row.get(1)?,
            location_name: row.get(2)?,
            error: error.and_then(|e| ErrorType::from_str(&e)),
            error_message: row.get(4)?,
            time: Utc
                .timestamp_millis_opt(millis)
                .single()
                .unwrap_or_else(Utc::now),
        })
    }
}

#[async_trait]
impl LocationStore for SqliteLocationStore {
    async fn latest(&self) -> Result<Option<LocationRecord>> {
        self.blocking(Self::select_current).await
    }

    async fn upsert(&self, record: &LocationRecord) -> Result<()> {
        let record = record.clone();
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO location (id, latitude, longitude, location_name, error, error_message, time)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                    latitude = excluded.latitude,
                    longitude = excluded.longitude,
                    location_name = excluded.location_name,
                    error = excluded.error,
                    error_message = excluded.error_message,
                    time = excluded.time",
                params![
                    CURRENT_ROW,
                    record.latitude,
                    record.longitude,
                    record.location_name,
                    record.error.map(|e| e.as_str()),
                    record.error_message,
                    record.time.timestamp_millis(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn insert_initial(&self) -> Result<bool> {
        let record = LocationRecord::unknown();
        self.blocking(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO location (id, error, time) VALUES (?1, ?2, ?3)",
                params![
                    CURRENT_ROW,
                    record.error.map(|e| e.as_str()),
                    record.time.timestamp_millis(),
                ],
            )?;
            Ok(inserted > 0)
        })
        .await
    }
}
