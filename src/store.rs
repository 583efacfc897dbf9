// src/store.rs
//! Durable storage of accepted fixes

use crate::{error::Result, gps::Fix};
use serde::Serialize;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    FromRow, SqlitePool,
};
use std::str::FromStr;

/// Number of rows returned by the recent-locations query
pub const RECENT_LIMIT: u32 = 100;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS gps_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    type TEXT NOT NULL,
    time TEXT NOT NULL,
    latitude REAL,
    longitude REAL,
    speed_knots REAL NOT NULL DEFAULT 0,
    course REAL NOT NULL DEFAULT 0,
    date TEXT,
    fix_quality INTEGER NOT NULL DEFAULT 0,
    satellites INTEGER NOT NULL DEFAULT 0,
    altitude REAL NOT NULL DEFAULT 0,
    received_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

/// Row shape exposed by the recent-locations query
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct StoredLocation {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub time: String,
    pub speed_knots: f64,
}

#[derive(Debug, Clone)]
pub struct FixStore {
    pool: SqlitePool,
}

impl FixStore {
    /// Open the database at `url` and create the table if needed
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    /// Insert one fix; fields the sentence type lacks are stored as 0 or NULL
    pub async fn insert(&self, fix: &Fix) -> Result<()> {
        sqlx::query(
            "INSERT INTO gps_data
                (type, time, latitude, longitude, speed_knots, course, date, fix_quality, satellites, altitude)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(fix.kind().tag())
        .bind(fix.time.as_str())
        .bind(fix.latitude)
        .bind(fix.longitude)
        .bind(fix.speed_knots().unwrap_or(0.0))
        .bind(fix.course().unwrap_or(0.0))
        .bind(fix.date())
        .bind(i64::from(fix.fix_quality().unwrap_or(0)))
        .bind(i64::from(fix.satellites().unwrap_or(0)))
        .bind(fix.altitude().unwrap_or(0.0))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Most recent fixes, newest first
    pub async fn recent(&self, limit: u32) -> Result<Vec<StoredLocation>> {
        let rows = sqlx::query_as::<_, StoredLocation>(
            "SELECT latitude, longitude, time, speed_knots
             FROM gps_data
             ORDER BY id DESC
             LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
