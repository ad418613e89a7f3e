//! Persistence sink for predictions and ride quotes.
//!
//! Flat records only: one row per saved prediction, and optionally one ride
//! quote keyed to it. Saving is best-effort from the caller's point of view;
//! the core never depends on this schema beyond producing the two records.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection};

use crate::error::Result;
use crate::flight::FlightRecord;
use crate::ride::RideQuote;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS predictions (
    id INTEGER PRIMARY KEY,
    flight_number TEXT NOT NULL,
    airline TEXT NOT NULL,
    origin TEXT NOT NULL,
    destination TEXT NOT NULL,
    scheduled_departure TEXT NOT NULL,
    actual_departure TEXT NOT NULL,
    gate TEXT NOT NULL,
    terminal TEXT NOT NULL,
    status TEXT NOT NULL,
    predicted_delay_minutes REAL NOT NULL,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS ride_quotes (
    id INTEGER PRIMARY KEY,
    prediction_id INTEGER REFERENCES predictions(id),
    airport_code TEXT NOT NULL,
    cost_usd REAL NOT NULL,
    duration_minutes INTEGER NOT NULL,
    created_at TEXT NOT NULL
);
";

pub struct Store {
    // rusqlite connections are not Sync; handlers take short exclusive holds.
    conn: Mutex<Connection>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    #[cfg(test)]
    fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Save one prediction; returns its row id for attaching ride quotes.
    pub fn save_prediction(&self, record: &FlightRecord, delay_minutes: f64) -> Result<i64> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "INSERT INTO predictions (
                flight_number, airline, origin, destination,
                scheduled_departure, actual_departure, gate, terminal, status,
                predicted_delay_minutes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                record.flight_number,
                record.airline,
                record.origin,
                record.destination,
                record.scheduled_departure,
                record.actual_departure,
                record.gate,
                record.terminal,
                record.status,
                delay_minutes,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Save one ride quote, optionally keyed to a saved prediction.
    pub fn save_ride_quote(
        &self,
        prediction_id: Option<i64>,
        airport_code: &str,
        quote: &RideQuote,
    ) -> Result<i64> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "INSERT INTO ride_quotes (
                prediction_id, airport_code, cost_usd, duration_minutes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                prediction_id,
                airport_code,
                quote.cost_usd,
                quote.duration_minutes,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}
