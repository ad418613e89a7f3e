//! Feature extraction for the delay model.
//!
//! `encode` is a total function: whatever the record looks like, it yields a
//! fully numeric 5-feature vector. Missing categories become index 0, a
//! missing encoder table switches to a stable hash-derived index, and an
//! unparseable timestamp becomes noon Monday.

use chrono::{DateTime, Datelike, Timelike};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::EncoderTables;
use crate::flight::{FlightRecord, UNKNOWN};

/// `(origin_idx, destination_idx, airline_idx, hour_of_day, weekday)`.
pub type FeatureVector = [f64; 5];

/// Encode a flight record into the model's feature order.
/// An entirely unusable record still yields `(0, 0, 0, 12, 0)` through the
/// per-field defaults; there is no failure path.
pub fn encode(record: &FlightRecord, tables: Option<&EncoderTables>) -> FeatureVector {
    let (hour, weekday) = departure_hour_weekday(&record.scheduled_departure);

    // Two-branch strategy: learned tables when the artifact carried them,
    // otherwise a stable hash-derived pseudo-index.
    let (origin, destination, airline) = match tables {
        Some(tables) => (
            table_index(&tables.origin, &record.origin),
            table_index(&tables.destination, &record.destination),
            table_index(&tables.airline, &record.airline),
        ),
        None => (
            hash_index(&record.origin),
            hash_index(&record.destination),
            hash_index(&record.airline),
        ),
    };

    [origin, destination, airline, hour, weekday]
}

fn table_index(table: &std::collections::HashMap<String, i64>, value: &str) -> f64 {
    table.get(value).copied().unwrap_or(0) as f64
}

/// Stable pseudo-index in `[0, 1000)` for when the artifact was saved without
/// its encoder tables. SHA-256 keeps it identical across processes and runs.
fn hash_index(value: &str) -> f64 {
    let digest = Sha256::digest(value.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    (u64::from_le_bytes(bytes) % 1000) as f64
}

/// Hour and weekday (Monday = 0) from an ISO-8601 departure timestamp, in
/// the timestamp's own offset. A trailing `Z` reads as UTC. Failures default
/// to `(12, 0)`.
fn departure_hour_weekday(scheduled: &str) -> (f64, f64) {
    if scheduled == UNKNOWN {
        return (12.0, 0.0);
    }
    match DateTime::parse_from_rfc3339(scheduled) {
        Ok(dt) => (dt.hour() as f64, dt.weekday().num_days_from_monday() as f64),
        Err(e) => {
            debug!(timestamp = scheduled, error = %e, "unparseable scheduled departure, using defaults");
            (12.0, 0.0)
        }
    }
}
