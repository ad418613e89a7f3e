//! Flight data - records and the resolver that produces them.

mod resolver;

pub use resolver::FlightResolver;

use serde::{Deserialize, Serialize};

/// Sentinel for fields the upstream service did not supply.
///
/// Downstream code (feature encoding, persistence) branches on this value
/// instead of on missing keys, so every field is always present.
pub const UNKNOWN: &str = "Unknown";

fn unknown() -> String {
    UNKNOWN.to_string()
}

/// One resolved flight. Immutable once returned by the resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    #[serde(default = "unknown")]
    pub flight_number: String,
    #[serde(default = "unknown")]
    pub airline: String,
    #[serde(default = "unknown")]
    pub origin: String,
    #[serde(default = "unknown")]
    pub destination: String,
    /// ISO-8601 timestamp, or `"Unknown"`.
    #[serde(default = "unknown")]
    pub scheduled_departure: String,
    #[serde(default = "unknown")]
    pub actual_departure: String,
    #[serde(default = "unknown")]
    pub gate: String,
    #[serde(default = "unknown")]
    pub terminal: String,
    #[serde(default = "unknown")]
    pub status: String,
}

impl FlightRecord {
    /// A record with every field unknown except the flight number.
    pub fn unknown(flight_number: &str) -> Self {
        Self {
            flight_number: flight_number.to_string(),
            airline: unknown(),
            origin: unknown(),
            destination: unknown(),
            scheduled_departure: unknown(),
            actual_departure: unknown(),
            gate: unknown(),
            terminal: unknown(),
            status: unknown(),
        }
    }
}

/// IATA-style flight identifier: 2-3 uppercase letters then 1-4 digits,
/// e.g. `WN1254`.
pub fn is_valid_flight_number(s: &str) -> bool {
    let letters = s.chars().take_while(|c| c.is_ascii_uppercase()).count();
    if !(2..=3).contains(&letters) {
        return false;
    }
    let digits = &s[letters..];
    (1..=4).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

/// Leading alphabetic prefix of a flight identifier - its carrier code.
pub fn carrier_prefix(flight_number: &str) -> &str {
    let end = flight_number
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(flight_number.len());
    &flight_number[..end]
}
