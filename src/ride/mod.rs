//! Ground-transportation estimates to and from the airport.
//!
//! # Key Concepts
//! - Tier: one fallback strategy in the estimator's ordered attempt list
//!   (mapping service, then heuristic mileage, then unavailable).
//! - Quota: the daily cap on calls to the metered mapping service.
//! - Heuristic estimate: cost/time from raw distance and a speed model,
//!   with no external call.

mod distance;
mod estimator;
mod quota;

pub use distance::{haversine_miles, heuristic_quote, round2, speed_factor_for_hour, FareSchedule};
pub use estimator::{DistanceMatrixClient, DrivingEstimate, MappingService, RideCostEstimator};
pub use quota::QuotaGovernor;

use serde::{Deserialize, Serialize};

/// Which way the ride goes relative to the airport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    ToAirport,
    FromAirport,
}

/// What the caller knows about the ride. `address` and `miles_override` are
/// both optional; with neither, the answer is "unavailable", not an error.
#[derive(Debug, Clone, Deserialize)]
pub struct RideQuoteRequest {
    pub airport_code: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub miles_override: Option<f64>,
    /// `HH:MM` today; absent or unparseable means "now".
    #[serde(default)]
    pub time_of_day: Option<String>,
    pub direction: Direction,
}

/// A ride estimate. Cost is rounded to cents, duration to whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RideQuote {
    pub cost_usd: f64,
    pub duration_minutes: i64,
}

/// Coordinates for the airports the mapping tier knows. Unknown codes only
/// disable tier 1; the heuristic tier needs no coordinates.
pub fn airport_coords(code: &str) -> Option<(f64, f64)> {
    match code.to_ascii_uppercase().as_str() {
        "SAN" => Some((32.7336, -117.1897)),
        "LAX" => Some((33.9416, -118.4085)),
        "SFO" => Some((37.6213, -122.3790)),
        "OAK" => Some((37.7126, -122.2197)),
        "SJC" => Some((37.3639, -121.9289)),
        "SEA" => Some((47.4502, -122.3088)),
        "PHX" => Some((33.4373, -112.0078)),
        "DEN" => Some((39.8561, -104.6737)),
        "ORD" => Some((41.9742, -87.9073)),
        "JFK" => Some((40.6413, -73.7781)),
        _ => None,
    }
}
