//! Distance and heuristic fare math. No external calls.

use super::RideQuote;

const EARTH_RADIUS_MILES: f64 = 3958.7613;

/// Fare constants for the rideshare-style cost model.
#[derive(Debug, Clone, Copy)]
pub struct FareSchedule {
    pub base_usd: f64,
    pub per_mile_usd: f64,
    pub per_minute_usd: f64,
    pub booking_fee_usd: f64,
    /// Free-flow average speed before the time-of-day factor.
    pub base_speed_mph: f64,
}

impl Default for FareSchedule {
    fn default() -> Self {
        Self {
            base_usd: 2.20,
            per_mile_usd: 1.25,
            per_minute_usd: 0.30,
            booking_fee_usd: 2.55,
            base_speed_mph: 28.0,
        }
    }
}

/// Great-circle distance in miles.
pub fn haversine_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_MILES * c
}

/// Traffic adjustment by hour of day. The table is a deliberate
/// simplification of traffic patterns; keep it exactly as is for
/// compatibility with previously saved quotes.
pub fn speed_factor_for_hour(hour: u32) -> f64 {
    match hour {
        // Late night: lighter traffic.
        0..=5 | 22..=23 => 1.15,
        // Morning and evening peak.
        7..=9 | 16..=19 => 0.70,
        // Shoulder hours.
        6 | 10..=15 | 20..=21 => 0.90,
        _ => 1.00,
    }
}

/// Quote a ride from raw mileage and a speed factor.
///
/// Speed is floored at 8 mph so a pathological factor cannot blow the
/// duration up, and mileage at 0 so cost and duration stay non-negative.
/// Minutes round to the nearest integer before entering the cost formula.
pub fn heuristic_quote(miles: f64, speed_factor: f64, fares: &FareSchedule) -> RideQuote {
    // f64::max also maps NaN miles to 0.
    let miles = miles.max(0.0);
    let adjusted_speed = (fares.base_speed_mph * speed_factor).max(8.0);
    let duration_minutes = (miles / adjusted_speed * 60.0).round().max(0.0) as i64;
    RideQuote {
        cost_usd: fare_for(miles, duration_minutes, fares),
        duration_minutes,
    }
}

/// The shared fare formula for both the mapping and heuristic tiers.
pub(crate) fn fare_for(miles: f64, duration_minutes: i64, fares: &FareSchedule) -> f64 {
    round2(
        fares.base_usd
            + miles * fares.per_mile_usd
            + duration_minutes as f64 * fares.per_minute_usd
            + fares.booking_fee_usd,
    )
}

/// Round to 2 decimals (cents).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
