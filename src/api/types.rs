//! Request/response types for the HTTP API.

use serde::{Deserialize, Serialize};

use crate::flight::FlightRecord;
use crate::ride::{RideQuote, RideQuoteRequest};

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    /// Optional at the wire level so absence maps to a 400, not a decode
    /// rejection.
    #[serde(default)]
    pub flight_number: Option<String>,
    /// Override the configured resolver mode for this request.
    #[serde(default)]
    pub mock: Option<bool>,
    /// Save the prediction to the user's history.
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub flight_number: String,
    pub flight: FlightRecord,
    pub predicted_delay_minutes: f64,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<i64>,
    /// Saving is best-effort; a failure is reported here, not as a 5xx.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RideRequest {
    #[serde(flatten)]
    pub quote: RideQuoteRequest,
    /// Attach the saved quote to a previously saved prediction.
    #[serde(default)]
    pub prediction_id: Option<i64>,
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Serialize)]
pub struct RideResponse {
    pub airport_code: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<RideQuote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Human-readable delay status: early below zero, on time under ten minutes
/// late, delayed from there.
pub fn delay_status(delay_minutes: f64) -> String {
    if delay_minutes < 0.0 {
        format!("~{:.0} min early (EARLY)", delay_minutes.abs())
    } else if delay_minutes < 10.0 {
        format!("~{delay_minutes:.0} min late (ON TIME)")
    } else {
        format!("~{delay_minutes:.0} min late (DELAYED)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_thresholds() {
        assert_eq!(delay_status(-4.2), "~4 min early (EARLY)");
        assert_eq!(delay_status(0.0), "~0 min late (ON TIME)");
        assert_eq!(delay_status(9.9), "~10 min late (ON TIME)");
        assert_eq!(delay_status(10.0), "~10 min late (DELAYED)");
        assert_eq!(delay_status(63.0), "~63 min late (DELAYED)");
    }

    #[test]
    fn predict_request_decodes_without_flight_number() {
        // The handler owns the missing-field answer (400), so the body must
        // still decode without one.
        let request: PredictRequest = serde_json::from_str(r#"{"save": true}"#).unwrap();
        assert!(request.flight_number.is_none());
        assert!(request.save);

        let request: PredictRequest =
            serde_json::from_str(r#"{"flight_number": "WN673"}"#).unwrap();
        assert_eq!(request.flight_number.as_deref(), Some("WN673"));
    }

    #[test]
    fn ride_request_flattens_quote_fields() {
        let body = r#"{
            "airport_code": "SAN",
            "miles_override": 12.5,
            "direction": "from_airport",
            "save": true
        }"#;
        let request: RideRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.quote.airport_code, "SAN");
        assert_eq!(request.quote.miles_override, Some(12.5));
        assert!(request.save);
        assert!(request.prediction_id.is_none());
    }
}
