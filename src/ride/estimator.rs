//! Tiered ride-cost estimation.
//!
//! Tiers are tried in strict order, first success wins:
//! 1. Mapping service - needs a configured client, an address, known airport
//!    coordinates, and remaining quota. Failures fall through without
//!    consuming quota.
//! 2. Heuristic mileage - needs a manual mileage figure; always succeeds.
//! 3. Unavailable - `None`, never a zero/garbage quote.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, NaiveTime, Timelike};
use serde::Deserialize;
use tracing::{debug, warn};

use super::distance::{fare_for, heuristic_quote, speed_factor_for_hour, FareSchedule};
use super::quota::QuotaGovernor;
use super::{airport_coords, Direction, RideQuote, RideQuoteRequest};

const METERS_PER_MILE: f64 = 1609.344;

/// Distance/duration between two places, as the provider reported it.
#[derive(Debug, Clone, Copy)]
pub struct DrivingEstimate {
    pub meters: f64,
    pub seconds: f64,
}

/// Seam for the external mapping service so tests can inject a fake.
#[async_trait]
pub trait MappingService: Send + Sync {
    /// One driving-mode distance query. `origin`/`destination` are free-text
    /// addresses or `"lat,lng"` strings.
    async fn driving_estimate(
        &self,
        origin: &str,
        destination: &str,
        departure_epoch: Option<i64>,
    ) -> anyhow::Result<DrivingEstimate>;
}

/// Distance-matrix-style HTTP client.
pub struct DistanceMatrixClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl DistanceMatrixClient {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self {
            client,
            api_key,
            base_url: "https://maps.googleapis.com/maps/api/distancematrix/json".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Default, Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    distance: Option<MatrixValue>,
    duration: Option<MatrixValue>,
    #[serde(default)]
    duration_in_traffic: Option<MatrixValue>,
}

#[derive(Debug, Deserialize)]
struct MatrixValue {
    value: f64,
}

#[async_trait]
impl MappingService for DistanceMatrixClient {
    async fn driving_estimate(
        &self,
        origin: &str,
        destination: &str,
        departure_epoch: Option<i64>,
    ) -> anyhow::Result<DrivingEstimate> {
        let mut params = vec![
            ("origins", origin.to_string()),
            ("destinations", destination.to_string()),
            ("mode", "driving".to_string()),
            ("key", self.api_key.clone()),
        ];
        if let Some(epoch) = departure_epoch {
            params.push(("departure_time", epoch.to_string()));
        }

        let body: MatrixResponse = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if body.status != "OK" {
            anyhow::bail!("mapping provider status {}", body.status);
        }
        let element = body
            .rows
            .first()
            .and_then(|row| row.elements.first())
            .ok_or_else(|| anyhow::anyhow!("empty distance matrix response"))?;
        if element.status != "OK" {
            anyhow::bail!("distance element status {}", element.status);
        }

        let meters = element
            .distance
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("element missing distance"))?
            .value;
        // Traffic-aware duration when the provider supplies it.
        let seconds = element
            .duration_in_traffic
            .as_ref()
            .or(element.duration.as_ref())
            .ok_or_else(|| anyhow::anyhow!("element missing duration"))?
            .value;

        Ok(DrivingEstimate { meters, seconds })
    }
}

/// Orchestrates the quota governor, the mapping client and the heuristic
/// distance math into one estimate per request.
pub struct RideCostEstimator {
    mapping: Option<Arc<dyn MappingService>>,
    quota: QuotaGovernor,
    fares: FareSchedule,
}

impl RideCostEstimator {
    pub fn new(mapping: Option<Arc<dyn MappingService>>, quota: QuotaGovernor) -> Self {
        Self {
            mapping,
            quota,
            fares: FareSchedule::default(),
        }
    }

    pub fn with_fares(mut self, fares: FareSchedule) -> Self {
        self.fares = fares;
        self
    }

    /// Produce a quote, or `None` when the ride is unavailable.
    pub async fn estimate(&self, request: &RideQuoteRequest) -> Option<RideQuote> {
        let (hour, departure_epoch) = resolve_departure(request.time_of_day.as_deref());

        if let Some(quote) = self.mapping_tier(request, departure_epoch).await {
            return Some(quote);
        }

        // A non-finite or negative mileage is no mileage at all; absence
        // yields "no estimate", never a garbage quote.
        let miles = request
            .miles_override
            .filter(|m| m.is_finite() && *m >= 0.0);
        if miles != request.miles_override {
            debug!(miles = ?request.miles_override, "ignoring unusable mileage override");
        }
        if let Some(miles) = miles {
            let factor = speed_factor_for_hour(hour);
            debug!(miles, hour, factor, "using heuristic mileage tier");
            return Some(heuristic_quote(miles, factor, &self.fares));
        }

        debug!(airport = %request.airport_code, "no address estimate and no mileage, ride unavailable");
        None
    }

    async fn mapping_tier(
        &self,
        request: &RideQuoteRequest,
        departure_epoch: i64,
    ) -> Option<RideQuote> {
        let mapping = self.mapping.as_ref()?;
        let address = request.address.as_deref()?;
        let Some((lat, lng)) = airport_coords(&request.airport_code) else {
            debug!(airport = %request.airport_code, "unknown airport, skipping mapping tier");
            return None;
        };
        if !self.quota.can_call() {
            debug!("daily mapping quota exhausted, skipping mapping tier");
            return None;
        }

        let airport = format!("{lat},{lng}");
        let (origin, destination) = match request.direction {
            Direction::ToAirport => (address.to_string(), airport),
            Direction::FromAirport => (airport, address.to_string()),
        };

        match mapping
            .driving_estimate(&origin, &destination, Some(departure_epoch))
            .await
        {
            Ok(estimate) => {
                // Only successful calls count against the daily budget.
                self.quota.record_call();
                let miles = estimate.meters / METERS_PER_MILE;
                let duration_minutes = (estimate.seconds / 60.0).round().max(0.0) as i64;
                Some(RideQuote {
                    cost_usd: fare_for(miles, duration_minutes, &self.fares),
                    duration_minutes,
                })
            }
            Err(e) => {
                warn!(error = %e, "mapping-service estimate failed, falling through");
                None
            }
        }
    }
}

/// Resolve the departure to `(hour_of_day, epoch_seconds)`: an explicit
/// `HH:MM` today, otherwise now.
fn resolve_departure(time_of_day: Option<&str>) -> (u32, i64) {
    let now = Local::now();
    if let Some(raw) = time_of_day {
        if let Ok(time) = NaiveTime::parse_from_str(raw.trim(), "%H:%M") {
            if let Some(departure) = now
                .date_naive()
                .and_time(time)
                .and_local_timezone(Local)
                .earliest()
            {
                return (time.hour(), departure.timestamp());
            }
        }
        debug!(time = raw, "unparseable time of day, using now");
    }
    (now.hour(), now.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedMapping {
        estimate: DrivingEstimate,
        calls: AtomicUsize,
    }

    impl FixedMapping {
        fn new(meters: f64, seconds: f64) -> Arc<Self> {
            Arc::new(Self {
                estimate: DrivingEstimate { meters, seconds },
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl MappingService for FixedMapping {
        async fn driving_estimate(
            &self,
            _origin: &str,
            _destination: &str,
            _departure_epoch: Option<i64>,
        ) -> anyhow::Result<DrivingEstimate> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.estimate)
        }
    }

    struct FailingMapping {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MappingService for FailingMapping {
        async fn driving_estimate(
            &self,
            _origin: &str,
            _destination: &str,
            _departure_epoch: Option<i64>,
        ) -> anyhow::Result<DrivingEstimate> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("provider unreachable")
        }
    }

    fn quota_in(dir: &tempfile::TempDir, limit: i64) -> QuotaGovernor {
        QuotaGovernor::new(dir.path().join("quota.json"), limit)
    }

    fn request(address: Option<&str>, miles: Option<f64>) -> RideQuoteRequest {
        RideQuoteRequest {
            airport_code: "SAN".to_string(),
            address: address.map(str::to_string),
            miles_override: miles,
            time_of_day: Some("13:00".to_string()),
            direction: Direction::ToAirport,
        }
    }

    #[tokio::test]
    async fn mapping_tier_wins_and_records_quota() {
        let dir = tempfile::tempdir().unwrap();
        let mapping = FixedMapping::new(10.0 * METERS_PER_MILE, 21.0 * 60.0);
        let estimator = RideCostEstimator::new(Some(mapping.clone()), quota_in(&dir, 5));

        let quote = estimator.estimate(&request(Some("UCSD"), None)).await.unwrap();
        assert_eq!(quote.duration_minutes, 21);
        assert_eq!(quote.cost_usd, 23.55);
        assert_eq!(mapping.calls.load(Ordering::SeqCst), 1);
        // The successful call consumed quota.
        let remaining = quota_in(&dir, 1);
        assert!(!remaining.can_call());
    }

    #[tokio::test]
    async fn exhausted_quota_skips_straight_to_heuristic() {
        let dir = tempfile::tempdir().unwrap();
        let quota = quota_in(&dir, 1);
        quota.record_call();

        let mapping = FixedMapping::new(1000.0, 60.0);
        let estimator = RideCostEstimator::new(Some(mapping.clone()), quota);
        let quote = estimator
            .estimate(&request(Some("UCSD"), Some(10.0)))
            .await
            .unwrap();

        assert_eq!(mapping.calls.load(Ordering::SeqCst), 0);
        // 13:00 is a shoulder hour: 28 * 0.9 = 25.2 mph.
        let expected = heuristic_quote(10.0, 0.90, &FareSchedule::default());
        assert_eq!(quote, expected);
    }

    #[tokio::test]
    async fn mapping_failure_falls_through_without_spending_quota() {
        let dir = tempfile::tempdir().unwrap();
        let mapping = Arc::new(FailingMapping {
            calls: AtomicUsize::new(0),
        });
        let estimator = RideCostEstimator::new(Some(mapping.clone()), quota_in(&dir, 5));

        let quote = estimator
            .estimate(&request(Some("UCSD"), Some(10.0)))
            .await
            .unwrap();
        assert_eq!(mapping.calls.load(Ordering::SeqCst), 1);
        assert_eq!(quote, heuristic_quote(10.0, 0.90, &FareSchedule::default()));
        // The failed call stayed free.
        assert!(quota_in(&dir, 1).can_call());
    }

    #[tokio::test]
    async fn unusable_mileage_counts_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let estimator = RideCostEstimator::new(None, quota_in(&dir, 5));

        for miles in [-10.0, f64::NAN, f64::INFINITY] {
            let quote = estimator.estimate(&request(None, Some(miles))).await;
            assert!(quote.is_none(), "miles {miles}");
        }
    }

    #[tokio::test]
    async fn no_address_and_no_mileage_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let mapping = FixedMapping::new(1000.0, 60.0);
        let estimator = RideCostEstimator::new(Some(mapping.clone()), quota_in(&dir, 5));

        assert!(estimator.estimate(&request(None, None)).await.is_none());
        assert_eq!(mapping.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn mapping_failure_with_no_mileage_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let mapping = Arc::new(FailingMapping {
            calls: AtomicUsize::new(0),
        });
        let estimator = RideCostEstimator::new(Some(mapping), quota_in(&dir, 5));
        assert!(estimator.estimate(&request(Some("UCSD"), None)).await.is_none());
    }

    #[tokio::test]
    async fn unknown_airport_still_quotes_from_mileage() {
        let dir = tempfile::tempdir().unwrap();
        let mapping = FixedMapping::new(1000.0, 60.0);
        let estimator = RideCostEstimator::new(Some(mapping.clone()), quota_in(&dir, 5));

        let mut req = request(Some("somewhere"), Some(5.0));
        req.airport_code = "XXX".to_string();
        let quote = estimator.estimate(&req).await.unwrap();
        assert_eq!(mapping.calls.load(Ordering::SeqCst), 0);
        assert_eq!(quote, heuristic_quote(5.0, 0.90, &FareSchedule::default()));
    }

    #[tokio::test]
    async fn no_mapping_client_uses_heuristic_directly() {
        let dir = tempfile::tempdir().unwrap();
        let estimator = RideCostEstimator::new(None, quota_in(&dir, 5));
        let quote = estimator
            .estimate(&request(Some("UCSD"), Some(10.0)))
            .await
            .unwrap();
        assert_eq!(quote, heuristic_quote(10.0, 0.90, &FareSchedule::default()));
    }

    #[test]
    fn departure_resolution_prefers_explicit_time() {
        let (hour, _) = resolve_departure(Some("08:30"));
        assert_eq!(hour, 8);
        let (hour, _) = resolve_departure(Some(" 23:05 "));
        assert_eq!(hour, 23);
    }

    #[test]
    fn departure_resolution_falls_back_to_now() {
        // Tolerate the test straddling an hour boundary.
        let before = Local::now().hour();
        let (hour, _) = resolve_departure(Some("25:99"));
        let after = Local::now().hour();
        assert!(hour == before || hour == after);

        let before = Local::now().hour();
        let (hour, _) = resolve_departure(None);
        let after = Local::now().hour();
        assert!(hour == before || hour == after);
    }

    #[test]
    fn matrix_element_prefers_traffic_duration() {
        let body = r#"{
            "status": "OK",
            "rows": [{ "elements": [{
                "status": "OK",
                "distance": { "value": 16093.44 },
                "duration": { "value": 900 },
                "duration_in_traffic": { "value": 1260 }
            }]}]
        }"#;
        let parsed: MatrixResponse = serde_json::from_str(body).unwrap();
        let element = &parsed.rows[0].elements[0];
        let seconds = element
            .duration_in_traffic
            .as_ref()
            .or(element.duration.as_ref())
            .unwrap()
            .value;
        assert_eq!(seconds, 1260.0);
    }
}
