//! Flight resolution: live lookup, exact cache hit, or best-effort
//! similar record.
//!
//! The resolver always tries to return *something plausible* in cached mode
//! rather than fail outright: an exact cache hit first, then a random record
//! from the same carrier, then a random record from the whole cache. Live
//! mode issues exactly one upstream request; any transport or decode failure
//! is absorbed into a not-found answer, never retried.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{carrier_prefix, FlightRecord, UNKNOWN};
use crate::error::{Error, Result};

const AVIATIONSTACK_URL: &str = "http://api.aviationstack.com/v1/flights";

/// Wire shape of one upstream flight object. All fields optional; absent or
/// null values map to the `"Unknown"` sentinel.
#[derive(Debug, Default, Deserialize)]
struct RawFlight {
    #[serde(default)]
    flight: RawIdent,
    #[serde(default)]
    departure: RawEndpoint,
    #[serde(default)]
    arrival: RawEndpoint,
    #[serde(default)]
    airline: RawAirline,
    #[serde(default)]
    flight_status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawIdent {
    #[serde(default)]
    iata: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawEndpoint {
    #[serde(default)]
    iata: Option<String>,
    #[serde(default)]
    scheduled: Option<String>,
    #[serde(default)]
    actual: Option<String>,
    #[serde(default)]
    gate: Option<String>,
    #[serde(default)]
    terminal: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawAirline {
    #[serde(default)]
    iata: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    data: Vec<RawFlight>,
}

fn unknown() -> String {
    UNKNOWN.to_string()
}

impl RawFlight {
    fn into_record(self) -> FlightRecord {
        FlightRecord {
            flight_number: self.flight.iata.unwrap_or_else(unknown),
            airline: self.airline.iata.or(self.airline.name).unwrap_or_else(unknown),
            origin: self.departure.iata.unwrap_or_else(unknown),
            destination: self.arrival.iata.unwrap_or_else(unknown),
            scheduled_departure: self.departure.scheduled.unwrap_or_else(unknown),
            actual_departure: self.departure.actual.unwrap_or_else(unknown),
            gate: self.departure.gate.unwrap_or_else(unknown),
            terminal: self.departure.terminal.unwrap_or_else(unknown),
            status: self.flight_status.unwrap_or_else(unknown),
        }
    }
}

/// Resolves a flight identifier to a [`FlightRecord`].
pub struct FlightResolver {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    cache_dir: PathBuf,
    // Seedable so tests can pin the similar-record selection.
    rng: Mutex<StdRng>,
}

impl FlightResolver {
    pub fn new(client: reqwest::Client, api_key: Option<String>, cache_dir: PathBuf) -> Self {
        Self {
            client,
            api_key,
            base_url: AVIATIONSTACK_URL.to_string(),
            cache_dir,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Pin the randomness source for deterministic selection.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Resolve a flight identifier. `mock` selects the cached/offline path.
    ///
    /// `Ok(None)` is the not-found signal; external failures never propagate
    /// past this boundary. The only error is a configuration one: live mode
    /// without a credential.
    pub async fn resolve(&self, flight_number: &str, mock: bool) -> Result<Option<FlightRecord>> {
        if mock {
            Ok(self.resolve_cached(flight_number))
        } else {
            self.resolve_live(flight_number).await
        }
    }

    async fn resolve_live(&self, flight_number: &str) -> Result<Option<FlightRecord>> {
        let key = self.api_key.as_deref().ok_or_else(|| {
            Error::Config(
                "AVIATIONSTACK_API_KEY is not configured; set it or use mock mode".to_string(),
            )
        })?;

        // One request, no retries; a failure is immediately a not-found.
        let response = match self
            .client
            .get(&self.base_url)
            .query(&[("access_key", key), ("flight_iata", flight_number)])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(flight = flight_number, error = %e, "flight lookup request failed");
                return Ok(None);
            }
        };

        let payload: LookupResponse = match response.error_for_status() {
            Ok(response) => match response.json().await {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(flight = flight_number, error = %e, "could not decode flight lookup response");
                    return Ok(None);
                }
            },
            Err(e) => {
                warn!(flight = flight_number, error = %e, "flight lookup returned an error status");
                return Ok(None);
            }
        };

        match payload.data.into_iter().next() {
            Some(raw) => Ok(Some(raw.into_record())),
            None => {
                debug!(flight = flight_number, "no flight data in lookup response");
                Ok(None)
            }
        }
    }

    fn resolve_cached(&self, flight_number: &str) -> Option<FlightRecord> {
        let exact = self.cache_dir.join(format!("{flight_number}.json"));
        if let Some(record) = read_cached_record(&exact) {
            debug!(flight = flight_number, "exact cache hit");
            return Some(record);
        }

        let all = self.load_all_cached();
        if all.is_empty() {
            warn!(dir = %self.cache_dir.display(), "flight cache is empty");
            return None;
        }

        let prefix = carrier_prefix(flight_number);
        let same_carrier: Vec<&FlightRecord> = if prefix.is_empty() {
            Vec::new()
        } else {
            all.iter()
                .filter(|r| carrier_prefix(&r.flight_number) == prefix)
                .collect()
        };

        let pool = if same_carrier.is_empty() {
            debug!(
                flight = flight_number,
                "no cached record for carrier {prefix:?}, sampling whole cache"
            );
            all.iter().collect()
        } else {
            same_carrier
        };

        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        pool.choose(&mut *rng).map(|r| (*r).clone())
    }

    fn load_all_cached(&self) -> Vec<FlightRecord> {
        let entries = match fs::read_dir(&self.cache_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %self.cache_dir.display(), error = %e, "could not read flight cache");
                return Vec::new();
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        // Stable order so a seeded rng selects reproducibly.
        paths.sort();

        paths.iter().filter_map(|p| read_cached_record(p)).collect()
    }
}

fn read_cached_record(path: &Path) -> Option<FlightRecord> {
    let text = fs::read_to_string(path).ok()?;
    match serde_json::from_str::<RawFlight>(&text) {
        Ok(raw) => Some(raw.into_record()),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "skipping unreadable cache file");
            None
        }
    }
}
