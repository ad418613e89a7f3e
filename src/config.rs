//! Process configuration.
//!
//! Everything is read once from the environment at startup and handed to the
//! components that need it. Nothing in the core reads the environment after
//! this point, which keeps the resolver/predictor/estimator testable without
//! process state.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen port.
    pub port: u16,
    /// Model artifact (bare model or `{model, encoders}` bundle).
    pub model_path: PathBuf,
    /// Directory of cached flight JSON files, one `<CODE>.json` per flight.
    pub mock_dir: PathBuf,
    /// Default resolver mode when a request does not say otherwise.
    pub use_mock: bool,
    /// SQLite database for saved predictions and ride quotes.
    pub db_path: PathBuf,
    /// Durable daily counter for the metered mapping service.
    pub quota_path: PathBuf,
    /// Daily cap on mapping-service calls. Zero or negative disables tier 1.
    pub daily_quota: i64,
    /// Timeout for every external call; expired calls downgrade to the next tier.
    pub http_timeout_secs: u64,
    /// Flight-lookup credential. Absent means live mode cannot proceed.
    pub aviation_api_key: Option<String>,
    /// Mapping-service credential. Absent means the mapping tier never enters.
    pub maps_api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env_parse("FLYCAST_PORT", 8080),
            model_path: env_var("FLYCAST_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("model/model.json")),
            mock_dir: env_var("FLYCAST_MOCK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("mock_flights")),
            use_mock: env_var("FLYCAST_USE_MOCK").as_deref().unwrap_or("1") == "1",
            db_path: env_var("FLYCAST_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("flycast.db")),
            quota_path: env_var("FLYCAST_QUOTA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("maps_quota.json")),
            daily_quota: env_parse("FLYCAST_DAILY_QUOTA", 100),
            http_timeout_secs: env_parse("FLYCAST_HTTP_TIMEOUT_SECS", 10),
            aviation_api_key: env_var("AVIATIONSTACK_API_KEY"),
            maps_api_key: env_var("MAPS_API_KEY"),
        }
    }
}

/// Read an environment variable, treating empty/whitespace values as unset.
fn env_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr + Copy>(name: &str, default: T) -> T {
    match env_var(name) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("could not parse {}={:?}, using default", name, raw);
            default
        }),
        None => default,
    }
}
