//! FlyCast - flight arrival-delay prediction with tiered airport ride
//! estimates.
//!
//! Startup loads configuration and the model artifact once, wires the
//! components into shared state, and serves the HTTP API. A missing model or
//! history store degrades the relevant endpoint instead of aborting startup.

mod api;
mod config;
mod error;
mod flight;
mod model;
mod ride;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::Config;
use crate::flight::FlightResolver;
use crate::ride::{DistanceMatrixClient, MappingService, QuotaGovernor, RideCostEstimator};
use crate::store::Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("flycast=info,tower_http=warn")),
        )
        .init();

    let config = Config::from_env();

    let (model, encoders) = match model::load_model(&config.model_path) {
        Ok((model, encoders)) => (Some(model), encoders),
        Err(e) => {
            warn!(error = %e, "model unavailable; /api/predict will refuse until one is provided");
            (None, None)
        }
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()?;

    let resolver = FlightResolver::new(
        client.clone(),
        config.aviation_api_key.clone(),
        config.mock_dir.clone(),
    );

    let quota = QuotaGovernor::new(config.quota_path.clone(), config.daily_quota);
    let mapping = config
        .maps_api_key
        .clone()
        .map(|key| Arc::new(DistanceMatrixClient::new(client, key)) as Arc<dyn MappingService>);
    if mapping.is_none() {
        info!("no mapping credential configured, ride estimates use the heuristic tier only");
    }
    let estimator = RideCostEstimator::new(mapping, quota);

    let db_store = match Store::open(&config.db_path) {
        Ok(db_store) => Some(db_store),
        Err(e) => {
            warn!(error = %e, "history store unavailable, saves will be declined");
            None
        }
    };

    let port = config.port;
    let state = Arc::new(AppState {
        config,
        model,
        encoders,
        resolver,
        estimator,
        store: db_store,
    });

    let app = api::router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
