//! Route handlers and shared application state.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::types::{
    delay_status, ErrorResponse, PredictRequest, PredictResponse, RideRequest, RideResponse,
};
use crate::config::Config;
use crate::error::Error;
use crate::flight::{is_valid_flight_number, FlightResolver};
use crate::model::{predict_delay, DelayModel, EncoderTables};
use crate::ride::{round2, RideCostEstimator};
use crate::store::Store;

/// Everything the handlers need, built once at startup. No ambient globals;
/// the core stays testable without process state.
pub struct AppState {
    pub config: Config,
    pub model: Option<DelayModel>,
    pub encoders: Option<EncoderTables>,
    pub resolver: FlightResolver,
    pub estimator: RideCostEstimator,
    pub store: Option<Store>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/predict", post(predict))
        .route("/api/ride", post(ride))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "model_loaded": state.model.is_some(),
        "store_available": state.store.is_some(),
    }))
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Some(flight_number) = request.flight_number.as_deref() else {
        return Err(api_error(StatusCode::BAD_REQUEST, "missing flight_number"));
    };
    let flight_number = flight_number.trim().to_uppercase();
    if !is_valid_flight_number(&flight_number) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("invalid flight number {flight_number:?}, expected e.g. WN1254"),
        ));
    }
    if state.model.is_none() {
        return Err(api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "no model loaded, cannot predict",
        ));
    }

    let mock = request.mock.unwrap_or(state.config.use_mock);
    let record = match state.resolver.resolve(&flight_number, mock).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            return Err(api_error(
                StatusCode::NOT_FOUND,
                format!("could not fetch flight data for {flight_number}"),
            ))
        }
        Err(Error::Config(message)) => {
            return Err(api_error(StatusCode::SERVICE_UNAVAILABLE, message))
        }
        Err(e) => {
            warn!(flight = %flight_number, error = %e, "unexpected resolver error");
            return Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "flight resolution failed",
            ));
        }
    };

    let delay = round2(predict_delay(
        state.model.as_ref(),
        &record,
        state.encoders.as_ref(),
    ));
    info!(flight = %flight_number, delay, mock, "prediction served");

    let (record_id, save_error) = if request.save {
        save_prediction(&state, &record, delay)
    } else {
        (None, None)
    };

    Ok(Json(PredictResponse {
        flight_number,
        status: delay_status(delay),
        flight: record,
        predicted_delay_minutes: delay,
        record_id,
        save_error,
    }))
}

async fn ride(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RideRequest>,
) -> Json<RideResponse> {
    let airport_code = request.quote.airport_code.to_uppercase();
    let quote = state.estimator.estimate(&request.quote).await;

    let (record_id, save_error) = match (&quote, request.save) {
        (Some(quote), true) => save_quote(&state, request.prediction_id, &airport_code, quote),
        _ => (None, None),
    };

    let status = if quote.is_some() { "ok" } else { "unavailable" };
    Json(RideResponse {
        airport_code,
        status: status.to_string(),
        quote,
        record_id,
        save_error,
    })
}

fn save_prediction(
    state: &AppState,
    record: &crate::flight::FlightRecord,
    delay: f64,
) -> (Option<i64>, Option<String>) {
    let Some(store) = state.store.as_ref() else {
        return (None, Some("history store is unavailable".to_string()));
    };
    match store.save_prediction(record, delay) {
        Ok(id) => (Some(id), None),
        Err(e) => {
            warn!(error = %e, "could not save prediction");
            (None, Some(e.to_string()))
        }
    }
}

fn save_quote(
    state: &AppState,
    prediction_id: Option<i64>,
    airport_code: &str,
    quote: &crate::ride::RideQuote,
) -> (Option<i64>, Option<String>) {
    let Some(store) = state.store.as_ref() else {
        return (None, Some("history store is unavailable".to_string()));
    };
    match store.save_ride_quote(prediction_id, airport_code, quote) {
        Ok(id) => (Some(id), None),
        Err(e) => {
            warn!(error = %e, "could not save ride quote");
            (None, Some(e.to_string()))
        }
    }
}
