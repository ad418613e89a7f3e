//! HTTP API for FlyCast.
//!
//! ## Endpoints
//!
//! - `POST /api/predict` - resolve a flight and predict its arrival delay
//! - `POST /api/ride` - estimate ground transportation to/from the airport
//! - `GET /api/health` - health check

mod routes;
mod types;

pub use routes::{router, AppState};
pub use types::*;
