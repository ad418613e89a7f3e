//! Error types for FlyCast.

use thiserror::Error;

/// Crate error type.
///
/// Most components deliberately do not return this: the encoder, predictor
/// and ride estimator have total contracts and absorb failures into
/// documented defaults. `Error` covers the places a caller genuinely has to
/// be told "cannot proceed" - missing credentials, a broken model artifact,
/// or the persistence sink.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid process configuration (credentials, paths).
    #[error("configuration error: {0}")]
    Config(String),

    /// The model artifact could not be read or decoded.
    #[error("model artifact error: {0}")]
    Artifact(String),

    /// HTTP transport error talking to an external service.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Persistence sink error.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
