//! Delay model - artifact loading, feature encoding, inference.
//!
//! # Key Concepts
//! - Artifact: a JSON file holding either a bare model or a `{model, encoders}`
//!   bundle saved at training time.
//! - EncoderTables: category -> dense index maps for origin/destination/airline.
//! - Prediction: a total function; failures become `0.0`, never errors.

mod features;
mod predictor;

pub use features::{encode, FeatureVector};
pub use predictor::predict_delay;

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::bail;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

/// Linear regressor over the 5-feature vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayModel {
    /// One weight per feature, in feature-vector order.
    pub weights: Vec<f64>,
    pub intercept: f64,
}

impl DelayModel {
    /// Single-row inference: predicted arrival delay in minutes.
    pub fn predict(&self, features: &FeatureVector) -> anyhow::Result<f64> {
        if self.weights.len() != features.len() {
            bail!(
                "weight count mismatch: model has {}, features have {}",
                self.weights.len(),
                features.len()
            );
        }
        let delay = self
            .weights
            .iter()
            .zip(features.iter())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept;
        Ok(delay)
    }
}

/// Category -> dense index tables, built at training time, read-only here.
///
/// Indices are unique per domain and stable for the lifetime of one artifact.
/// An unseen category resolves to index 0, never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncoderTables {
    #[serde(default)]
    pub origin: HashMap<String, i64>,
    #[serde(default)]
    pub destination: HashMap<String, i64>,
    #[serde(default)]
    pub airline: HashMap<String, i64>,
}

impl EncoderTables {
    pub fn is_empty(&self) -> bool {
        self.origin.is_empty() && self.destination.is_empty() && self.airline.is_empty()
    }
}

/// The two artifact shapes a trainer may have saved.
#[derive(Deserialize)]
#[serde(untagged)]
enum Artifact {
    Bundle {
        model: DelayModel,
        #[serde(default)]
        encoders: Option<EncoderTables>,
    },
    Bare(DelayModel),
}

/// Load a model artifact.
///
/// A bundle without an `encoders` key (or with empty tables) loads as a model
/// with no tables, which switches the encoder to its hash fallback - the same
/// degraded-but-stable behavior as a bare artifact.
pub fn load_model(path: &Path) -> Result<(DelayModel, Option<EncoderTables>)> {
    let text = fs::read_to_string(path)
        .map_err(|e| Error::Artifact(format!("could not read {}: {e}", path.display())))?;
    let artifact: Artifact = serde_json::from_str(&text)
        .map_err(|e| Error::Artifact(format!("could not decode {}: {e}", path.display())))?;

    match artifact {
        Artifact::Bundle { model, encoders } => {
            let encoders = encoders.filter(|t| !t.is_empty());
            info!(
                path = %path.display(),
                encoders = encoders.is_some(),
                "model artifact loaded"
            );
            Ok((model, encoders))
        }
        Artifact::Bare(model) => {
            info!(path = %path.display(), "bare model artifact loaded, no encoder tables");
            Ok((model, None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_artifact(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{body}").unwrap();
        file
    }

    #[test]
    fn loads_bundle_with_encoders() {
        let file = write_artifact(
            r#"{
                "model": { "weights": [0.1, 0.2, 0.3, 0.4, 0.5], "intercept": 1.0 },
                "encoders": { "origin": { "SAN": 1 }, "destination": {}, "airline": { "WN": 2 } }
            }"#,
        );
        let (model, encoders) = load_model(file.path()).unwrap();
        assert_eq!(model.weights.len(), 5);
        let encoders = encoders.unwrap();
        assert_eq!(encoders.origin["SAN"], 1);
        assert_eq!(encoders.airline["WN"], 2);
    }

    #[test]
    fn bundle_without_encoders_loads_without_tables() {
        let file = write_artifact(
            r#"{ "model": { "weights": [0, 0, 0, 0, 0], "intercept": 0.0 } }"#,
        );
        let (_, encoders) = load_model(file.path()).unwrap();
        assert!(encoders.is_none());
    }

    #[test]
    fn bare_model_loads_without_tables() {
        let file = write_artifact(r#"{ "weights": [1, 1, 1, 1, 1], "intercept": 2.5 }"#);
        let (model, encoders) = load_model(file.path()).unwrap();
        assert_eq!(model.intercept, 2.5);
        assert!(encoders.is_none());
    }

    #[test]
    fn missing_file_is_an_artifact_error() {
        let err = load_model(Path::new("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, Error::Artifact(_)));
    }

    #[test]
    fn malformed_artifact_is_an_error() {
        let file = write_artifact("not json");
        assert!(load_model(file.path()).is_err());
    }

    #[test]
    fn predict_is_a_dot_product_plus_intercept() {
        let model = DelayModel {
            weights: vec![1.0, 2.0, 0.0, 0.5, 0.0],
            intercept: 3.0,
        };
        let delay = model.predict(&[1.0, 2.0, 100.0, 12.0, 0.0]).unwrap();
        assert!((delay - (1.0 + 4.0 + 6.0 + 3.0)).abs() < 1e-9);
    }

    #[test]
    fn predict_rejects_wrong_arity() {
        let model = DelayModel {
            weights: vec![1.0, 2.0],
            intercept: 0.0,
        };
        assert!(model.predict(&[0.0, 0.0, 0.0, 12.0, 0.0]).is_err());
    }
}
