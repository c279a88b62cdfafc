//! Serialized model artifacts produced by the offline training step.
//!
//! The training job exports three JSON documents: the ZIP code encoder, the
//! polynomial transformer and the fitted regression model. They are read
//! once at startup; any failure here is fatal for the service.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or validating artifacts
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse artifact {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("artifact shape mismatch: {0}")]
    Shape(String),

    #[error("invalid predictor settings: {0}")]
    Invalid(String),
}

/// What to do with a category that was not seen during training
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleUnknown {
    #[default]
    Ignore,
    Error,
}

/// Fitted one-hot encoder for a single categorical column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderArtifact {
    #[serde(default = "default_encoded_feature")]
    pub feature: String,
    pub categories: Vec<String>,
    #[serde(default)]
    pub handle_unknown: HandleUnknown,
}

fn default_encoded_feature() -> String { "zipcode".to_string() }

/// Fitted polynomial feature transformer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolynomialArtifact {
    pub degree: u32,
    #[serde(default)]
    pub interaction_only: bool,
    #[serde(default = "default_include_bias")]
    pub include_bias: bool,
    /// Column names in the order the transformer was fitted on
    pub input_features: Vec<String>,
}

fn default_include_bias() -> bool { true }

/// Transform applied to the target before fitting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetTransform {
    #[default]
    Log1p,
    Identity,
}

impl TargetTransform {
    /// Map a raw model output back to price units
    #[inline]
    pub fn invert(&self, value: f64) -> f64 {
        match self {
            TargetTransform::Log1p => value.exp_m1(),
            TargetTransform::Identity => value,
        }
    }
}

/// Fitted linear regression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub target_transform: TargetTransform,
    /// Standard deviation of held-out residuals, in price units
    #[serde(default)]
    pub residual_std: Option<f64>,
}

/// Filesystem locations of the three artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub encoder: PathBuf,
    pub poly: PathBuf,
    pub model: PathBuf,
}

impl ArtifactPaths {
    /// Standard file names inside a single directory
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            encoder: dir.join("encoder.json"),
            poly: dir.join("poly.json"),
            model: dir.join("model.json"),
        }
    }
}

/// Read and deserialize a single JSON artifact
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let raw = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.display().to_string(),
        source,
    })?;

    serde_json::from_str(&raw).map_err(|source| ArtifactError::Parse {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoder_defaults() {
        let encoder: EncoderArtifact =
            serde_json::from_str(r#"{"categories": ["98001", "98052"]}"#).unwrap();
        assert_eq!(encoder.feature, "zipcode");
        assert_eq!(encoder.handle_unknown, HandleUnknown::Ignore);
    }

    #[test]
    fn test_model_defaults_to_log1p() {
        let model: ModelArtifact =
            serde_json::from_str(r#"{"coefficients": [0.5], "intercept": 1.0}"#).unwrap();
        assert_eq!(model.target_transform, TargetTransform::Log1p);
        assert!(model.residual_std.is_none());
    }

    #[test]
    fn test_invert_log1p() {
        let price = 425_000.0_f64;
        let inverted = TargetTransform::Log1p.invert(price.ln_1p());
        assert!((inverted - price).abs() < 1e-6);
        assert_eq!(TargetTransform::Identity.invert(12.5), 12.5);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = load_json::<ModelArtifact>(Path::new("/nonexistent/model.json"));
        assert!(matches!(result, Err(ArtifactError::Io { .. })));
    }

    #[test]
    fn test_paths_in_dir() {
        let paths = ArtifactPaths::in_dir("model/saved_model");
        assert_eq!(paths.poly, PathBuf::from("model/saved_model/poly.json"));
    }
}
