use crate::core::artifacts::ModelArtifact;
use crate::core::preprocess::PreprocessError;
use thiserror::Error;

/// Errors raised while producing a prediction
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),

    #[error("model expects {expected} features, got {actual}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("model produced a non-finite value: {0}")]
    NonFinite(f64),
}

/// A fitted single-output regression model
pub trait Regressor: Send + Sync {
    /// Number of input features the model was fitted on
    fn n_features(&self) -> usize;

    /// Raw model output for one preprocessed row
    fn predict_row(&self, row: &[f64]) -> Result<f64, ModelError>;
}

/// Ordinary least squares model: `intercept + Σ coefficients[i] · row[i]`
#[derive(Debug, Clone)]
pub struct LinearRegression {
    coefficients: Box<[f64]>,
    intercept: f64,
}

impl LinearRegression {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients: coefficients.into_boxed_slice(),
            intercept,
        }
    }

    pub fn from_artifact(artifact: &ModelArtifact) -> Self {
        Self::new(artifact.coefficients.clone(), artifact.intercept)
    }
}

impl Regressor for LinearRegression {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict_row(&self, row: &[f64]) -> Result<f64, ModelError> {
        if row.len() != self.coefficients.len() {
            return Err(ModelError::FeatureCount {
                expected: self.coefficients.len(),
                actual: row.len(),
            });
        }

        let dot: f64 = self
            .coefficients
            .iter()
            .zip(row)
            .map(|(w, x)| w * x)
            .sum();

        Ok(self.intercept + dot)
    }
}
