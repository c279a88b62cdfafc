use crate::core::artifacts::{load_json, ArtifactError, ArtifactPaths, EncoderArtifact, ModelArtifact, PolynomialArtifact, TargetTransform};
use crate::core::model::{LinearRegression, ModelError, Regressor};
use crate::core::preprocess::Preprocessor;
use crate::models::{FeatureRecord, ModelSummary, PredictionResult};

/// z-score of a two-sided 95% interval
pub const Z_95: f64 = 1.96;

/// How the confidence band around a prediction is sized
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IntervalPolicy {
    /// Constant ± margin in price units
    Fixed { margin: f64 },
    /// ± z × residual standard deviation recorded at training time.
    /// Uses `fallback_margin` when the model carries no residual std.
    ResidualStd { z: f64, fallback_margin: f64 },
}

impl Default for IntervalPolicy {
    fn default() -> Self {
        IntervalPolicy::Fixed { margin: 20_000.0 }
    }
}

impl IntervalPolicy {
    fn margin(&self, residual_std: Option<f64>) -> f64 {
        match *self {
            IntervalPolicy::Fixed { margin } => margin,
            IntervalPolicy::ResidualStd { z, fallback_margin } => match residual_std {
                Some(std) => z * std,
                None => fallback_margin,
            },
        }
    }
}

/// Preprocessor + regression model + interval policy
pub struct Predictor {
    preprocessor: Preprocessor,
    model: Box<dyn Regressor>,
    target_transform: TargetTransform,
    margin: f64,
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("input_features", &self.preprocessor.polynomial().n_features_in())
            .field("expanded_features", &self.model.n_features())
            .field("target_transform", &self.target_transform)
            .field("margin", &self.margin)
            .finish()
    }
}

impl Predictor {
    pub fn new(
        preprocessor: Preprocessor,
        model: Box<dyn Regressor>,
        target_transform: TargetTransform,
        residual_std: Option<f64>,
        policy: IntervalPolicy,
    ) -> Result<Self, ArtifactError> {
        if model.n_features() != preprocessor.output_width() {
            return Err(ArtifactError::Shape(format!(
                "model has {} coefficients but the transformer produces {} features",
                model.n_features(),
                preprocessor.output_width()
            )));
        }

        let margin = policy.margin(residual_std);
        if !margin.is_finite() || margin < 0.0 {
            return Err(ArtifactError::Invalid(format!(
                "confidence margin must be a finite non-negative number, got {}",
                margin
            )));
        }

        Ok(Self {
            preprocessor,
            model,
            target_transform,
            margin,
        })
    }

    /// Build the pipeline from already-parsed artifacts
    pub fn from_artifacts(
        encoder: EncoderArtifact,
        poly: PolynomialArtifact,
        model: ModelArtifact,
        policy: IntervalPolicy,
    ) -> Result<Self, ArtifactError> {
        let preprocessor = Preprocessor::from_artifacts(encoder, poly)?;
        let regressor = LinearRegression::from_artifact(&model);

        Self::new(
            preprocessor,
            Box::new(regressor),
            model.target_transform,
            model.residual_std,
            policy,
        )
    }

    /// Load the three artifacts from disk
    pub fn load(paths: &ArtifactPaths, policy: IntervalPolicy) -> Result<Self, ArtifactError> {
        let encoder: EncoderArtifact = load_json(&paths.encoder)?;
        let poly: PolynomialArtifact = load_json(&paths.poly)?;
        let model: ModelArtifact = load_json(&paths.model)?;

        let predictor = Self::from_artifacts(encoder, poly, model, policy)?;
        tracing::info!(
            "Loaded model pipeline: {} inputs -> {} features, {} known zipcodes, ±{:.0} interval",
            predictor.preprocessor.polynomial().n_features_in(),
            predictor.model.n_features(),
            predictor.preprocessor.encoder().width(),
            predictor.margin
        );

        Ok(predictor)
    }

    /// Half-width of the confidence interval in price units
    pub fn margin(&self) -> f64 {
        self.margin
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            input_features: self.preprocessor.polynomial().n_features_in(),
            expanded_features: self.model.n_features(),
            known_zipcodes: self.preprocessor.encoder().width(),
        }
    }

    /// Estimate the price of a house
    pub fn predict(&self, features: &FeatureRecord) -> Result<PredictionResult, ModelError> {
        let row = self.preprocessor.transform(features)?;
        let raw = self.model.predict_row(&row)?;
        let price = self.target_transform.invert(raw);

        if !price.is_finite() {
            return Err(ModelError::NonFinite(price));
        }

        tracing::debug!("Model output {:.6} -> price {:.2}", raw, price);

        Ok(PredictionResult {
            price,
            confidence_low: price - self.margin,
            confidence_high: price + self.margin,
        })
    }
}
