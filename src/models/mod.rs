// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{FeatureRecord, Purpose, ParsePurposeError, PredictionResult, Comparator, RecommendationRule, QueryLogEntry, StoredQuery};
pub use requests::{PredictRequest, RequestError};
pub use responses::{PredictResponse, HealthResponse, ModelSummary, QueryListResponse, ErrorResponse};
