use serde::{Deserialize, Serialize};
use crate::models::domain::StoredQuery;
use crate::services::ListingsLookup;

/// Response for the predict endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predicted_price: f64,
    pub confidence_interval: [f64; 2],
    pub recommendations: Vec<String>,
    pub search_url: String,
    /// False when the query was dropped as a same-second duplicate
    pub logged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listings: Option<ListingsLookup>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub model: ModelSummary,
}

/// Shape of the loaded model pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSummary {
    pub input_features: usize,
    pub expanded_features: usize,
    pub known_zipcodes: usize,
}

/// Admin listing of logged queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryListResponse {
    pub queries: Vec<StoredQuery>,
    pub count: usize,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
