//! Homeworth - house price estimation service
//!
//! Turns a handful of house attributes into a price estimate with a
//! confidence band, using a regression pipeline trained offline (ZIP one-hot
//! encoding, polynomial expansion, linear model on a log1p target). Each
//! successful estimate is appended to a SQLite query log, and stored
//! buy/sell rules are matched against the attributes to produce
//! recommendations.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{recommend, IntervalPolicy, Predictor};
pub use models::{FeatureRecord, Purpose, PredictionResult, RecommendationRule, QueryLogEntry, PredictRequest, PredictResponse};
