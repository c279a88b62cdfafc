// Route exports
pub mod admin;
pub mod errors;
pub mod predict;

use actix_web::web;
use std::sync::Arc;

use crate::config::PredictionSettings;
use crate::core::Predictor;
use crate::services::{ListingsClient, QueryLog, RuleStore, SqliteStore};

pub use errors::{form_config, json_config, query_config};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<Predictor>,
    pub store: SqliteStore,
    pub query_log: QueryLog,
    pub rules: RuleStore,
    pub listings: Option<Arc<ListingsClient>>,
    pub prediction: PredictionSettings,
    pub admin_token: Option<String>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(predict::configure)
            .configure(admin::configure),
    );
}
