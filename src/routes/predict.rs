use actix_web::{guard, http::header, web, HttpResponse, Responder};
use validator::Validate;

use crate::core::{listings_search_url, recommend};
use crate::models::{ErrorResponse, HealthResponse, PredictRequest, PredictResponse, QueryLogEntry};
use crate::routes::AppState;
use crate::services::AppendOutcome;

const GENERIC_FAILURE: &str = "Sorry, something went wrong on our end. Please try again later.";

/// Configure prediction routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .service(
            web::resource("/predict")
                .route(web::post().guard(guard::fn_guard(is_json)).to(predict_json))
                .route(web::post().to(predict_form)),
        );
}

fn is_json(ctx: &guard::GuardContext<'_>) -> bool {
    ctx.head()
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim_start().to_ascii_lowercase().starts_with("application/json"))
        .unwrap_or(false)
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = match state.store.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::warn!("Store health check failed: {}", e);
            false
        }
    };

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        model: state.predictor.summary(),
    })
}

/// POST /api/v1/predict with a JSON body
async fn predict_json(state: web::Data<AppState>, req: web::Json<PredictRequest>) -> HttpResponse {
    handle_prediction(&state, req.into_inner()).await
}

/// POST /api/v1/predict with an urlencoded form body
async fn predict_form(state: web::Data<AppState>, req: web::Form<PredictRequest>) -> HttpResponse {
    handle_prediction(&state, req.into_inner()).await
}

/// Validate, predict, log, recommend.
///
/// Request body (JSON or form):
/// ```json
/// {
///   "sqft_living": 1800,
///   "no_of_bedrooms": 3,
///   "no_of_bathrooms": 2,
///   "sqft_lot": 7500,
///   "no_of_floors": 2,
///   "house_age": 10,
///   "zipcode": "98052",
///   "purpose": "buy"
/// }
/// ```
async fn handle_prediction(state: &AppState, req: PredictRequest) -> HttpResponse {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for predict request: {}", errors);
        return bad_request("Validation failed", errors.to_string());
    }

    let features = match req.into_features(state.prediction.zipcode_range()) {
        Ok(features) => features,
        Err(e) => {
            tracing::info!("Rejected predict request: {}", e);
            return bad_request("Invalid input", e.to_string());
        }
    };

    let prediction = match state.predictor.predict(&features) {
        Ok(prediction) => prediction,
        Err(e) => {
            tracing::error!("Prediction failed for zipcode {}: {}", features.zipcode, e);
            return internal_error("Prediction failed");
        }
    };

    let entry = QueryLogEntry::now(features, prediction.price);
    let logged = match state.query_log.append(&entry).await {
        Ok(AppendOutcome::Inserted(_)) => true,
        Ok(AppendOutcome::Duplicate) => false,
        Err(e) => {
            tracing::error!("Failed to log query: {}", e);
            return internal_error("Failed to record query");
        }
    };
    let features = entry.features;

    let rules = match state.rules.rules_for(features.purpose).await {
        Ok(rules) => rules,
        Err(e) => {
            tracing::error!("Failed to load recommendation rules: {}", e);
            return internal_error("Failed to load recommendations");
        }
    };
    let recommendations = recommend(features.purpose, &features, &rules);

    let search_url = listings_search_url(
        &state.prediction.search_base_url,
        &features.zipcode,
        prediction.price,
        state.prediction.search_window,
    );

    let listings = match &state.listings {
        Some(client) => Some(client.lookup(&search_url).await),
        None => None,
    };

    tracing::info!(
        "Predicted {:.0} for {} in {} ({} recommendations)",
        prediction.price,
        features.purpose,
        features.zipcode,
        recommendations.len()
    );

    HttpResponse::Ok().json(PredictResponse {
        predicted_price: prediction.price,
        confidence_interval: prediction.interval(),
        recommendations,
        search_url,
        logged,
        listings,
    })
}

fn bad_request(error: &str, message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: 400,
    })
}

fn internal_error(error: &str) -> HttpResponse {
    HttpResponse::InternalServerError().json(ErrorResponse {
        error: error.to_string(),
        message: GENERIC_FAILURE.to_string(),
        status_code: 500,
    })
}
