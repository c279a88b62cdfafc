// Integration tests for the Homeworth HTTP API

use actix_web::{http::StatusCode, test, web, App};
use chrono::Utc;
use homeworth::config::PredictionSettings;
use homeworth::core::{ArtifactPaths, IntervalPolicy, Predictor};
use homeworth::models::{ErrorResponse, HealthResponse, PredictResponse, QueryListResponse};
use homeworth::routes::{self, AppState};
use homeworth::services::{QueryLog, RuleStore, SqliteStore, CSV_HEADER};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

async fn create_test_state(admin_token: Option<&str>) -> (TempDir, AppState) {
    let dir = tempfile::tempdir().unwrap();
    let artifacts = ArtifactPaths::in_dir(concat!(env!("CARGO_MANIFEST_DIR"), "/model/saved_model"));
    let predictor = Predictor::load(&artifacts, IntervalPolicy::default()).unwrap();
    let store = SqliteStore::open_path(dir.path().join("housing.db")).await.unwrap();

    let state = AppState {
        predictor: Arc::new(predictor),
        query_log: QueryLog::new(store.clone()),
        rules: RuleStore::new(store.clone()),
        store,
        listings: None,
        prediction: PredictionSettings::default(),
        admin_token: admin_token.map(str::to_string),
    };

    (dir, state)
}

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .app_data(routes::json_config())
                .app_data(routes::form_config())
                .app_data(routes::query_config())
                .configure(routes::configure_routes),
        )
        .await
    };
}

fn house(sqft_living: f64, zipcode: &str, purpose: &str) -> serde_json::Value {
    json!({
        "sqft_living": sqft_living,
        "no_of_bedrooms": 3,
        "no_of_bathrooms": 2,
        "sqft_lot": 7500,
        "no_of_floors": 2,
        "house_age": 10,
        "zipcode": zipcode,
        "purpose": purpose,
    })
}

#[actix_web::test]
async fn test_predict_json() {
    let (_dir, state) = create_test_state(None).await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/predict")
        .set_json(house(1800.0, "98052", "buy"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: PredictResponse = test::read_body_json(resp).await;
    let [low, high] = body.confidence_interval;
    assert!(low <= body.predicted_price && body.predicted_price <= high);
    assert!((high - low - 40_000.0).abs() < 1e-6);
    assert!(body.predicted_price > 0.0);
    assert!(body
        .search_url
        .starts_with("https://www.realtor.com/realestateandhomes-search/98052/price-"));
    assert!(body.logged);
    assert!(body.listings.is_none());
    assert_eq!(state.query_log.count().await.unwrap(), 1);
}

#[actix_web::test]
async fn test_predict_json_numeric_zipcode() {
    let (_dir, state) = create_test_state(None).await;
    let app = test_app!(state);

    let mut payload = house(1800.0, "98052", "sell");
    payload["zipcode"] = json!(98052);

    let req = test::TestRequest::post()
        .uri("/api/v1/predict")
        .set_json(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_predict_form_with_buy_recommendation() {
    let (_dir, state) = create_test_state(None).await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/predict")
        .set_form(vec![
            ("sqft_living", "900"),
            ("no_of_bedrooms", "2"),
            ("no_of_bathrooms", "1"),
            ("sqft_lot", "4000"),
            ("no_of_floors", "1"),
            ("house_age", "15"),
            ("zipcode", "98103"),
            ("purpose", "buy"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: PredictResponse = test::read_body_json(resp).await;
    assert!(body
        .recommendations
        .iter()
        .any(|r| r.contains("under 1,000 sq ft")));
}

#[actix_web::test]
async fn test_unseen_zipcode_in_range_predicts() {
    let (_dir, state) = create_test_state(None).await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/predict")
        .set_json(house(1800.0, "98765", "buy"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_zipcode_out_of_range_rejected_without_logging() {
    let (_dir, state) = create_test_state(None).await;
    let app = test_app!(state);

    for zipcode in ["98000", "99002", "10001"] {
        let req = test::TestRequest::post()
            .uri("/api/v1/predict")
            .set_json(house(1800.0, zipcode, "buy"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.status_code, 400);
        assert!(body.message.contains("98001") && body.message.contains("99001"));
    }

    assert_eq!(state.query_log.count().await.unwrap(), 0);
}

#[actix_web::test]
async fn test_non_numeric_form_value_rejected() {
    let (_dir, state) = create_test_state(None).await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/predict")
        .set_form(vec![("sqft_living", "large"), ("zipcode", "98052")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.error, "invalid_form");
    assert_eq!(state.query_log.count().await.unwrap(), 0);
}

#[actix_web::test]
async fn test_malformed_json_rejected() {
    let (_dir, state) = create_test_state(None).await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/predict")
        .insert_header(("content-type", "application/json"))
        .set_payload(r#"{"sqft_living": "#)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.error, "invalid_json");
}

#[actix_web::test]
async fn test_negative_lot_fails_validation() {
    let (_dir, state) = create_test_state(None).await;
    let app = test_app!(state);

    let mut payload = house(1800.0, "98052", "buy");
    payload["sqft_lot"] = json!(-10);

    let req = test::TestRequest::post()
        .uri("/api/v1/predict")
        .set_json(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_identical_requests_in_same_second_logged_once() {
    let (_dir, state) = create_test_state(None).await;
    let app = test_app!(state);

    // Retry with fresh values if the pair happens to straddle a second boundary
    for attempt in 0..5 {
        let sqft = 1500.0 + attempt as f64;
        let before = Utc::now().timestamp();

        let mut responses = Vec::new();
        for _ in 0..2 {
            let req = test::TestRequest::post()
                .uri("/api/v1/predict")
                .set_json(house(sqft, "98052", "buy"))
                .to_request();
            let body: PredictResponse = test::call_and_read_body_json(&app, req).await;
            responses.push(body);
        }

        if Utc::now().timestamp() != before {
            continue;
        }

        assert!(responses[0].logged);
        assert!(!responses[1].logged);
        let rows = state.query_log.list_all().await.unwrap();
        assert_eq!(rows.iter().filter(|r| r.sqft_living == sqft).count(), 1);
        return;
    }

    panic!("could not fit two requests into one second");
}

#[actix_web::test]
async fn test_admin_list_and_export() {
    let (_dir, state) = create_test_state(None).await;
    let app = test_app!(state);

    for (sqft, zipcode, purpose) in [(1200.0, "98001", "buy"), (2400.0, "98004", "sell"), (3100.0, "98115", "buy")] {
        let req = test::TestRequest::post()
            .uri("/api/v1/predict")
            .set_json(house(sqft, zipcode, purpose))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let req = test::TestRequest::get().uri("/api/v1/admin/queries").to_request();
    let listing: QueryListResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listing.count, 3);
    assert_eq!(listing.queries.len(), 3);

    let req = test::TestRequest::get().uri("/api/v1/admin/queries?limit=2").to_request();
    let limited: QueryListResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(limited.count, 2);

    let req = test::TestRequest::get().uri("/api/v1/admin/queries/export").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/csv"));

    let body = test::read_body(resp).await;
    let csv = String::from_utf8(body.to_vec()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], CSV_HEADER.join(","));
    assert_eq!(lines.len() - 1, state.query_log.count().await.unwrap() as usize);
}

#[actix_web::test]
async fn test_admin_token_required_when_configured() {
    let (_dir, state) = create_test_state(Some("s3cret")).await;
    let app = test_app!(state);

    let req = test::TestRequest::get().uri("/api/v1/admin/queries").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/queries/export")
        .insert_header(("X-Admin-Token", "wrong"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/queries")
        .insert_header(("X-Admin-Token", "s3cret"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_health_check() {
    let (_dir, state) = create_test_state(None).await;
    let app = test_app!(state);

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: HealthResponse = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body.status, "healthy");
    assert_eq!(body.model.input_features, 14);
    assert_eq!(body.model.expanded_features, 120);
    assert_eq!(body.model.known_zipcodes, 8);
}

#[actix_web::test]
async fn test_health_reports_degraded_store() {
    let (dir, state) = create_test_state(None).await;
    let app = test_app!(state);

    std::fs::remove_dir_all(dir.path()).unwrap();

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: HealthResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.status, "degraded");
}

#[actix_web::test]
async fn test_zipcode_logged_in_canonical_form() {
    let (_dir, state) = create_test_state(None).await;
    let app = test_app!(state);

    let plain = test::TestRequest::post()
        .uri("/api/v1/predict")
        .set_json(house(1800.0, "98052", "buy"))
        .to_request();
    let plain: PredictResponse = test::call_and_read_body_json(&app, plain).await;

    let padded = test::TestRequest::post()
        .uri("/api/v1/predict")
        .set_json(house(1800.0, "+98052", "Buy"))
        .to_request();
    let padded: PredictResponse = test::call_and_read_body_json(&app, padded).await;

    assert_eq!(plain.predicted_price, padded.predicted_price);
    let rows = state.query_log.list_all().await.unwrap();
    assert!(rows.iter().all(|r| r.zipcode == "98052"));
}

#[actix_web::test]
async fn test_oversized_house_age_is_bad_request() {
    let (_dir, state) = create_test_state(None).await;
    let app = test_app!(state);

    let mut payload = house(1800.0, "98052", "buy");
    payload["house_age"] = json!(4_000_000_000u64);

    let req = test::TestRequest::post()
        .uri("/api/v1/predict")
        .set_json(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(state.query_log.count().await.unwrap(), 0);
}
