use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use homeworth::config::Settings;
use homeworth::core::Predictor;
use homeworth::routes::{self, AppState};
use homeworth::services::{ListingsClient, QueryLog, RuleStore, SqliteStore};
use std::io;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn startup_error(context: &str, e: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", context, e);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, e))
}

fn init_logging() {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    // RUST_LOG wins over LOG_LEVEL when both are set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    init_logging();

    info!("Starting Homeworth price estimation service...");

    let settings = Settings::load().map_err(|e| startup_error("Failed to load configuration", e))?;

    info!("Configuration loaded successfully");

    // Missing or inconsistent artifacts are fatal
    let predictor = Predictor::load(
        &settings.model.artifact_paths(),
        settings.prediction.interval_policy(),
    )
    .map_err(|e| startup_error("Failed to load model artifacts", e))?;

    let store = SqliteStore::open(&settings.database.url)
        .await
        .map_err(|e| startup_error("Failed to open database", e))?;

    info!("Database ready at {}", settings.database.url);

    let listings = if settings.listings.enabled {
        if settings.listings.token.is_empty() {
            warn!("Listings lookup enabled without a token; the proxy will likely reject requests");
        }
        let client = ListingsClient::new(
            settings.listings.proxy_url.clone(),
            settings.listings.token.clone(),
            settings.listings.timeout(),
        )
        .map_err(|e| startup_error("Failed to create listings client", e))?;
        info!("Listings lookup enabled (timeout: {}s)", settings.listings.timeout().as_secs());
        Some(Arc::new(client))
    } else {
        None
    };

    if settings.admin.token.is_none() {
        warn!("No admin token configured; admin endpoints are open");
    }

    let app_state = AppState {
        predictor: Arc::new(predictor),
        query_log: QueryLog::new(store.clone()),
        rules: RuleStore::new(store.clone()),
        store,
        listings,
        prediction: settings.prediction.clone(),
        admin_token: settings.admin.token.clone(),
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(routes::json_config())
            .app_data(routes::form_config())
            .app_data(routes::query_config())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
