use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::artifacts::ArtifactPaths;
use crate::core::predictor::{IntervalPolicy, Z_95};
use crate::core::search::{DEFAULT_PRICE_WINDOW, DEFAULT_SEARCH_BASE_URL};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default)]
    pub prediction: PredictionSettings,
    #[serde(default)]
    pub listings: ListingsSettings,
    #[serde(default)]
    pub admin: AdminSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self { url: default_database_url() }
    }
}

fn default_database_url() -> String { "sqlite://data/housing.db".to_string() }

/// Locations of the serialized training artifacts
#[derive(Debug, Clone, Deserialize)]
pub struct ModelSettings {
    #[serde(default = "default_encoder_path")]
    pub encoder_path: PathBuf,
    #[serde(default = "default_poly_path")]
    pub poly_path: PathBuf,
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            encoder_path: default_encoder_path(),
            poly_path: default_poly_path(),
            model_path: default_model_path(),
        }
    }
}

impl ModelSettings {
    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            encoder: self.encoder_path.clone(),
            poly: self.poly_path.clone(),
            model: self.model_path.clone(),
        }
    }
}

fn default_encoder_path() -> PathBuf { PathBuf::from("model/saved_model/encoder.json") }
fn default_poly_path() -> PathBuf { PathBuf::from("model/saved_model/poly.json") }
fn default_model_path() -> PathBuf { PathBuf::from("model/saved_model/model.json") }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalKind {
    #[default]
    Fixed,
    ResidualStd,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictionSettings {
    #[serde(default = "default_zipcode_min")]
    pub zipcode_min: u32,
    #[serde(default = "default_zipcode_max")]
    pub zipcode_max: u32,
    #[serde(default)]
    pub interval: IntervalKind,
    #[serde(default = "default_interval_margin")]
    pub interval_margin: f64,
    #[serde(default = "default_search_base_url")]
    pub search_base_url: String,
    #[serde(default = "default_search_window")]
    pub search_window: f64,
}

impl Default for PredictionSettings {
    fn default() -> Self {
        Self {
            zipcode_min: default_zipcode_min(),
            zipcode_max: default_zipcode_max(),
            interval: IntervalKind::default(),
            interval_margin: default_interval_margin(),
            search_base_url: default_search_base_url(),
            search_window: default_search_window(),
        }
    }
}

impl PredictionSettings {
    /// Inclusive accepted zipcode range
    pub fn zipcode_range(&self) -> (u32, u32) {
        (self.zipcode_min, self.zipcode_max)
    }

    pub fn interval_policy(&self) -> IntervalPolicy {
        match self.interval {
            IntervalKind::Fixed => IntervalPolicy::Fixed {
                margin: self.interval_margin,
            },
            IntervalKind::ResidualStd => IntervalPolicy::ResidualStd {
                z: Z_95,
                fallback_margin: self.interval_margin,
            },
        }
    }
}

fn default_zipcode_min() -> u32 { 98001 }
fn default_zipcode_max() -> u32 { 99001 }
fn default_interval_margin() -> f64 { 20_000.0 }
fn default_search_base_url() -> String { DEFAULT_SEARCH_BASE_URL.to_string() }
fn default_search_window() -> f64 { DEFAULT_PRICE_WINDOW }

#[derive(Debug, Clone, Deserialize)]
pub struct ListingsSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_proxy_url")]
    pub proxy_url: String,
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_listings_timeout")]
    pub timeout_secs: u64,
}

impl Default for ListingsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            proxy_url: default_proxy_url(),
            token: String::new(),
            timeout_secs: default_listings_timeout(),
        }
    }
}

impl ListingsSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

fn default_proxy_url() -> String { "https://api.crawlbase.com/".to_string() }
fn default_listings_timeout() -> u64 { 5 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminSettings {
    /// When set, admin endpoints require a matching `X-Admin-Token` header
    pub token: Option<String>,
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with HOMEWORTH__)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., HOMEWORTH__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("HOMEWORTH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = apply_env_overrides(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("HOMEWORTH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Conventional environment variables that take precedence over the
/// prefixed ones: `DATABASE_URL`, `LISTINGS_TOKEN`, `ADMIN_TOKEN`
fn apply_env_overrides(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(url) = env::var("DATABASE_URL") {
        builder = builder.set_override("database.url", url)?;
    }
    if let Ok(token) = env::var("LISTINGS_TOKEN") {
        builder = builder.set_override("listings.token", token)?;
    }
    if let Ok(token) = env::var("ADMIN_TOKEN") {
        builder = builder.set_override("admin.token", token)?;
    }

    builder.build()
}
