use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration build error: {0}")]
    Build(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

#[derive(Debug, Deserialize)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    /// Root directory the object store writes under.
    pub root: String,
    /// Base URL documents are served from (fronted by the storage provider's
    /// pre-signed URLs in production).
    pub public_base_url: String,
}

#[derive(Debug, Deserialize)]
pub struct VerificationConfig {
    /// Endpoint for the API verification strategy. Empty disables it.
    #[serde(default)]
    pub api_endpoint: String,
    /// Certificate registry queried by the web-scraping strategy.
    #[serde(default)]
    pub registry_endpoint: String,
    /// Issuing bodies accepted by the list-matching strategy.
    #[serde(default)]
    pub trusted_issuers: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AlertConfig {
    /// Day thresholds that map to alert buckets. Must be drawn from {7, 30, 90}.
    #[serde(default = "default_thresholds")]
    pub thresholds: Vec<i64>,
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            thresholds: default_thresholds(),
            scan_interval_secs: default_scan_interval_secs(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub smtp: SmtpConfig,
    pub frontend_url: String,
    pub storage: StorageConfig,
    #[serde(default)]
    pub verification: VerificationConfig,
    #[serde(default)]
    pub alerts: AlertConfig,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            api_endpoint: String::new(),
            registry_endpoint: String::new(),
            trusted_issuers: Vec::new(),
        }
    }
}

fn default_thresholds() -> Vec<i64> {
    vec![90, 30, 7]
}

fn default_scan_interval_secs() -> u64 {
    6 * 3600
}

/// Load application configuration from `config.yaml` + environment overrides.
///
/// Environment variable override convention: any var matching the key path
/// separated by double underscores (e.g. `SMTP__PORT`) overrides the file
/// value.
///
/// Returns a `ConfigError` instead of panicking so the caller can decide how
/// to fail.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    use config::{Config, Environment, File};
    let cfg = Config::builder()
        .add_source(File::with_name("config.yaml"))
        .add_source(Environment::default().separator("__"))
        .build()?;

    let app: AppConfig = cfg.try_deserialize()?;
    validate(&app)?;
    Ok(app)
}

fn validate(app: &AppConfig) -> Result<(), ConfigError> {
    if app.smtp.port == 0 {
        return Err(ConfigError::Validation("smtp.port must be > 0".into()));
    }
    if app.storage.root.is_empty() {
        return Err(ConfigError::Validation(
            "storage.root must not be empty".into(),
        ));
    }
    if app.alerts.thresholds.is_empty() {
        return Err(ConfigError::Validation(
            "alerts.thresholds must not be empty".into(),
        ));
    }
    for t in &app.alerts.thresholds {
        if !matches!(t, 7 | 30 | 90) {
            return Err(ConfigError::Validation(format!(
                "alerts.thresholds contains {t}, expected values from {{7, 30, 90}}"
            )));
        }
    }
    if app.alerts.scan_interval_secs == 0 {
        return Err(ConfigError::Validation(
            "alerts.scan_interval_secs must be > 0".into(),
        ));
    }
    Ok(())
}

/// Convenience helper for binaries wanting panic-on-error behaviour.
pub fn load_config_or_panic() -> AppConfig {
    match load_config() {
        Ok(c) => c,
        Err(e) => panic!("Failed to load configuration: {e}"),
    }
}
