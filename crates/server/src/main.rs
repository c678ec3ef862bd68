use lettre::{AsyncSmtpTransport, Tokio1Executor, transport::smtp::authentication::Credentials};
use rustls::crypto;
use rustls::crypto::CryptoProvider;
use sea_orm::Database;
use std::sync::Arc;
use supplyvault::AppResources;
use supplyvault::alerts::expiry_scan_loop;
use supplyvault::api::start_webserver;
use supplyvault::config::load_config_or_panic;
use supplyvault::storage::FsObjectStore;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn initialize_tracing() {
    let default_directives = "supplyvault=info,hyper=warn,sea_orm=info";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer().with_target(true).with_level(true);

    registry.with(layer).init();
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install().expect("Failed to install `color_eyre::install`");

    initialize_tracing();

    // Load config
    let config = Arc::new(load_config_or_panic());

    let ring_provider = crypto::ring::default_provider();
    CryptoProvider::install_default(ring_provider).expect("Failed to install crypto provider");

    // Set up SeaORM database connection
    let db = Arc::new(
        Database::connect(&config.database_url)
            .await
            .expect("Failed to connect to database"),
    );

    // Set up lettre SMTP client
    let creds = Credentials::new(config.smtp.username.clone(), config.smtp.password.clone());
    let mailer = Arc::new(
        AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp.server)
            .expect("Failed to build SMTP transport")
            .port(config.smtp.port)
            .credentials(creds)
            .build(),
    );

    // Document object store
    let store = Arc::new(FsObjectStore::new(
        config.storage.root.clone(),
        config.storage.public_base_url.clone(),
    ));

    let resources = Arc::new(AppResources {
        db,
        mailer,
        store,
        config,
    });

    tracing::info!(
        thresholds = ?resources.config.alerts.thresholds,
        scan_interval_secs = resources.config.alerts.scan_interval_secs,
        trusted_issuers = resources.config.verification.trusted_issuers.len(),
        "alerting configuration"
    );

    // Start recurring expiry sweep
    let resources_for_sweep = resources.clone();
    tokio::spawn(async move {
        expiry_scan_loop(resources_for_sweep).await;
    });

    start_webserver((*resources).clone()).await?;
    Ok(())
}
