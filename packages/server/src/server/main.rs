// Main entry point for the registration server

use std::sync::Arc;

use anyhow::{Context, Result};
use disposable_email::{DisposableEmailOptions, DisposableEmailService};
use registration_core::domains::member::activities::ValidationPostRegistration;
use registration_core::domains::member::profile_steps::ProfileStepRegistry;
use registration_core::kernel::{
    AesGcmEncryptor, BaseEmailVerifier, DisposableEmailAdapter, NoopEmailVerifier,
    PgRegistrationStore, ServerDeps,
};
use registration_core::{server::build_app, Config, DisposableEmailConfig};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,registration_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting registration server");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        mode = ?config.registration.registration_mode,
        validation = config.registration.validation_mode.as_str(),
        "Configuration loaded"
    );

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    let store = Arc::new(PgRegistrationStore::new(pool.clone()));
    let encryptor = AesGcmEncryptor::from_hex(&config.answer_encryption_key)
        .context("ANSWER_ENCRYPTION_KEY is not a valid AES-256 key")?;

    let deps = ServerDeps::new(
        store.clone(),
        store.clone(),
        email_verifier(&config.disposable_email)?,
        Arc::new(encryptor),
        ProfileStepRegistry::builtin(),
        Arc::new(ValidationPostRegistration::new(
            store,
            config.registration.validation_mode,
        )),
        config.registration.clone(),
    );

    // Build application
    let app = build_app(pool, deps);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}

fn email_verifier(config: &DisposableEmailConfig) -> Result<Arc<dyn BaseEmailVerifier>> {
    let Some(api_token) = config.api_token.clone() else {
        tracing::warn!("DISPOSABLE_EMAIL_API_TOKEN not set, disposable email check disabled");
        return Ok(Arc::new(NoopEmailVerifier));
    };

    let mut options = DisposableEmailOptions::new(config.token_type.clone(), api_token);
    options.endpoint = config.endpoint.clone();
    options.timeout = config.timeout;

    let service = DisposableEmailService::new(options)
        .context("Failed to build disposable email client")?;

    Ok(Arc::new(DisposableEmailAdapter::new(Arc::new(service))))
}
