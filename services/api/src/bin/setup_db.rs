//! services/api/src/bin/setup_db.rs
//!
//! Prepares a database for deployment: runs migrations, then seeds the admin
//! account and sample books if they are missing.

use api_lib::{adapters, config::Config, error::ApiError, seed::seed_database};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Setting up database...");

    let adapters = adapters::connect(&config).await?;
    let report = seed_database(
        adapters.store.as_ref(),
        adapters.identity.as_ref(),
        config.admin_password.as_deref(),
    )
    .await?;

    info!(
        admin_created = report.admin_created,
        books_created = report.books_created,
        "Database setup completed."
    );
    Ok(())
}
