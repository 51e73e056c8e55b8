pub mod db;

pub use db::{DbAdapter, DbTransaction};

use crate::config::Config;
use crate::error::ApiError;
use bookstore_core::ports::{IdentityService, StoreService};
use bookstore_core::MemoryStore;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};

/// The storage and identity ports the service runs against.
pub struct Adapters {
    pub store: Arc<dyn StoreService>,
    pub identity: Arc<dyn IdentityService>,
}

/// Connects the adapters selected by `DATABASE_URL` and brings the schema
/// up to date.
pub async fn connect(config: &Config) -> Result<Adapters, ApiError> {
    if config.uses_memory_store() {
        warn!("Using the in-memory store; all data is lost on shutdown.");
        let memory = MemoryStore::new();
        return Ok(Adapters {
            store: Arc::new(memory.clone()),
            identity: Arc::new(memory),
        });
    }

    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;
    let db_adapter = DbAdapter::new(db_pool);
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    Ok(Adapters {
        store: Arc::new(db_adapter.clone()),
        identity: Arc::new(db_adapter),
    })
}
