// storefront/src/db/mod.rs

pub mod pg_store;
pub mod seed;

pub use pg_store::{PgInventoryStore, PgStockTransaction};

use crate::config::{AppConfig, StoreBackend};
use crate::errors::{AppError, Result};
use dropline::{InventoryStore, MemoryStore};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};

/// Connects the configured backend, applying migrations and seed data as requested.
pub async fn build_store(config: &AppConfig) -> Result<Arc<dyn InventoryStore>> {
  match config.store_backend {
    StoreBackend::Postgres => {
      let database_url = config
        .database_url
        .as_deref()
        .ok_or_else(|| AppError::Config("DATABASE_URL is required for the postgres backend".to_string()))?;
      let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(database_url)
        .await?;
      info!("Successfully connected to the database.");

      if config.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database migrations applied.");
      }
      if config.seed_db {
        seed::seed_postgres(&pool).await?;
      }
      Ok(Arc::new(PgInventoryStore::new(pool)))
    }
    StoreBackend::Memory => {
      warn!("Using the in-memory store: data is not durable and not shared between instances.");
      let store = MemoryStore::new();
      if config.seed_db {
        seed::seed_memory(&store);
      }
      Ok(Arc::new(store))
    }
  }
}
