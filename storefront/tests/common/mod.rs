// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use dropline::model::{LedgerSnapshot, OrderDetails, Product, ProductId};
use dropline::{InventoryStore, MemoryStore, OrderNumberGenerator, StockTransaction, StoreResult};
use once_cell::sync::Lazy;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use storefront::config::AppConfig;
use storefront::state::AppState;
use tokio::sync::Barrier;

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub fn seed_product(store: &MemoryStore, name: &str, price_cents: i64, quantity: i32) -> ProductId {
  let product = Product::new(name, "Supreme", "M", price_cents, quantity);
  let id = product.id;
  store.insert_product(product);
  id
}

pub fn app_state(store: Arc<dyn InventoryStore>) -> AppState {
  AppState::new(store, Arc::new(AppConfig::for_memory_store()))
}

/// Holds the first `parties` calls to `begin` until all of them arrived, so racing
/// checkouts have all passed the pre-check before any of them writes.
pub struct GatedStore {
  pub inner: MemoryStore,
  gate: Barrier,
  remaining: AtomicUsize,
}

impl GatedStore {
  pub fn new(inner: MemoryStore, parties: usize) -> Self {
    Self {
      inner,
      gate: Barrier::new(parties),
      remaining: AtomicUsize::new(parties),
    }
  }
}

#[async_trait]
impl InventoryStore for GatedStore {
  async fn find_product(&self, product_id: ProductId) -> StoreResult<Option<Product>> {
    self.inner.find_product(product_id).await
  }

  async fn begin(&self) -> StoreResult<Box<dyn StockTransaction>> {
    if self
      .remaining
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
      .is_ok()
    {
      self.gate.wait().await;
    }
    self.inner.begin().await
  }

  async fn find_order_by_number(&self, order_number: &str) -> StoreResult<Option<OrderDetails>> {
    self.inner.find_order_by_number(order_number).await
  }

  async fn ledger_snapshot(&self, product_id: ProductId) -> StoreResult<Option<LedgerSnapshot>> {
    self.inner.ledger_snapshot(product_id).await
  }
}

// --- Postgres ---

/// A migrated pool on `DATABASE_URL`, or `None` when no database is configured, in
/// which case the calling test returns early.
pub async fn test_pool() -> Option<PgPool> {
  dotenvy::dotenv().ok();
  let database_url = match std::env::var("DATABASE_URL") {
    Ok(url) if !url.is_empty() => url,
    _ => {
      tracing::warn!("DATABASE_URL not set, skipping Postgres store test.");
      return None;
    }
  };
  let pool = PgPoolOptions::new()
    .max_connections(5)
    .connect(&database_url)
    .await
    .expect("connect to DATABASE_URL");
  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("apply migrations");
  Some(pool)
}

/// `<prefix>-1`, `<prefix>-2`, ... Two generators with the same prefix collide on
/// every number.
pub struct SequentialNumbers {
  prefix: String,
  next: AtomicU32,
}

impl SequentialNumbers {
  pub fn new(prefix: &str) -> Self {
    Self {
      prefix: prefix.to_string(),
      next: AtomicU32::new(1),
    }
  }

  /// A prefix no earlier run against the same database has used.
  pub fn unique() -> Self {
    Self::new(&format!("T{}", uuid::Uuid::new_v4().simple()))
  }

  pub fn prefix(&self) -> &str {
    &self.prefix
  }
}

impl OrderNumberGenerator for SequentialNumbers {
  fn next_number(&self) -> String {
    format!("{}-{}", self.prefix, self.next.fetch_add(1, Ordering::SeqCst))
  }
}
