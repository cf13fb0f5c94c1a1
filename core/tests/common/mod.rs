// tests/common/mod.rs
#![allow(dead_code)] // Not every test binary uses every helper.

use async_trait::async_trait;
use dropline::model::{LedgerSnapshot, Order, OrderDetails, OrderItem, Product, ProductId, StockMove};
use dropline::{
  Checkout, CheckoutConfig, CheckoutRequest, ContextData, Handler, InventoryStore, MemoryStore, OrderNumberGenerator,
  PipelineControl, PipelineError, StockTransaction, StoreResult, TimeRandomOrderNumbers,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;
use tracing::Level;

// --- Engine test context ---
#[derive(Clone, Debug, Default)]
pub struct TraceContext {
  pub counter: i32,
  pub message: String,
  pub steps_executed: Vec<String>,
  pub should_stop_at: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Pipeline error: {0}")]
  Pipeline(String),

  #[error("Test handler failed: {0}")]
  Handler(String),
}

impl From<PipelineError> for TestError {
  fn from(err: PipelineError) -> Self {
    TestError::Pipeline(format!("{:?}", err))
  }
}

pub fn create_simple_handler(
  step_name: &'static str,
  message_to_append: &'static str,
) -> Handler<TraceContext, TestError> {
  Box::new(move |ctx: ContextData<TraceContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.message.push_str(message_to_append);
      guard.steps_executed.push(step_name.to_string());
      tracing::debug!(target: "test_handlers", step = %step_name, counter = guard.counter, "executed");
      if guard.should_stop_at.as_deref() == Some(step_name) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

pub fn create_failing_handler(
  step_name: &'static str,
  error_message: &'static str,
) -> Handler<TraceContext, TestError> {
  Box::new(move |ctx: ContextData<TraceContext>| {
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      tracing::warn!(target: "test_handlers", step = %step_name, "failing with: '{}'", error_message);
      Err(TestError::Handler(error_message.to_string()))
    })
  })
}

// --- Tracing ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Checkout fixtures ---
pub fn seed_product(store: &MemoryStore, name: &str, price_cents: i64, quantity: i32) -> ProductId {
  let product = Product::new(name, "Supreme", "M", price_cents, quantity);
  let id = product.id;
  store.insert_product(product);
  id
}

pub fn request(lines: &[(ProductId, i32)]) -> CheckoutRequest {
  CheckoutRequest {
    buyer: None,
    lines: lines.iter().map(|(id, qty)| dropline::model::CartLine::new(*id, *qty)).collect(),
  }
}

pub fn checkout_over(store: Arc<dyn InventoryStore>) -> Checkout {
  Checkout::new(store, Arc::new(TimeRandomOrderNumbers::default()), CheckoutConfig::default())
}

pub fn checkout_with_numbers(store: Arc<dyn InventoryStore>, numbers: Arc<dyn OrderNumberGenerator>, attempts: u32) -> Checkout {
  Checkout::new(
    store,
    numbers,
    CheckoutConfig {
      max_order_number_attempts: attempts,
      ..CheckoutConfig::default()
    },
  )
}

/// Hands out the scripted numbers first, then `fallback` forever.
pub struct ScriptedNumbers {
  script: Mutex<VecDeque<String>>,
  fallback: String,
}

impl ScriptedNumbers {
  pub fn new(script: &[&str], fallback: &str) -> Self {
    Self {
      script: Mutex::new(script.iter().map(|s| s.to_string()).collect()),
      fallback: fallback.to_string(),
    }
  }
}

impl OrderNumberGenerator for ScriptedNumbers {
  fn next_number(&self) -> String {
    self.script.lock().pop_front().unwrap_or_else(|| self.fallback.clone())
  }
}

/// Holds the first `parties` calls to `begin` until all of them arrived, so that every
/// racing checkout has passed its pre-check before any of them writes.
pub struct GatedStore {
  pub inner: MemoryStore,
  gate: Arc<Barrier>,
  remaining: AtomicUsize,
}

impl GatedStore {
  pub fn new(inner: MemoryStore, parties: usize) -> Self {
    Self {
      inner,
      gate: Arc::new(Barrier::new(parties)),
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
    let gated = self
      .remaining
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
      .is_ok();
    if gated {
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

/// Delays guarded decrements (a checkout stuck mid-transaction) or the
/// acknowledgement of an already applied COMMIT (a slow round trip after the write).
pub struct SlowStore {
  pub inner: MemoryStore,
  pub decrement_delay: Duration,
  pub commit_ack_delay: Duration,
}

impl SlowStore {
  pub fn slow_decrements(inner: MemoryStore, delay: Duration) -> Self {
    Self {
      inner,
      decrement_delay: delay,
      commit_ack_delay: Duration::ZERO,
    }
  }

  pub fn slow_commit_acks(inner: MemoryStore, delay: Duration) -> Self {
    Self {
      inner,
      decrement_delay: Duration::ZERO,
      commit_ack_delay: delay,
    }
  }
}

#[async_trait]
impl InventoryStore for SlowStore {
  async fn find_product(&self, product_id: ProductId) -> StoreResult<Option<Product>> {
    self.inner.find_product(product_id).await
  }

  async fn begin(&self) -> StoreResult<Box<dyn StockTransaction>> {
    Ok(Box::new(SlowTransaction {
      inner: self.inner.begin().await?,
      decrement_delay: self.decrement_delay,
      commit_ack_delay: self.commit_ack_delay,
    }))
  }

  async fn find_order_by_number(&self, order_number: &str) -> StoreResult<Option<OrderDetails>> {
    self.inner.find_order_by_number(order_number).await
  }

  async fn ledger_snapshot(&self, product_id: ProductId) -> StoreResult<Option<LedgerSnapshot>> {
    self.inner.ledger_snapshot(product_id).await
  }
}

struct SlowTransaction {
  inner: Box<dyn StockTransaction>,
  decrement_delay: Duration,
  commit_ack_delay: Duration,
}

#[async_trait]
impl StockTransaction for SlowTransaction {
  async fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
    self.inner.insert_order(order).await
  }

  async fn insert_order_item(&mut self, item: &OrderItem) -> StoreResult<()> {
    self.inner.insert_order_item(item).await
  }

  async fn decrement_stock(&mut self, product_id: ProductId, quantity: i32) -> StoreResult<u64> {
    tokio::time::sleep(self.decrement_delay).await;
    self.inner.decrement_stock(product_id, quantity).await
  }

  async fn append_stock_move(&mut self, stock_move: &StockMove) -> StoreResult<()> {
    self.inner.append_stock_move(stock_move).await
  }

  async fn commit(&mut self) -> StoreResult<()> {
    self.inner.commit().await?;
    tokio::time::sleep(self.commit_ack_delay).await;
    Ok(())
  }

  async fn rollback(&mut self) -> StoreResult<()> {
    self.inner.rollback().await
  }
}
