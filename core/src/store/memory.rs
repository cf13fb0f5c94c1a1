// dropline/src/store/memory.rs

//! Process-local `InventoryStore`.
//!
//! Non-durable and not shared across processes: meant for tests, benches and
//! `STORE_BACKEND=memory` development runs. Inserts are staged per transaction and
//! only become visible on commit. Guarded decrements are applied in place under the
//! table lock (that is what makes the guard atomic) and recorded in an undo log that
//! `rollback` or drop replays, so concurrent readers may observe stock held by a
//! transaction that later rolls back.

use crate::error::{StoreError, StoreResult};
use crate::model::{
  LedgerSnapshot, MoveReason, Order, OrderDetails, OrderItem, Product, ProductId, StockMove,
};
use crate::store::{InventoryStore, StockTransaction};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{event, Level};

#[derive(Debug, Default)]
struct Tables {
  products: HashMap<ProductId, Product>,
  orders: Vec<Order>,
  order_items: Vec<OrderItem>,
  stock_moves: Vec<StockMove>,
  // Committed numbers plus numbers held by open transactions.
  order_numbers: HashSet<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert_product(&self, product: Product) {
    self.tables.lock().products.insert(product.id, product);
  }

  pub fn product(&self, product_id: ProductId) -> Option<Product> {
    self.tables.lock().products.get(&product_id).cloned()
  }

  pub fn product_count(&self) -> usize {
    self.tables.lock().products.len()
  }

  /// Catalog-side price change. Returns `false` for an unknown product.
  pub fn set_price(&self, product_id: ProductId, price_cents: i64) -> bool {
    let mut tables = self.tables.lock();
    match tables.products.get_mut(&product_id) {
      Some(product) => {
        product.price_cents = price_cents;
        product.updated_at = Utc::now();
        true
      }
      None => false,
    }
  }

  pub fn orders(&self) -> Vec<Order> {
    self.tables.lock().orders.clone()
  }

  pub fn order_items(&self) -> Vec<OrderItem> {
    self.tables.lock().order_items.clone()
  }

  pub fn stock_moves(&self) -> Vec<StockMove> {
    self.tables.lock().stock_moves.clone()
  }
}

#[async_trait]
impl InventoryStore for MemoryStore {
  async fn find_product(&self, product_id: ProductId) -> StoreResult<Option<Product>> {
    Ok(self.product(product_id))
  }

  async fn begin(&self) -> StoreResult<Box<dyn StockTransaction>> {
    Ok(Box::new(MemoryTransaction {
      tables: Arc::clone(&self.tables),
      orders: Vec::new(),
      order_items: Vec::new(),
      stock_moves: Vec::new(),
      reserved_numbers: Vec::new(),
      applied_decrements: Vec::new(),
      finished: false,
    }))
  }

  async fn find_order_by_number(&self, order_number: &str) -> StoreResult<Option<OrderDetails>> {
    let tables = self.tables.lock();
    let order = match tables.orders.iter().find(|o| o.order_number == order_number) {
      Some(order) => order.clone(),
      None => return Ok(None),
    };
    let items = tables
      .order_items
      .iter()
      .filter(|item| item.order_id == order.id)
      .cloned()
      .collect();
    Ok(Some(OrderDetails { order, items }))
  }

  async fn ledger_snapshot(&self, product_id: ProductId) -> StoreResult<Option<LedgerSnapshot>> {
    let tables = self.tables.lock();
    let product = match tables.products.get(&product_id) {
      Some(product) => product,
      None => return Ok(None),
    };
    let checkout_moves_total = tables
      .stock_moves
      .iter()
      .filter(|m| m.product_id == product_id && m.reason == MoveReason::Checkout)
      .map(|m| i64::from(m.quantity_change))
      .sum();
    Ok(Some(LedgerSnapshot {
      product_id,
      quantity_available: product.quantity_available,
      quantity_sold: product.quantity_sold,
      checkout_moves_total,
    }))
  }
}

pub struct MemoryTransaction {
  tables: Arc<Mutex<Tables>>,
  orders: Vec<Order>,
  order_items: Vec<OrderItem>,
  stock_moves: Vec<StockMove>,
  reserved_numbers: Vec<String>,
  applied_decrements: Vec<(ProductId, i32)>,
  finished: bool,
}

impl MemoryTransaction {
  fn ensure_open(&self) -> StoreResult<()> {
    if self.finished {
      return Err(StoreError::TransactionFinished);
    }
    Ok(())
  }

  fn undo(&mut self) {
    let mut tables = self.tables.lock();
    for (product_id, quantity) in self.applied_decrements.drain(..).rev() {
      if let Some(product) = tables.products.get_mut(&product_id) {
        product.quantity_available += quantity;
        product.quantity_sold -= quantity;
      }
    }
    for number in self.reserved_numbers.drain(..) {
      tables.order_numbers.remove(&number);
    }
    self.orders.clear();
    self.order_items.clear();
    self.stock_moves.clear();
  }
}

#[async_trait]
impl StockTransaction for MemoryTransaction {
  async fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
    self.ensure_open()?;
    {
      let mut tables = self.tables.lock();
      if !tables.order_numbers.insert(order.order_number.clone()) {
        return Err(StoreError::DuplicateOrderNumber(order.order_number.clone()));
      }
    }
    self.reserved_numbers.push(order.order_number.clone());
    self.orders.push(order.clone());
    Ok(())
  }

  async fn insert_order_item(&mut self, item: &OrderItem) -> StoreResult<()> {
    self.ensure_open()?;
    self.order_items.push(item.clone());
    Ok(())
  }

  async fn decrement_stock(&mut self, product_id: ProductId, quantity: i32) -> StoreResult<u64> {
    self.ensure_open()?;
    let mut tables = self.tables.lock();
    let product = match tables.products.get_mut(&product_id) {
      Some(product) if product.can_fulfil(quantity) => product,
      _ => return Ok(0),
    };
    product.quantity_available -= quantity;
    product.quantity_sold += quantity;
    product.updated_at = Utc::now();
    drop(tables);
    self.applied_decrements.push((product_id, quantity));
    Ok(1)
  }

  async fn append_stock_move(&mut self, stock_move: &StockMove) -> StoreResult<()> {
    self.ensure_open()?;
    self.stock_moves.push(stock_move.clone());
    Ok(())
  }

  async fn commit(&mut self) -> StoreResult<()> {
    self.ensure_open()?;
    let mut tables = self.tables.lock();
    tables.orders.append(&mut self.orders);
    tables.order_items.append(&mut self.order_items);
    tables.stock_moves.append(&mut self.stock_moves);
    drop(tables);
    self.reserved_numbers.clear();
    self.applied_decrements.clear();
    self.finished = true;
    Ok(())
  }

  async fn rollback(&mut self) -> StoreResult<()> {
    self.ensure_open()?;
    self.undo();
    self.finished = true;
    Ok(())
  }
}

impl Drop for MemoryTransaction {
  fn drop(&mut self) {
    if !self.finished {
      event!(Level::DEBUG, "Open memory transaction dropped, rolling back.");
      self.undo();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use uuid::Uuid;

  fn order(number: &str) -> Order {
    Order {
      id: Uuid::new_v4(),
      order_number: number.to_string(),
      user_id: None,
      status: crate::model::OrderStatus::Pending,
      subtotal_cents: 1000,
      shipping_cents: 0,
      total_cents: 1000,
      created_at: Utc::now(),
    }
  }

  #[tokio::test]
  async fn guarded_decrement_refuses_to_go_negative() {
    let store = MemoryStore::new();
    let product = Product::new("Box Logo Tee", "Supreme", "M", 4800, 1);
    let id = product.id;
    store.insert_product(product);

    let mut tx = store.begin().await.unwrap();
    assert_eq!(tx.decrement_stock(id, 2).await.unwrap(), 0);
    assert_eq!(tx.decrement_stock(id, 1).await.unwrap(), 1);
    assert_eq!(tx.decrement_stock(id, 1).await.unwrap(), 0);
    tx.commit().await.unwrap();

    let after = store.product(id).unwrap();
    assert_eq!(after.quantity_available, 0);
    assert_eq!(after.quantity_sold, 1);
  }

  #[tokio::test]
  async fn dropping_an_open_transaction_discards_everything() {
    let store = MemoryStore::new();
    let product = Product::new("Nuptse", "The North Face", "L", 32000, 3);
    let id = product.id;
    store.insert_product(product);

    {
      let mut tx = store.begin().await.unwrap();
      let o = order("DROPPED1");
      tx.insert_order(&o).await.unwrap();
      assert_eq!(tx.decrement_stock(id, 2).await.unwrap(), 1);
    }

    assert_eq!(store.product(id).unwrap().quantity_available, 3);
    assert!(store.orders().is_empty());

    // The number was released with the rollback.
    let mut tx = store.begin().await.unwrap();
    tx.insert_order(&order("DROPPED1")).await.unwrap();
    tx.commit().await.unwrap();
    assert_eq!(store.orders().len(), 1);
  }

  #[tokio::test]
  async fn order_number_held_by_open_transaction_is_a_duplicate() {
    let store = MemoryStore::new();
    let mut first = store.begin().await.unwrap();
    first.insert_order(&order("SAME")).await.unwrap();

    let mut second = store.begin().await.unwrap();
    match second.insert_order(&order("SAME")).await {
      Err(StoreError::DuplicateOrderNumber(n)) => assert_eq!(n, "SAME"),
      other => panic!("expected DuplicateOrderNumber, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn uncommitted_decrement_is_visible_until_rolled_back() {
    let store = MemoryStore::new();
    let product = Product::new("Box Logo Hoodie", "Supreme", "L", 16800, 1);
    let id = product.id;
    store.insert_product(product);

    let mut tx = store.begin().await.unwrap();
    assert_eq!(tx.decrement_stock(id, 1).await.unwrap(), 1);
    // A concurrent pre-check already sees the held unit as gone.
    let seen = store.find_product(id).await.unwrap().unwrap();
    assert!(!seen.can_fulfil(1));

    tx.rollback().await.unwrap();
    assert!(store.find_product(id).await.unwrap().unwrap().can_fulfil(1));
  }

  #[tokio::test]
  async fn finished_transaction_rejects_further_writes() {
    let store = MemoryStore::new();
    let mut tx = store.begin().await.unwrap();
    tx.rollback().await.unwrap();
    assert!(matches!(
      tx.insert_order(&order("LATE")).await,
      Err(StoreError::TransactionFinished)
    ));
    assert!(matches!(tx.commit().await, Err(StoreError::TransactionFinished)));
  }
}
