// dropline/src/store/mod.rs

//! Storage seam of the checkout core.
//!
//! The checkout protocol only relies on what a relational store gives it:
//! parameterized reads, per-statement affected-row counts, and a transaction that
//! either commits every write or none of them.

pub mod memory;

pub use memory::MemoryStore;

use crate::error::StoreResult;
use crate::model::{LedgerSnapshot, Order, OrderDetails, OrderItem, Product, ProductId, StockMove};
use async_trait::async_trait;

#[async_trait]
pub trait InventoryStore: Send + Sync {
  /// Plain read with no locking. Used by the advisory pre-check.
  async fn find_product(&self, product_id: ProductId) -> StoreResult<Option<Product>>;

  /// Opens a transaction. Dropping it without `commit` must discard its writes.
  async fn begin(&self) -> StoreResult<Box<dyn StockTransaction>>;

  async fn find_order_by_number(&self, order_number: &str) -> StoreResult<Option<OrderDetails>>;

  async fn ledger_snapshot(&self, product_id: ProductId) -> StoreResult<Option<LedgerSnapshot>>;
}

/// One open unit of work.
///
/// After `commit` or `rollback` every further call returns
/// `StoreError::TransactionFinished`.
#[async_trait]
pub trait StockTransaction: Send {
  /// Fails with `StoreError::DuplicateOrderNumber` when the number is taken, including
  /// by another still-open transaction.
  async fn insert_order(&mut self, order: &Order) -> StoreResult<()>;

  async fn insert_order_item(&mut self, item: &OrderItem) -> StoreResult<()>;

  /// Guarded decrement: moves `quantity` units from available to sold only if the
  /// product is still `available` with at least `quantity` units. Returns the number of
  /// rows affected, so `0` means the guard failed at write time.
  async fn decrement_stock(&mut self, product_id: ProductId, quantity: i32) -> StoreResult<u64>;

  async fn append_stock_move(&mut self, stock_move: &StockMove) -> StoreResult<()>;

  async fn commit(&mut self) -> StoreResult<()>;

  async fn rollback(&mut self) -> StoreResult<()>;
}
