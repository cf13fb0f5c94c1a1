// storefront/src/db/pg_store.rs

//! PostgreSQL implementation of the checkout storage seam.
//!
//! `begin()` opens a real database transaction. The guarded decrement is a single
//! conditional `UPDATE`, so under READ COMMITTED a concurrent writer blocks on the row
//! lock and then re-evaluates the guard against the committed value.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dropline::model::{
  LedgerSnapshot, Order, OrderDetails, OrderItem, OrderStatus, Product, ProductId, ProductStatus, StockMove,
};
use dropline::{InventoryStore, StockTransaction, StoreError, StoreResult};
use sqlx::postgres::{PgPool, Postgres};
use sqlx::{FromRow, Transaction};
use tracing::{event, Level};
use uuid::Uuid;

const ORDER_NUMBER_CONSTRAINT: &str = "orders_order_number_key";

#[derive(Clone)]
pub struct PgInventoryStore {
  pool: PgPool,
}

impl PgInventoryStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[derive(FromRow)]
struct ProductRow {
  id: Uuid,
  name: String,
  brand: String,
  size: String,
  price_cents: i64,
  status: String,
  quantity_available: i32,
  quantity_sold: i32,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
  type Error = StoreError;

  fn try_from(row: ProductRow) -> StoreResult<Self> {
    Ok(Product {
      id: row.id,
      name: row.name,
      brand: row.brand,
      size: row.size,
      price_cents: row.price_cents,
      status: row.status.parse::<ProductStatus>().map_err(backend)?,
      quantity_available: row.quantity_available,
      quantity_sold: row.quantity_sold,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}

#[derive(FromRow)]
struct OrderRow {
  id: Uuid,
  order_number: String,
  user_id: Option<Uuid>,
  status: String,
  subtotal_cents: i64,
  shipping_cents: i64,
  total_cents: i64,
  created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
  type Error = StoreError;

  fn try_from(row: OrderRow) -> StoreResult<Self> {
    Ok(Order {
      id: row.id,
      order_number: row.order_number,
      user_id: row.user_id,
      status: row.status.parse::<OrderStatus>().map_err(backend)?,
      subtotal_cents: row.subtotal_cents,
      shipping_cents: row.shipping_cents,
      total_cents: row.total_cents,
      created_at: row.created_at,
    })
  }
}

#[derive(FromRow)]
struct OrderItemRow {
  id: Uuid,
  order_id: Uuid,
  product_id: Uuid,
  quantity: i32,
  price_at_purchase_cents: i64,
}

impl From<OrderItemRow> for OrderItem {
  fn from(row: OrderItemRow) -> Self {
    OrderItem {
      id: row.id,
      order_id: row.order_id,
      product_id: row.product_id,
      quantity: row.quantity,
      price_at_purchase_cents: row.price_at_purchase_cents,
    }
  }
}

#[derive(FromRow)]
struct LedgerRow {
  id: Uuid,
  quantity_available: i32,
  quantity_sold: i32,
  checkout_moves_total: i64,
}

pub(crate) fn backend<E>(err: E) -> StoreError
where
  E: std::error::Error + Send + Sync + 'static,
{
  StoreError::from(anyhow::Error::new(err))
}

const PRODUCT_COLUMNS: &str =
  "id, name, brand, size, price_cents, status, quantity_available, quantity_sold, created_at, updated_at";

#[async_trait]
impl InventoryStore for PgInventoryStore {
  async fn find_product(&self, product_id: ProductId) -> StoreResult<Option<Product>> {
    let row: Option<ProductRow> = sqlx::query_as(&format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS))
      .bind(product_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(backend)?;
    row.map(Product::try_from).transpose()
  }

  async fn begin(&self) -> StoreResult<Box<dyn StockTransaction>> {
    let tx = self.pool.begin().await.map_err(backend)?;
    Ok(Box::new(PgStockTransaction { tx: Some(tx) }))
  }

  async fn find_order_by_number(&self, order_number: &str) -> StoreResult<Option<OrderDetails>> {
    let row: Option<OrderRow> = sqlx::query_as(
      "SELECT id, order_number, user_id, status, subtotal_cents, shipping_cents, total_cents, created_at \
       FROM orders WHERE order_number = $1",
    )
    .bind(order_number)
    .fetch_optional(&self.pool)
    .await
    .map_err(backend)?;

    let order = match row {
      Some(row) => Order::try_from(row)?,
      None => return Ok(None),
    };

    let items: Vec<OrderItemRow> = sqlx::query_as(
      "SELECT id, order_id, product_id, quantity, price_at_purchase_cents \
       FROM order_items WHERE order_id = $1 ORDER BY product_id",
    )
    .bind(order.id)
    .fetch_all(&self.pool)
    .await
    .map_err(backend)?;

    Ok(Some(OrderDetails {
      order,
      items: items.into_iter().map(OrderItem::from).collect(),
    }))
  }

  async fn ledger_snapshot(&self, product_id: ProductId) -> StoreResult<Option<LedgerSnapshot>> {
    let row: Option<LedgerRow> = sqlx::query_as(
      r#"
      SELECT p.id, p.quantity_available, p.quantity_sold,
             COALESCE(SUM(m.quantity_change) FILTER (WHERE m.reason = 'checkout'), 0)::BIGINT AS checkout_moves_total
      FROM products p
      LEFT JOIN stock_moves m ON m.product_id = p.id
      WHERE p.id = $1
      GROUP BY p.id
      "#,
    )
    .bind(product_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(backend)?;

    Ok(row.map(|row| LedgerSnapshot {
      product_id: row.id,
      quantity_available: row.quantity_available,
      quantity_sold: row.quantity_sold,
      checkout_moves_total: row.checkout_moves_total,
    }))
  }
}

/// An open database transaction. Dropping it unfinished rolls it back.
pub struct PgStockTransaction {
  tx: Option<Transaction<'static, Postgres>>,
}

impl PgStockTransaction {
  fn open(&mut self) -> StoreResult<&mut Transaction<'static, Postgres>> {
    self.tx.as_mut().ok_or(StoreError::TransactionFinished)
  }
}

#[async_trait]
impl StockTransaction for PgStockTransaction {
  async fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
    let tx = self.open()?;
    sqlx::query(
      "INSERT INTO orders (id, order_number, user_id, status, subtotal_cents, shipping_cents, total_cents, created_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(order.id)
    .bind(&order.order_number)
    .bind(order.user_id)
    .bind(order.status.as_str())
    .bind(order.subtotal_cents)
    .bind(order.shipping_cents)
    .bind(order.total_cents)
    .bind(order.created_at)
    .execute(&mut **tx)
    .await
    .map_err(|err| {
      let duplicate_number = matches!(
        &err,
        sqlx::Error::Database(db_err)
          if db_err.is_unique_violation() && db_err.constraint() == Some(ORDER_NUMBER_CONSTRAINT)
      );
      if duplicate_number {
        StoreError::DuplicateOrderNumber(order.order_number.clone())
      } else {
        backend(err)
      }
    })?;
    Ok(())
  }

  async fn insert_order_item(&mut self, item: &OrderItem) -> StoreResult<()> {
    let tx = self.open()?;
    sqlx::query(
      "INSERT INTO order_items (id, order_id, product_id, quantity, price_at_purchase_cents) \
       VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(item.id)
    .bind(item.order_id)
    .bind(item.product_id)
    .bind(item.quantity)
    .bind(item.price_at_purchase_cents)
    .execute(&mut **tx)
    .await
    .map_err(backend)?;
    Ok(())
  }

  async fn decrement_stock(&mut self, product_id: ProductId, quantity: i32) -> StoreResult<u64> {
    let tx = self.open()?;
    let result = sqlx::query(
      r#"
      UPDATE products
      SET quantity_available = quantity_available - $2,
          quantity_sold = quantity_sold + $2,
          updated_at = NOW()
      WHERE id = $1 AND status = 'available' AND quantity_available >= $2
      "#,
    )
    .bind(product_id)
    .bind(quantity)
    .execute(&mut **tx)
    .await
    .map_err(backend)?;
    Ok(result.rows_affected())
  }

  async fn append_stock_move(&mut self, stock_move: &StockMove) -> StoreResult<()> {
    let tx = self.open()?;
    sqlx::query(
      "INSERT INTO stock_moves (id, product_id, order_id, quantity_change, reason, created_at) \
       VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(stock_move.id)
    .bind(stock_move.product_id)
    .bind(stock_move.order_id)
    .bind(stock_move.quantity_change)
    .bind(stock_move.reason.as_str())
    .bind(stock_move.created_at)
    .execute(&mut **tx)
    .await
    .map_err(backend)?;
    Ok(())
  }

  async fn commit(&mut self) -> StoreResult<()> {
    let tx = self.tx.take().ok_or(StoreError::TransactionFinished)?;
    tx.commit().await.map_err(backend)
  }

  async fn rollback(&mut self) -> StoreResult<()> {
    let tx = self.tx.take().ok_or(StoreError::TransactionFinished)?;
    tx.rollback().await.map_err(backend)?;
    event!(Level::DEBUG, "Postgres transaction rolled back.");
    Ok(())
  }
}
