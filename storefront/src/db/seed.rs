// storefront/src/db/seed.rs

//! Sample catalog for development runs (`SEED_DB=true`).

use crate::errors::Result;
use dropline::model::Product;
use dropline::MemoryStore;
use sqlx::PgPool;
use tracing::info;

pub fn sample_products() -> Vec<Product> {
  vec![
    Product::new("Box Logo Hoodie", "Supreme", "L", 16800, 3),
    Product::new("Box Logo Tee", "Supreme", "M", 4800, 10),
    Product::new("Dunk Low Panda", "Nike", "10", 11000, 2),
    Product::new("Nuptse 1996 Jacket", "The North Face", "M", 32000, 1),
    Product::new("Yeezy Boost 350 V2 Zebra", "Adidas", "9.5", 23000, 1),
    Product::new("Arc Logo Cap", "Palace", "OS", 3800, 25),
  ]
}

pub fn seed_memory(store: &MemoryStore) {
  if store.product_count() > 0 {
    return;
  }
  let products = sample_products();
  let count = products.len();
  for product in products {
    store.insert_product(product);
  }
  info!(count, "Seeded in-memory store with sample products.");
}

/// Inserts the sample catalog if the products table is empty.
pub async fn seed_postgres(pool: &PgPool) -> Result<()> {
  let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products").fetch_one(pool).await?;
  if existing > 0 {
    info!(existing, "Products table not empty, skipping seed.");
    return Ok(());
  }

  let products = sample_products();
  insert_products(pool, &products).await?;
  info!(count = products.len(), "Seeded products table with sample products.");
  Ok(())
}

/// Inserts the given catalog rows in one transaction.
pub async fn insert_products(pool: &PgPool, products: &[Product]) -> Result<()> {
  let mut tx = pool.begin().await?;
  for product in products {
    sqlx::query(
      "INSERT INTO products (id, name, brand, size, price_cents, status, quantity_available, quantity_sold, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.brand)
    .bind(&product.size)
    .bind(product.price_cents)
    .bind(product.status.as_str())
    .bind(product.quantity_available)
    .bind(product.quantity_sold)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(&mut *tx)
    .await?;
  }
  tx.commit().await?;
  Ok(())
}
