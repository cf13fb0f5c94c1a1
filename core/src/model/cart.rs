// dropline/src/model/cart.rs

use super::{Product, ProductId};
use serde::{Deserialize, Serialize};

/// One requested line of a submitted cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
  pub product_id: ProductId,
  pub quantity: i32,
}

impl CartLine {
  pub fn new(product_id: ProductId, quantity: i32) -> Self {
    Self { product_id, quantity }
  }
}

/// A cart line that passed the pre-check, with the product snapshot the order item
/// is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedLine {
  pub product_id: ProductId,
  pub quantity: i32,
  pub unit_price_cents: i64,
  pub name: String,
  pub brand: String,
  pub size: String,
}

impl ValidatedLine {
  pub fn from_product(product: &Product, quantity: i32) -> Self {
    Self {
      product_id: product.id,
      quantity,
      unit_price_cents: product.price_cents,
      name: product.name.clone(),
      brand: product.brand.clone(),
      size: product.size.clone(),
    }
  }

  pub fn line_total_cents(&self) -> i64 {
    self.unit_price_cents * i64::from(self.quantity)
  }
}
