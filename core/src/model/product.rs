// dropline/src/model/product.rs

use super::ParseEnumError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type ProductId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
  Available,
  Reserved,
  Sold,
  Archived,
}

impl ProductStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      ProductStatus::Available => "available",
      ProductStatus::Reserved => "reserved",
      ProductStatus::Sold => "sold",
      ProductStatus::Archived => "archived",
    }
  }
}

impl fmt::Display for ProductStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ProductStatus {
  type Err = ParseEnumError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "available" => Ok(ProductStatus::Available),
      "reserved" => Ok(ProductStatus::Reserved),
      "sold" => Ok(ProductStatus::Sold),
      "archived" => Ok(ProductStatus::Archived),
      other => Err(ParseEnumError::new("product status", other)),
    }
  }
}

/// A sellable item. One row per physical listing; streetwear drops usually carry a
/// handful of units per size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
  pub id: ProductId,
  pub name: String,
  pub brand: String,
  pub size: String,
  pub price_cents: i64,
  pub status: ProductStatus,
  /// Never negative.
  pub quantity_available: i32,
  /// Only ever grows.
  pub quantity_sold: i32,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Product {
  /// A new `available` listing with nothing sold yet.
  pub fn new(
    name: impl Into<String>,
    brand: impl Into<String>,
    size: impl Into<String>,
    price_cents: i64,
    quantity_available: i32,
  ) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      name: name.into(),
      brand: brand.into(),
      size: size.into(),
      price_cents,
      status: ProductStatus::Available,
      quantity_available,
      quantity_sold: 0,
      created_at: now,
      updated_at: now,
    }
  }

  pub fn with_status(mut self, status: ProductStatus) -> Self {
    self.status = status;
    self
  }

  /// The same condition the commit-time guard re-checks.
  pub fn can_fulfil(&self, quantity: i32) -> bool {
    self.status == ProductStatus::Available && self.quantity_available >= quantity
  }
}
