// dropline/src/model/stock_move.rs

use super::{OrderId, ParseEnumError, ProductId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveReason {
  Checkout,
  Restock,
  Adjustment,
}

impl MoveReason {
  pub fn as_str(&self) -> &'static str {
    match self {
      MoveReason::Checkout => "checkout",
      MoveReason::Restock => "restock",
      MoveReason::Adjustment => "adjustment",
    }
  }
}

impl fmt::Display for MoveReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for MoveReason {
  type Err = ParseEnumError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "checkout" => Ok(MoveReason::Checkout),
      "restock" => Ok(MoveReason::Restock),
      "adjustment" => Ok(MoveReason::Adjustment),
      other => Err(ParseEnumError::new("stock move reason", other)),
    }
  }
}

/// Append-only inventory ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMove {
  pub id: Uuid,
  pub product_id: ProductId,
  pub order_id: Option<OrderId>,
  /// Negative for a sale.
  pub quantity_change: i32,
  pub reason: MoveReason,
  pub created_at: DateTime<Utc>,
}

impl StockMove {
  pub fn checkout(product_id: ProductId, order_id: OrderId, quantity: i32) -> Self {
    Self {
      id: Uuid::new_v4(),
      product_id,
      order_id: Some(order_id),
      quantity_change: -quantity,
      reason: MoveReason::Checkout,
      created_at: Utc::now(),
    }
  }
}

/// Stock counters next to the ledger total, for auditing one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerSnapshot {
  pub product_id: ProductId,
  pub quantity_available: i32,
  pub quantity_sold: i32,
  /// Sum of `quantity_change` over all checkout moves of the product.
  pub checkout_moves_total: i64,
}

impl LedgerSnapshot {
  /// Every unit counted as sold must have a matching negative checkout move.
  pub fn reconciles(&self) -> bool {
    i64::from(self.quantity_sold) == -self.checkout_moves_total
  }
}
