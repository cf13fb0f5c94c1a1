// dropline/src/model/order.rs

use super::{ParseEnumError, ProductId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type OrderId = Uuid;
pub type UserId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Paid,
  Fulfilled,
  Cancelled,
}

impl OrderStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Paid => "paid",
      OrderStatus::Fulfilled => "fulfilled",
      OrderStatus::Cancelled => "cancelled",
    }
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = ParseEnumError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(OrderStatus::Pending),
      "paid" => Ok(OrderStatus::Paid),
      "fulfilled" => Ok(OrderStatus::Fulfilled),
      "cancelled" => Ok(OrderStatus::Cancelled),
      other => Err(ParseEnumError::new("order status", other)),
    }
  }
}

/// Order header. `total_cents == subtotal_cents + shipping_cents` at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
  pub id: OrderId,
  pub order_number: String,
  /// `None` for guest checkout.
  pub user_id: Option<UserId>,
  pub status: OrderStatus,
  pub subtotal_cents: i64,
  pub shipping_cents: i64,
  pub total_cents: i64,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: OrderId,
  pub product_id: ProductId,
  pub quantity: i32,
  /// Snapshot taken at pre-check time; never recomputed from the live price.
  pub price_at_purchase_cents: i64,
}

/// An order with its lines, as returned by support lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetails {
  pub order: Order,
  pub items: Vec<OrderItem>,
}
