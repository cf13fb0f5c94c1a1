// dropline/src/model/mod.rs

//! Entities of the checkout core: products, orders, order items and the stock ledger.

pub mod cart;
pub mod order;
pub mod product;
pub mod stock_move;

pub use cart::{CartLine, ValidatedLine};
pub use order::{Order, OrderDetails, OrderId, OrderItem, OrderStatus, UserId};
pub use product::{Product, ProductId, ProductStatus};
pub use stock_move::{LedgerSnapshot, MoveReason, StockMove};

/// A stored enum column held a value this version does not know.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
  pub kind: &'static str,
  pub value: String,
}

impl ParseEnumError {
  pub(crate) fn new(kind: &'static str, value: &str) -> Self {
    Self {
      kind,
      value: value.to_string(),
    }
  }
}
