// dropline/src/error.rs
use crate::model::{ProductId, ProductStatus};
use anyhow::Error as AnyhowError;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Failures raised by the step engine itself rather than by handlers.
#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },
}

/// Failures reported by an `InventoryStore` / `StockTransaction` implementation.
#[derive(Debug, Error)]
pub enum StoreError {
  /// The storage-level unique constraint on the order number rejected the insert.
  #[error("Order number '{0}' already exists")]
  DuplicateOrderNumber(String),

  /// The transaction was already committed or rolled back.
  #[error("Transaction already finished")]
  TransactionFinished,

  #[error("Storage backend error: {source}")]
  Backend {
    #[source]
    source: AnyhowError,
  },
}

impl From<AnyhowError> for StoreError {
  fn from(err: AnyhowError) -> Self {
    StoreError::Backend { source: err }
  }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Why a single cart line failed the stock pre-check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason")]
pub enum LineFailureReason {
  ProductNotFound,
  ProductUnavailable { status: ProductStatus },
  InsufficientStock { requested: i32, available: i32 },
}

/// A cart line rejected by the pre-check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineFailure {
  pub product_id: ProductId,
  #[serde(flatten)]
  pub reason: LineFailureReason,
}

impl std::fmt::Display for LineFailure {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match &self.reason {
      LineFailureReason::ProductNotFound => write!(f, "product {} not found", self.product_id),
      LineFailureReason::ProductUnavailable { status } => {
        write!(f, "product {} is {}", self.product_id, status)
      }
      LineFailureReason::InsufficientStock { requested, available } => write!(
        f,
        "product {}: requested {}, only {} available",
        self.product_id, requested, available
      ),
    }
  }
}

#[derive(Debug, Error)]
pub enum CheckoutError {
  /// The cart is malformed (empty, non-positive quantity).
  #[error("Invalid cart: {0}")]
  InvalidCart(String),

  /// One or more lines failed the pre-check. Nothing was written.
  #[error("Insufficient stock for {} item(s)", .0.len())]
  StockValidation(Vec<LineFailure>),

  /// A guarded decrement affected zero rows at commit time. The whole attempt was
  /// rolled back; retrying is safe.
  #[error("Stock changed during checkout for {} product(s)", .product_ids.len())]
  StockConflict { product_ids: Vec<ProductId> },

  #[error("Could not allocate a unique order number after {attempts} attempts")]
  OrderNumberExhausted { attempts: u32 },

  #[error("Checkout did not finish within {0:?}")]
  TimedOut(Duration),

  /// The checkout pipeline ended without producing a receipt.
  #[error("Checkout incomplete: {0}")]
  Incomplete(String),

  #[error("Storage error: {0}")]
  Store(#[from] StoreError),

  #[error("Pipeline error: {0}")]
  Pipeline(#[from] PipelineError),
}

impl CheckoutError {
  /// Whether the caller can reasonably retry the same cart unchanged.
  pub fn is_retryable(&self) -> bool {
    matches!(
      self,
      CheckoutError::StockConflict { .. } | CheckoutError::TimedOut(_) | CheckoutError::OrderNumberExhausted { .. }
    )
  }
}

pub type CheckoutResult<T> = std::result::Result<T, CheckoutError>;
