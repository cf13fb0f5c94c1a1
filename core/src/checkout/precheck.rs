// dropline/src/checkout/precheck.rs

//! Read-only stock pre-check.
//!
//! Advisory only: results can be stale by the time the commit runs. The commit's
//! guarded decrement is what actually protects stock.

use crate::error::{CheckoutError, CheckoutResult, LineFailure, LineFailureReason, StoreResult};
use crate::model::{CartLine, Product, ProductStatus, ValidatedLine};
use crate::store::InventoryStore;
use futures_util::future::try_join_all;
use tracing::{event, instrument, Level};

/// Rejects empty carts and non-positive quantities, and merges repeated lines for
/// the same product (first-seen order kept) so the guard sees the real demand.
pub fn normalize_cart(lines: &[CartLine]) -> CheckoutResult<Vec<CartLine>> {
  if lines.is_empty() {
    return Err(CheckoutError::InvalidCart("cart has no items".to_string()));
  }

  let mut merged: Vec<CartLine> = Vec::with_capacity(lines.len());
  for line in lines {
    if line.quantity <= 0 {
      return Err(CheckoutError::InvalidCart(format!(
        "quantity for product {} must be positive, got {}",
        line.product_id, line.quantity
      )));
    }
    match merged.iter_mut().find(|m| m.product_id == line.product_id) {
      Some(existing) => {
        existing.quantity = existing.quantity.checked_add(line.quantity).ok_or_else(|| {
          CheckoutError::InvalidCart(format!("quantity for product {} is too large", line.product_id))
        })?;
      }
      None => merged.push(*line),
    }
  }
  Ok(merged)
}

/// Validates one line against the product row read for it.
pub fn check_line(product: Option<&Product>, line: &CartLine) -> Result<ValidatedLine, LineFailure> {
  let failure = |reason: LineFailureReason| LineFailure {
    product_id: line.product_id,
    reason,
  };
  let product = product.ok_or_else(|| failure(LineFailureReason::ProductNotFound))?;
  if product.status != ProductStatus::Available {
    return Err(failure(LineFailureReason::ProductUnavailable { status: product.status }));
  }
  if product.quantity_available < line.quantity {
    return Err(failure(LineFailureReason::InsufficientStock {
      requested: line.quantity,
      available: product.quantity_available,
    }));
  }
  Ok(ValidatedLine::from_product(product, line.quantity))
}

/// Reads every product concurrently and returns one result per line, in cart order.
#[instrument(name = "precheck::check_lines", skip_all, fields(lines = lines.len()))]
pub async fn check_lines(
  store: &dyn InventoryStore,
  lines: &[CartLine],
) -> StoreResult<Vec<Result<ValidatedLine, LineFailure>>> {
  let products = try_join_all(lines.iter().map(|line| store.find_product(line.product_id))).await?;
  Ok(
    lines
      .iter()
      .zip(products.iter())
      .map(|(line, product)| check_line(product.as_ref(), line))
      .collect(),
  )
}

/// All lines valid, or every failure at once.
pub fn into_validated(results: Vec<Result<ValidatedLine, LineFailure>>) -> CheckoutResult<Vec<ValidatedLine>> {
  let mut validated = Vec::with_capacity(results.len());
  let mut failures = Vec::new();
  for result in results {
    match result {
      Ok(line) => validated.push(line),
      Err(failure) => failures.push(failure),
    }
  }
  if !failures.is_empty() {
    for failure in &failures {
      event!(Level::INFO, %failure, "Pre-check rejected line.");
    }
    return Err(CheckoutError::StockValidation(failures));
  }
  Ok(validated)
}
