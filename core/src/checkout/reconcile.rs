// dropline/src/checkout/reconcile.rs

//! Decides whether a commit attempt may be committed, from the affected-row counts of
//! its guarded decrements.

use crate::error::{CheckoutError, CheckoutResult};
use crate::model::ProductId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecrementOutcome {
  pub product_id: ProductId,
  pub quantity: i32,
  pub rows_affected: u64,
}

impl DecrementOutcome {
  /// Exactly one product row must have matched the guard.
  pub fn applied(&self) -> bool {
    self.rows_affected == 1
  }
}

/// `Ok` when every decrement applied. Otherwise a `StockConflict` naming every product
/// whose guard failed, in cart order. The caller must roll back on `Err`.
pub fn reconcile(outcomes: &[DecrementOutcome]) -> CheckoutResult<()> {
  let product_ids: Vec<ProductId> = outcomes
    .iter()
    .filter(|outcome| !outcome.applied())
    .map(|outcome| outcome.product_id)
    .collect();
  if product_ids.is_empty() {
    Ok(())
  } else {
    Err(CheckoutError::StockConflict { product_ids })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use uuid::Uuid;

  #[test]
  fn all_applied_reconciles() {
    let outcomes = [
      DecrementOutcome {
        product_id: Uuid::new_v4(),
        quantity: 1,
        rows_affected: 1,
      },
      DecrementOutcome {
        product_id: Uuid::new_v4(),
        quantity: 3,
        rows_affected: 1,
      },
    ];
    assert!(reconcile(&outcomes).is_ok());
  }

  #[test]
  fn every_failed_guard_is_reported() {
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let outcomes = [
      DecrementOutcome {
        product_id: a,
        quantity: 1,
        rows_affected: 0,
      },
      DecrementOutcome {
        product_id: b,
        quantity: 1,
        rows_affected: 1,
      },
      DecrementOutcome {
        product_id: c,
        quantity: 2,
        rows_affected: 0,
      },
    ];
    match reconcile(&outcomes) {
      Err(CheckoutError::StockConflict { product_ids }) => assert_eq!(product_ids, vec![a, c]),
      other => panic!("expected StockConflict, got {:?}", other),
    }
  }
}
