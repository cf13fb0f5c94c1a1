// dropline/src/checkout/pricing.rs

use crate::model::ValidatedLine;
use serde::Serialize;

/// Flat-rate shipping, optionally waived above a subtotal threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingPolicy {
  pub flat_cents: i64,
  pub free_threshold_cents: Option<i64>,
}

impl Default for ShippingPolicy {
  fn default() -> Self {
    Self {
      flat_cents: 1000,
      free_threshold_cents: None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
  pub subtotal_cents: i64,
  pub shipping_cents: i64,
  pub total_cents: i64,
}

impl ShippingPolicy {
  pub fn shipping_for(&self, subtotal_cents: i64) -> i64 {
    match self.free_threshold_cents {
      Some(threshold) if subtotal_cents >= threshold => 0,
      _ => self.flat_cents,
    }
  }

  /// Totals from the pre-check price snapshots, never from live prices.
  pub fn totals(&self, lines: &[ValidatedLine]) -> OrderTotals {
    let subtotal_cents = lines.iter().map(ValidatedLine::line_total_cents).sum();
    let shipping_cents = self.shipping_for(subtotal_cents);
    OrderTotals {
      subtotal_cents,
      shipping_cents,
      total_cents: subtotal_cents + shipping_cents,
    }
  }
}
