// dropline/src/checkout/deadline.rs

use crate::error::{CheckoutError, CheckoutResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{event, Level};

/// Request-scoped time budget of one checkout.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
  at: Instant,
  budget: Duration,
}

impl Deadline {
  /// Starts the clock now.
  pub fn after(budget: Duration) -> Self {
    Self {
      at: Instant::now() + budget,
      budget,
    }
  }

  /// Runs `work` unless the budget runs out first, in which case `work` is dropped and
  /// `TimedOut` returned.
  pub async fn run<T, F>(&self, work: F) -> CheckoutResult<T>
  where
    F: Future<Output = CheckoutResult<T>>,
  {
    match tokio::time::timeout_at(self.at, work).await {
      Ok(result) => result,
      Err(_) => {
        event!(Level::WARN, budget = ?self.budget, "Checkout deadline exceeded, open work discarded.");
        Err(CheckoutError::TimedOut(self.budget))
      }
    }
  }
}
