// dropline/src/checkout/mod.rs

//! The checkout flow: `normalize_cart` -> `precheck_stock` -> `commit_order`, run as a
//! pipeline over a shared `CheckoutCtxData`. One deadline bounds the run up to the
//! store's COMMIT.

pub mod commit;
pub mod deadline;
pub mod order_number;
pub mod precheck;
pub mod pricing;
pub mod reconcile;

pub use commit::{commit_order, Receipt};
pub use deadline::Deadline;
pub use order_number::{OrderNumberGenerator, TimeRandomOrderNumbers};
pub use precheck::{check_line, check_lines, into_validated, normalize_cart};
pub use pricing::{OrderTotals, ShippingPolicy};
pub use reconcile::{reconcile, DecrementOutcome};

use crate::core::context_data::ContextData;
use crate::core::control::{PipelineControl, PipelineResult};
use crate::error::{CheckoutError, CheckoutResult};
use crate::model::{CartLine, UserId, ValidatedLine};
use crate::pipeline::Pipeline;
use crate::store::InventoryStore;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

pub const STEP_NORMALIZE: &str = "normalize_cart";
pub const STEP_PRECHECK: &str = "precheck_stock";
pub const STEP_COMMIT: &str = "commit_order";

#[derive(Debug, Clone)]
pub struct CheckoutConfig {
  pub shipping: ShippingPolicy,
  pub max_order_number_attempts: u32,
  /// Upper bound for one checkout up to COMMIT. On expiry the open transaction is
  /// dropped, which discards its writes. A COMMIT already sent is always awaited.
  pub deadline: Duration,
}

impl Default for CheckoutConfig {
  fn default() -> Self {
    Self {
      shipping: ShippingPolicy::default(),
      max_order_number_attempts: 5,
      deadline: Duration::from_secs(5),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutRequest {
  pub buyer: Option<UserId>,
  pub lines: Vec<CartLine>,
}

/// State shared by the checkout steps of one run.
#[derive(Debug, Clone)]
pub struct CheckoutCtxData {
  pub deadline: Deadline,
  pub buyer: Option<UserId>,
  pub lines: Vec<CartLine>,
  pub validated: Vec<ValidatedLine>,
  pub receipt: Option<Receipt>,
}

/// Entry point for placing orders.
pub struct Checkout {
  pipeline: Pipeline<CheckoutCtxData, CheckoutError>,
  config: CheckoutConfig,
}

impl Checkout {
  pub fn new(
    store: Arc<dyn InventoryStore>,
    numbers: Arc<dyn OrderNumberGenerator>,
    config: CheckoutConfig,
  ) -> Self {
    let mut pipeline = Pipeline::new(&[(STEP_NORMALIZE, false), (STEP_PRECHECK, false), (STEP_COMMIT, false)]);

    pipeline.on_root(STEP_NORMALIZE, |ctx: ContextData<CheckoutCtxData>| async move {
      let mut guard = ctx.write();
      guard.lines = normalize_cart(&guard.lines)?;
      Ok::<_, CheckoutError>(PipelineControl::Continue)
    });

    let precheck_store = store.clone();
    pipeline.on_root(STEP_PRECHECK, move |ctx: ContextData<CheckoutCtxData>| {
      let store = precheck_store.clone();
      async move {
        let (deadline, lines) = {
          let guard = ctx.read();
          (guard.deadline, guard.lines.clone())
        };
        let results = deadline
          .run(async { check_lines(store.as_ref(), &lines).await.map_err(CheckoutError::from) })
          .await?;
        let validated = into_validated(results)?;
        ctx.write().validated = validated;
        Ok::<_, CheckoutError>(PipelineControl::Continue)
      }
    });

    let shipping = config.shipping;
    let max_attempts = config.max_order_number_attempts;
    pipeline.on_root(STEP_COMMIT, move |ctx: ContextData<CheckoutCtxData>| {
      let store = store.clone();
      let numbers = numbers.clone();
      async move {
        let (deadline, buyer, validated) = {
          let guard = ctx.read();
          (guard.deadline, guard.buyer, guard.validated.clone())
        };
        let totals = shipping.totals(&validated);
        let receipt = commit_order(
          store.as_ref(),
          numbers.as_ref(),
          buyer,
          &validated,
          totals,
          max_attempts,
          deadline,
        )
        .await?;
        ctx.write().receipt = Some(receipt);
        Ok::<_, CheckoutError>(PipelineControl::Continue)
      }
    });

    Self { pipeline, config }
  }

  /// Validates the cart, pre-checks stock and commits the order atomically.
  ///
  /// Either every write of the order lands or none does. A `StockConflict` or
  /// `TimedOut` outcome left nothing behind and can be retried. The deadline is not
  /// applied to the COMMIT itself, so a committed order is always returned as `Ok`.
  #[instrument(
    name = "Checkout::place_order",
    skip_all,
    fields(buyer = ?request.buyer, lines = request.lines.len()),
    err(Display)
  )]
  pub async fn place_order(&self, request: CheckoutRequest) -> CheckoutResult<Receipt> {
    let ctx = ContextData::new(CheckoutCtxData {
      deadline: Deadline::after(self.config.deadline),
      buyer: request.buyer,
      lines: request.lines,
      validated: Vec::new(),
      receipt: None,
    });

    let result = self.pipeline.run(ctx.clone()).await?;
    if result == PipelineResult::Stopped {
      return Err(CheckoutError::Incomplete("checkout pipeline stopped early".to_string()));
    }
    let receipt = ctx.write().receipt.take();
    receipt.ok_or_else(|| CheckoutError::Incomplete("no receipt produced".to_string()))
  }
}
