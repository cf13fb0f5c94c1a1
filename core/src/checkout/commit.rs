// dropline/src/checkout/commit.rs

//! The atomic order commit.
//!
//! Everything for one attempt happens inside a single store transaction: order
//! header, order items, guarded stock decrements and ledger entries. The
//! affected-row counts of the decrements are reconciled before commit; any failed
//! guard rolls the whole transaction back.
//!
//! The checkout deadline covers staging only. Once COMMIT is sent it is awaited to
//! the end, so a landed order is never reported as timed out.

use crate::checkout::deadline::Deadline;
use crate::checkout::order_number::OrderNumberGenerator;
use crate::checkout::pricing::OrderTotals;
use crate::checkout::reconcile::{reconcile, DecrementOutcome};
use crate::error::{CheckoutError, CheckoutResult, StoreError};
use crate::model::{Order, OrderId, OrderItem, OrderStatus, StockMove, UserId, ValidatedLine};
use crate::store::{InventoryStore, StockTransaction};
use chrono::Utc;
use serde::Serialize;
use tracing::{event, instrument, Level};
use uuid::Uuid;

/// What the buyer gets back from a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
  pub order_id: OrderId,
  pub order_number: String,
  pub subtotal_cents: i64,
  pub shipping_cents: i64,
  pub total_cents: i64,
  /// Number of order lines.
  pub item_count: usize,
}

/// Commits one order for already pre-checked lines.
///
/// A duplicate order number only ever hits the first write of an attempt, so the
/// attempt is rolled back and retried with a fresh number, up to `max_attempts`.
///
/// `deadline` bounds everything up to the store's COMMIT. The COMMIT itself always runs
/// to completion so that its outcome is what the caller sees.
#[instrument(
  name = "commit::commit_order",
  skip_all,
  fields(buyer = ?buyer, lines = lines.len(), total_cents = totals.total_cents),
  err(Display)
)]
pub async fn commit_order(
  store: &dyn InventoryStore,
  numbers: &dyn OrderNumberGenerator,
  buyer: Option<UserId>,
  lines: &[ValidatedLine],
  totals: OrderTotals,
  max_attempts: u32,
  deadline: Deadline,
) -> CheckoutResult<Receipt> {
  for attempt in 1..=max_attempts {
    let order = Order {
      id: Uuid::new_v4(),
      order_number: numbers.next_number(),
      user_id: buyer,
      status: OrderStatus::Pending,
      subtotal_cents: totals.subtotal_cents,
      shipping_cents: totals.shipping_cents,
      total_cents: totals.total_cents,
      created_at: Utc::now(),
    };

    // On expiry the staged transaction is dropped with the future, discarding its writes.
    let mut tx = match deadline.run(stage_order(store, &order, lines)).await? {
      Staged::Ready(tx) => tx,
      Staged::NumberTaken(number) => {
        event!(Level::WARN, %number, attempt, "Order number collision, retrying with a new number.");
        continue;
      }
    };

    tx.commit().await?;
    event!(Level::INFO, order_number = %order.order_number, order_id = %order.id, "Order committed.");
    return Ok(Receipt {
      order_id: order.id,
      order_number: order.order_number,
      subtotal_cents: totals.subtotal_cents,
      shipping_cents: totals.shipping_cents,
      total_cents: totals.total_cents,
      item_count: lines.len(),
    });
  }

  Err(CheckoutError::OrderNumberExhausted { attempts: max_attempts })
}

enum Staged {
  /// Every write of the attempt applied and reconciled; only COMMIT is left.
  Ready(Box<dyn StockTransaction>),
  /// The order number was taken. The attempt's transaction is already rolled back.
  NumberTaken(String),
}

/// One attempt up to, but not including, COMMIT.
async fn stage_order(store: &dyn InventoryStore, order: &Order, lines: &[ValidatedLine]) -> CheckoutResult<Staged> {
  let mut tx = store.begin().await?;
  match tx.insert_order(order).await {
    Ok(()) => {}
    Err(StoreError::DuplicateOrderNumber(number)) => {
      tx.rollback().await?;
      return Ok(Staged::NumberTaken(number));
    }
    Err(e) => return Err(abort(tx, e.into()).await),
  }

  let outcomes = match apply_lines(tx.as_mut(), order.id, lines).await {
    Ok(outcomes) => outcomes,
    Err(e) => return Err(abort(tx, e.into()).await),
  };

  if let Err(conflict) = reconcile(&outcomes) {
    event!(Level::WARN, order_number = %order.order_number, error = %conflict, "Guarded decrement failed, rolling back.");
    return Err(abort(tx, conflict).await);
  }
  Ok(Staged::Ready(tx))
}

/// Writes the item, the guarded decrement and (if it applied) the ledger entry for
/// every line. Keeps going after a failed guard so that every conflicting product is
/// known; the transaction is rolled back in that case anyway.
async fn apply_lines(
  tx: &mut dyn StockTransaction,
  order_id: OrderId,
  lines: &[ValidatedLine],
) -> Result<Vec<DecrementOutcome>, StoreError> {
  // Product rows are locked in id order so two multi-item checkouts cannot deadlock.
  let mut write_order: Vec<(usize, &ValidatedLine)> = lines.iter().enumerate().collect();
  write_order.sort_by_key(|(_, line)| line.product_id);

  let mut outcomes = Vec::with_capacity(lines.len());
  for (cart_idx, line) in write_order {
    tx.insert_order_item(&OrderItem {
      id: Uuid::new_v4(),
      order_id,
      product_id: line.product_id,
      quantity: line.quantity,
      price_at_purchase_cents: line.unit_price_cents,
    })
    .await?;

    let rows_affected = tx.decrement_stock(line.product_id, line.quantity).await?;
    let outcome = DecrementOutcome {
      product_id: line.product_id,
      quantity: line.quantity,
      rows_affected,
    };
    if outcome.applied() {
      tx.append_stock_move(&StockMove::checkout(line.product_id, order_id, line.quantity))
        .await?;
    } else {
      event!(Level::DEBUG, product_id = %line.product_id, rows_affected, "Guard rejected decrement.");
    }
    outcomes.push((cart_idx, outcome));
  }
  outcomes.sort_by_key(|(cart_idx, _)| *cart_idx);
  Ok(outcomes.into_iter().map(|(_, outcome)| outcome).collect())
}

/// Rolls back and hands back the original error. A failed rollback is only logged:
/// the store discards an unfinished transaction on its own once it is dropped.
async fn abort(mut tx: Box<dyn StockTransaction>, error: CheckoutError) -> CheckoutError {
  if let Err(rollback_err) = tx.rollback().await {
    event!(Level::ERROR, error = %rollback_err, "Rollback failed.");
  }
  error
}
