// tests/checkout_concurrency_tests.rs
mod common;

use common::*;
use dropline::{Checkout, CheckoutError, InventoryStore, MemoryStore};
use serial_test::serial;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_concurrent_buyers_never_oversell() {
  setup_tracing();
  const STOCK: i32 = 5;
  const BUYERS: usize = 24;

  let store = MemoryStore::new();
  let p = seed_product(&store, "Box Logo Hoodie FW24", 16800, STOCK);
  let checkout = Arc::new(checkout_over(Arc::new(store.clone())));

  let mut tasks = Vec::with_capacity(BUYERS);
  for _ in 0..BUYERS {
    let checkout = Arc::clone(&checkout);
    tasks.push(tokio::spawn(async move { checkout.place_order(request(&[(p, 1)])).await }));
  }

  let mut successes = 0;
  let mut rejections = 0;
  for task in tasks {
    match task.await.unwrap() {
      Ok(_) => successes += 1,
      Err(CheckoutError::StockConflict { .. }) | Err(CheckoutError::StockValidation(_)) => rejections += 1,
      Err(other) => panic!("unexpected checkout failure: {:?}", other),
    }
  }

  assert_eq!(successes, STOCK as usize);
  assert_eq!(rejections, BUYERS - STOCK as usize);

  let product = store.product(p).unwrap();
  assert_eq!(product.quantity_available, 0);
  assert_eq!(product.quantity_sold, STOCK);
  assert_eq!(store.orders().len(), STOCK as usize);
  assert_eq!(store.stock_moves().len(), STOCK as usize);
  assert!(store.ledger_snapshot(p).await.unwrap().unwrap().reconciles());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_two_buyers_race_for_the_last_unit() {
  setup_tracing();
  let memory = MemoryStore::new();
  let p = seed_product(&memory, "Dunk Low Panda", 11000, 1);
  // Neither buyer may start writing before both passed the pre-check.
  let checkout = Arc::new(checkout_over(Arc::new(GatedStore::new(memory.clone(), 2))));

  let run = |checkout: Arc<Checkout>| tokio::spawn(async move { checkout.place_order(request(&[(p, 1)])).await });
  let (a, b) = tokio::join!(run(Arc::clone(&checkout)), run(Arc::clone(&checkout)));
  let outcomes = [a.unwrap(), b.unwrap()];

  let winners: Vec<_> = outcomes.iter().filter_map(|o| o.as_ref().ok()).collect();
  assert_eq!(winners.len(), 1);
  assert!(!winners[0].order_number.is_empty());

  let loser = outcomes.iter().find_map(|o| o.as_ref().err()).unwrap();
  match loser {
    CheckoutError::StockConflict { product_ids } => assert_eq!(product_ids, &vec![p]),
    other => panic!("expected StockConflict, got {:?}", other),
  }

  assert_eq!(memory.product(p).unwrap().quantity_available, 0);
  assert_eq!(memory.order_items().iter().filter(|i| i.product_id == p).count(), 1);
  assert_eq!(memory.orders().len(), 1);
}
