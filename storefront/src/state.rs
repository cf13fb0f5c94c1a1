// storefront/src/state.rs
use crate::config::AppConfig;
use dropline::{Checkout, InventoryStore, TimeRandomOrderNumbers};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub checkout: Arc<Checkout>,
  pub store: Arc<dyn InventoryStore>,
  pub config: Arc<AppConfig>, // Share loaded config
}

impl AppState {
  pub fn new(store: Arc<dyn InventoryStore>, config: Arc<AppConfig>) -> Self {
    let checkout = Checkout::new(
      store.clone(),
      Arc::new(TimeRandomOrderNumbers::default()),
      config.checkout_config(),
    );
    Self {
      checkout: Arc::new(checkout),
      store,
      config,
    }
  }
}
