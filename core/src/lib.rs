// dropline/src/lib.rs

//! Dropline: inventory-safe checkout for single-item streetwear listings.
//!
//! The crate provides:
//!  - A small async step pipeline (named steps with before/on/after handlers and
//!    early stopping) over shared, lockable context data.
//!  - The checkout flow built on it: an advisory stock pre-check, then one atomic
//!    commit whose guarded decrements are reconciled before anything is committed.
//!  - The `InventoryStore` seam plus a process-local `MemoryStore`. The Postgres
//!    store lives with the HTTP service.

pub mod checkout;
pub mod core;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod store;

// --- Re-exports for the Public API ---

pub use crate::core::context::Handler;
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::StepDef;

pub use crate::pipeline::definition::Pipeline;

pub use crate::checkout::{
  Checkout, CheckoutConfig, CheckoutRequest, OrderNumberGenerator, Receipt, ShippingPolicy, TimeRandomOrderNumbers,
};
pub use crate::error::{
  CheckoutError, CheckoutResult, LineFailure, LineFailureReason, PipelineError, StoreError, StoreResult,
};
pub use crate::store::{InventoryStore, MemoryStore, StockTransaction};

/*
    Checkout flow:
    1. `normalize_cart` rejects empty carts and non-positive quantities and merges repeats.
    2. `precheck_stock` reads every product and reports all failing lines together.
    3. `commit_order` opens a transaction, inserts the order (retrying on an order
       number collision), then per line inserts the item, runs the guarded decrement
       and appends a stock move. Any decrement that affected zero rows rolls the
       whole transaction back with `StockConflict`.
*/
