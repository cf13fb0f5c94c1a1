// storefront/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();

  match app_state.store.find_product(product_id).await? {
    Some(product) => Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "product": product
    }))),
    None => {
      warn!("Product with ID {} not found.", product_id);
      Err(AppError::NotFound(format!("Product with ID {} not found.", product_id)))
    }
  }
}

/// Stock counters next to the checkout ledger, for support and audits.
#[instrument(name = "handler::get_product_stock", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn get_product_stock_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();

  let product = app_state
    .store
    .find_product(product_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Product with ID {} not found.", product_id)))?;
  let snapshot = app_state
    .store
    .ledger_snapshot(product_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Product with ID {} not found.", product_id)))?;

  let reconciles = snapshot.reconciles();
  if !reconciles {
    warn!(
      quantity_sold = snapshot.quantity_sold,
      checkout_moves_total = snapshot.checkout_moves_total,
      "Stock ledger does not reconcile."
    );
  } else {
    info!("Stock ledger reconciles.");
  }

  Ok(HttpResponse::Ok().json(json!({
      "success": true,
      "product_id": product_id,
      "status": product.status,
      "quantity_available": snapshot.quantity_available,
      "quantity_sold": snapshot.quantity_sold,
      "checkout_moves_total": snapshot.checkout_moves_total,
      "ledger_reconciles": reconciles
  })))
}
