// storefront/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{instrument, warn};

use crate::errors::AppError;
use crate::state::AppState;

#[instrument(name = "handler::get_order", skip(app_state, path), fields(order_number = %path.as_str()))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let order_number = path.into_inner();

  match app_state.store.find_order_by_number(&order_number).await? {
    Some(details) => Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "order": details.order,
        "items": details.items
    }))),
    None => {
      warn!("Order {} not found.", order_number);
      Err(AppError::NotFound(format!("Order {} not found.", order_number)))
    }
  }
}
