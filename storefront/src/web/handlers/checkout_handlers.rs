// storefront/src/web/handlers/checkout_handlers.rs

use actix_web::{web, FromRequest, HttpRequest, HttpResponse};
use dropline::model::CartLine;
use dropline::CheckoutRequest;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

// --- Buyer identity ---
// Guest checkout is allowed, so the X-User-ID header is optional. A header that is
// present but not a UUID is still rejected.
#[derive(Debug)]
pub struct BuyerIdentity {
  pub user_id: Option<Uuid>,
}

impl FromRequest for BuyerIdentity {
  type Error = AppError;
  type Future = futures_util::future::Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let header = match req.headers().get("X-User-ID") {
      Some(header) => header,
      None => return futures_util::future::ready(Ok(BuyerIdentity { user_id: None })),
    };
    match header.to_str().ok().and_then(|raw| Uuid::parse_str(raw).ok()) {
      Some(user_id) => futures_util::future::ready(Ok(BuyerIdentity { user_id: Some(user_id) })),
      None => {
        warn!("BuyerIdentity extractor: invalid X-User-ID header.");
        futures_util::future::ready(Err(AppError::Auth("Invalid X-User-ID header.".to_string())))
      }
    }
  }
}

// --- Request DTO ---
#[derive(Deserialize, Debug)]
pub struct CheckoutRequestPayload {
  pub items: Vec<CartLine>,
  /// Used when no X-User-ID header is sent.
  #[serde(default)]
  pub user_id: Option<Uuid>,
}

#[instrument(
    name = "handler::checkout",
    skip(app_state, req_payload, buyer),
    fields(lines = req_payload.items.len())
)]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<CheckoutRequestPayload>,
  buyer: BuyerIdentity,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let request = CheckoutRequest {
    buyer: buyer.user_id.or(payload.user_id),
    lines: payload.items,
  };

  let receipt = app_state.checkout.place_order(request).await?;
  info!(order_number = %receipt.order_number, total_cents = receipt.total_cents, "Checkout completed.");

  Ok(HttpResponse::Ok().json(json!({
      "success": true,
      "order_number": receipt.order_number,
      "order_id": receipt.order_id,
      "subtotal": receipt.subtotal_cents,
      "shipping": receipt.shipping_cents,
      "total": receipt.total_cents,
      "items": receipt.item_count
  })))
}
