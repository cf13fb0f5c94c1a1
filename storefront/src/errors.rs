// storefront/src/errors.rs

use actix_web::{HttpResponse, ResponseError};
use dropline::{CheckoutError, StoreError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Migration Error: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),

  #[error("Checkout Error: {0}")]
  Checkout(#[from] CheckoutError),

  #[error("Storage Error: {0}")]
  Store(#[from] StoreError),
}

impl ResponseError for AppError {
  fn error_response(&self) -> HttpResponse {
    match self {
      AppError::Checkout(err) => checkout_error_response(err),
      _ => {
        tracing::error!(application_error = %self, "Responding with error");
        match self {
          AppError::Validation(m) => HttpResponse::BadRequest().json(json!({"success": false, "error": m})),
          AppError::Auth(m) => HttpResponse::Unauthorized().json(json!({"success": false, "error": m})),
          AppError::NotFound(m) => HttpResponse::NotFound().json(json!({"success": false, "error": m})),
          // Infrastructure detail stays in the logs.
          _ => HttpResponse::InternalServerError().json(json!({
            "success": false,
            "error": "Internal server error",
            "details": "An unexpected error occurred"
          })),
        }
      }
    }
  }
}

fn checkout_error_response(err: &CheckoutError) -> HttpResponse {
  match err {
    CheckoutError::InvalidCart(m) => {
      tracing::info!(error = %err, "Checkout rejected: invalid cart");
      HttpResponse::BadRequest().json(json!({"success": false, "error": "Invalid cart", "details": m}))
    }
    CheckoutError::StockValidation(failures) => {
      tracing::info!(error = %err, "Checkout rejected by stock pre-check");
      HttpResponse::BadRequest().json(json!({
        "success": false,
        "error": "Insufficient stock",
        "details": failures
      }))
    }
    CheckoutError::StockConflict { product_ids } => {
      tracing::warn!(error = %err, ?product_ids, "Checkout lost a stock race");
      HttpResponse::Conflict().json(json!({
        "success": false,
        "error": "Insufficient stock: inventory changed during checkout, please retry",
        "product_id": product_ids.first(),
        "product_ids": product_ids
      }))
    }
    CheckoutError::TimedOut(_) => {
      tracing::warn!(error = %err, "Checkout timed out");
      HttpResponse::GatewayTimeout().json(json!({
        "success": false,
        "error": "Checkout timed out, please retry",
        "details": "No order was placed"
      }))
    }
    CheckoutError::OrderNumberExhausted { .. }
    | CheckoutError::Incomplete(_)
    | CheckoutError::Store(_)
    | CheckoutError::Pipeline(_) => {
      tracing::error!(error = %err, "Checkout failed unexpectedly");
      HttpResponse::InternalServerError().json(json!({
        "success": false,
        "error": "Checkout failed",
        "details": "An unexpected error occurred"
      }))
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::body::to_bytes;
  use actix_web::http::StatusCode;
  use dropline::{LineFailure, LineFailureReason};
  use uuid::Uuid;

  async fn body_json(resp: HttpResponse) -> serde_json::Value {
    let bytes = to_bytes(resp.into_body()).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  #[actix_web::test]
  async fn stock_validation_maps_to_400_with_every_line() {
    let p1 = Uuid::new_v4();
    let err = AppError::from(CheckoutError::StockValidation(vec![
      LineFailure {
        product_id: p1,
        reason: LineFailureReason::InsufficientStock {
          requested: 2,
          available: 1,
        },
      },
      LineFailure {
        product_id: Uuid::new_v4(),
        reason: LineFailureReason::ProductNotFound,
      },
    ]));
    let resp = err.error_response();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body = body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Insufficient stock");
    assert_eq!(body["details"][0]["product_id"], p1.to_string());
    assert_eq!(body["details"][0]["reason"], "InsufficientStock");
    assert_eq!(body["details"][0]["requested"], 2);
    assert_eq!(body["details"][0]["available"], 1);
    assert_eq!(body["details"][1]["reason"], "ProductNotFound");
  }

  #[actix_web::test]
  async fn stock_conflict_maps_to_409_naming_the_first_product() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let resp = AppError::from(CheckoutError::StockConflict { product_ids: vec![a, b] }).error_response();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let body = body_json(resp).await;
    assert_eq!(body["product_id"], a.to_string());
    assert_eq!(body["product_ids"][1], b.to_string());
  }

  #[actix_web::test]
  async fn infrastructure_failures_do_not_leak_details() {
    let store_err = StoreError::Backend {
      source: anyhow::anyhow!("connection refused at 10.0.0.7:5432"),
    };
    let resp = AppError::from(CheckoutError::from(store_err)).error_response();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(resp).await;
    assert!(!body.to_string().contains("10.0.0.7"));
  }
}
