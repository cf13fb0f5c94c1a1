// storefront/src/web/routes.rs

use actix_web::web;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::handlers::{checkout_handlers, order_handlers, product_handlers};

async fn health_check_handler(app_state: web::Data<AppState>) -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({
    "status": "ok",
    "store": app_state.config.store_backend.as_str()
  }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      // Malformed JSON bodies get the same error shape as every other rejection.
      .app_data(
        web::JsonConfig::default().error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
      )
      .route("/health", web::get().to(health_check_handler))
      .service(web::scope("/checkout").route("", web::post().to(checkout_handlers::checkout_handler)))
      .service(web::scope("/orders").route("/{order_number}", web::get().to(order_handlers::get_order_handler)))
      .service(
        web::scope("/products")
          .route("/{product_id}", web::get().to(product_handlers::get_product_handler))
          .route(
            "/{product_id}/stock",
            web::get().to(product_handlers::get_product_stock_handler),
          ),
      ),
  );
}
