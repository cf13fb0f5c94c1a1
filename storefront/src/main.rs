// storefront/src/main.rs

use storefront::config::{AppConfig, LogFormat};
use storefront::db;
use storefront::state::AppState;
use storefront::web::configure_app_routes;

use actix_web::{web as actix_data, App, HttpServer};
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing(log_format: LogFormat) {
  // RUST_LOG overrides the default level.
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_span_events(FmtSpan::CLOSE);
  match log_format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Pretty => builder.init(),
  }
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
  tracing::error!(error = %err, "{}", context);
  std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  // The subscriber depends on LOG_FORMAT, so configuration is read first and its
  // outcome logged afterwards.
  let loaded = AppConfig::from_env();
  init_tracing(loaded.as_ref().map(|c| c.log_format).unwrap_or(LogFormat::Pretty));
  tracing::info!("Starting storefront checkout server...");

  let app_config = loaded
    .map(Arc::new)
    .map_err(|e| startup_error("Failed to load application configuration", e))?;
  tracing::info!(
    backend = ?app_config.store_backend,
    port = app_config.server_port,
    "Application configuration loaded successfully."
  );

  let store = db::build_store(&app_config)
    .await
    .map_err(|e| startup_error("Failed to initialise the inventory store", e))?;

  let app_state = AppState::new(store, app_config.clone());

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
