// storefront/src/config.rs

use crate::errors::{AppError, Result};
use dropline::checkout::{CheckoutConfig, ShippingPolicy};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Where products, orders and the stock ledger live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  Postgres,
  /// Process-local and non-durable. Development and tests only.
  ///
  /// Decrements are visible to other checkouts before their transaction commits, so
  /// under contention a rival's pre-check can count stock that is later rolled back
  /// and answer with a spurious 400 `Insufficient stock`.
  Memory,
}

impl StoreBackend {
  pub fn as_str(&self) -> &'static str {
    match self {
      StoreBackend::Postgres => "postgres",
      StoreBackend::Memory => "memory",
    }
  }
}

impl FromStr for StoreBackend {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.to_ascii_lowercase().as_str() {
      "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
      "memory" => Ok(StoreBackend::Memory),
      other => Err(AppError::Config(format!(
        "Invalid STORE_BACKEND '{}', expected 'postgres' or 'memory'",
        other
      ))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub store_backend: StoreBackend,
  /// Required when `store_backend` is `Postgres`.
  pub database_url: Option<String>,
  pub database_max_connections: u32,
  pub run_migrations: bool,
  pub seed_db: bool,

  pub shipping_flat_cents: i64,
  pub free_shipping_threshold_cents: Option<i64>,
  pub checkout_timeout: Duration,
  pub order_number_max_attempts: u32,

  pub log_format: LogFormat,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let server_host = env_or("SERVER_HOST", "127.0.0.1");
    let server_port = parse_env("SERVER_PORT", "8080")?;
    let store_backend: StoreBackend = env_or("STORE_BACKEND", "postgres").parse()?;
    let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
    if store_backend == StoreBackend::Postgres && database_url.is_none() {
      return Err(AppError::Config(
        "Missing environment variable 'DATABASE_URL' (required for STORE_BACKEND=postgres)".to_string(),
      ));
    }

    let log_format = match env_or("LOG_FORMAT", "pretty").to_ascii_lowercase().as_str() {
      "pretty" => LogFormat::Pretty,
      "json" => LogFormat::Json,
      other => return Err(AppError::Config(format!("Invalid LOG_FORMAT '{}'", other))),
    };

    let free_shipping_threshold_cents = match env::var("FREE_SHIPPING_THRESHOLD_CENTS") {
      Ok(raw) if !raw.is_empty() => Some(
        raw
          .parse::<i64>()
          .map_err(|e| AppError::Config(format!("Invalid FREE_SHIPPING_THRESHOLD_CENTS: {}", e)))?,
      ),
      _ => None,
    };

    let order_number_max_attempts: u32 = parse_env("ORDER_NUMBER_MAX_ATTEMPTS", "5")?;
    if order_number_max_attempts == 0 {
      return Err(AppError::Config("ORDER_NUMBER_MAX_ATTEMPTS must be at least 1".to_string()));
    }

    Ok(Self {
      server_host,
      server_port,
      store_backend,
      database_url,
      database_max_connections: parse_env("DATABASE_MAX_CONNECTIONS", "10")?,
      run_migrations: parse_env("RUN_MIGRATIONS", "true")?,
      seed_db: parse_env("SEED_DB", "false")?,
      shipping_flat_cents: parse_env("SHIPPING_FLAT_CENTS", "1000")?,
      free_shipping_threshold_cents,
      checkout_timeout: Duration::from_millis(parse_env("CHECKOUT_TIMEOUT_MS", "5000")?),
      order_number_max_attempts,
      log_format,
    })
  }

  /// Development defaults over the in-memory store.
  pub fn for_memory_store() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      store_backend: StoreBackend::Memory,
      database_url: None,
      database_max_connections: 10,
      run_migrations: false,
      seed_db: false,
      shipping_flat_cents: 1000,
      free_shipping_threshold_cents: None,
      checkout_timeout: Duration::from_millis(5000),
      order_number_max_attempts: 5,
      log_format: LogFormat::Pretty,
    }
  }

  pub fn checkout_config(&self) -> CheckoutConfig {
    CheckoutConfig {
      shipping: ShippingPolicy {
        flat_cents: self.shipping_flat_cents,
        free_threshold_cents: self.free_shipping_threshold_cents,
      },
      max_order_number_attempts: self.order_number_max_attempts,
      deadline: self.checkout_timeout,
    }
  }
}

fn env_or(var_name: &str, default: &str) -> String {
  env::var(var_name).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(var_name: &str, default: &str) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  env_or(var_name, default)
    .parse::<T>()
    .map_err(|e| AppError::Config(format!("Invalid {}: {}", var_name, e)))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn store_backend_parses_case_insensitively() {
    assert_eq!("Memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
    assert_eq!("postgres".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
    assert!(matches!("sqlite".parse::<StoreBackend>(), Err(AppError::Config(_))));
  }

  #[test]
  fn checkout_config_carries_shipping_and_deadline() {
    let mut config = AppConfig::for_memory_store();
    config.free_shipping_threshold_cents = Some(25000);
    config.checkout_timeout = Duration::from_millis(750);

    let checkout = config.checkout_config();
    assert_eq!(checkout.shipping.flat_cents, 1000);
    assert_eq!(checkout.shipping.free_threshold_cents, Some(25000));
    assert_eq!(checkout.deadline, Duration::from_millis(750));
    assert_eq!(checkout.max_order_number_attempts, 5);
  }
}
