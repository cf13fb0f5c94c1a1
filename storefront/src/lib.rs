// storefront/src/lib.rs

//! HTTP surface of the dropline checkout: actix-web handlers, the PostgreSQL store,
//! configuration and startup wiring.

pub mod config;
pub mod db;
pub mod errors;
pub mod state;
pub mod web;
