//! Long-lived daemon that collects one historical USD price per token per
//! calendar day from the CoinGecko history API and persists it into
//! Postgres, one table per token. Each token is driven by its own
//! sequential collector; a supervisor starts them together and shuts them
//! down cooperatively on SIGINT/SIGTERM.

pub mod app;
pub mod config;
pub mod db;
pub mod errors;
pub mod external;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;

pub use config::ServiceConfig;
pub use errors::AppError;
