use chrono::NaiveDate;
use std::time::Duration;
use tracing::info;

use crate::errors::AppError;
use crate::models::{parse_date, DATE_FORMAT};

pub const DEFAULT_MAX_REQUEST_ATTEMPTS: u32 = 2;
pub const DEFAULT_INITIAL_DATE: &str = "01-01-2023";
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_API_PORT: u16 = 8000;
pub const DEFAULT_METRICS_PREFIX: &str = "token_price_collector_";

/// Service configuration, environment-sourced and validated at startup.
/// Any invalid value is fatal before a single collector starts.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub database_url: String,
    pub initial_date: NaiveDate,
    pub max_request_attempts: u32,
    /// Per-request client timeout and long-pause duration, in seconds.
    pub timeout_secs: u64,
    pub api_port: u16,
    pub metrics_prefix: String,
    /// Override for the CoinGecko API base, mainly for tests and proxies.
    pub coingecko_base_url: Option<String>,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, AppError> {
        info!("Checking configuration parameters");

        let max_request_attempts = parse_max_request_attempts(
            std::env::var("MAX_REQUEST_ATTEMPTS").ok().as_deref(),
        )?;
        info!("[ENV] MAX_REQUEST_ATTEMPTS: {}", max_request_attempts);

        let initial_date =
            parse_initial_date(std::env::var("INITIAL_DATE").ok().as_deref())?;
        info!("[ENV] INITIAL_DATE: {}", initial_date.format(DATE_FORMAT));

        let timeout_secs = parse_timeout(std::env::var("TIMEOUT").ok().as_deref())?;
        info!("[ENV] TIMEOUT: {}", timeout_secs);

        let api_port = parse_api_port(std::env::var("API_PORT").ok().as_deref())?;
        info!("[ENV] API_PORT: {}", api_port);

        let metrics_prefix = std::env::var("PROMETHEUS_METRICS_PREFIX")
            .unwrap_or_else(|_| DEFAULT_METRICS_PREFIX.to_string());
        info!("[ENV] PROMETHEUS_METRICS_PREFIX: {}", metrics_prefix);

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                AppError::Config("The 'DATABASE_URL' parameter is not provided".to_string())
            })?;

        let coingecko_base_url = std::env::var("COINGECKO_BASE_URL").ok();
        if let Some(base) = &coingecko_base_url {
            info!("[ENV] COINGECKO_BASE_URL: {}", base);
        }

        info!("Successfully checked configuration parameters");

        Ok(Self {
            database_url,
            initial_date,
            max_request_attempts,
            timeout_secs,
            api_port,
            metrics_prefix,
            coingecko_base_url,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_max_request_attempts(value: Option<&str>) -> Result<u32, AppError> {
    let attempts = match value {
        Some(raw) => raw.parse::<u32>().map_err(|_| {
            AppError::Config(
                "The 'MAX_REQUEST_ATTEMPTS' parameter must be a positive integer".to_string(),
            )
        })?,
        None => DEFAULT_MAX_REQUEST_ATTEMPTS,
    };
    if attempts == 0 {
        return Err(AppError::Config(
            "The 'MAX_REQUEST_ATTEMPTS' parameter must be a positive integer".to_string(),
        ));
    }
    Ok(attempts)
}

fn parse_initial_date(value: Option<&str>) -> Result<NaiveDate, AppError> {
    let raw = value.unwrap_or(DEFAULT_INITIAL_DATE);
    parse_date(raw).map_err(|_| {
        AppError::Config(
            "The 'INITIAL_DATE' parameter is incorrect. An appropriate format: dd-mm-yyyy"
                .to_string(),
        )
    })
}

fn parse_timeout(value: Option<&str>) -> Result<u64, AppError> {
    match value {
        Some(raw) => raw.parse::<u64>().map_err(|_| {
            AppError::Config(
                "The 'TIMEOUT' parameter must be a non-negative integer".to_string(),
            )
        }),
        None => Ok(DEFAULT_TIMEOUT_SECS),
    }
}

fn parse_api_port(value: Option<&str>) -> Result<u16, AppError> {
    match value {
        Some(raw) => raw
            .parse::<u16>()
            .map_err(|_| AppError::Config("The 'API_PORT' parameter must be a port number".to_string())),
        None => Ok(DEFAULT_API_PORT),
    }
}
