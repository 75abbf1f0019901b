use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::Token;

#[derive(Debug, Error)]
pub enum PriceProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// A remote source of one historical USD price per (token, day).
///
/// Implementations perform a single bounded request; retrying is the
/// collector's job, and it treats every error variant the same way.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    async fn fetch_price(
        &self,
        token: Token,
        date: NaiveDate,
    ) -> Result<f64, PriceProviderError>;
}
