use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::models::{format_date, Token};

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko `/coins/<id>/history` client. One GET per call, bounded by the
/// client timeout; no retries here.
pub struct CoinGeckoProvider {
    client: reqwest::Client,
    base_url: String,
}

impl CoinGeckoProvider {
    /// `timeout` bounds each request. A zero timeout disables the bound
    /// instead of failing every request instantly.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PriceProviderError> {
        let mut builder = reqwest::Client::builder();
        if !timeout.is_zero() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

// The history endpoint nests the USD price three levels deep:
// { "market_data": { "current_price": { "usd": 5.0, ... } } }
// Every level is optional in practice (delisted coins, missing days).
#[derive(Debug, Deserialize)]
struct HistoryResponse {
    market_data: Option<MarketData>,
}

#[derive(Debug, Deserialize)]
struct MarketData {
    current_price: Option<CurrentPrice>,
}

#[derive(Debug, Deserialize)]
struct CurrentPrice {
    usd: Option<f64>,
}

#[async_trait]
impl PriceProvider for CoinGeckoProvider {
    async fn fetch_price(
        &self,
        token: Token,
        date: NaiveDate,
    ) -> Result<f64, PriceProviderError> {
        let url = format!("{}/coins/{}/history", self.base_url, token.api_id());

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("date", format_date(date).as_str()),
                ("localization", "false"),
            ])
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(PriceProviderError::BadResponse(format!(
                "status {}",
                resp.status()
            )));
        }

        let body = resp
            .json::<HistoryResponse>()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        body.market_data
            .and_then(|m| m.current_price)
            .and_then(|p| p.usd)
            .ok_or_else(|| {
                PriceProviderError::BadResponse(
                    "missing market_data.current_price.usd".into(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
    }

    #[tokio::test]
    async fn parses_usd_price() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/coins/polkadot/history")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("date".into(), "01-01-2023".into()),
                mockito::Matcher::UrlEncoded("localization".into(), "false".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"market_data":{"current_price":{"usd":4.35,"eur":4.1}}}"#)
            .create_async()
            .await;

        let provider =
            CoinGeckoProvider::new(server.url(), Duration::from_secs(5)).unwrap();
        let price = provider.fetch_price(Token::Dot, date()).await.unwrap();

        assert_eq!(price, 4.35);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_200_is_a_bad_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/coins/kusama/history")
            .match_query(mockito::Matcher::Any)
            .with_status(429)
            .with_body("Too Many Requests")
            .create_async()
            .await;

        let provider =
            CoinGeckoProvider::new(server.url(), Duration::from_secs(5)).unwrap();
        let err = provider.fetch_price(Token::Ksm, date()).await.unwrap_err();

        assert!(matches!(err, PriceProviderError::BadResponse(_)));
    }

    #[tokio::test]
    async fn missing_usd_field_is_a_bad_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/coins/moonbeam/history")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"market_data":{"current_price":{"eur":4.1}}}"#)
            .create_async()
            .await;

        let provider =
            CoinGeckoProvider::new(server.url(), Duration::from_secs(5)).unwrap();
        let err = provider.fetch_price(Token::Glmr, date()).await.unwrap_err();

        assert!(matches!(err, PriceProviderError::BadResponse(_)));
    }

    #[tokio::test]
    async fn malformed_body_is_a_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/coins/moonriver/history")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let provider =
            CoinGeckoProvider::new(server.url(), Duration::from_secs(5)).unwrap();
        let err = provider.fetch_price(Token::Movr, date()).await.unwrap_err();

        assert!(matches!(err, PriceProviderError::Parse(_)));
    }
}
