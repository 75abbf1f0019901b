//! End-to-end tests driving real collector tasks through the supervisor
//! against in-memory doubles, under tokio's paused clock.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use token_price_collector::config::ServiceConfig;
use token_price_collector::db::PriceStore;
use token_price_collector::errors::AppError;
use token_price_collector::external::{PriceProvider, PriceProviderError};
use token_price_collector::models::{PriceRecord, Token};
use token_price_collector::services::CollectorSupervisor;

#[derive(Default)]
struct MemoryStore {
    prices: Mutex<HashMap<(Token, NaiveDate), f64>>,
}

impl MemoryStore {
    fn stored(&self, token: Token, date: NaiveDate) -> Option<f64> {
        self.prices.lock().unwrap().get(&(token, date)).copied()
    }
}

#[async_trait]
impl PriceStore for MemoryStore {
    async fn put(&self, record: &PriceRecord) -> Result<(), AppError> {
        tokio::task::yield_now().await;
        self.prices
            .lock()
            .unwrap()
            .entry((record.token, record.date))
            .or_insert(record.price);
        Ok(())
    }

    async fn get(&self, token: Token, date: NaiveDate) -> Result<Option<f64>, AppError> {
        tokio::task::yield_now().await;
        Ok(self.stored(token, date))
    }
}

struct FixedPriceProvider(f64);

#[async_trait]
impl PriceProvider for FixedPriceProvider {
    async fn fetch_price(
        &self,
        _token: Token,
        _date: NaiveDate,
    ) -> Result<f64, PriceProviderError> {
        Ok(self.0)
    }
}

fn config(initial_date: NaiveDate) -> ServiceConfig {
    ServiceConfig {
        database_url: "postgres://unused".to_string(),
        initial_date,
        max_request_attempts: 2,
        timeout_secs: 600,
        api_port: 8000,
        metrics_prefix: "token_price_collector_".to_string(),
        coingecko_base_url: None,
    }
}

#[tokio::test(start_paused = true)]
async fn all_collectors_progress_in_date_order() {
    let initial = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let store = Arc::new(MemoryStore::default());
    let provider = Arc::new(FixedPriceProvider(5.0));
    let shutdown = CancellationToken::new();

    let supervisor =
        CollectorSupervisor::start(store.clone(), provider, &config(initial), &shutdown);

    // Each successfully collected day costs one virtual second per collector.
    tokio::time::sleep(Duration::from_secs(5)).await;
    shutdown.cancel();
    supervisor.join().await;

    for token in Token::ALL {
        for offset in 0..3 {
            let date = initial + ChronoDuration::days(offset);
            assert_eq!(
                store.stored(token, date),
                Some(5.0),
                "{} is missing {}",
                token,
                date
            );
        }
        // Strictly sequential: nothing beyond the virtual time budget.
        assert_eq!(
            store.stored(token, initial + ChronoDuration::days(10)),
            None
        );
    }
}

#[tokio::test(start_paused = true)]
async fn shutdown_mid_pause_terminates_promptly() {
    let initial = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let store = Arc::new(MemoryStore::default());
    let provider = Arc::new(FixedPriceProvider(5.0));
    let shutdown = CancellationToken::new();

    let supervisor =
        CollectorSupervisor::start(store.clone(), provider, &config(initial), &shutdown);

    // Collectors are mid-way through their one second post-success pause.
    tokio::time::sleep(Duration::from_millis(2500)).await;

    let before = tokio::time::Instant::now();
    shutdown.cancel();
    supervisor.join().await;

    assert!(before.elapsed() < Duration::from_secs(1));
}
