//! Prometheus metrics: recorder setup plus the collector's business counters.

use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

use crate::models::Token;

static PREFIX: OnceLock<String> = OnceLock::new();

/// Install the global Prometheus recorder and remember the metric-name
/// prefix. Returns the handle the `/metrics` route renders from.
///
/// Panics if a recorder is already installed; called once at startup,
/// before any collector runs.
pub fn setup_metrics_recorder(prefix: &str) -> PrometheusHandle {
    let _ = PREFIX.set(prefix.to_string());
    PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

fn name(metric: &str) -> String {
    match PREFIX.get() {
        Some(prefix) => format!("{prefix}{metric}"),
        None => metric.to_string(),
    }
}

/// A (token, date) price was persisted.
pub fn record_price_collected(token: Token) {
    counter!(name("prices_collected_total"), "symbol" => token.symbol()).increment(1);
}

/// A single fetch attempt failed.
pub fn record_fetch_failure(token: Token) {
    counter!(name("fetch_failures_total"), "symbol" => token.symbol()).increment(1);
}

/// A store operation failed for a reason other than a duplicate key.
pub fn record_store_failure(token: Token) {
    counter!(name("store_failures_total"), "symbol" => token.symbol()).increment(1);
}
