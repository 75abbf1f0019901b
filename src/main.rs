use std::net::SocketAddr;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use token_price_collector::app;
use token_price_collector::config::ServiceConfig;
use token_price_collector::db::PgPriceStore;
use token_price_collector::external::{CoinGeckoProvider, DEFAULT_BASE_URL};
use token_price_collector::logging::{init_logging, LoggingConfig};
use token_price_collector::metrics::setup_metrics_recorder;
use token_price_collector::services::CollectorSupervisor;

const SIGINT: i32 = 2;
const SIGTERM: i32 = 15;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST so configuration checks are visible
    init_logging(&LoggingConfig::from_env())?;

    let config = ServiceConfig::from_env()?;

    let metrics_handle = setup_metrics_recorder(&config.metrics_prefix);

    let store = Arc::new(PgPriceStore::connect(&config.database_url).await?);
    info!("Database connection established");

    let base_url = config
        .coingecko_base_url
        .clone()
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let provider = Arc::new(CoinGeckoProvider::new(base_url, config.request_timeout())?);

    let shutdown = CancellationToken::new();

    let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
    let listener = TcpListener::bind(&addr).await?;
    info!("Metrics available at http://{}/metrics", addr);

    let server_app = app::create_app(metrics_handle);
    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, server_app)
            .with_graceful_shutdown(server_shutdown.cancelled_owned())
            .await
        {
            warn!("Metrics server error: {}", e);
        }
    });

    let triggering_signal = Arc::new(AtomicI32::new(0));
    tokio::spawn(shutdown_signal(shutdown.clone(), triggering_signal.clone()));

    let supervisor = CollectorSupervisor::start(store.clone(), provider, &config, &shutdown);
    supervisor.join().await;

    store.close().await;
    info!("Token price collector stopped");

    // Exit with a status reflecting the signal that triggered the shutdown.
    let signo = triggering_signal.load(Ordering::SeqCst);
    if signo != 0 {
        std::process::exit(exit_code_for_signal(signo));
    }

    Ok(())
}

/// Conventional exit status for a signal-terminated process.
fn exit_code_for_signal(signo: i32) -> i32 {
    128 + signo
}

/// Wait for Ctrl+C or SIGTERM, record which one fired, then cancel the
/// shutdown token so every collector and the metrics server wind down
/// cooperatively.
async fn shutdown_signal(shutdown: CancellationToken, triggering_signal: Arc<AtomicI32>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
            triggering_signal.store(SIGINT, Ordering::SeqCst);
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
            triggering_signal.store(SIGTERM, Ordering::SeqCst);
        }
    }

    shutdown.cancel();
}
