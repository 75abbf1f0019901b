use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::ServiceConfig;
use crate::db::PriceStore;
use crate::external::PriceProvider;
use crate::models::Token;
use crate::services::collector::TokenCollector;

/// Owns one collector task per token and coordinates their lifetime.
///
/// All collectors share a single store and provider but progress through
/// their dates independently. Cancelling the supervising token stops every
/// collector cooperatively at its next stop check or pause.
pub struct CollectorSupervisor {
    handles: Vec<(Token, JoinHandle<()>)>,
}

impl CollectorSupervisor {
    pub fn start(
        store: Arc<dyn PriceStore>,
        provider: Arc<dyn PriceProvider>,
        config: &ServiceConfig,
        shutdown: &CancellationToken,
    ) -> Self {
        let handles = Token::ALL
            .iter()
            .map(|&token| {
                let collector = TokenCollector::new(
                    token,
                    store.clone(),
                    provider.clone(),
                    config.initial_date,
                    config.max_request_attempts,
                    config.request_timeout(),
                    shutdown.child_token(),
                );
                (token, tokio::spawn(collector.run()))
            })
            .collect();

        info!("Started {} collectors", Token::ALL.len());
        Self { handles }
    }

    /// Block until every collector has exited its loop. A panicked collector
    /// task is logged; the other collectors are unaffected.
    pub async fn join(self) {
        for (token, handle) in self.handles {
            if let Err(e) = handle.await {
                error!("[{}] Collector task failed: {}", token, e);
            }
        }
    }
}
