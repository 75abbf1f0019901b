use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::db::PriceStore;
use crate::external::PriceProvider;
use crate::metrics;
use crate::models::{format_date, PriceRecord, Token};

const SECOND: Duration = Duration::from_secs(1);

/// Compute the next date the collector may move to. The cursor stays put
/// while `current + 1 day` has not yet begun in wall-clock time, so it can
/// never race ahead of the real calendar.
fn next_collectable_day(current: NaiveDate, today: NaiveDate) -> NaiveDate {
    let next = current + ChronoDuration::days(1);
    if next > today {
        current
    } else {
        next
    }
}

/// Sequential day-by-day price collector for a single token.
///
/// Runs until its cancellation token fires. Dates are processed strictly in
/// order: a date is only left behind once it is confirmed present in the
/// store, either by the existence check or by a successful fetch-and-put.
/// A date is never skipped and never escalated; a persistently failing
/// remote just means the same date is retried after the long pause, forever.
pub struct TokenCollector {
    token: Token,
    store: Arc<dyn PriceStore>,
    provider: Arc<dyn PriceProvider>,
    current_date: NaiveDate,
    max_request_attempts: u32,
    retry_pause: Duration,
    shutdown: CancellationToken,
    waiting_for_next_day: bool,
}

impl TokenCollector {
    pub fn new(
        token: Token,
        store: Arc<dyn PriceStore>,
        provider: Arc<dyn PriceProvider>,
        initial_date: NaiveDate,
        max_request_attempts: u32,
        retry_pause: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            token,
            store,
            provider,
            current_date: initial_date,
            max_request_attempts,
            retry_pause,
            shutdown,
            waiting_for_next_day: false,
        }
    }

    pub async fn run(mut self) {
        info!(
            "[{}] Collector started at {}",
            self.token,
            format_date(self.current_date)
        );

        while !self.shutdown.is_cancelled() {
            if self.step().await {
                break;
            }
        }

        info!("[{}] Collector stopped", self.token);
    }

    /// One pass of the collection loop: skip an already-stored date, or run
    /// a fetch cycle for the current one. Returns true when shutdown was
    /// observed during a pause and the loop must terminate.
    async fn step(&mut self) -> bool {
        match self.store.get(self.token, self.current_date).await {
            Ok(Some(_)) => {
                // No delay on this path: once the store is caught up the
                // cursor advances at most once per real day anyway.
                self.advance_cursor();
                return false;
            }
            Ok(None) => {}
            Err(e) => {
                // A read failure looks like an absent date; the fetch
                // cycle's own throttling bounds the pressure on the store.
                warn!(
                    "[{}] Failed to get token price from the store. {}: {}",
                    self.token,
                    format_date(self.current_date),
                    e
                );
                metrics::record_store_failure(self.token);
            }
        }
        self.waiting_for_next_day = false;

        self.fetch_cycle().await
    }

    /// Attempt to fetch and persist the current date, up to
    /// `max_request_attempts` times with a one second pause between
    /// attempts. If nothing was persisted, hold the cursor and sleep for
    /// the full retry pause so a failing or not-yet-published date does not
    /// hammer the remote source.
    async fn fetch_cycle(&mut self) -> bool {
        let date = self.current_date;
        info!(
            "[{}] Making a request to retrieve the token price for {}",
            self.token,
            format_date(date)
        );

        let mut persisted = false;
        for attempt in 1..=self.max_request_attempts {
            if self.shutdown.is_cancelled() {
                return true;
            }

            match self.provider.fetch_price(self.token, date).await {
                Ok(price) => {
                    let record = PriceRecord::new(self.token, date, price);
                    match self.store.put(&record).await {
                        Ok(()) => {
                            metrics::record_price_collected(self.token);
                            self.advance_cursor();
                            persisted = true;
                            if self.pause(SECOND).await {
                                return true;
                            }
                            break;
                        }
                        Err(e) => {
                            // Not persisted: the cursor stays, so this date
                            // is fetched again on a later cycle.
                            warn!(
                                "[{}] Failed to save token price into the store. {}: {}",
                                self.token,
                                format_date(date),
                                e
                            );
                            metrics::record_store_failure(self.token);
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        "[{}] Failed to get token price, attempt {}. {}: {}",
                        self.token,
                        attempt,
                        format_date(date),
                        e
                    );
                    metrics::record_fetch_failure(self.token);
                }
            }

            if self.pause(SECOND).await {
                return true;
            }
        }

        if !persisted {
            warn!(
                "[{}] Failed to get the token price for the {}",
                self.token,
                format_date(date)
            );
            info!(
                "[{}] Sleep for {} seconds",
                self.token,
                self.retry_pause.as_secs()
            );
            if self.pause(self.retry_pause).await {
                return true;
            }
        }

        false
    }

    /// Move the cursor one day forward unless that day has not begun yet.
    fn advance_cursor(&mut self) {
        let next = next_collectable_day(self.current_date, Utc::now().date_naive());
        if next == self.current_date {
            if !self.waiting_for_next_day {
                info!("[{}] Waiting for the next day", self.token);
                self.waiting_for_next_day = true;
            }
        } else {
            self.current_date = next;
            self.waiting_for_next_day = false;
        }
    }

    /// Sleep, racing the shutdown token. Returns true if shutdown fired
    /// first, so a collector mid-pause stops without waiting it out.
    async fn pause(&self, duration: Duration) -> bool {
        debug!(
            "[{}] Waiting for {} seconds",
            self.token,
            duration.as_secs()
        );
        tokio::select! {
            _ = self.shutdown.cancelled() => true,
            _ = tokio::time::sleep(duration) => false,
        }
    }
}
