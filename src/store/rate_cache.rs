//! Latest-rate cache kept fresh by a background sweep over all supported pairs.

use super::memory::{CacheStats, MemoryRateTable};
use crate::core::cache::{RateEntry, RateKey, RateStore};
use crate::core::currency::{CurrencyCode, CurrencyRateProvider, SupportedCurrencies};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(5);

/// Outcome of one refresh sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub total: usize,
    pub updated: usize,
    pub failed: Vec<RateKey>,
}

struct RefreshWorker {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Everything a sweep needs, cloned into the background task.
#[derive(Clone)]
struct Refresher {
    table: Arc<MemoryRateTable>,
    provider: Arc<dyn CurrencyRateProvider>,
    currencies: SupportedCurrencies,
}

impl Refresher {
    async fn refresh_all(&self) -> RefreshSummary {
        let mut summary = RefreshSummary::default();
        info!(
            "Starting exchange rate refresh for {} currencies",
            self.currencies.len()
        );

        for (from, to) in self.currencies.pairs() {
            summary.total += 1;
            let key = RateKey::new(from, to);

            match self.provider.fetch_rate(from, to, None).await {
                Ok(rate) if rate > 0.0 && rate.is_finite() => {
                    self.table.set_rate(from, to, rate);
                    summary.updated += 1;
                    debug!("Refreshed rate {}: {:.6}", key, rate);
                }
                Ok(rate) => {
                    warn!("Provider returned invalid rate {} for {}", rate, key);
                    summary.failed.push(key);
                }
                Err(e) => {
                    warn!("Failed to fetch rate {}: {:#}", key, e);
                    summary.failed.push(key);
                }
            }
        }

        if summary.failed.is_empty() {
            info!(
                "Exchange rate refresh completed: {}/{} pairs updated",
                summary.updated, summary.total
            );
        } else {
            let failed: Vec<String> = summary.failed.iter().map(ToString::to_string).collect();
            warn!(
                "Exchange rate refresh completed: {}/{} pairs updated, failed pairs: {}",
                summary.updated,
                summary.total,
                failed.join(", ")
            );
        }
        summary
    }

    async fn run(self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        // The first tick completes immediately, giving the initial sweep.
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    info!("Shutdown requested during refresh, abandoning sweep");
                    break;
                }
                _ = self.refresh_all() => {}
            }
        }
        info!("Background rate refresh stopped");
    }
}

/// Latest known rate per ordered currency pair.
///
/// Reads never block on the network. [`ExchangeRateCache::start_background_refresh`]
/// spawns a task on the current tokio runtime which sweeps every supported pair
/// once immediately and then on every interval. Failed fetches leave the
/// previous entry in place.
pub struct ExchangeRateCache {
    refresher: Refresher,
    refresh_interval: Duration,
    worker: Mutex<Option<RefreshWorker>>,
}

impl ExchangeRateCache {
    pub fn new(
        provider: Arc<dyn CurrencyRateProvider>,
        currencies: SupportedCurrencies,
        refresh_interval: Duration,
    ) -> Self {
        let refresh_interval = if refresh_interval.is_zero() {
            DEFAULT_REFRESH_INTERVAL
        } else {
            refresh_interval
        };

        ExchangeRateCache {
            refresher: Refresher {
                table: Arc::new(MemoryRateTable::new()),
                provider,
                currencies,
            },
            refresh_interval,
            worker: Mutex::new(None),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    pub fn entry(&self, from: &CurrencyCode, to: &CurrencyCode) -> Option<RateEntry> {
        self.refresher.table.get_entry(&RateKey::new(from, to))
    }

    pub fn entries(&self) -> Vec<(RateKey, RateEntry)> {
        self.refresher.table.entries()
    }

    pub fn stats(&self) -> CacheStats {
        self.refresher.table.stats()
    }

    /// Runs a single sweep over all supported pairs on the calling task.
    pub async fn refresh_all(&self) -> RefreshSummary {
        self.refresher.refresh_all().await
    }

    pub fn is_refreshing(&self) -> bool {
        self.worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|w| !w.handle.is_finished())
    }

    /// Spawns the background refresh task. Does nothing if one is running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_background_refresh(&self) {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if worker.as_ref().is_some_and(|w| !w.handle.is_finished()) {
            warn!("Background rate refresh already running");
            return;
        }

        let (shutdown, receiver) = watch::channel(false);
        let refresher = self.refresher.clone();
        let handle = tokio::spawn(refresher.run(self.refresh_interval, receiver));
        info!(
            "Background rate refresh started, interval {:?}",
            self.refresh_interval
        );
        *worker = Some(RefreshWorker { shutdown, handle });
    }

    /// Signals the background task and waits for it to exit.
    ///
    /// A sweep in progress is abandoned. If the task has not finished within
    /// the shutdown deadline it is aborted.
    pub async fn stop(&self) {
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(RefreshWorker { shutdown, handle }) = worker
        else {
            debug!("Background rate refresh not running");
            return;
        };

        let _ = shutdown.send(true);
        join_or_abort(handle, SHUTDOWN_DEADLINE).await;
    }
}

/// Waits up to `deadline` for the task to finish, then aborts it and waits for
/// the cancellation to complete.
async fn join_or_abort(mut handle: JoinHandle<()>, deadline: Duration) {
    let outcome = tokio::time::timeout(deadline, &mut handle).await;
    match outcome {
        Ok(Ok(())) => debug!("Background rate refresh exited"),
        Ok(Err(e)) => warn!("Background rate refresh task failed: {}", e),
        Err(_) => {
            warn!(
                "Background rate refresh did not stop within {:?}, aborting",
                deadline
            );
            handle.abort();
            // Cancelled is the expected outcome
            let _ = handle.await;
        }
    }
}

impl RateStore for ExchangeRateCache {
    fn get_rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> Option<f64> {
        self.refresher.table.get_rate(from, to)
    }

    fn set_rate(&self, from: &CurrencyCode, to: &CurrencyCode, rate: f64) {
        self.refresher.table.set_rate(from, to, rate);
    }
}

impl Drop for ExchangeRateCache {
    fn drop(&mut self) {
        let worker = self
            .worker
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            let _ = worker.shutdown.send(true);
        }
    }
}
