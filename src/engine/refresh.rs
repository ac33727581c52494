use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::Timeframe;
use crate::data::ExchangeDataProvider;
use crate::engine::RadarEngine;

/// Candles pulled per symbol on a background refresh tick. A fraction of
/// the retention window: the tick interval is much shorter than the buffer.
const REFRESH_FETCH_LIMIT: usize = 30;

/// Handle to the background micro-metrics refresher. Dropping it does NOT
/// stop the task; call `stop` to shut down and flush.
pub struct RefreshHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Signals shutdown, waits for the final flush, and returns.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            log::error!("refresher task aborted: {:#}", err);
        }
    }
}

impl RadarEngine {
    /// Spawns the periodic task that keeps micro-metrics warm for the
    /// most-recently-requested symbols and persists dirty buffers. Tied to
    /// engine lifecycle via the returned handle; stop() flushes everything.
    pub fn start_refresher(self: &Arc<Self>) -> RefreshHandle {
        let (shutdown, mut rx) = watch::channel(false);
        let engine = Arc::clone(self);
        let interval_secs = engine.config.refresh.interval_secs;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await; // the first tick fires immediately; skip it

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        engine.refresh_tracked().await;
                    }
                    changed = rx.changed() => {
                        if changed.is_err() || *rx.borrow() {
                            break;
                        }
                    }
                }
            }

            log::info!("refresher stopping; flushing micro metrics");
            engine.micro.persist_all().await;
        });

        RefreshHandle { shutdown, task }
    }

    /// One refresh pass over the tracked symbols, all fetched concurrently.
    pub(crate) async fn refresh_tracked(&self) {
        let symbols = self.recent_symbols();
        if symbols.is_empty() {
            return;
        }
        log::debug!("refreshing micro metrics for {} symbol(s)", symbols.len());
        let jobs = symbols.into_iter().map(|symbol| self.refresh_symbol(symbol));
        futures::future::join_all(jobs).await;
    }

    async fn refresh_symbol(&self, symbol: String) {
        match self
            .exchange
            .candles(&symbol, Timeframe::M1, REFRESH_FETCH_LIMIT)
            .await
        {
            Ok(candles) => {
                self.micro.ingest(&symbol, &candles).await;
                if let Err(err) = self.micro.persist_symbol(&symbol).await {
                    log::error!("micro[{}]: persist failed: {:#}", symbol, err);
                }
            }
            Err(err) => {
                log::warn!("background refresh failed for {}: {:#}", symbol, err);
            }
        }
    }
}
