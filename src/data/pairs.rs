use std::time::{Duration, Instant};

use itertools::Itertools;
use tokio::sync::Mutex;

use crate::config::PairsConfig;
use crate::data::provider::ExchangeDataProvider;

struct CachedPairs {
    fetched_at: Instant,
    pairs: Vec<String>,
}

/// Short-TTL cache over the exchange's listed pairs.
/// Resolution never raises: any failure falls back to the last cached list,
/// then to the static fallback.
pub struct PairsCache {
    ttl: Duration,
    max_pairs: usize,
    fallback: Vec<String>,
    inner: Mutex<Option<CachedPairs>>,
}

impl PairsCache {
    pub fn new(cfg: &PairsConfig) -> Self {
        Self {
            ttl: Duration::from_secs(cfg.ttl_secs),
            max_pairs: cfg.max_pairs,
            fallback: cfg.fallback.iter().map(|s| s.to_string()).collect(),
            inner: Mutex::new(None),
        }
    }

    pub async fn resolve(&self, exchange: &dyn ExchangeDataProvider) -> Vec<String> {
        // Fast path under the lock; the fetch itself runs outside it so a
        // slow metadata call can't serialize unrelated callers.
        {
            let cached = self.inner.lock().await;
            if let Some(entry) = cached.as_ref() {
                if entry.fetched_at.elapsed() <= self.ttl {
                    return entry.pairs.clone();
                }
            }
        }

        match exchange.exchange_metadata().await {
            Ok(metadata) => {
                let pairs: Vec<String> = metadata
                    .iter()
                    .filter(|m| m.is_active_usdt())
                    .map(|m| m.symbol.to_uppercase())
                    .sorted()
                    .dedup()
                    .take(self.max_pairs)
                    .collect();

                if pairs.is_empty() {
                    log::warn!("exchange metadata listed no active USDT pairs; using fallback");
                    return self.fallback.clone();
                }

                let mut cached = self.inner.lock().await;
                *cached = Some(CachedPairs {
                    fetched_at: Instant::now(),
                    pairs: pairs.clone(),
                });
                pairs
            }
            Err(err) => {
                log::warn!("supported-pairs refresh failed: {:#}", err);
                let cached = self.inner.lock().await;
                match cached.as_ref() {
                    Some(entry) => entry.pairs.clone(), // stale beats static
                    None => self.fallback.clone(),
                }
            }
        }
    }
}
