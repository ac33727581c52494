use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::models::TradingSignal;

/// Outcome of a gate check.
#[derive(Debug, Clone)]
pub enum GateDecision {
    /// Cooldown elapsed (or force): caller computes and then calls `store`.
    Proceed,
    /// Fresh cached signal returned as-is.
    Cached(TradingSignal),
    /// Inside the cooldown with nothing cached. Not an error.
    Limited,
}

#[derive(Default)]
struct GateEntry {
    last_request_ms: i64,
    cached: Option<(TradingSignal, i64)>,
}

/// Per-symbol cooldown and signal cache.
///
/// The map mutex guards only the bookkeeping; the expensive compute happens
/// outside it (check, drop lock, compute, store), so one symbol's in-flight
/// request never blocks another symbol.
pub struct SignalGate {
    cooldown_ms: i64,
    entries: Mutex<HashMap<String, GateEntry>>,
}

impl SignalGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown_ms: cooldown.as_millis() as i64,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Marks the request time when the caller may proceed, so a concurrent
    /// duplicate lands on the Limited/Cached path instead of recomputing.
    pub async fn check(&self, symbol: &str, force: bool, now_ms: i64) -> GateDecision {
        let mut map = self.entries.lock().await;
        let entry = map.entry(symbol.to_string()).or_default();

        if force || now_ms - entry.last_request_ms >= self.cooldown_ms {
            entry.last_request_ms = now_ms;
            return GateDecision::Proceed;
        }

        if let Some((signal, cached_at)) = &entry.cached {
            if now_ms - cached_at <= self.cooldown_ms {
                return GateDecision::Cached(signal.clone());
            }
        }
        GateDecision::Limited
    }

    pub async fn store(&self, symbol: &str, signal: TradingSignal, now_ms: i64) {
        let mut map = self.entries.lock().await;
        let entry = map.entry(symbol.to_string()).or_default();
        entry.cached = Some((signal, now_ms));
    }

    /// Seconds until the symbol may recompute. Zero when already eligible.
    pub async fn cooldown_remaining_secs(&self, symbol: &str, now_ms: i64) -> i64 {
        let map = self.entries.lock().await;
        match map.get(symbol) {
            Some(entry) => {
                ((entry.last_request_ms + self.cooldown_ms - now_ms).max(0) + 999) / 1000
            }
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Score, SentimentScore};
    use crate::models::{RiskLevel, SentimentSnapshot, SignalKind};

    fn signal(symbol: &str, generated_at_ms: i64) -> TradingSignal {
        TradingSignal {
            symbol: symbol.to_string(),
            signal: SignalKind::Long,
            confidence: Score::new(0.7),
            risk_level: RiskLevel::Medium,
            reasoning: "test".to_string(),
            entry_price: None,
            stop_loss: None,
            take_profit: None,
            sentiment: SentimentSnapshot {
                sentiment_score: SentimentScore::new(0.1),
                ..SentimentSnapshot::neutral()
            },
            generated_at_ms,
        }
    }

    #[tokio::test]
    async fn second_request_within_cooldown_hits_the_cache() {
        let gate = SignalGate::new(Duration::from_secs(300));
        assert!(matches!(gate.check("BTCUSDT", false, 1_000).await, GateDecision::Proceed));
        gate.store("BTCUSDT", signal("BTCUSDT", 1_000), 1_000).await;

        match gate.check("BTCUSDT", false, 60_000).await {
            GateDecision::Cached(cached) => {
                assert_eq!(cached.generated_at_ms, 1_000);
                assert_eq!(cached, signal("BTCUSDT", 1_000));
            }
            other => panic!("expected cache hit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn force_always_proceeds() {
        let gate = SignalGate::new(Duration::from_secs(300));
        assert!(matches!(gate.check("BTCUSDT", false, 1_000).await, GateDecision::Proceed));
        gate.store("BTCUSDT", signal("BTCUSDT", 1_000), 1_000).await;
        assert!(matches!(gate.check("BTCUSDT", true, 2_000).await, GateDecision::Proceed));
    }

    #[tokio::test]
    async fn in_cooldown_without_cache_is_limited_not_an_error() {
        let gate = SignalGate::new(Duration::from_secs(300));
        // First caller proceeds but never stores (its compute degraded away).
        assert!(matches!(gate.check("BTCUSDT", false, 1_000).await, GateDecision::Proceed));
        assert!(matches!(gate.check("BTCUSDT", false, 2_000).await, GateDecision::Limited));
        assert_eq!(gate.cooldown_remaining_secs("BTCUSDT", 2_000).await, 299);
    }

    #[tokio::test]
    async fn cooldown_expiry_reopens_the_gate() {
        let gate = SignalGate::new(Duration::from_secs(300));
        assert!(matches!(gate.check("BTCUSDT", false, 1_000).await, GateDecision::Proceed));
        gate.store("BTCUSDT", signal("BTCUSDT", 1_000), 1_000).await;
        assert!(matches!(
            gate.check("BTCUSDT", false, 1_000 + 300_000).await,
            GateDecision::Proceed
        ));
    }

    #[tokio::test]
    async fn symbols_are_independent() {
        let gate = SignalGate::new(Duration::from_secs(300));
        assert!(matches!(gate.check("BTCUSDT", false, 1_000).await, GateDecision::Proceed));
        assert!(matches!(gate.check("ETHUSDT", false, 1_000).await, GateDecision::Proceed));
    }
}
