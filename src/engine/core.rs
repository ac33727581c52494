use std::collections::VecDeque;
use std::sync::{Arc, Mutex as StdMutex};

use anyhow::Result;

use crate::analysis::{self, ScalpContext, SentimentInputs};
use crate::config::{EngineConfig, PERSISTENCE, Timeframe};
use crate::data::{
    AdvisoryService, AnalyticsDataProvider, ExchangeDataProvider, GateDecision, MicroStore,
    PairsCache, SignalGate,
};
use crate::domain::Ticker24h;
use crate::models::{ScalpCall, TimeframeAnalysis, TradingSignal};
use crate::utils::{normalize_symbol, now_timestamp_ms};

/// The signal engine. All shared state (micro buffers, signal cache,
/// cooldown bookkeeping, pairs cache) lives on this struct so independent
/// engines can coexist under test; nothing is process-global.
pub struct RadarEngine {
    pub(crate) exchange: Arc<dyn ExchangeDataProvider>,
    analytics: Arc<dyn AnalyticsDataProvider>,
    advisor: Option<Arc<dyn AdvisoryService>>,
    pub(crate) config: EngineConfig,
    pub(crate) micro: MicroStore,
    gate: SignalGate,
    pairs: PairsCache,
    recent: StdMutex<VecDeque<String>>,
}

impl RadarEngine {
    /// Fails only on invalid static configuration.
    pub fn new(
        exchange: Arc<dyn ExchangeDataProvider>,
        analytics: Arc<dyn AnalyticsDataProvider>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        let micro = MicroStore::new(PERSISTENCE.micro.directory, config.scalp.retention);
        let gate = SignalGate::new(std::time::Duration::from_secs(config.gate.cooldown_secs));
        let pairs = PairsCache::new(&config.pairs);
        Ok(Self {
            exchange,
            analytics,
            advisor: None,
            config,
            micro,
            gate,
            pairs,
            recent: StdMutex::new(VecDeque::new()),
        })
    }

    pub fn with_advisor(mut self, advisor: Arc<dyn AdvisoryService>) -> Self {
        self.advisor = Some(advisor);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reloads persisted micro-metrics documents. Corrupt files quarantine
    /// to empty state inside the store; this only fails on I/O setup.
    pub async fn load_persisted(&self) -> Result<usize> {
        let loaded = self.micro.load_from_disk().await?;
        if loaded > 0 {
            log::info!("restored micro metrics for {} symbol(s)", loaded);
        }
        Ok(loaded)
    }

    /// The macro directional call. None means rate-limited (no fresh cache)
    /// or an unusable symbol, never a computation error.
    pub async fn generate_signal(&self, symbol: &str, force: bool) -> Option<TradingSignal> {
        let symbol = match normalize_symbol(symbol) {
            Some(s) => s,
            None => {
                log::warn!("unusable symbol {:?}", symbol);
                return None;
            }
        };

        let now = now_timestamp_ms();
        match self.gate.check(&symbol, force, now).await {
            GateDecision::Cached(cached) => {
                log::info!("signal cache hit for {}", symbol);
                return Some(cached);
            }
            GateDecision::Limited => {
                let remaining = self.gate.cooldown_remaining_secs(&symbol, now).await;
                log::info!("signal for {} rate limited ({}s remaining)", symbol, remaining);
                return None;
            }
            GateDecision::Proceed => {}
        }
        self.note_request(&symbol);

        // Exchange ticker and the analytics bundle fetch concurrently;
        // either side degrades on its own without aborting the request.
        let (ticker_res, inputs) = tokio::join!(
            self.exchange.ticker_24h(&symbol),
            self.fetch_sentiment_inputs(&symbol),
        );
        let ticker = ticker_res.unwrap_or_else(|err| {
            log::warn!("ticker unavailable for {}: {:#}", symbol, err);
            Ticker24h::default()
        });

        let sentiment =
            analysis::aggregate_sentiment(self.config.target_exchange, &inputs, &self.config.sentiment);
        let signal = analysis::synthesize(&symbol, &ticker, &sentiment, now);

        log::info!(
            "generated {} for {} (confidence {})",
            signal.signal,
            symbol,
            signal.confidence
        );
        self.gate.store(&symbol, signal.clone(), now).await;
        Some(signal)
    }

    /// Per-timeframe trend read. None = insufficient (or unfetchable) history.
    pub async fn analyze_timeframe(&self, symbol: &str, timeframe: &str) -> Option<TimeframeAnalysis> {
        let symbol = normalize_symbol(symbol)?;
        let tf = Timeframe::parse_or_default(timeframe);
        let candles = match self
            .exchange
            .candles(&symbol, tf, self.config.analyzer.candle_fetch_limit)
            .await
        {
            Ok(c) => c,
            Err(err) => {
                log::warn!("{} candles unavailable for {}: {:#}", tf, symbol, err);
                return None;
            }
        };
        analysis::analyze_timeframe_candles(tf, &candles, &self.config.analyzer)
    }

    /// The live scalp read. Recomputed on every call; only an unusable
    /// symbol or a total absence of price data yields None.
    pub async fn scalp_snapshot(&self, symbol: &str) -> Option<ScalpCall> {
        let symbol = normalize_symbol(symbol)?;
        self.note_request(&symbol);

        let minutes = match self
            .exchange
            .candles(&symbol, Timeframe::M1, self.config.scalp.retention)
            .await
        {
            Ok(c) => c,
            Err(err) => {
                log::warn!("1m candles unavailable for {}: {:#}", symbol, err);
                Vec::new()
            }
        };
        let micro = self.micro.ingest(&symbol, &minutes).await;

        let current_price = match micro.closes.last().copied().filter(|p| *p > 0.0) {
            Some(price) => price,
            None => match self.exchange.ticker_24h(&symbol).await {
                Ok(t) if t.last_price > 0.0 => t.last_price,
                _ => {
                    log::warn!("no price data at all for {}; skipping scalp", symbol);
                    return None;
                }
            },
        };

        let lookback = self.config.scalp.extreme_lookback;
        let (h1_res, h4_res) = tokio::join!(
            self.exchange.candles(&symbol, Timeframe::H1, lookback),
            self.exchange.candles(&symbol, Timeframe::H4, lookback),
        );
        let h1 = h1_res.unwrap_or_else(|err| {
            log::warn!("1h candles unavailable for {}: {:#}", symbol, err);
            Vec::new()
        });
        let h4 = h4_res.unwrap_or_else(|err| {
            log::warn!("4h candles unavailable for {}: {:#}", symbol, err);
            Vec::new()
        });

        let ctx = self.scalp_context(&symbol).await;
        Some(analysis::detect_scalp(
            &symbol,
            current_price,
            &micro,
            &h1,
            &h4,
            &ctx,
            &self.config.scalp,
        ))
    }

    pub async fn supported_pairs(&self) -> Vec<String> {
        self.pairs.resolve(self.exchange.as_ref()).await
    }

    /// Delegates to the advisory service when configured; otherwise (or on
    /// failure) returns the deterministic local read.
    pub async fn market_explanation(&self, symbol: &str) -> String {
        let Some(symbol) = normalize_symbol(symbol) else {
            return format!("Unrecognized symbol {:?}.", symbol);
        };

        let (ticker_res, inputs) = tokio::join!(
            self.exchange.ticker_24h(&symbol),
            self.fetch_sentiment_inputs(&symbol),
        );
        let ticker = ticker_res.unwrap_or_default();
        let sentiment =
            analysis::aggregate_sentiment(self.config.target_exchange, &inputs, &self.config.sentiment);
        let local = analysis::synthesize(&symbol, &ticker, &sentiment, now_timestamp_ms()).digest();

        if let Some(advisor) = &self.advisor {
            match advisor.explain(&symbol, &local).await {
                Ok(text) if !text.trim().is_empty() => return text,
                Ok(_) => log::warn!("advisory service returned empty text for {}", symbol),
                Err(err) => log::warn!("advisory service failed for {}: {:#}", symbol, err),
            }
        }
        format!("Local market read for {}:\n{}", symbol, local)
    }

    async fn fetch_sentiment_inputs(&self, symbol: &str) -> SentimentInputs {
        let (rows_res, liq_res, fg_res) = tokio::join!(
            self.analytics.market_rows(symbol),
            self.analytics.liquidations(symbol, "24h"),
            self.analytics.fear_greed(),
        );

        let rows = rows_res.unwrap_or_else(|err| {
            log::warn!("market rows unavailable for {}: {:#}", symbol, err);
            Vec::new()
        });
        let liquidations = match liq_res {
            Ok(l) => Some(l),
            Err(err) => {
                log::warn!("liquidation feed unavailable for {}: {:#}", symbol, err);
                None
            }
        };
        let fear_greed = match fg_res {
            Ok(v) => Some(v),
            Err(err) => {
                log::debug!("fear/greed feed unavailable: {:#}", err);
                None
            }
        };

        // Taker volume is only worth fetching when no venue reported a
        // usable ratio directly. Ranges are tried until one yields data.
        let mut taker_rows = Vec::new();
        if !analysis::has_direct_ratio(&rows) {
            for range in self.config.sentiment.ratio_ranges {
                match self.analytics.taker_volume(symbol, range).await {
                    Ok(r) if r.iter().any(|t| t.buy_usd + t.sell_usd > 0.0) => {
                        taker_rows = r;
                        break;
                    }
                    Ok(_) => continue,
                    Err(err) => {
                        log::debug!(
                            "taker volume ({}) unavailable for {}: {:#}",
                            range,
                            symbol,
                            err
                        );
                    }
                }
            }
        }

        SentimentInputs {
            rows,
            taker_rows,
            liquidations,
            fear_greed,
        }
    }

    /// Slow metrics shown next to a scalp call. Context only; the detector
    /// never reads them.
    async fn scalp_context(&self, symbol: &str) -> ScalpContext {
        let rows = match self.analytics.market_rows(symbol).await {
            Ok(rows) => rows,
            Err(err) => {
                log::debug!("scalp context degraded for {}: {:#}", symbol, err);
                Vec::new()
            }
        };
        let inputs = SentimentInputs {
            rows,
            ..SentimentInputs::default()
        };
        let snap =
            analysis::aggregate_sentiment(self.config.target_exchange, &inputs, &self.config.sentiment);
        ScalpContext {
            funding_rate: snap.funding_rate,
            oi_change_24h_percent: snap.oi_change_24h_percent,
            long_short_ratio: snap.long_short_ratio,
        }
    }

    /// Tracks the most-recently-requested symbols for the refresher,
    /// newest first, bounded by config.
    fn note_request(&self, symbol: &str) {
        let mut recent = self.recent.lock().expect("recent symbols poisoned");
        if let Some(pos) = recent.iter().position(|s| s == symbol) {
            recent.remove(pos);
        }
        recent.push_front(symbol.to_string());
        recent.truncate(self.config.refresh.max_symbols);
    }

    pub(crate) fn recent_symbols(&self) -> Vec<String> {
        self.recent
            .lock()
            .expect("recent symbols poisoned")
            .iter()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Candle;
    use crate::models::{
        LiquidationTotals, MarketRow, PairMeta, RiskLevel, SignalKind, TakerVolumeRow,
    };
    use anyhow::bail;
    use async_trait::async_trait;

    struct FixtureExchange {
        ticker: Ticker24h,
        m1: Vec<Candle>,
        h1: Vec<Candle>,
        h4: Vec<Candle>,
        fail_metadata: bool,
    }

    impl FixtureExchange {
        fn btc_strong_bull() -> Self {
            Self {
                ticker: Ticker24h {
                    last_price: 50_000.0,
                    price_change_percent: 3.5,
                    high_price: 51_500.0,
                    low_price: 49_000.0,
                    volume: 10_000.0,
                },
                m1: Vec::new(),
                h1: Vec::new(),
                h4: Vec::new(),
                fail_metadata: true,
            }
        }
    }

    #[async_trait]
    impl ExchangeDataProvider for FixtureExchange {
        async fn ticker_24h(&self, _symbol: &str) -> Result<Ticker24h> {
            Ok(self.ticker)
        }

        async fn candles(
            &self,
            _symbol: &str,
            timeframe: Timeframe,
            _limit: usize,
        ) -> Result<Vec<Candle>> {
            Ok(match timeframe {
                Timeframe::M1 => self.m1.clone(),
                Timeframe::H1 => self.h1.clone(),
                Timeframe::H4 => self.h4.clone(),
                _ => Vec::new(),
            })
        }

        async fn exchange_metadata(&self) -> Result<Vec<PairMeta>> {
            if self.fail_metadata {
                bail!("exchange metadata outage");
            }
            Ok(Vec::new())
        }
    }

    struct FixtureAnalytics {
        rows: Vec<MarketRow>,
    }

    #[async_trait]
    impl AnalyticsDataProvider for FixtureAnalytics {
        async fn market_rows(&self, _symbol: &str) -> Result<Vec<MarketRow>> {
            Ok(self.rows.clone())
        }

        async fn taker_volume(&self, _symbol: &str, _range: &str) -> Result<Vec<TakerVolumeRow>> {
            Ok(Vec::new())
        }

        async fn liquidations(&self, _symbol: &str, _interval: &str) -> Result<LiquidationTotals> {
            Ok(LiquidationTotals::default())
        }

        async fn fear_greed(&self) -> Result<f64> {
            bail!("fear/greed feed down")
        }
    }

    fn bull_rows() -> Vec<MarketRow> {
        vec![MarketRow {
            exchange: "MEXC".to_string(),
            funding_rate: 0.01, // saturates the funding contribution
            open_interest_usd: 5_000_000.0,
            oi_change_24h_percent: 12.0,
            long_rate: Some(55.0),
            short_rate: Some(45.0),
            long_short_ratio: None,
        }]
    }

    fn engine() -> RadarEngine {
        RadarEngine::new(
            Arc::new(FixtureExchange::btc_strong_bull()),
            Arc::new(FixtureAnalytics { rows: bull_rows() }),
            EngineConfig::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn strong_bull_scenario_longs_with_high_risk() {
        let engine = engine();
        let signal = engine.generate_signal("btc", false).await.unwrap();
        assert_eq!(signal.symbol, "BTCUSDT");
        assert_eq!(signal.signal, SignalKind::Long);
        assert!((signal.confidence.value() - 0.92).abs() < 1e-12);
        assert_eq!(signal.risk_level, RiskLevel::High);
    }

    #[tokio::test]
    async fn repeat_request_inside_cooldown_returns_the_cached_signal() {
        let engine = engine();
        let first = engine.generate_signal("BTCUSDT", false).await.unwrap();
        let second = engine.generate_signal("BTCUSDT", false).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.generated_at_ms, second.generated_at_ms);
    }

    #[tokio::test]
    async fn force_recomputes_with_a_fresh_timestamp() {
        let engine = engine();
        let first = engine.generate_signal("BTCUSDT", false).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        let forced = engine.generate_signal("BTCUSDT", true).await.unwrap();
        assert!(forced.generated_at_ms > first.generated_at_ms);
    }

    #[tokio::test]
    async fn unusable_symbol_is_none() {
        let engine = engine();
        assert!(engine.generate_signal("!!", false).await.is_none());
    }

    #[tokio::test]
    async fn supported_pairs_fall_back_when_metadata_fails() {
        let engine = engine();
        let pairs = engine.supported_pairs().await;
        assert!(!pairs.is_empty());
        assert!(pairs.contains(&"BTCUSDT".to_string()));
    }

    #[tokio::test]
    async fn explanation_uses_the_local_fallback_without_an_advisor() {
        let engine = engine();
        let text = engine.market_explanation("BTCUSDT").await;
        assert!(text.contains("Local market read for BTCUSDT"));
        assert!(text.contains("LONG BTCUSDT"));
    }

    #[tokio::test]
    async fn scalp_snapshot_detects_the_resistance_rejection_end_to_end() {
        let hour = |ts: i64, high: f64, low: f64| {
            let close = (high + low) / 2.0;
            Candle::new(ts, close, high, low, close, 100.0)
        };
        let h1: Vec<Candle> = (0..24i64)
            .map(|i| hour((i + 1) * 3_600_000, if i == 20 { 105.0 } else { 103.0 }, 97.0))
            .collect();
        let h4: Vec<Candle> = (0..24i64)
            .map(|i| hour((i + 1) * 14_400_000, 104.0, if i == 5 { 95.0 } else { 96.0 }))
            .collect();
        let mut closes: Vec<f64> = (0..18).map(|i| 103.5 + i as f64 * 0.05).collect();
        closes.push(104.8);
        closes.push(104.5);
        let m1: Vec<Candle> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Candle::new((i as i64 + 1) * 60_000, c, c + 0.3, c - 0.3, c, 5.0))
            .collect();

        let exchange = FixtureExchange {
            ticker: Ticker24h::default(),
            m1,
            h1,
            h4,
            fail_metadata: true,
        };
        let engine = RadarEngine::new(
            Arc::new(exchange),
            Arc::new(FixtureAnalytics { rows: bull_rows() }),
            EngineConfig::default(),
        )
        .unwrap();

        let call = engine.scalp_snapshot("BTCUSDT").await.unwrap();
        assert_eq!(call.bias, SignalKind::Short);
        assert_eq!(call.take_profit_2, Some(95.0));
        assert!(call.stop_loss.unwrap() > call.resistance_zone.unwrap().upper);
        // The informational context made it into the reasoning.
        assert!(call.reasoning.contains("funding"));
    }
}
