//! Engine tuning configuration

use anyhow::{Result, bail};

/// Multi-timeframe analyzer knobs.
#[derive(Clone, Debug)]
pub struct AnalyzerConfig {
    /// Minimum valid candles required after filtering malformed rows.
    pub min_candles: usize,
    /// How many candles to request per timeframe.
    pub candle_fetch_limit: usize,
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub rsi_period: usize,
    pub atr_period: usize,
    /// ATR% above this is HIGH volatility.
    pub atr_high_pct: f64,
    /// ATR% below this is LOW volatility.
    pub atr_low_pct: f64,
}

/// Sentiment fusion knobs. Weights are the caps on each source's contribution
/// to the fused score; saturations are the input magnitudes at which a source
/// hits its cap.
#[derive(Clone, Debug)]
pub struct SentimentConfig {
    /// OI change (percent) beyond which the trend reads RISING / FALLING.
    pub oi_trend_threshold_pct: f64,
    /// Funding rate at which the funding contribution saturates (0.01 = 1%).
    pub funding_saturation: f64,
    pub funding_weight: f64,
    /// OI 24h change (percent) at which the OI contribution saturates.
    pub oi_saturation_pct: f64,
    pub oi_weight: f64,
    pub liquidation_weight: f64,
    pub liquidation_tilt_cap: f64,
    pub fear_greed_weight: f64,
    pub fear_greed_tilt_cap: f64,
    /// Taker-volume lookback ranges tried in order until one yields data.
    pub ratio_ranges: &'static [&'static str],
}

/// Scalp detector knobs. The zone half-width constants are untuned
/// heuristics, kept configurable on purpose.
#[derive(Clone, Debug)]
pub struct ScalpConfig {
    /// Ring buffer length for 1-minute micro metrics.
    pub retention: usize,
    pub atr_period: usize,
    /// Floor for the zone half-width as a fraction of price (0.0015 = 0.15%).
    pub min_half_width_pct: f64,
    /// Multiplier applied to ATR1m% when it dominates the half-width.
    pub atr_scale: f64,
    /// Floor for the stop-loss buffer beyond the zone edge.
    pub stop_buffer_min_pct: f64,
    pub stop_buffer_atr_factor: f64,
    /// How many recent candles per higher timeframe feed the extremes.
    pub extreme_lookback: usize,
    pub volume_profile_enabled: bool,
    pub volume_profile_buckets: usize,
}

/// Per-symbol signal cooldown / cache window.
#[derive(Clone, Debug)]
pub struct GateConfig {
    pub cooldown_secs: u64,
}

/// Background micro-metrics refresher.
#[derive(Clone, Debug)]
pub struct RefreshConfig {
    pub interval_secs: u64,
    /// Bounded set of most-recently-requested symbols kept warm.
    pub max_symbols: usize,
}

/// Supported-pairs resolver cache + fallback.
#[derive(Clone, Debug)]
pub struct PairsConfig {
    pub ttl_secs: u64,
    pub max_pairs: usize,
    pub fallback: &'static [&'static str],
}

/// The Master Engine Configuration
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Venue whose rows win ties in the sentiment fusion.
    pub target_exchange: &'static str,
    pub analyzer: AnalyzerConfig,
    pub sentiment: SentimentConfig,
    pub scalp: ScalpConfig,
    pub gate: GateConfig,
    pub refresh: RefreshConfig,
    pub pairs: PairsConfig,
}

impl EngineConfig {
    /// Static-configuration sanity check. This is the only fatal error
    /// surface in the engine; everything downstream degrades instead.
    pub fn validate(&self) -> Result<()> {
        if self.gate.cooldown_secs == 0 {
            bail!("gate.cooldown_secs must be positive");
        }
        if self.analyzer.min_candles <= self.analyzer.ema_slow {
            bail!(
                "analyzer.min_candles ({}) must exceed the slow EMA period ({})",
                self.analyzer.min_candles,
                self.analyzer.ema_slow
            );
        }
        if self.analyzer.atr_low_pct >= self.analyzer.atr_high_pct {
            bail!("analyzer ATR bands are inverted");
        }
        if self.scalp.retention <= self.scalp.atr_period {
            bail!(
                "scalp.retention ({}) must exceed scalp.atr_period ({})",
                self.scalp.retention,
                self.scalp.atr_period
            );
        }
        if !(6..=200).contains(&self.scalp.volume_profile_buckets) {
            bail!("scalp.volume_profile_buckets must lie in [6, 200]");
        }
        if self.refresh.max_symbols == 0 {
            bail!("refresh.max_symbols must be positive");
        }
        if self.pairs.fallback.is_empty() {
            bail!("pairs.fallback must not be empty");
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        RADAR.clone()
    }
}

pub const RADAR: EngineConfig = EngineConfig {
    target_exchange: "MEXC",

    analyzer: AnalyzerConfig {
        min_candles: 60,
        candle_fetch_limit: 120,
        ema_fast: 20,
        ema_slow: 50,
        rsi_period: 14,
        atr_period: 14,
        atr_high_pct: 3.5,
        atr_low_pct: 1.5,
    },

    sentiment: SentimentConfig {
        oi_trend_threshold_pct: 5.0,
        funding_saturation: 0.01, // 1% funding = full weight
        funding_weight: 0.4,
        oi_saturation_pct: 10.0,
        oi_weight: 0.3,
        liquidation_weight: 0.3,
        liquidation_tilt_cap: 0.15,
        fear_greed_weight: 0.2,
        fear_greed_tilt_cap: 0.2,
        ratio_ranges: &["1h", "4h", "12h", "24h"],
    },

    scalp: ScalpConfig {
        retention: 240, // 4 hours of 1-minute samples
        atr_period: 14,
        min_half_width_pct: 0.0015,
        atr_scale: 0.6,
        stop_buffer_min_pct: 0.002,
        stop_buffer_atr_factor: 0.5,
        extreme_lookback: 24,
        volume_profile_enabled: false,
        volume_profile_buckets: 24,
    },

    gate: GateConfig { cooldown_secs: 300 },

    refresh: RefreshConfig {
        interval_secs: 60,
        max_symbols: 8,
    },

    pairs: PairsConfig {
        ttl_secs: 60,
        max_pairs: 50,
        fallback: &[
            "BTCUSDT", "ETHUSDT", "BNBUSDT", "ADAUSDT", "SOLUSDT", "DOGEUSDT", "XRPUSDT",
            "DOTUSDT", "LINKUSDT", "LTCUSDT", "MATICUSDT", "AVAXUSDT",
        ],
    },
};
