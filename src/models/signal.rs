use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::config::{AtrPct, Score, SentimentScore, Timeframe};
use crate::domain::Zone;
use crate::utils::{format_notional, format_price, risk_reward_ratio};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalKind {
    #[strum(to_string = "LONG")]
    Long,
    #[strum(to_string = "SHORT")]
    Short,
    #[strum(to_string = "WAIT")]
    Wait,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    #[strum(to_string = "LOW")]
    Low,
    #[strum(to_string = "MEDIUM")]
    Medium,
    #[strum(to_string = "HIGH")]
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrendBias {
    #[strum(to_string = "BULLISH")]
    Bullish,
    #[strum(to_string = "BEARISH")]
    Bearish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "UPPERCASE")]
pub enum VolatilityBand {
    #[strum(to_string = "LOW")]
    Low,
    #[strum(to_string = "MEDIUM")]
    Medium,
    #[strum(to_string = "HIGH")]
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "UPPERCASE")]
pub enum OiTrend {
    #[strum(to_string = "RISING")]
    Rising,
    #[strum(to_string = "FALLING")]
    Falling,
    #[strum(to_string = "NEUTRAL")]
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum MicroDirection {
    Up,
    Down,
    Flat,
}

/// Per-timeframe trend read. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeAnalysis {
    pub timeframe: Timeframe,
    pub trend: TrendBias,
    pub volatility: VolatilityBand,
    pub ema20: f64,
    pub ema50: f64,
    pub rsi14: f64,
    pub atr_percent: AtrPct,
    pub recommendation: SignalKind,
    pub score: Score,
    pub explanation: String,
}

/// Fused derivatives-market sentiment for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSnapshot {
    pub funding_rate: f64,
    pub open_interest_usd: f64,
    pub oi_change_24h_percent: f64,
    pub oi_trend: OiTrend,
    /// Fraction of exposure attributable to longs, in [0, 1]. None = unknown.
    pub long_short_ratio: Option<f64>,
    pub liquidation_long_usd: f64,
    pub liquidation_short_usd: f64,
    pub fear_greed_index: Option<f64>,
    pub sentiment_score: SentimentScore,
}

impl SentimentSnapshot {
    /// Neutral snapshot used when every sentiment source is unavailable.
    pub fn neutral() -> Self {
        SentimentSnapshot {
            funding_rate: 0.0,
            open_interest_usd: 0.0,
            oi_change_24h_percent: 0.0,
            oi_trend: OiTrend::Neutral,
            long_short_ratio: None,
            liquidation_long_usd: 0.0,
            liquidation_short_usd: 0.0,
            fear_greed_index: None,
            sentiment_score: SentimentScore::new(0.0),
        }
    }
}

/// The macro directional call. Cached per symbol by the signal gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingSignal {
    pub symbol: String,
    pub signal: SignalKind,
    pub confidence: Score,
    pub risk_level: RiskLevel,
    pub reasoning: String,
    pub entry_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub sentiment: SentimentSnapshot,
    pub generated_at_ms: i64,
}

impl TradingSignal {
    /// Compact plain-text summary for presentation layers.
    pub fn digest(&self) -> String {
        let mut out = format!(
            "{} {} | confidence {} | risk {}\n",
            self.signal, self.symbol, self.confidence, self.risk_level
        );

        if let (Some(entry), Some(stop), Some(target)) =
            (self.entry_price, self.stop_loss, self.take_profit)
        {
            out.push_str(&format!(
                "entry {} | stop {} | target {}",
                format_price(entry),
                format_price(stop),
                format_price(target)
            ));
            if let Some(rr) = risk_reward_ratio(entry, stop, target) {
                out.push_str(&format!(" | r/r {:.2}", rr));
            }
            out.push('\n');
        }

        let s = &self.sentiment;
        out.push_str(&format!(
            "funding {:+.4}% | OI {} ({:+.1}% 24h, {}) | sentiment {}",
            s.funding_rate * 100.0,
            format_notional(s.open_interest_usd),
            s.oi_change_24h_percent,
            s.oi_trend,
            s.sentiment_score
        ));
        if let Some(ratio) = s.long_short_ratio {
            out.push_str(&format!(" | longs {:.0}%", ratio * 100.0));
        }
        out.push('\n');
        out.push_str(&self.reasoning);
        out
    }
}

/// Short-horizon zone-reversal call. Always recomputed live, never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalpCall {
    pub symbol: String,
    pub bias: SignalKind,
    pub entry: Option<f64>,
    pub stop_loss: Option<f64>,
    pub take_profit_1: Option<f64>,
    pub take_profit_2: Option<f64>,
    pub support_zone: Option<Zone>,
    pub resistance_zone: Option<Zone>,
    pub atr_1m_percent: AtrPct,
    pub reasoning: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_serializes_with_uppercase_tags() {
        let json = serde_json::to_string(&SignalKind::Long).unwrap();
        assert_eq!(json, "\"LONG\"");
        let back: SignalKind = serde_json::from_str("\"WAIT\"").unwrap();
        assert_eq!(back, SignalKind::Wait);
    }

    #[test]
    fn digest_mentions_levels_and_ratio() {
        let signal = TradingSignal {
            symbol: "BTCUSDT".to_string(),
            signal: SignalKind::Long,
            confidence: Score::new(0.92),
            risk_level: RiskLevel::High,
            reasoning: "test".to_string(),
            entry_price: Some(50_000.0),
            stop_loss: Some(48_750.0),
            take_profit: Some(51_250.0),
            sentiment: SentimentSnapshot::neutral(),
            generated_at_ms: 0,
        };
        let digest = signal.digest();
        assert!(digest.contains("LONG BTCUSDT"));
        assert!(digest.contains("$50000.00"));
        assert!(digest.contains("r/r 1.00"));
    }
}
