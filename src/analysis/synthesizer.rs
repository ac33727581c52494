use crate::analysis::price_action::PriceAction;
use crate::config::Score;
use crate::domain::Ticker24h;
use crate::models::{OiTrend, RiskLevel, SentimentSnapshot, SignalKind, TradingSignal, VolatilityBand};

const CONFIDENCE_FLOOR: f64 = 0.2;
const CONFIDENCE_CEILING: f64 = 0.92;

/// Pure decision function: 24h price action + fused sentiment in,
/// LONG/SHORT/WAIT with confidence and risk out. No I/O; the timestamp is
/// passed in so identical inputs always produce the identical signal.
pub fn synthesize(
    symbol: &str,
    ticker: &Ticker24h,
    sentiment: &SentimentSnapshot,
    generated_at_ms: i64,
) -> TradingSignal {
    let action = PriceAction::from_ticker(ticker);
    let score = sentiment.sentiment_score.value();
    let change = action.price_change_percent;

    let (signal, confidence, reasoning) = if action.trend.is_bullish() && score > 0.0 {
        let mut raw = 0.4 + action.strength + score.abs().min(0.6);
        if sentiment.oi_trend == OiTrend::Rising {
            raw += 0.1;
        }
        if change > 2.0 {
            raw += 0.05;
        }
        (
            SignalKind::Long,
            raw.clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING),
            bullish_reasoning(&action, sentiment),
        )
    } else if action.trend.is_bearish() && score < 0.0 {
        let mut raw = 0.4 + action.strength + score.abs().min(0.6);
        if sentiment.oi_trend == OiTrend::Falling {
            raw += 0.1;
        }
        if change < -2.0 {
            raw += 0.05;
        }
        (
            SignalKind::Short,
            raw.clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING),
            bearish_reasoning(&action, sentiment),
        )
    } else {
        (
            SignalKind::Wait,
            CONFIDENCE_FLOOR,
            wait_reasoning(&action, sentiment),
        )
    };

    let risk_level = match action.volatility {
        VolatilityBand::High => RiskLevel::High,
        VolatilityBand::Low if confidence > 0.6 => RiskLevel::Low,
        _ => RiskLevel::Medium,
    };

    let (entry_price, stop_loss, take_profit) =
        price_levels(signal, ticker.last_price, action.daily_range_percent);

    TradingSignal {
        symbol: symbol.to_string(),
        signal,
        confidence: Score::new(confidence),
        risk_level,
        reasoning,
        entry_price,
        stop_loss,
        take_profit,
        sentiment: sentiment.clone(),
        generated_at_ms,
    }
}

/// Entry at the last price, stop and target half the 24h range away.
/// WAIT signals (and dead tickers) carry no levels.
fn price_levels(
    signal: SignalKind,
    last_price: f64,
    daily_range_percent: f64,
) -> (Option<f64>, Option<f64>, Option<f64>) {
    if last_price <= f64::EPSILON {
        return (None, None, None);
    }
    let half_range = (daily_range_percent / 2.0).max(0.5) / 100.0;
    match signal {
        SignalKind::Long => (
            Some(last_price),
            Some(last_price * (1.0 - half_range)),
            Some(last_price * (1.0 + half_range)),
        ),
        SignalKind::Short => (
            Some(last_price),
            Some(last_price * (1.0 + half_range)),
            Some(last_price * (1.0 - half_range)),
        ),
        SignalKind::Wait => (None, None, None),
    }
}

fn bullish_reasoning(action: &PriceAction, s: &SentimentSnapshot) -> String {
    let mut text = format!(
        "{} 24h trend ({:+.2}%, {} momentum) with positive sentiment {}. ",
        action.trend, action.price_change_percent, action.momentum, s.sentiment_score
    );
    text.push_str(&sentiment_detail(s));
    if s.oi_trend == OiTrend::Rising {
        text.push_str(" Rising open interest supports the move.");
    }
    text
}

fn bearish_reasoning(action: &PriceAction, s: &SentimentSnapshot) -> String {
    let mut text = format!(
        "{} 24h trend ({:+.2}%, {} momentum) with negative sentiment {}. ",
        action.trend, action.price_change_percent, action.momentum, s.sentiment_score
    );
    text.push_str(&sentiment_detail(s));
    if s.oi_trend == OiTrend::Falling {
        text.push_str(" Falling open interest confirms the weakness.");
    }
    text
}

fn wait_reasoning(action: &PriceAction, s: &SentimentSnapshot) -> String {
    format!(
        "Mixed signals: trend {} ({:+.2}%, {} momentum) vs sentiment {}. {} Waiting for a clearer directional bias.",
        action.trend,
        action.price_change_percent,
        action.momentum,
        s.sentiment_score,
        sentiment_detail(s),
    )
}

fn sentiment_detail(s: &SentimentSnapshot) -> String {
    let mut text = format!(
        "Funding {:+.4}%, OI change {:+.1}% 24h ({}).",
        s.funding_rate * 100.0,
        s.oi_change_24h_percent,
        s.oi_trend
    );
    if let Some(ratio) = s.long_short_ratio {
        text.push_str(&format!(" Longs hold {:.0}% of exposure.", ratio * 100.0));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SentimentScore;

    fn scenario_ticker() -> Ticker24h {
        Ticker24h {
            last_price: 50_000.0,
            price_change_percent: 3.5,
            high_price: 51_500.0,
            low_price: 49_000.0,
            volume: 10_000.0,
        }
    }

    fn sentiment(score: f64, oi_trend: OiTrend) -> SentimentSnapshot {
        SentimentSnapshot {
            funding_rate: 0.0002,
            open_interest_usd: 5_000_000.0,
            oi_change_24h_percent: 12.0,
            oi_trend,
            long_short_ratio: Some(0.55),
            liquidation_long_usd: 0.0,
            liquidation_short_usd: 0.0,
            fear_greed_index: Some(60.0),
            sentiment_score: SentimentScore::new(score),
        }
    }

    #[test]
    fn btc_scenario_clamps_confidence_at_ceiling() {
        // 0.4 + 0.35 + 0.4 + 0.1 + 0.05 = 1.3, clamped to 0.92.
        let signal = synthesize(
            "BTCUSDT",
            &scenario_ticker(),
            &sentiment(0.4, OiTrend::Rising),
            1_000,
        );
        assert_eq!(signal.signal, SignalKind::Long);
        assert!((signal.confidence.value() - 0.92).abs() < 1e-12);
        // Daily range 5.0% trips the HIGH band, which overrides the LOW/MEDIUM path.
        assert_eq!(signal.risk_level, RiskLevel::High);
        assert_eq!(signal.entry_price, Some(50_000.0));
        assert!(signal.reasoning.contains("STRONG_BULLISH"));
        assert!(signal.reasoning.contains("+0.40"));
        assert!(signal.reasoning.contains("OI change +12.0%"));
    }

    #[test]
    fn identical_inputs_give_identical_signals() {
        let ticker = scenario_ticker();
        let s = sentiment(0.4, OiTrend::Rising);
        let a = synthesize("BTCUSDT", &ticker, &s, 42);
        let b = synthesize("BTCUSDT", &ticker, &s, 42);
        assert_eq!(a, b);
    }

    #[test]
    fn bullish_trend_with_negative_sentiment_waits() {
        let signal = synthesize(
            "ETHUSDT",
            &scenario_ticker(),
            &sentiment(-0.2, OiTrend::Neutral),
            0,
        );
        assert_eq!(signal.signal, SignalKind::Wait);
        assert_eq!(signal.confidence.value(), 0.2);
        assert_eq!(signal.entry_price, None);
        assert!(signal.reasoning.contains("Waiting"));
    }

    #[test]
    fn bearish_mirror_rewards_falling_oi() {
        let ticker = Ticker24h {
            last_price: 100.0,
            price_change_percent: -2.5,
            high_price: 101.0,
            low_price: 98.5,
            volume: 500.0,
        };
        let falling = synthesize("SOLUSDT", &ticker, &sentiment(-0.1, OiTrend::Falling), 0);
        let neutral = synthesize("SOLUSDT", &ticker, &sentiment(-0.1, OiTrend::Neutral), 0);
        assert_eq!(falling.signal, SignalKind::Short);
        // 0.4 + 0.25 + 0.1 + 0.1 (falling OI) + 0.05 (change < -2)
        assert!((falling.confidence.value() - 0.9).abs() < 1e-12);
        assert!(falling.confidence.value() > neutral.confidence.value());
        // Short levels are mirrored around entry.
        assert!(falling.stop_loss.unwrap() > falling.entry_price.unwrap());
        assert!(falling.take_profit.unwrap() < falling.entry_price.unwrap());
    }

    #[test]
    fn low_volatility_and_conviction_reads_low_risk() {
        let ticker = Ticker24h {
            last_price: 100.0,
            price_change_percent: 2.5,
            high_price: 101.0,
            low_price: 99.5,
            volume: 500.0,
        };
        let signal = synthesize("BNBUSDT", &ticker, &sentiment(0.5, OiTrend::Rising), 0);
        assert_eq!(signal.signal, SignalKind::Long);
        assert!(signal.confidence.value() > 0.6);
        assert_eq!(signal.risk_level, RiskLevel::Low);
    }
}
