use crate::config::{AnalyzerConfig, AtrPct, Score, Timeframe};
use crate::domain::Candle;
use crate::indicators::{atr_percent, ema, rsi};
use crate::models::{SignalKind, TimeframeAnalysis, TrendBias, VolatilityBand};

/// Per-timeframe trend/volatility read over a candle series.
/// Returns None when fewer than `min_candles` well-formed rows survive
/// filtering (insufficient history, not an error).
pub fn analyze(
    timeframe: Timeframe,
    candles: &[Candle],
    cfg: &AnalyzerConfig,
) -> Option<TimeframeAnalysis> {
    let valid: Vec<&Candle> = candles.iter().filter(|c| c.is_well_formed()).collect();
    if valid.len() < cfg.min_candles {
        log::debug!(
            "insufficient history on {}: {} valid candles (need {})",
            timeframe,
            valid.len(),
            cfg.min_candles
        );
        return None;
    }

    let closes: Vec<f64> = valid.iter().map(|c| c.close).collect();
    let highs: Vec<f64> = valid.iter().map(|c| c.high).collect();
    let lows: Vec<f64> = valid.iter().map(|c| c.low).collect();

    let ema20 = ema(&closes, cfg.ema_fast);
    let ema50 = ema(&closes, cfg.ema_slow);
    let rsi14 = rsi(&closes, cfg.rsi_period);
    let atr = atr_percent(&highs, &lows, &closes, cfg.atr_period);

    let trend = trend_for(ema20, ema50);
    let volatility = volatility_band(atr, cfg);

    let mut score = 0.5;
    score += match trend {
        TrendBias::Bullish => 0.15,
        TrendBias::Bearish => -0.15,
    };
    if (45.0..=65.0).contains(&rsi14) {
        score += 0.1;
    } else if rsi14 < 30.0 || rsi14 > 70.0 {
        score -= 0.15;
    }
    score += match volatility {
        VolatilityBand::Low => 0.05,
        VolatilityBand::High => -0.05,
        VolatilityBand::Medium => 0.0,
    };
    let score = Score::new(score);

    let recommendation = if score.value() >= 0.6 && trend == TrendBias::Bullish {
        SignalKind::Long
    } else if score.value() <= 0.4 && trend == TrendBias::Bearish {
        SignalKind::Short
    } else {
        SignalKind::Wait
    };

    let explanation = format!(
        "{}: EMA20 {:.4} {} EMA50 {:.4} ({}), RSI {:.1} ({}), ATR {:.2}% ({} volatility)",
        timeframe,
        ema20,
        if ema20 >= ema50 { ">=" } else { "<" },
        ema50,
        trend,
        rsi14,
        rsi_zone(rsi14),
        atr,
        volatility,
    );

    Some(TimeframeAnalysis {
        timeframe,
        trend,
        volatility,
        ema20,
        ema50,
        rsi14,
        atr_percent: AtrPct::new(atr),
        recommendation,
        score,
        explanation,
    })
}

/// ema20 == ema50 reads bullish.
pub(crate) fn trend_for(ema_fast: f64, ema_slow: f64) -> TrendBias {
    if ema_fast >= ema_slow {
        TrendBias::Bullish
    } else {
        TrendBias::Bearish
    }
}

/// HIGH strictly above the high band, LOW strictly below the low band.
pub(crate) fn volatility_band(atr_pct: f64, cfg: &AnalyzerConfig) -> VolatilityBand {
    if atr_pct > cfg.atr_high_pct {
        VolatilityBand::High
    } else if atr_pct < cfg.atr_low_pct {
        VolatilityBand::Low
    } else {
        VolatilityBand::Medium
    }
}

fn rsi_zone(rsi: f64) -> &'static str {
    if rsi < 30.0 {
        "oversold"
    } else if rsi > 70.0 {
        "overbought"
    } else if (45.0..=65.0).contains(&rsi) {
        "balanced"
    } else {
        "drifting"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RADAR;

    fn cfg() -> AnalyzerConfig {
        RADAR.analyzer.clone()
    }

    /// Mild up-drift with alternating pullbacks: last-14-delta RSI lands on
    /// exactly 60, EMA20 > EMA50, tiny ATR.
    fn drifting_up_candles(n: usize) -> Vec<Candle> {
        let mut close = 100.0;
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            if i > 0 {
                close += if i % 2 == 1 { 0.15 } else { -0.1 };
            }
            out.push(Candle::new(
                (i as i64 + 1) * 60_000,
                close,
                close + 0.1,
                close - 0.1,
                close,
                10.0,
            ));
        }
        out
    }

    #[test]
    fn classification_boundaries() {
        let cfg = cfg();
        // Equal EMAs read bullish.
        assert_eq!(trend_for(100.0, 100.0), TrendBias::Bullish);
        assert_eq!(trend_for(99.9, 100.0), TrendBias::Bearish);
        // Exactly 3.5 / 1.5 sit on the MEDIUM side of both inequalities.
        assert_eq!(volatility_band(3.5, &cfg), VolatilityBand::Medium);
        assert_eq!(volatility_band(3.51, &cfg), VolatilityBand::High);
        assert_eq!(volatility_band(1.5, &cfg), VolatilityBand::Medium);
        assert_eq!(volatility_band(1.49, &cfg), VolatilityBand::Low);
    }

    #[test]
    fn too_few_candles_is_none() {
        let candles = drifting_up_candles(59);
        assert!(analyze(Timeframe::M15, &candles, &cfg()).is_none());
    }

    #[test]
    fn malformed_rows_do_not_count_toward_history() {
        let mut candles = drifting_up_candles(59);
        // Pad to 70 rows with garbage; still only 59 valid.
        for i in 0..11 {
            candles.push(Candle::new(1, 100.0, 90.0, 110.0, f64::NAN, -(i as f64)));
        }
        assert!(analyze(Timeframe::H1, &candles, &cfg()).is_none());
    }

    #[test]
    fn drifting_uptrend_recommends_long() {
        let candles = drifting_up_candles(70);
        let analysis = analyze(Timeframe::H1, &candles, &cfg()).unwrap();
        assert_eq!(analysis.trend, TrendBias::Bullish);
        assert_eq!(analysis.volatility, VolatilityBand::Low);
        // RSI over the last 14 deltas: 7*0.15 gains vs 7*0.1 losses -> 60.
        assert!((analysis.rsi14 - 60.0).abs() < 1e-9);
        // 0.5 + 0.15 (trend) + 0.1 (rsi band) + 0.05 (low vol)
        assert!((analysis.score.value() - 0.8).abs() < 1e-9);
        assert_eq!(analysis.recommendation, SignalKind::Long);
        assert!(analysis.explanation.contains("RSI 60.0"));
        assert!(analysis.explanation.contains("EMA20"));
        assert!(analysis.explanation.contains("ATR"));
    }

    #[test]
    fn runaway_uptrend_waits_on_overbought_rsi() {
        // Strictly increasing closes: RSI 100 -> -0.15 penalty keeps it WAIT.
        let candles: Vec<Candle> = (0..70i64)
            .map(|i| {
                let close = 100.0 + i as f64 * 0.1;
                Candle::new((i + 1) * 60_000, close, close + 0.3, close - 0.3, close, 10.0)
            })
            .collect();
        let analysis = analyze(Timeframe::M15, &candles, &cfg()).unwrap();
        assert_eq!(analysis.trend, TrendBias::Bullish);
        assert_eq!(analysis.rsi14, 100.0);
        assert_eq!(analysis.recommendation, SignalKind::Wait);
    }
}
