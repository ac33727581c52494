use crate::config::{SentimentConfig, SentimentScore};
use crate::models::{LiquidationTotals, MarketRow, OiTrend, SentimentSnapshot, TakerVolumeRow};
use crate::utils::{clamp_abs, median};

/// Everything the fusion needs, already fetched. Missing sources stay empty
/// and contribute zero; the aggregation itself never fails.
#[derive(Debug, Clone, Default)]
pub struct SentimentInputs {
    pub rows: Vec<MarketRow>,
    pub taker_rows: Vec<TakerVolumeRow>,
    pub liquidations: Option<LiquidationTotals>,
    pub fear_greed: Option<f64>,
}

/// Fuses funding, OI, long/short positioning, liquidations and fear/greed
/// into one bounded score. Target venue rows win; a venue reporting a
/// spurious zero falls back to the cross-venue median.
pub fn aggregate(
    target_exchange: &str,
    inputs: &SentimentInputs,
    cfg: &SentimentConfig,
) -> SentimentSnapshot {
    let target_row = inputs
        .rows
        .iter()
        .find(|r| r.exchange.eq_ignore_ascii_case(target_exchange));

    let funding_rate = prefer_or_median(
        target_row.map(|r| r.funding_rate),
        inputs.rows.iter().map(|r| r.funding_rate),
    );
    let oi_change = prefer_or_median(
        target_row.map(|r| r.oi_change_24h_percent),
        inputs.rows.iter().map(|r| r.oi_change_24h_percent),
    );
    let open_interest = match target_row.map(|r| r.open_interest_usd) {
        Some(v) if v > 0.0 => v,
        _ => inputs.rows.iter().map(|r| r.open_interest_usd.max(0.0)).sum(),
    };

    let oi_trend = if oi_change > cfg.oi_trend_threshold_pct {
        OiTrend::Rising
    } else if oi_change < -cfg.oi_trend_threshold_pct {
        OiTrend::Falling
    } else {
        OiTrend::Neutral
    };

    let long_short_ratio = resolve_ratio(target_exchange, inputs);

    let (liq_long, liq_short) = inputs
        .liquidations
        .map(|l| (l.long_usd.max(0.0), l.short_usd.max(0.0)))
        .unwrap_or((0.0, 0.0));
    let liq_total = liq_long + liq_short;
    let liquidation_tilt = if liq_total > 0.0 {
        clamp_abs(
            cfg.liquidation_weight * (liq_long - liq_short) / liq_total,
            cfg.liquidation_tilt_cap,
        )
    } else {
        0.0
    };

    let fear_greed_tilt = match inputs.fear_greed {
        Some(fg) if fg.is_finite() => {
            clamp_abs(cfg.fear_greed_weight * (fg - 50.0) / 50.0, cfg.fear_greed_tilt_cap)
        }
        _ => 0.0,
    };

    let funding_contribution = clamp_abs(
        funding_rate / cfg.funding_saturation * cfg.funding_weight,
        cfg.funding_weight,
    );
    let oi_contribution = clamp_abs(oi_change / cfg.oi_saturation_pct * cfg.oi_weight, cfg.oi_weight);

    let score = SentimentScore::new(
        funding_contribution + oi_contribution + liquidation_tilt + fear_greed_tilt,
    );

    SentimentSnapshot {
        funding_rate,
        open_interest_usd: open_interest,
        oi_change_24h_percent: oi_change,
        oi_trend,
        long_short_ratio,
        liquidation_long_usd: liq_long,
        liquidation_short_usd: liq_short,
        fear_greed_index: inputs.fear_greed,
        sentiment_score: score,
    }
}

/// True when any venue row carries a usable directly-reported ratio,
/// which makes the taker-volume fallback fetch unnecessary.
pub(crate) fn has_direct_ratio(rows: &[MarketRow]) -> bool {
    rows.iter().any(|r| direct_ratio(r).is_some())
}

fn prefer_or_median(target: Option<f64>, all: impl Iterator<Item = f64>) -> f64 {
    match target {
        Some(v) if v != 0.0 && v.is_finite() => v,
        _ => {
            let non_zero: Vec<f64> = all.filter(|v| *v != 0.0 && v.is_finite()).collect();
            median(&non_zero)
        }
    }
}

fn resolve_ratio(target_exchange: &str, inputs: &SentimentInputs) -> Option<f64> {
    // 1. Directly reported ratio, target venue first.
    let target_row = inputs
        .rows
        .iter()
        .find(|r| r.exchange.eq_ignore_ascii_case(target_exchange));
    if let Some(ratio) = target_row.and_then(direct_ratio) {
        return Some(ratio);
    }
    if let Some(ratio) = inputs.rows.iter().find_map(direct_ratio) {
        return Some(ratio);
    }

    // 2. Derive from taker buy/sell volume, target venue first.
    if let Some(row) = inputs
        .taker_rows
        .iter()
        .find(|r| r.exchange.eq_ignore_ascii_case(target_exchange))
    {
        if let Some(ratio) = taker_ratio(row.buy_usd, row.sell_usd) {
            return Some(ratio);
        }
    }
    let buy: f64 = inputs.taker_rows.iter().map(|r| r.buy_usd.max(0.0)).sum();
    let sell: f64 = inputs.taker_rows.iter().map(|r| r.sell_usd.max(0.0)).sum();
    taker_ratio(buy, sell)
}

/// Normalizes a reported ratio into [0,1]. Values above 1 are read as
/// longs-per-short (e.g. 1.5) and converted to a long fraction.
fn direct_ratio(row: &MarketRow) -> Option<f64> {
    if let Some(r) = row.long_short_ratio {
        if r.is_finite() && r >= 0.0 {
            return Some(if r <= 1.0 { r } else { r / (1.0 + r) });
        }
    }
    if let (Some(long), Some(short)) = (row.long_rate, row.short_rate) {
        let total = long + short;
        if total > 0.0 && total.is_finite() {
            return Some(long / total);
        }
    }
    None
}

fn taker_ratio(buy: f64, sell: f64) -> Option<f64> {
    let total = buy + sell;
    if total > 0.0 && total.is_finite() {
        Some(buy / total)
    } else {
        None
    }
}
