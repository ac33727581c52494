use crate::config::{AtrPct, ScalpConfig};
use crate::domain::{Candle, Zone};
use crate::indicators::volume_profile;
use crate::models::{MicroDirection, MicroSeries, ScalpCall, SignalKind};
use crate::utils::{format_price, get_max, get_min};

/// Slow-horizon metrics surfaced alongside a scalp call for context.
/// Deliberately NOT decision inputs: minute-scale reversals are
/// microstructure-driven, and the macro synthesis already consumes these.
#[derive(Debug, Clone, Default)]
pub struct ScalpContext {
    pub funding_rate: f64,
    pub oi_change_24h_percent: f64,
    pub long_short_ratio: Option<f64>,
}

/// Zone-touch-and-reversal detection against the strongest 1h/4h extremes.
pub fn detect(
    symbol: &str,
    current_price: f64,
    micro: &MicroSeries,
    h1: &[Candle],
    h4: &[Candle],
    ctx: &ScalpContext,
    cfg: &ScalpConfig,
) -> ScalpCall {
    let atr = micro.atr_percent(cfg.atr_period);

    let wait = |reasoning: String, support: Option<Zone>, resistance: Option<Zone>| ScalpCall {
        symbol: symbol.to_string(),
        bias: SignalKind::Wait,
        entry: None,
        stop_loss: None,
        take_profit_1: None,
        take_profit_2: None,
        support_zone: support,
        resistance_zone: resistance,
        atr_1m_percent: AtrPct::new(atr),
        reasoning,
    };

    if current_price <= f64::EPSILON {
        return wait("No live price available for the scalp window.".to_string(), None, None);
    }

    let (highs, lows) = recent_extremes(h1, h4, cfg.extreme_lookback);
    if highs.is_empty() || lows.is_empty() {
        return wait(
            format!(
                "Insufficient 1h/4h history to anchor zones. {}",
                context_line(ctx, atr)
            ),
            None,
            None,
        );
    }

    let resistance = get_max(&highs);
    let support = get_min(&lows);

    let half_width = cfg.min_half_width_pct.max(cfg.atr_scale * atr / 100.0) * current_price;
    let resistance_zone = Zone::around(resistance, half_width);
    let support_zone = Zone::around(support, half_width);

    let touched_resistance = micro.touched(&resistance_zone);
    let touched_support = micro.touched(&support_zone);
    let direction = micro.micro_direction();

    let stop_buffer = cfg
        .stop_buffer_min_pct
        .max(cfg.stop_buffer_atr_factor * atr / 100.0);

    let mut profile_note = String::new();
    if cfg.volume_profile_enabled {
        if let Some(profile) = volume_profile(
            &micro.closes,
            &micro.volumes,
            &micro.highs,
            &micro.lows,
            cfg.volume_profile_buckets,
        ) {
            profile_note = format!(" Minute volume POC near {}.", format_price(profile.poc));
        }
    }

    if touched_resistance && direction == MicroDirection::Down {
        let take_profit_1 = (resistance + support) / 2.0;
        let reasoning = format!(
            "Resistance zone {}..{} tested and rejected (last 1m move Down). Targeting mid {} then support {}.{} {}",
            format_price(resistance_zone.lower),
            format_price(resistance_zone.upper),
            format_price(take_profit_1),
            format_price(support),
            profile_note,
            context_line(ctx, atr),
        );
        return ScalpCall {
            symbol: symbol.to_string(),
            bias: SignalKind::Short,
            entry: Some(current_price),
            stop_loss: Some(resistance_zone.upper * (1.0 + stop_buffer)),
            take_profit_1: Some(take_profit_1),
            take_profit_2: Some(support),
            support_zone: Some(support_zone),
            resistance_zone: Some(resistance_zone),
            atr_1m_percent: AtrPct::new(atr),
            reasoning,
        };
    }

    if touched_support && direction == MicroDirection::Up {
        let take_profit_1 = (resistance + support) / 2.0;
        let reasoning = format!(
            "Support zone {}..{} tested and defended (last 1m move Up). Targeting mid {} then resistance {}.{} {}",
            format_price(support_zone.lower),
            format_price(support_zone.upper),
            format_price(take_profit_1),
            format_price(resistance),
            profile_note,
            context_line(ctx, atr),
        );
        return ScalpCall {
            symbol: symbol.to_string(),
            bias: SignalKind::Long,
            entry: Some(current_price),
            stop_loss: Some(support_zone.lower * (1.0 - stop_buffer)),
            take_profit_1: Some(take_profit_1),
            take_profit_2: Some(resistance),
            support_zone: Some(support_zone),
            resistance_zone: Some(resistance_zone),
            atr_1m_percent: AtrPct::new(atr),
            reasoning,
        };
    }

    let reasoning = if touched_resistance || touched_support {
        let side = if touched_resistance { "resistance" } else { "support" };
        format!(
            "Touched the {} zone but no reversal confirmation yet (last 1m move {}).{} {}",
            side,
            direction,
            profile_note,
            context_line(ctx, atr),
        )
    } else {
        format!(
            "Price {} has not tested either zone (support {}, resistance {}).{} {}",
            format_price(current_price),
            format_price(support),
            format_price(resistance),
            profile_note,
            context_line(ctx, atr),
        )
    };
    wait(reasoning, Some(support_zone), Some(resistance_zone))
}

/// Highs/lows over the recent window of each higher timeframe.
fn recent_extremes(h1: &[Candle], h4: &[Candle], lookback: usize) -> (Vec<f64>, Vec<f64>) {
    let mut highs = Vec::new();
    let mut lows = Vec::new();
    for window in [h1, h4] {
        let start = window.len().saturating_sub(lookback);
        for candle in &window[start..] {
            if candle.is_well_formed() {
                highs.push(candle.high);
                lows.push(candle.low);
            }
        }
    }
    (highs, lows)
}

fn context_line(ctx: &ScalpContext, atr: f64) -> String {
    let mut line = format!(
        "Context: funding {:+.4}%, OI {:+.1}% 24h, ATR1m {:.2}%",
        ctx.funding_rate * 100.0,
        ctx.oi_change_24h_percent,
        atr
    );
    if let Some(ratio) = ctx.long_short_ratio {
        line.push_str(&format!(", longs {:.0}%", ratio * 100.0));
    }
    line.push('.');
    line
}
