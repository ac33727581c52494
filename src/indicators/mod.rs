//! Pure indicator math. Every function here is total and deterministic:
//! malformed-but-typed input produces a neutral value, never a panic.

use serde::{Deserialize, Serialize};

/// Exponential moving average. Seeded with the first sample, k = 2/(period+1).
pub fn ema(series: &[f64], period: usize) -> f64 {
    if series.is_empty() || period == 0 {
        return 0.0;
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut value = series[0];
    for &price in &series[1..] {
        value = price * k + value * (1.0 - k);
    }
    value
}

/// Relative Strength Index over the last `period` deltas.
///
/// Simple mean of gains/losses, NOT Wilder's recursive smoothing.
/// avg_loss == 0 reads as 100. Short input reads as neutral 50.
pub fn rsi(series: &[f64], period: usize) -> f64 {
    if period == 0 || series.len() < period + 1 {
        return 50.0;
    }

    let window = &series[series.len() - (period + 1)..];
    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;
    for pair in window.windows(2) {
        let delta = pair[1] - pair[0];
        if delta >= 0.0 {
            gain_sum += delta;
        } else {
            loss_sum += -delta;
        }
    }

    let avg_gain = gain_sum / period as f64;
    let avg_loss = loss_sum / period as f64;

    if avg_loss <= f64::EPSILON {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
}

/// Average True Range as percent of the last close.
/// Returns 0.0 with fewer than period+1 samples or a non-positive last close.
pub fn atr_percent(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> f64 {
    let n = highs.len().min(lows.len()).min(closes.len());
    if period == 0 || n < period + 1 {
        return 0.0;
    }

    let mut true_ranges = Vec::with_capacity(n - 1);
    for i in 1..n {
        true_ranges.push(true_range(highs[i], lows[i], closes[i - 1]));
    }

    let tail = &true_ranges[true_ranges.len() - period..];
    let atr: f64 = tail.iter().sum::<f64>() / period as f64;

    let last_close = closes[n - 1];
    if last_close <= f64::EPSILON || !atr.is_finite() {
        return 0.0;
    }
    atr / last_close * 100.0
}

/// TR = max(high - low, |high - prev_close|, |low - prev_close|)
#[inline]
pub fn true_range(high: f64, low: f64, prev_close: f64) -> f64 {
    let hl = high - low;
    let hc = (high - prev_close).abs();
    let lc = (low - prev_close).abs();
    hl.max(hc).max(lc)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeProfile {
    /// Point of Control: midpoint of the highest-volume bucket.
    pub poc: f64,
    /// High-volume node midpoints, strongest first.
    pub hvn: Vec<f64>,
    /// Low-volume node midpoints, weakest first.
    pub lvn: Vec<f64>,
    pub bucket_width: f64,
    /// (max - min) / last_close * 100
    pub range_percent: f64,
}

/// Bins traded volume across the [min(lows), max(highs)] price range by each
/// sample's close. None when the range is degenerate or there are <10 samples.
pub fn volume_profile(
    closes: &[f64],
    volumes: &[f64],
    highs: &[f64],
    lows: &[f64],
    buckets: usize,
) -> Option<VolumeProfile> {
    let n = closes
        .len()
        .min(volumes.len())
        .min(highs.len())
        .min(lows.len());
    if n < 10 {
        return None;
    }
    let buckets = buckets.clamp(6, 200);

    let min = lows[..n]
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f64::INFINITY, f64::min);
    let max = highs[..n]
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    let last_close = closes[n - 1];
    if !(max > min) || last_close <= f64::EPSILON || !last_close.is_finite() {
        return None;
    }

    let bucket_width = (max - min) / buckets as f64;
    let mut binned = vec![0.0_f64; buckets];
    for i in 0..n {
        let close = closes[i];
        let volume = volumes[i];
        if !close.is_finite() || !volume.is_finite() || volume < 0.0 {
            continue;
        }
        let idx = (((close - min) / bucket_width).floor() as isize)
            .clamp(0, buckets as isize - 1) as usize;
        binned[idx] += volume;
    }

    let midpoint = |idx: usize| min + (idx as f64 + 0.5) * bucket_width;

    // Stable ordering: volume first, bucket index as the tie-break.
    let mut order: Vec<usize> = (0..buckets).collect();
    order.sort_by(|&a, &b| {
        binned[b]
            .partial_cmp(&binned[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    let hvn: Vec<f64> = order.iter().take(3).map(|&i| midpoint(i)).collect();
    let lvn: Vec<f64> = order.iter().rev().take(2).map(|&i| midpoint(i)).collect();

    Some(VolumeProfile {
        poc: midpoint(order[0]),
        hvn,
        lvn,
        bucket_width,
        range_percent: (max - min) / last_close * 100.0,
    })
}
