use argminmax::ArgMinMax;

#[inline]
pub(crate) fn get_max(vec: &[f64]) -> f64 {
    let max_index: usize = vec.argmax();
    vec[max_index]
}

#[inline]
pub(crate) fn get_min(vec: &[f64]) -> f64 {
    let min_index: usize = vec.argmin();
    vec[min_index]
}

/// Clamps `val` symmetrically into [-limit, limit].
#[inline]
pub(crate) fn clamp_abs(val: f64, limit: f64) -> f64 {
    val.clamp(-limit.abs(), limit.abs())
}

/// Median of a slice. Returns 0.0 for an empty slice so callers stay total.
pub(crate) fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Total parsing helper: pull a float out of loosely typed JSON fields.
/// Anything unusable (missing, non-numeric, NaN) becomes `default`.
pub(crate) fn json_f64_or(value: Option<&serde_json::Value>, default: f64) -> f64 {
    let parsed = match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => v,
        _ => default,
    }
}

/// Risk/reward ratio for a proposed trade. None when the inputs make no sense.
pub(crate) fn risk_reward_ratio(entry: f64, stop_loss: f64, take_profit: f64) -> Option<f64> {
    let risk = (entry - stop_loss).abs();
    let reward = (take_profit - entry).abs();
    if risk <= f64::EPSILON || !risk.is_finite() || !reward.is_finite() {
        return None;
    }
    Some(reward / risk)
}
