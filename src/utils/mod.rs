mod format;
mod maths;
mod symbols;
mod time;

pub use format::{format_notional, format_price};
pub use symbols::normalize_symbol;
pub use time::{TimeUtils, format_duration, now_timestamp_ms};

pub(crate) use maths::{clamp_abs, get_max, get_min, json_f64_or, median, risk_reward_ratio};
