// Analysis algorithms: price action, per-timeframe reads, sentiment fusion,
// signal synthesis and the scalp detector.
mod price_action;
mod scalp;
mod sentiment;
mod synthesizer;
mod timeframe;

pub use price_action::{Momentum, PriceAction, TrendStrength};
pub use scalp::{ScalpContext, detect as detect_scalp};
pub use sentiment::{SentimentInputs, aggregate as aggregate_sentiment};
pub use synthesizer::synthesize;
pub use timeframe::analyze as analyze_timeframe_candles;

pub(crate) use sentiment::has_direct_ratio;
