mod market;
mod micro;
mod signal;

pub use market::{LiquidationTotals, MarketRow, PairMeta, TakerVolumeRow};
pub use micro::MicroSeries;
pub use signal::{
    MicroDirection, OiTrend, RiskLevel, ScalpCall, SentimentSnapshot, SignalKind,
    TimeframeAnalysis, TradingSignal, TrendBias, VolatilityBand,
};
