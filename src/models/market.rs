use serde::{Deserialize, Serialize};

/// One venue's derivatives-market row from the analytics API.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketRow {
    pub exchange: String,
    /// Fractional funding rate, e.g. 0.0001 = 0.01% per interval.
    pub funding_rate: f64,
    pub open_interest_usd: f64,
    /// Percent units, e.g. 12.0 = +12%.
    pub oi_change_24h_percent: f64,
    pub long_rate: Option<f64>,
    pub short_rate: Option<f64>,
    /// Reported long/short ratio, either already in [0,1] or as longs-per-short.
    pub long_short_ratio: Option<f64>,
}

/// Taker buy/sell volume for one venue over a lookback range.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TakerVolumeRow {
    pub exchange: String,
    pub buy_usd: f64,
    pub sell_usd: f64,
}

/// Aggregated liquidation notionals over an interval.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LiquidationTotals {
    pub long_usd: f64,
    pub short_usd: f64,
}

/// One listed instrument from the exchange metadata endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairMeta {
    pub symbol: String,
    pub quote_asset: String,
    pub status: String,
}

impl PairMeta {
    pub fn is_active_usdt(&self) -> bool {
        self.quote_asset.eq_ignore_ascii_case("USDT")
            && matches!(self.status.to_uppercase().as_str(), "TRADING" | "ENABLED" | "1")
    }
}
