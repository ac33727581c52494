use strum_macros::Display;

use crate::domain::Ticker24h;
use crate::models::VolatilityBand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TrendStrength {
    #[strum(to_string = "STRONG_BULLISH")]
    StrongBullish,
    #[strum(to_string = "BULLISH")]
    Bullish,
    #[strum(to_string = "NEUTRAL")]
    Neutral,
    #[strum(to_string = "BEARISH")]
    Bearish,
    #[strum(to_string = "STRONG_BEARISH")]
    StrongBearish,
}

impl TrendStrength {
    pub fn is_bullish(&self) -> bool {
        matches!(self, Self::Bullish | Self::StrongBullish)
    }

    pub fn is_bearish(&self) -> bool {
        matches!(self, Self::Bearish | Self::StrongBearish)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Momentum {
    #[strum(to_string = "STRONG")]
    Strong,
    #[strum(to_string = "MODERATE")]
    Moderate,
    #[strum(to_string = "NEUTRAL")]
    Neutral,
}

/// 24h price action read off the ticker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceAction {
    pub trend: TrendStrength,
    /// Trend conviction in [0, 1].
    pub strength: f64,
    pub momentum: Momentum,
    pub volatility: VolatilityBand,
    pub price_change_percent: f64,
    pub daily_range_percent: f64,
}

impl PriceAction {
    pub fn from_ticker(ticker: &Ticker24h) -> Self {
        let change = if ticker.price_change_percent.is_finite() {
            ticker.price_change_percent
        } else {
            0.0
        };

        let (trend, strength) = if change > 3.0 {
            (TrendStrength::StrongBullish, (change / 10.0).min(1.0))
        } else if change > 1.0 {
            (TrendStrength::Bullish, (change / 10.0).min(1.0))
        } else if change < -3.0 {
            (TrendStrength::StrongBearish, (change.abs() / 10.0).min(1.0))
        } else if change < -1.0 {
            (TrendStrength::Bearish, (change.abs() / 10.0).min(1.0))
        } else {
            (TrendStrength::Neutral, 0.0)
        };

        let daily_range = ticker.daily_range_percent();
        let volatility = if daily_range > 5.0 {
            VolatilityBand::High
        } else if daily_range < 2.0 {
            VolatilityBand::Low
        } else {
            VolatilityBand::Medium
        };

        let momentum = if change.abs() > 2.0 {
            Momentum::Strong
        } else if change.abs() > 0.5 {
            Momentum::Moderate
        } else {
            Momentum::Neutral
        };

        PriceAction {
            trend,
            strength,
            momentum,
            volatility,
            price_change_percent: change,
            daily_range_percent: daily_range,
        }
    }
}
