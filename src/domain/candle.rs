use serde::{Deserialize, Serialize};

/// One OHLCV sample. Immutable once ingested.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp_ms: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(timestamp_ms: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Candle {
            timestamp_ms,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Filter for malformed rows coming off the wire.
    /// A usable candle has finite fields, a positive close, and high >= low.
    pub fn is_well_formed(&self) -> bool {
        let finite = [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite());
        finite && self.close > 0.0 && self.high >= self.low && self.timestamp_ms > 0
    }
}

/// 24-hour rolling ticker snapshot.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Ticker24h {
    pub last_price: f64,
    /// Percent units, e.g. 3.5 means +3.5%.
    pub price_change_percent: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub volume: f64,
}

impl Ticker24h {
    /// (high - low) / last * 100. Zero when the ticker is unusable.
    pub fn daily_range_percent(&self) -> f64 {
        if self.last_price <= f64::EPSILON || self.high_price <= 0.0 || self.low_price <= 0.0 {
            return 0.0;
        }
        (self.high_price - self.low_price) / self.last_price * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_candles_are_rejected() {
        let good = Candle::new(1_700_000_000_000, 10.0, 11.0, 9.0, 10.5, 100.0);
        assert!(good.is_well_formed());

        let inverted = Candle::new(1_700_000_000_000, 10.0, 9.0, 11.0, 10.5, 100.0);
        assert!(!inverted.is_well_formed());

        let nan = Candle::new(1_700_000_000_000, 10.0, f64::NAN, 9.0, 10.5, 100.0);
        assert!(!nan.is_well_formed());

        let zero_close = Candle::new(1_700_000_000_000, 10.0, 11.0, 9.0, 0.0, 100.0);
        assert!(!zero_close.is_well_formed());
    }

    #[test]
    fn daily_range_matches_hand_calc() {
        let ticker = Ticker24h {
            last_price: 50_000.0,
            price_change_percent: 3.5,
            high_price: 51_500.0,
            low_price: 49_000.0,
            volume: 1000.0,
        };
        assert!((ticker.daily_range_percent() - 5.0).abs() < 1e-9);
        assert_eq!(Ticker24h::default().daily_range_percent(), 0.0);
    }
}
