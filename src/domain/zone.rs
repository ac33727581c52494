use serde::{Deserialize, Serialize};

/// A support or resistance band around a price level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub center: f64,
    pub lower: f64,
    pub upper: f64,
}

impl Zone {
    pub fn around(center: f64, half_width: f64) -> Self {
        let half = half_width.abs();
        Zone {
            center,
            lower: center - half,
            upper: center + half,
        }
    }

    /// True if the [low, high] interval of a candle overlaps this band.
    pub fn overlaps(&self, low: f64, high: f64) -> bool {
        let (lo, hi) = if low <= high { (low, high) } else { (high, low) };
        hi >= self.lower && lo <= self.upper
    }

    pub fn half_width(&self) -> f64 {
        (self.upper - self.lower) / 2.0
    }
}
