use serde::{Deserialize, Serialize};

use crate::domain::{Candle, Zone};
use crate::models::MicroDirection;

/// Per-symbol 1-minute micro metrics as parallel ring buffers.
/// Equal-length, chronologically ordered, deduplicated by timestamp.
/// This struct is also the persisted on-disk document, one per symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MicroSeries {
    pub timestamps: Vec<i64>,
    pub closes: Vec<f64>,
    pub highs: Vec<f64>,
    pub lows: Vec<f64>,
    pub volumes: Vec<f64>,
    pub true_ranges: Vec<f64>,
}

impl MicroSeries {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Appends fresh candles in timestamp order, skipping anything already
    /// buffered or malformed, then trims to the retention window.
    /// Returns how many samples were actually appended.
    pub fn ingest(&mut self, candles: &[Candle], retention: usize) -> usize {
        let mut appended = 0;
        for candle in candles {
            if !candle.is_well_formed() {
                continue;
            }
            if let Some(&last_ts) = self.timestamps.last() {
                if candle.timestamp_ms <= last_ts {
                    continue; // duplicate or stale sample
                }
            }
            let tr = match self.closes.last() {
                Some(&prev_close) => crate::indicators::true_range(candle.high, candle.low, prev_close),
                None => candle.high - candle.low,
            };
            self.timestamps.push(candle.timestamp_ms);
            self.closes.push(candle.close);
            self.highs.push(candle.high);
            self.lows.push(candle.low);
            self.volumes.push(candle.volume);
            self.true_ranges.push(tr);
            appended += 1;
        }
        self.trim(retention);
        appended
    }

    /// Drops the oldest samples until at most `retention` remain.
    pub fn trim(&mut self, retention: usize) {
        let len = self.len();
        if len <= retention {
            return;
        }
        let drop = len - retention;
        self.timestamps.drain(..drop);
        self.closes.drain(..drop);
        self.highs.drain(..drop);
        self.lows.drain(..drop);
        self.volumes.drain(..drop);
        self.true_ranges.drain(..drop);
    }

    /// 1-minute ATR as percent of the last close.
    /// Zero until period+1 samples are buffered.
    pub fn atr_percent(&self, period: usize) -> f64 {
        if period == 0 || self.len() < period + 1 {
            return 0.0;
        }
        let tail = &self.true_ranges[self.len() - period..];
        let atr: f64 = tail.iter().sum::<f64>() / period as f64;
        let last_close = self.closes[self.len() - 1];
        if last_close <= f64::EPSILON || !atr.is_finite() {
            return 0.0;
        }
        atr / last_close * 100.0
    }

    /// True if any buffered minute's [low, high] interval overlaps the zone.
    pub fn touched(&self, zone: &Zone) -> bool {
        self.lows
            .iter()
            .zip(self.highs.iter())
            .any(|(&low, &high)| zone.overlaps(low, high))
    }

    /// Direction of the last two 1-minute closes.
    pub fn micro_direction(&self) -> MicroDirection {
        if self.len() < 2 {
            return MicroDirection::Flat;
        }
        let prev = self.closes[self.len() - 2];
        let last = self.closes[self.len() - 1];
        if last > prev {
            MicroDirection::Up
        } else if last < prev {
            MicroDirection::Down
        } else {
            MicroDirection::Flat
        }
    }

    /// Structural invariant for loaded documents: equal-length parallel
    /// arrays with strictly increasing timestamps.
    pub fn is_consistent(&self) -> bool {
        let n = self.timestamps.len();
        let lengths_match = self.closes.len() == n
            && self.highs.len() == n
            && self.lows.len() == n
            && self.volumes.len() == n
            && self.true_ranges.len() == n;
        lengths_match && self.timestamps.windows(2).all(|w| w[0] < w[1])
    }
}
