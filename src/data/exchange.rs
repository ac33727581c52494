use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::config::{API, Timeframe};
use crate::data::provider::{ExchangeDataProvider, RestClient};
use crate::domain::{Candle, Ticker24h};
use crate::models::PairMeta;
use crate::utils::json_f64_or;

/// REST adapter for a MEXC-style spot/futures API.
/// Every numeric field is parsed-or-defaulted; shape surprises degrade to
/// empty rows rather than errors.
pub struct MexcRest {
    rest: RestClient,
    base_url: String,
}

impl MexcRest {
    pub fn new() -> Self {
        Self::with_base_url(API.exchange.base_url)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            rest: RestClient::new(&API.client),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for MexcRest {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeDataProvider for MexcRest {
    async fn ticker_24h(&self, symbol: &str) -> Result<Ticker24h> {
        let url = format!("{}/api/v3/ticker/24hr?symbol={}", self.base_url, symbol);
        let body = self.rest.get_json(&url, &[]).await?;
        Ok(parse_ticker(&body))
    }

    async fn candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let limit = limit.min(API.exchange.klines_limit);
        let url = format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit={}",
            self.base_url, symbol, timeframe, limit
        );
        let body = self.rest.get_json(&url, &[]).await?;
        Ok(parse_klines(&body))
    }

    async fn exchange_metadata(&self) -> Result<Vec<PairMeta>> {
        let url = format!("{}/api/v3/exchangeInfo", self.base_url);
        let body = self.rest.get_json(&url, &[]).await?;
        Ok(parse_exchange_info(&body))
    }
}

fn parse_ticker(body: &Value) -> Ticker24h {
    Ticker24h {
        last_price: json_f64_or(body.get("lastPrice"), 0.0),
        price_change_percent: json_f64_or(body.get("priceChangePercent"), 0.0),
        high_price: json_f64_or(body.get("highPrice"), 0.0),
        low_price: json_f64_or(body.get("lowPrice"), 0.0),
        volume: json_f64_or(body.get("volume"), 0.0),
    }
}

/// Kline rows arrive as positional arrays:
/// [openTime, open, high, low, close, volume, closeTime, quoteVolume, ...]
fn parse_klines(body: &Value) -> Vec<Candle> {
    let Some(rows) = body.as_array() else {
        return Vec::new();
    };
    rows.iter()
        .filter_map(|row| {
            let row = row.as_array()?;
            let timestamp_ms = row.first()?.as_i64()?;
            Some(Candle::new(
                timestamp_ms,
                json_f64_or(row.get(1), 0.0),
                json_f64_or(row.get(2), 0.0),
                json_f64_or(row.get(3), 0.0),
                json_f64_or(row.get(4), 0.0),
                json_f64_or(row.get(5), 0.0),
            ))
        })
        .collect()
}

fn parse_exchange_info(body: &Value) -> Vec<PairMeta> {
    let Some(rows) = body.get("symbols").and_then(Value::as_array) else {
        return Vec::new();
    };
    rows.iter()
        .filter_map(|row| {
            Some(PairMeta {
                symbol: row.get("symbol")?.as_str()?.to_string(),
                quote_asset: row
                    .get("quoteAsset")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                status: row
                    .get("status")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticker_parses_string_numbers() {
        let body = serde_json::json!({
            "lastPrice": "50000.0",
            "priceChangePercent": "3.5",
            "highPrice": "51500",
            "lowPrice": "49000",
            "volume": "12345.6"
        });
        let ticker = parse_ticker(&body);
        assert_eq!(ticker.last_price, 50_000.0);
        assert_eq!(ticker.price_change_percent, 3.5);
        assert_eq!(ticker.volume, 12_345.6);
    }

    #[test]
    fn klines_skip_rows_without_a_timestamp() {
        let body = serde_json::json!([
            [1700000000000i64, "100", "101", "99", "100.5", "10", 1700000059999i64, "1000"],
            ["bad-row"],
            [1700000060000i64, "100.5", "102", "100", "101.5", "12", 1700000119999i64, "1210"]
        ]);
        let candles = parse_klines(&body);
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].close, 100.5);
        assert_eq!(candles[1].high, 102.0);
        assert!(candles.iter().all(|c| c.is_well_formed()));
    }

    #[test]
    fn exchange_info_tolerates_partial_rows() {
        let body = serde_json::json!({
            "symbols": [
                {"symbol": "BTCUSDT", "quoteAsset": "USDT", "status": "TRADING"},
                {"symbol": "ETHBTC", "quoteAsset": "BTC", "status": "TRADING"},
                {"quoteAsset": "USDT"}
            ]
        });
        let pairs = parse_exchange_info(&body);
        assert_eq!(pairs.len(), 2);
        assert!(pairs[0].is_active_usdt());
        assert!(!pairs[1].is_active_usdt());
    }
}
