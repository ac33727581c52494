use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::config::API;
use crate::data::provider::{AnalyticsDataProvider, RestClient};
use crate::models::{LiquidationTotals, MarketRow, TakerVolumeRow};
use crate::utils::json_f64_or;

/// REST adapter for a Coinglass-style analytics API.
/// Works with the base coin ("BTC"), so full pair symbols are stripped of
/// their quote suffix before hitting the endpoints.
pub struct CoinglassRest {
    rest: RestClient,
    base_url: String,
    api_key: String,
}

impl CoinglassRest {
    /// Reads the API key from the environment. A missing key is not fatal:
    /// requests will come back 4xx and every consumer degrades to neutral.
    pub fn from_env() -> Self {
        let api_key = std::env::var(API.analytics.key_env).unwrap_or_default();
        if api_key.is_empty() {
            log::warn!(
                "{} is not set; analytics sentiment will read neutral",
                API.analytics.key_env
            );
        }
        Self::with_base_url(API.analytics.base_url, api_key)
    }

    pub fn with_base_url(base_url: &str, api_key: String) -> Self {
        Self {
            rest: RestClient::new(&API.client),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("accept", "application/json".to_string()),
            ("CG-API-KEY", self.api_key.clone()),
        ]
    }

    async fn get_data(&self, path_and_query: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path_and_query);
        let body = self.rest.get_json(&url, &self.headers()).await?;
        Ok(body.get("data").cloned().unwrap_or(Value::Null))
    }
}

#[async_trait]
impl AnalyticsDataProvider for CoinglassRest {
    async fn market_rows(&self, symbol: &str) -> Result<Vec<MarketRow>> {
        let data = self
            .get_data(&format!("/futures/pairs-markets?symbol={}", base_symbol(symbol)))
            .await?;
        Ok(parse_market_rows(&data))
    }

    async fn taker_volume(&self, symbol: &str, range: &str) -> Result<Vec<TakerVolumeRow>> {
        let data = self
            .get_data(&format!(
                "/futures/taker-buy-sell-volume/exchange-list?symbol={}&range={}",
                base_symbol(symbol),
                range
            ))
            .await?;
        Ok(parse_taker_rows(&data))
    }

    async fn liquidations(&self, symbol: &str, interval: &str) -> Result<LiquidationTotals> {
        let data = self
            .get_data(&format!(
                "/futures/liquidation/exchange-list?symbol={}&range={}",
                base_symbol(symbol),
                interval
            ))
            .await?;
        Ok(parse_liquidations(&data))
    }

    async fn fear_greed(&self) -> Result<f64> {
        let data = self.get_data("/index/fear-greed-history").await?;
        parse_fear_greed(&data)
            .ok_or_else(|| anyhow::anyhow!("fear/greed feed returned no usable value"))
    }
}

/// "BTCUSDT" -> "BTC". Analytics endpoints key on the base coin.
fn base_symbol(symbol: &str) -> String {
    let upper = symbol.to_uppercase();
    for quote in ["USDT", "USDC"] {
        if let Some(base) = upper.strip_suffix(quote) {
            if !base.is_empty() {
                return base.to_string();
            }
        }
    }
    upper
}

fn parse_market_rows(data: &Value) -> Vec<MarketRow> {
    let Some(rows) = data.as_array() else {
        return Vec::new();
    };
    rows.iter()
        .filter_map(|row| {
            let exchange = row
                .get("exchangeName")
                .or_else(|| row.get("exchange"))?
                .as_str()?
                .to_string();
            Some(MarketRow {
                exchange,
                funding_rate: json_f64_or(row.get("fundingRate"), 0.0),
                open_interest_usd: json_f64_or(
                    row.get("openInterestUsd").or_else(|| row.get("openInterest")),
                    0.0,
                ),
                oi_change_24h_percent: json_f64_or(row.get("h24OpenInterestChange"), 0.0),
                long_rate: opt_f64(row.get("longRate")),
                short_rate: opt_f64(row.get("shortRate")),
                long_short_ratio: opt_f64(row.get("longShortRatio")),
            })
        })
        .collect()
}

fn parse_taker_rows(data: &Value) -> Vec<TakerVolumeRow> {
    let Some(rows) = data.as_array() else {
        return Vec::new();
    };
    rows.iter()
        .filter_map(|row| {
            let exchange = row
                .get("exchange")
                .or_else(|| row.get("exchangeName"))?
                .as_str()?
                .to_string();
            Some(TakerVolumeRow {
                exchange,
                buy_usd: json_f64_or(row.get("buyVolUsd").or_else(|| row.get("buyVol")), 0.0),
                sell_usd: json_f64_or(row.get("sellVolUsd").or_else(|| row.get("sellVol")), 0.0),
            })
        })
        .collect()
}

fn parse_liquidations(data: &Value) -> LiquidationTotals {
    let Some(rows) = data.as_array() else {
        return LiquidationTotals::default();
    };
    let mut totals = LiquidationTotals::default();
    for row in rows {
        totals.long_usd += json_f64_or(row.get("longLiquidationUsd"), 0.0).max(0.0);
        totals.short_usd += json_f64_or(row.get("shortLiquidationUsd"), 0.0).max(0.0);
    }
    totals
}

fn parse_fear_greed(data: &Value) -> Option<f64> {
    let value = match data {
        Value::Array(rows) => rows.last()?.get("value"),
        Value::Object(_) => data.get("value"),
        _ => None,
    };
    let parsed = json_f64_or(value, f64::NAN);
    if parsed.is_finite() && (0.0..=100.0).contains(&parsed) {
        Some(parsed)
    } else {
        None
    }
}

fn opt_f64(value: Option<&Value>) -> Option<f64> {
    let parsed = json_f64_or(value, f64::NAN);
    if parsed.is_finite() { Some(parsed) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_symbol_strips_known_quotes() {
        assert_eq!(base_symbol("BTCUSDT"), "BTC");
        assert_eq!(base_symbol("ethusdc"), "ETH");
        assert_eq!(base_symbol("SOL"), "SOL");
        assert_eq!(base_symbol("USDT"), "USDT"); // never strip to empty
    }

    #[test]
    fn market_rows_parse_with_optional_fields() {
        let data = serde_json::json!([
            {
                "exchangeName": "MEXC",
                "fundingRate": "0.0001",
                "openInterest": 1000000.0,
                "h24OpenInterestChange": "12.5",
                "longRate": 55.0,
                "shortRate": 45.0
            },
            {"exchangeName": "Binance", "fundingRate": 0.0002},
            {"fundingRate": 0.5}
        ]);
        let rows = parse_market_rows(&data);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].exchange, "MEXC");
        assert_eq!(rows[0].oi_change_24h_percent, 12.5);
        assert_eq!(rows[0].long_rate, Some(55.0));
        assert_eq!(rows[1].long_rate, None);
        assert_eq!(rows[1].oi_change_24h_percent, 0.0);
    }

    #[test]
    fn liquidations_sum_across_venues() {
        let data = serde_json::json!([
            {"exchange": "MEXC", "longLiquidationUsd": "1000", "shortLiquidationUsd": 500.0},
            {"exchange": "Binance", "longLiquidationUsd": 2000.0, "shortLiquidationUsd": "junk"}
        ]);
        let totals = parse_liquidations(&data);
        assert_eq!(totals.long_usd, 3000.0);
        assert_eq!(totals.short_usd, 500.0);
    }

    #[test]
    fn fear_greed_takes_latest_row_and_validates_range() {
        let series = serde_json::json!([{"value": "30"}, {"value": "72"}]);
        assert_eq!(parse_fear_greed(&series), Some(72.0));
        let object = serde_json::json!({"value": 55});
        assert_eq!(parse_fear_greed(&object), Some(55.0));
        let bogus = serde_json::json!([{"value": "150"}]);
        assert_eq!(parse_fear_greed(&bogus), None);
    }
}
