use std::error::Error;
use std::fmt;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::config::{ClientDefaults, Timeframe};
use crate::domain::{Candle, Ticker24h};
use crate::models::{LiquidationTotals, MarketRow, PairMeta, TakerVolumeRow};

/// Abstract interface for exchange market data.
#[async_trait]
pub trait ExchangeDataProvider: Send + Sync {
    async fn ticker_24h(&self, symbol: &str) -> Result<Ticker24h>;

    async fn candles(&self, symbol: &str, timeframe: Timeframe, limit: usize)
    -> Result<Vec<Candle>>;

    async fn exchange_metadata(&self) -> Result<Vec<PairMeta>>;
}

/// Abstract interface for derivatives analytics (funding, OI, liquidations).
#[async_trait]
pub trait AnalyticsDataProvider: Send + Sync {
    async fn market_rows(&self, symbol: &str) -> Result<Vec<MarketRow>>;

    async fn taker_volume(&self, symbol: &str, range: &str) -> Result<Vec<TakerVolumeRow>>;

    async fn liquidations(&self, symbol: &str, interval: &str) -> Result<LiquidationTotals>;

    async fn fear_greed(&self) -> Result<f64>;
}

/// External natural-language advisory service. The engine supplies a
/// deterministic local fallback when this is absent or failing.
#[async_trait]
pub trait AdvisoryService: Send + Sync {
    async fn explain(&self, symbol: &str, digest: &str) -> Result<String>;
}

/// Provider-boundary error classification. Transport failures are retried
/// with backoff; application errors (4xx, unusable body) never are.
#[derive(Debug)]
pub enum FetchError {
    Transport(String),
    Application(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FetchError::Transport(msg) => write!(f, "transport failure: {}", msg),
            FetchError::Application(msg) => write!(f, "application error: {}", msg),
        }
    }
}

impl Error for FetchError {}

pub(crate) fn is_application_error(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<FetchError>(),
        Some(FetchError::Application(_))
    )
}

/// Shared GET-JSON plumbing for the REST adapters: bounded timeout per call,
/// bounded retries with exponential backoff on transport failures only.
pub(crate) struct RestClient {
    client: reqwest::Client,
    timeout: Duration,
    retries: u32,
    backoff: Duration,
}

impl RestClient {
    pub(crate) fn new(cfg: &ClientDefaults) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: Duration::from_millis(cfg.timeout_ms),
            retries: cfg.retries,
            backoff: Duration::from_millis(cfg.backoff_ms),
        }
    }

    pub(crate) async fn get_json(&self, url: &str, headers: &[(&str, String)]) -> Result<Value> {
        let mut attempt: u32 = 0;
        loop {
            match self.try_get(url, headers).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if is_application_error(&err) || attempt >= self.retries {
                        return Err(err.context(format!(
                            "GET {} failed after {} attempt(s)",
                            url,
                            attempt + 1
                        )));
                    }
                    let delay = self.backoff * 2u32.pow(attempt);
                    log::warn!(
                        "Transient failure on GET {} (attempt {}): {:#}. Retrying in {:?}.",
                        url,
                        attempt + 1,
                        err,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn try_get(&self, url: &str, headers: &[(&str, String)]) -> Result<Value> {
        let mut request = self.client.get(url).timeout(self.timeout);
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| anyhow::Error::new(FetchError::Transport(e.to_string())))?;

        let status = response.status();
        if status.is_client_error() {
            return Err(anyhow::Error::new(FetchError::Application(format!(
                "HTTP {}",
                status
            ))));
        }
        if !status.is_success() {
            return Err(anyhow::Error::new(FetchError::Transport(format!(
                "HTTP {}",
                status
            ))));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| anyhow::Error::new(FetchError::Application(format!("bad body: {}", e))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_distinguishes_transport_from_application() {
        let transport = anyhow::Error::new(FetchError::Transport("timeout".to_string()));
        let application = anyhow::Error::new(FetchError::Application("HTTP 400".to_string()));
        assert!(!is_application_error(&transport));
        assert!(is_application_error(&application));
        // Context wrapping must not break the downcast.
        let wrapped = application.context("GET /x failed");
        assert!(is_application_error(&wrapped));
    }
}
