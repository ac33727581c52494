//! REST client defaults and endpoint roots for the two external APIs.

pub struct ClientDefaults {
    pub timeout_ms: u64,
    pub retries: u32,
    pub backoff_ms: u64,
}

pub struct ExchangeApi {
    pub base_url: &'static str,
    /// Max candles a single klines call may request.
    pub klines_limit: usize,
}

pub struct AnalyticsApi {
    pub base_url: &'static str,
    /// Env var holding the API key; the adapter degrades without it.
    pub key_env: &'static str,
}

pub struct ApiConfig {
    pub exchange: ExchangeApi,
    pub analytics: AnalyticsApi,
    pub client: ClientDefaults,
}

pub const API: ApiConfig = ApiConfig {
    exchange: ExchangeApi {
        base_url: "https://api.mexc.com",
        klines_limit: 500,
    },
    analytics: AnalyticsApi {
        base_url: "https://open-api-v4.coinglass.com/api",
        key_env: "COINGLASS_API_KEY",
    },
    client: ClientDefaults {
        timeout_ms: 10_000,
        retries: 2,
        backoff_ms: 250,
    },
};
