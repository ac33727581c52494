mod analytics;
mod exchange;
mod micro;
mod pairs;
mod provider;
mod rate_limiter;

pub use analytics::CoinglassRest;
pub use exchange::MexcRest;
pub use micro::MicroStore;
pub use provider::{AdvisoryService, AnalyticsDataProvider, ExchangeDataProvider, FetchError};

pub(crate) use pairs::PairsCache;
pub(crate) use rate_limiter::{GateDecision, SignalGate};
