#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]
#![allow(clippy::too_many_arguments)]

// Core modules
pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod models;
pub mod utils;

// Re-export commonly used types outside of crate
pub use crate::config::{EngineConfig, RADAR, Timeframe};
pub use crate::data::{
    AdvisoryService, AnalyticsDataProvider, CoinglassRest, ExchangeDataProvider, MexcRest,
};
pub use crate::engine::{RadarEngine, RefreshHandle};
pub use crate::models::{ScalpCall, TimeframeAnalysis, TradingSignal};

// CLI argument parsing
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Symbols to analyze ("btc" resolves to BTCUSDT)
    #[arg(required = true)]
    pub symbols: Vec<String>,

    /// Bypass the per-symbol cooldown and recompute
    #[arg(long, default_value_t = false)]
    pub force: bool,

    /// Also print the short-horizon scalp call
    #[arg(long, default_value_t = false)]
    pub scalp: bool,

    /// Print a single-timeframe report instead of a signal (5m|15m|30m|1h|4h)
    #[arg(long)]
    pub timeframe: Option<String>,

    /// Keep re-generating signals every cooldown window
    #[arg(long, default_value_t = false)]
    pub watch: bool,

    /// List the exchange's supported USDT pairs and exit
    #[arg(long, default_value_t = false)]
    pub pairs: bool,
}
