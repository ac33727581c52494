//! Configuration module for the radar engine.

mod api;
mod engine;
mod persistence;
mod types;

// Re-export commonly used items
pub use api::{API, ApiConfig, ClientDefaults};
pub use engine::{
    AnalyzerConfig, EngineConfig, GateConfig, PairsConfig, RADAR, RefreshConfig, ScalpConfig,
    SentimentConfig,
};
pub use persistence::{PERSISTENCE, micro_cache_filename, micro_symbol_from_filename};
pub use types::{AtrPct, Score, SentimentScore, Timeframe};
