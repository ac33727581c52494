// Domain types and value objects
mod candle;
mod zone;

// Re-export commonly used types
pub use candle::{Candle, Ticker24h};
pub use zone::Zone;
