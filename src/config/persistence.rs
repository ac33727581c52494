//! File persistence and serialization configuration

/// Configuration for micro-metrics persistence
pub struct MicroPersistenceConfig {
    /// Directory path for storing per-symbol micro-metrics documents
    pub directory: &'static str,
    /// Base filename for micro-metrics files (without extension)
    pub filename_base: &'static str,
    /// Current version of the serialization format
    pub version: u32,
}

/// The Master Persistence Configuration
pub struct PersistenceConfig {
    pub micro: MicroPersistenceConfig,
}

pub const PERSISTENCE: PersistenceConfig = PersistenceConfig {
    micro: MicroPersistenceConfig {
        directory: "micro_data",
        filename_base: "mm",
        version: 1,
    },
};

/// Generate symbol-specific cache filename
/// Example: "mm_BTCUSDT_v1.json"
pub fn micro_cache_filename(symbol: &str) -> String {
    format!(
        "{}_{}_v{}.json",
        PERSISTENCE.micro.filename_base, symbol, PERSISTENCE.micro.version
    )
}

/// Inverse of `micro_cache_filename`. None for files that aren't ours.
pub fn micro_symbol_from_filename(filename: &str) -> Option<String> {
    let prefix = format!("{}_", PERSISTENCE.micro.filename_base);
    let suffix = format!("_v{}.json", PERSISTENCE.micro.version);
    let rest = filename.strip_prefix(prefix.as_str())?;
    let symbol = rest.strip_suffix(suffix.as_str())?;
    if symbol.is_empty() {
        None
    } else {
        Some(symbol.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_round_trip() {
        let name = micro_cache_filename("BTCUSDT");
        assert_eq!(name, "mm_BTCUSDT_v1.json");
        assert_eq!(micro_symbol_from_filename(&name).as_deref(), Some("BTCUSDT"));
        assert_eq!(micro_symbol_from_filename("random.json"), None);
        assert_eq!(micro_symbol_from_filename("mm__v1.json"), None);
    }
}
