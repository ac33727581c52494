use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use tokio::sync::Mutex;

use crate::config::{micro_cache_filename, micro_symbol_from_filename};
use crate::domain::Candle;
use crate::models::MicroSeries;

/// Keyed store of per-symbol micro-metrics buffers.
///
/// Locking shape: the outer map lock is synchronous and held only long
/// enough to clone an entry handle; each symbol's series sits behind its own
/// async mutex, so a symbol has at most one concurrent mutator and different
/// symbols never block each other. No lock is held across file I/O --
/// persistence works on snapshot copies.
pub struct MicroStore {
    dir: PathBuf,
    retention: usize,
    entries: RwLock<HashMap<String, Arc<Mutex<MicroSeries>>>>,
}

impl MicroStore {
    pub fn new(dir: impl Into<PathBuf>, retention: usize) -> Self {
        Self {
            dir: dir.into(),
            retention,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Entry handle for a symbol, created empty on first access.
    fn entry(&self, symbol: &str) -> Arc<Mutex<MicroSeries>> {
        if let Some(found) = self.entries.read().expect("micro map poisoned").get(symbol) {
            return Arc::clone(found);
        }
        let mut map = self.entries.write().expect("micro map poisoned");
        Arc::clone(
            map.entry(symbol.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(MicroSeries::default()))),
        )
    }

    /// Appends fresh 1-minute candles and returns a snapshot of the buffer.
    pub async fn ingest(&self, symbol: &str, candles: &[Candle]) -> MicroSeries {
        let entry = self.entry(symbol);
        let mut series = entry.lock().await;
        let appended = series.ingest(candles, self.retention);
        if appended > 0 {
            log::debug!("micro[{}]: +{} samples ({} buffered)", symbol, appended, series.len());
        }
        series.clone()
    }

    pub async fn snapshot(&self, symbol: &str) -> MicroSeries {
        let entry = self.entry(symbol);
        let series = entry.lock().await;
        series.clone()
    }

    pub fn tracked_symbols(&self) -> Vec<String> {
        self.entries
            .read()
            .expect("micro map poisoned")
            .keys()
            .cloned()
            .collect()
    }

    /// Reloads every persisted document from the store directory.
    /// Malformed or structurally inconsistent files are quarantined by
    /// rename and treated as empty state; loading never fails the process.
    pub async fn load_from_disk(&self) -> Result<usize> {
        if tokio::fs::metadata(&self.dir).await.is_err() {
            tokio::fs::create_dir_all(&self.dir)
                .await
                .with_context(|| format!("creating micro data dir {}", self.dir.display()))?;
            return Ok(0);
        }

        let mut loaded = 0;
        let mut dir = tokio::fs::read_dir(&self.dir)
            .await
            .with_context(|| format!("reading micro data dir {}", self.dir.display()))?;

        while let Some(file) = dir.next_entry().await? {
            let name = file.file_name().to_string_lossy().into_owned();
            let Some(symbol) = micro_symbol_from_filename(&name) else {
                continue;
            };
            match self.load_document(&file.path()).await {
                Ok(mut series) => {
                    series.trim(self.retention);
                    let entry = self.entry(&symbol);
                    *entry.lock().await = series;
                    loaded += 1;
                }
                Err(err) => {
                    log::warn!(
                        "micro[{}]: corrupt persisted state ({:#}); quarantining {}",
                        symbol,
                        err,
                        name
                    );
                    quarantine(&file.path()).await;
                }
            }
        }
        Ok(loaded)
    }

    async fn load_document(&self, path: &Path) -> Result<MicroSeries> {
        let raw = tokio::fs::read_to_string(path).await?;
        let series: MicroSeries = serde_json::from_str(&raw)?;
        if !series.is_consistent() {
            anyhow::bail!("parallel arrays are inconsistent");
        }
        Ok(series)
    }

    /// Atomically persists one symbol's buffer (write temp, then rename).
    pub async fn persist_symbol(&self, symbol: &str) -> Result<()> {
        let snapshot = self.snapshot(symbol).await;
        if snapshot.is_empty() {
            return Ok(());
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating micro data dir {}", self.dir.display()))?;

        let path = self.dir.join(micro_cache_filename(symbol));
        let tmp = self.dir.join(format!("{}.tmp", micro_cache_filename(symbol)));
        let body = serde_json::to_string(&snapshot)?;

        tokio::fs::write(&tmp, body)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("renaming into {}", path.display()))?;
        Ok(())
    }

    /// Persists every tracked symbol; failures are logged per symbol.
    pub async fn persist_all(&self) {
        for symbol in self.tracked_symbols() {
            if let Err(err) = self.persist_symbol(&symbol).await {
                log::error!("micro[{}]: persist failed: {:#}", symbol, err);
            }
        }
    }
}

async fn quarantine(path: &Path) {
    let mut target = path.as_os_str().to_owned();
    target.push(".corrupt");
    if let Err(err) = tokio::fs::rename(path, &target).await {
        log::error!("failed to quarantine {}: {:#}", path.display(), err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::now_timestamp_ms;

    fn minute(ts: i64, close: f64) -> Candle {
        Candle::new(ts, close, close + 0.2, close - 0.2, close, 10.0)
    }

    fn temp_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "perp_radar_{}_{}_{}",
            tag,
            std::process::id(),
            now_timestamp_ms()
        ))
    }

    #[tokio::test]
    async fn round_trip_reproduces_trimmed_sequences() {
        let dir = temp_dir("roundtrip");
        let store = MicroStore::new(&dir, 5);
        let candles: Vec<Candle> = (1..=8).map(|i| minute(i * 60_000, 100.0 + i as f64)).collect();
        let written = store.ingest("BTCUSDT", &candles).await;
        assert_eq!(written.len(), 5); // trimmed to retention on ingest
        store.persist_symbol("BTCUSDT").await.unwrap();

        let reloaded_store = MicroStore::new(&dir, 5);
        assert_eq!(reloaded_store.load_from_disk().await.unwrap(), 1);
        let reloaded = reloaded_store.snapshot("BTCUSDT").await;
        assert_eq!(reloaded, written);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn load_trims_to_the_retention_window() {
        let dir = temp_dir("loadtrim");
        let store = MicroStore::new(&dir, 50);
        let candles: Vec<Candle> = (1..=10).map(|i| minute(i * 60_000, 100.0)).collect();
        store.ingest("ETHUSDT", &candles).await;
        store.persist_symbol("ETHUSDT").await.unwrap();

        let tighter = MicroStore::new(&dir, 3);
        tighter.load_from_disk().await.unwrap();
        let series = tighter.snapshot("ETHUSDT").await;
        assert_eq!(series.len(), 3);
        assert_eq!(series.timestamps.first().copied(), Some(8 * 60_000));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn corrupt_file_is_quarantined_and_reads_as_empty() {
        let dir = temp_dir("corrupt");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(micro_cache_filename("BTCUSDT"));
        std::fs::write(&path, "{ not json").unwrap();

        let store = MicroStore::new(&dir, 5);
        assert_eq!(store.load_from_disk().await.unwrap(), 0);
        assert!(store.snapshot("BTCUSDT").await.is_empty());
        assert!(!path.exists());
        let quarantined = dir.join(format!("{}.corrupt", micro_cache_filename("BTCUSDT")));
        assert!(quarantined.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn inconsistent_arrays_count_as_corrupt() {
        let dir = temp_dir("inconsistent");
        std::fs::create_dir_all(&dir).unwrap();
        // Valid JSON, but the parallel arrays disagree in length.
        let body = r#"{"timestamps":[1,2],"closes":[1.0],"highs":[],"lows":[],"volumes":[],"true_ranges":[]}"#;
        let path = dir.join(micro_cache_filename("SOLUSDT"));
        std::fs::write(&path, body).unwrap();

        let store = MicroStore::new(&dir, 5);
        assert_eq!(store.load_from_disk().await.unwrap(), 0);
        assert!(!path.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn persist_skips_empty_buffers() {
        let dir = temp_dir("empty");
        let store = MicroStore::new(&dir, 5);
        store.snapshot("BTCUSDT").await; // creates an empty entry
        store.persist_symbol("BTCUSDT").await.unwrap();
        assert!(!dir.join(micro_cache_filename("BTCUSDT")).exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
