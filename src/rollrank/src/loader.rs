//! Lazy, single-flight construction of the shared [`RankingEngine`].
//!
//! The statistics document is fetched once per [`EngineLoader`]. Callers
//! arriving while the fetch is in flight wait on the same construction, and
//! everyone receives the same `Arc`. A failed fetch is not retried: the
//! loader settles on an engine with empty tables so lookups simply miss.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::OnceCell;

use crate::engine::RankingEngine;
use crate::mapping::StandardToEnhancedMap;
use crate::stats::RollStatistics;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Server returned status {0}")]
    Status(u16),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid statistics document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Loader task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Where the reduced statistics document comes from.
pub trait StatsSource: Send + Sync {
    /// Human readable origin for logs
    fn describe(&self) -> String;

    fn fetch(&self) -> impl Future<Output = Result<RollStatistics, LoadError>> + Send;
}

/// Statistics read from a local file.
#[derive(Debug, Clone)]
pub struct FileStatsSource {
    path: PathBuf,
}

impl FileStatsSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStatsSource { path: path.into() }
    }
}

impl StatsSource for FileStatsSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<RollStatistics, LoadError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let bytes = std::fs::read(&path)?;
            Ok(RollStatistics::from_slice(&bytes)?)
        })
        .await?
    }
}

/// Statistics fetched with a GET from a fixed URL.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpStatsSource {
    url: String,
}

#[cfg(feature = "http")]
impl HttpStatsSource {
    pub fn new(url: impl Into<String>) -> Self {
        HttpStatsSource { url: url.into() }
    }
}

#[cfg(feature = "http")]
impl StatsSource for HttpStatsSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<RollStatistics, LoadError> {
        use std::io::Read;

        let url = self.url.clone();
        tokio::task::spawn_blocking(move || {
            let response = match ureq::get(&url).call() {
                Ok(response) => response,
                Err(ureq::Error::Status(code, _)) => return Err(LoadError::Status(code)),
                Err(e) => return Err(LoadError::Http(e.to_string())),
            };

            let mut bytes = Vec::new();
            response.into_reader().read_to_end(&mut bytes)?;
            Ok(RollStatistics::from_slice(&bytes)?)
        })
        .await?
    }
}

/// Owns the one engine instance built from a [`StatsSource`].
pub struct EngineLoader<S> {
    source: S,
    mapping: StandardToEnhancedMap,
    engine: OnceCell<Arc<RankingEngine>>,
}

impl<S: StatsSource> EngineLoader<S> {
    pub fn new(source: S, mapping: StandardToEnhancedMap) -> Self {
        EngineLoader {
            source,
            mapping,
            engine: OnceCell::new(),
        }
    }

    /// The shared engine, constructing it on first use
    pub async fn get(&self) -> Arc<RankingEngine> {
        self.engine
            .get_or_init(|| async {
                let engine = match self.source.fetch().await {
                    Ok(stats) => {
                        tracing::info!(
                            source = %self.source.describe(),
                            weapons = stats.perk_stats.len(),
                            "Loaded roll statistics"
                        );
                        RankingEngine::new(stats, self.mapping.clone())
                    }
                    Err(e) => {
                        tracing::warn!(
                            source = %self.source.describe(),
                            error = %e,
                            "Failed to load roll statistics, using empty tables"
                        );
                        RankingEngine::empty(self.mapping.clone())
                    }
                };
                Arc::new(engine)
            })
            .await
            .clone()
    }

    /// The engine if construction already finished; never waits
    pub fn get_if_loaded(&self) -> Option<Arc<RankingEngine>> {
        self.engine.get().cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingSource {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl StatsSource for CountingSource {
        fn describe(&self) -> String {
            "counting".to_string()
        }

        async fn fetch(&self) -> Result<RollStatistics, LoadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self.fail {
                return Err(LoadError::Status(503));
            }
            Ok(RollStatistics::from_value(json!({
                "PerkStats": {"1": [[{"PerkHash": 100, "Rank": 1, "Count": 5}]]}
            }))?)
        }
    }

    fn loader(fail: bool) -> (Arc<EngineLoader<CountingSource>>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            calls: calls.clone(),
            fail,
        };
        let mapping = [(100, 200)].into_iter().collect();
        (Arc::new(EngineLoader::new(source, mapping)), calls)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_fetch() {
        let (loader, calls) = loader(false);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let loader = loader.clone();
                tokio::spawn(async move { loader.get().await })
            })
            .collect();

        let mut engines = Vec::new();
        for handle in handles {
            engines.push(handle.await.unwrap());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(engines.iter().all(|e| Arc::ptr_eq(e, &engines[0])));
        assert_eq!(engines[0].get_perk_rank(1, 200).unwrap().rank, 1);

        loader.get().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_yields_empty_engine() {
        let (loader, calls) = loader(true);

        let engine = loader.get().await;
        assert!(!engine.has_data_for_weapon(1));
        assert_eq!(engine.get_perk_rank(1, 100), None);
        assert_eq!(engine.get_review_summary(1), None);
        assert_eq!(engine.mapping().enhanced_for(100), Some(200));

        // Not retried
        loader.get().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_if_loaded() {
        let (loader, _) = loader(false);
        assert!(!loader.is_loaded());
        assert!(loader.get_if_loaded().is_none());

        let engine = loader.get().await;
        assert!(loader.is_loaded());
        assert!(Arc::ptr_eq(&loader.get_if_loaded().unwrap(), &engine));
    }

    #[tokio::test]
    async fn test_file_source() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("stats.json");
        std::fs::write(
            &path,
            r#"{"ReviewSummary": {"7": {"ReviewCount": 3, "PVEAvg": 4, "PVPAvg": 3, "OverallAvg": 3.5}}}"#,
        )
        .unwrap();

        let stats = FileStatsSource::new(&path).fetch().await.unwrap();
        assert!(stats.contains_weapon(7));

        let missing = FileStatsSource::new(temp_dir.path().join("missing.json"));
        assert!(matches!(missing.fetch().await, Err(LoadError::Io(_))));
    }

    #[tokio::test]
    async fn test_file_source_invalid_json() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("stats.json");
        std::fs::write(&path, "not json").unwrap();

        let loader = EngineLoader::new(FileStatsSource::new(&path), StandardToEnhancedMap::new());
        let engine = loader.get().await;
        assert!(engine.stats().is_empty());
    }
}
