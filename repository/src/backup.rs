use std::fs::File;
use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics_model::{CounterMetric, GaugeMetric, Metric, Params};
use ticker_pool::TickerPool;
use tokio_util::sync::CancellationToken;

use crate::error::RepositoryError;
use crate::memory::MemoryRepository;
use crate::traits::Repository;

/// Wraps a `MemoryRepository` with periodic file-backup and optional startup
/// restore. An `interval` of zero disables the periodic ticker entirely; no
/// synchronous per-write backup mode is offered (see the design notes on the
/// resolution of this ambiguity).
pub struct BackupRepository {
    inner: MemoryRepository,
    file: PathBuf,
    interval: Duration,
    pool: TickerPool,
}

impl BackupRepository {
    pub fn new(file: impl Into<PathBuf>, interval: Duration, restore: bool) -> Self {
        let repo = Self {
            inner: MemoryRepository::new(),
            file: file.into(),
            interval,
            pool: TickerPool::new(CancellationToken::new()),
        };
        if restore {
            if let Err(error) = repo.restore() {
                tracing::warn!(%error, "failed to restore metrics from backup file, starting empty");
            }
        }
        repo
    }

    /// Spawns the periodic backup task, if configured. Call once after
    /// wrapping `self` in an `Arc`.
    pub fn start(self: &Arc<Self>) {
        if self.interval.is_zero() {
            tracing::debug!("backup ticker disabled (interval=0)");
            return;
        }
        let this = Arc::clone(self);
        self.pool.add_task("backup", self.interval, move || {
            let this = Arc::clone(&this);
            async move {
                if let Err(error) = this.backup() {
                    tracing::warn!(%error, "periodic backup failed");
                }
            }
        });
    }

    pub fn backup(&self) -> Result<(), RepositoryError> {
        tracing::debug!(file = %self.file.display(), "writing backup");
        let metrics = self.inner.get_all_sync();
        let params: Vec<Params> = metrics.iter().map(|m| m.to_params(None)).collect();

        let file = File::create(&self.file)?;
        serde_json::to_writer(&file, &params)?;
        (&file).flush()?;
        tracing::info!(count = params.len(), "metrics backed up");
        Ok(())
    }

    pub fn restore(&self) -> Result<(), RepositoryError> {
        let file = match File::open(&self.file) {
            Ok(f) => f,
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                tracing::info!("no backup file to restore from");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let params: Vec<Params> = match serde_json::from_reader(&file) {
            Ok(p) => p,
            Err(e) if e.is_eof() => {
                tracing::info!("backup file is empty, nothing to restore");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        for p in &params {
            match Metric::from_params(p) {
                Ok(Metric::Gauge(GaugeMetric { name, value })) => {
                    self.inner.set_gauge_sync(&name, value);
                }
                Ok(Metric::Counter(CounterMetric { name, value })) => {
                    self.inner.add_counter_sync(&name, value);
                }
                Err(error) => {
                    tracing::warn!(%error, metric = %p.name, "skipping malformed backup entry");
                }
            }
        }
        tracing::info!(count = params.len(), "metrics restored from backup");
        Ok(())
    }
}

#[async_trait]
impl Repository for BackupRepository {
    async fn get_gauge(&self, name: &str) -> Result<GaugeMetric, RepositoryError> {
        self.inner.get_gauge(name).await
    }

    async fn get_counter(&self, name: &str) -> Result<CounterMetric, RepositoryError> {
        self.inner.get_counter(name).await
    }

    async fn set_gauge(&self, name: &str, value: f64) -> Result<GaugeMetric, RepositoryError> {
        self.inner.set_gauge(name, value).await
    }

    async fn add_counter(&self, name: &str, delta: i64) -> Result<CounterMetric, RepositoryError> {
        self.inner.add_counter(name, delta).await
    }

    async fn set_gauges(
        &self,
        gauges: &[(String, f64)],
    ) -> Result<Vec<GaugeMetric>, RepositoryError> {
        self.inner.set_gauges(gauges).await
    }

    async fn add_counters(
        &self,
        counters: &[(String, i64)],
    ) -> Result<Vec<CounterMetric>, RepositoryError> {
        self.inner.add_counters(counters).await
    }

    async fn get_all(&self) -> Result<Vec<Metric>, RepositoryError> {
        self.inner.get_all().await
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.inner.ping().await
    }

    async fn shutdown(&self) -> Result<(), RepositoryError> {
        self.pool.cancellation_token().cancel();
        self.pool.wait().await;
        if let Err(error) = self.backup() {
            tracing::warn!(%error, "final backup on shutdown failed");
        }
        self.inner.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn backup_then_restore_round_trips_on_empty_repository() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");

        let original = BackupRepository::new(&path, Duration::from_secs(0), false);
        original.inner.set_gauge("Foo", 1.5).await.unwrap();
        original.inner.add_counter("Dog", 3).await.unwrap();
        original.backup().unwrap();

        let restored = BackupRepository::new(&path, Duration::from_secs(0), true);
        let mut all = restored.get_all().await.unwrap();
        all.sort_by(|a, b| a.name().cmp(b.name()));

        assert_eq!(all.len(), 2);
        assert_eq!(restored.get_gauge("Foo").await.unwrap().value, 1.5);
        assert_eq!(restored.get_counter("Dog").await.unwrap().value, 3);
    }

    #[tokio::test]
    async fn missing_backup_file_restores_empty_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.json");

        let repo = BackupRepository::new(&path, Duration::from_secs(0), true);
        let all = repo.get_all().await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn shutdown_writes_a_final_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");

        let repo = Arc::new(BackupRepository::new(&path, Duration::from_secs(0), false));
        repo.set_gauge("Foo", 2.0).await.unwrap();
        repo.shutdown().await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("Foo"));
    }
}
