use async_trait::async_trait;
use metrics_model::{CounterMetric, GaugeMetric, Metric};

use crate::error::RepositoryError;

/// The capability set shared by every backend: memory, memory-with-backup, and
/// relational. `set_gauges`/`add_counters` are the only operations required to
/// be atomic across the whole slice.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn get_gauge(&self, name: &str) -> Result<GaugeMetric, RepositoryError>;
    async fn get_counter(&self, name: &str) -> Result<CounterMetric, RepositoryError>;

    async fn set_gauge(&self, name: &str, value: f64) -> Result<GaugeMetric, RepositoryError>;
    async fn add_counter(&self, name: &str, delta: i64) -> Result<CounterMetric, RepositoryError>;

    async fn set_gauges(
        &self,
        gauges: &[(String, f64)],
    ) -> Result<Vec<GaugeMetric>, RepositoryError>;

    async fn add_counters(
        &self,
        counters: &[(String, i64)],
    ) -> Result<Vec<CounterMetric>, RepositoryError>;

    async fn get_all(&self) -> Result<Vec<Metric>, RepositoryError>;

    async fn ping(&self) -> Result<(), RepositoryError>;

    async fn shutdown(&self) -> Result<(), RepositoryError>;
}
