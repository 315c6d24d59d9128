use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use metrics_model::{CounterMetric, GaugeMetric, Metric};

use crate::error::RepositoryError;
use crate::traits::Repository;

/// Two maps under readers-writer locks, keyed independently per kind so a gauge
/// and a counter never collide even if they share a name.
pub struct MemoryRepository {
    gauges: RwLock<HashMap<String, f64>>,
    counters: RwLock<HashMap<String, i64>>,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self {
            gauges: RwLock::new(HashMap::new()),
            counters: RwLock::new(HashMap::new()),
        }
    }

    /// Synchronous snapshot, usable from the non-async backup path.
    pub fn get_all_sync(&self) -> Vec<Metric> {
        let gauges = self.gauges.read().expect("gauge map lock poisoned");
        let counters = self.counters.read().expect("counter map lock poisoned");

        let mut metrics = Vec::with_capacity(gauges.len() + counters.len());
        metrics.extend(
            gauges
                .iter()
                .map(|(name, &value)| Metric::gauge(name.clone(), value)),
        );
        metrics.extend(
            counters
                .iter()
                .map(|(name, &value)| Metric::counter(name.clone(), value)),
        );
        metrics
    }

    pub fn set_gauge_sync(&self, name: &str, value: f64) {
        let mut map = self.gauges.write().expect("gauge map lock poisoned");
        map.insert(name.to_owned(), value);
    }

    pub fn add_counter_sync(&self, name: &str, delta: i64) {
        let mut map = self.counters.write().expect("counter map lock poisoned");
        let entry = map.entry(name.to_owned()).or_insert(0);
        *entry = entry.wrapping_add(delta);
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn get_gauge(&self, name: &str) -> Result<GaugeMetric, RepositoryError> {
        let map = self.gauges.read().expect("gauge map lock poisoned");
        map.get(name)
            .map(|&value| GaugeMetric {
                name: name.to_owned(),
                value,
            })
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_counter(&self, name: &str) -> Result<CounterMetric, RepositoryError> {
        let map = self.counters.read().expect("counter map lock poisoned");
        map.get(name)
            .map(|&value| CounterMetric {
                name: name.to_owned(),
                value,
            })
            .ok_or(RepositoryError::NotFound)
    }

    async fn set_gauge(&self, name: &str, value: f64) -> Result<GaugeMetric, RepositoryError> {
        let mut map = self.gauges.write().expect("gauge map lock poisoned");
        map.insert(name.to_owned(), value);
        Ok(GaugeMetric {
            name: name.to_owned(),
            value,
        })
    }

    async fn add_counter(&self, name: &str, delta: i64) -> Result<CounterMetric, RepositoryError> {
        let mut map = self.counters.write().expect("counter map lock poisoned");
        let entry = map.entry(name.to_owned()).or_insert(0);
        *entry = entry.wrapping_add(delta);
        Ok(CounterMetric {
            name: name.to_owned(),
            value: *entry,
        })
    }

    async fn set_gauges(
        &self,
        gauges: &[(String, f64)],
    ) -> Result<Vec<GaugeMetric>, RepositoryError> {
        let mut map = self.gauges.write().expect("gauge map lock poisoned");
        let mut results = Vec::with_capacity(gauges.len());
        for (name, value) in gauges {
            map.insert(name.clone(), *value);
            results.push(GaugeMetric {
                name: name.clone(),
                value: *value,
            });
        }
        Ok(results)
    }

    async fn add_counters(
        &self,
        counters: &[(String, i64)],
    ) -> Result<Vec<CounterMetric>, RepositoryError> {
        let mut map = self.counters.write().expect("counter map lock poisoned");
        let mut results = Vec::with_capacity(counters.len());
        for (name, delta) in counters {
            let entry = map.entry(name.clone()).or_insert(0);
            *entry = entry.wrapping_add(*delta);
            results.push(CounterMetric {
                name: name.clone(),
                value: *entry,
            });
        }
        Ok(results)
    }

    async fn get_all(&self) -> Result<Vec<Metric>, RepositoryError> {
        let gauges = self.gauges.read().expect("gauge map lock poisoned");
        let counters = self.counters.read().expect("counter map lock poisoned");

        let mut metrics = Vec::with_capacity(gauges.len() + counters.len());
        metrics.extend(
            gauges
                .iter()
                .map(|(name, &value)| Metric::gauge(name.clone(), value)),
        );
        metrics.extend(
            counters
                .iter()
                .map(|(name, &value)| Metric::counter(name.clone(), value)),
        );
        Ok(metrics)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_gauge_then_get_returns_same_value() {
        let repo = MemoryRepository::new();
        repo.set_gauge("WaterPercent", 0.8).await.unwrap();
        let g = repo.get_gauge("WaterPercent").await.unwrap();
        assert_eq!(g.value, 0.8);
    }

    #[tokio::test]
    async fn sequential_add_counter_accumulates() {
        let repo = MemoryRepository::new();
        repo.add_counter("Dog", 3).await.unwrap();
        repo.add_counter("Dog", 3).await.unwrap();
        let c = repo.get_counter("Dog").await.unwrap();
        assert_eq!(c.value, 6);
    }

    #[tokio::test]
    async fn gauge_and_counter_with_same_name_are_independent() {
        let repo = MemoryRepository::new();
        repo.set_gauge("Foo", 1.0).await.unwrap();
        repo.add_counter("Foo", 5).await.unwrap();

        assert_eq!(repo.get_gauge("Foo").await.unwrap().value, 1.0);
        assert_eq!(repo.get_counter("Foo").await.unwrap().value, 5);
    }

    #[tokio::test]
    async fn get_unknown_metric_is_not_found() {
        let repo = MemoryRepository::new();
        let err = repo.get_gauge("Missing").await.unwrap_err();
        assert_eq!(err.kind(), metrics_model::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn batch_add_counters_accumulates_within_the_same_batch() {
        let repo = MemoryRepository::new();
        let batch = vec![("Dog".to_owned(), 1i64), ("Dog".to_owned(), 2i64)];
        let results = repo.add_counters(&batch).await.unwrap();
        assert_eq!(results[0].value, 1);
        assert_eq!(results[1].value, 3);
    }

    #[tokio::test]
    async fn batch_set_gauges_preserves_order() {
        let repo = MemoryRepository::new();
        let batch = vec![("A".to_owned(), 0.5f64), ("B".to_owned(), 1.5f64)];
        let results = repo.set_gauges(&batch).await.unwrap();
        assert_eq!(results[0].name, "A");
        assert_eq!(results[1].name, "B");
    }
}
