use std::sync::Arc;

use metrics_model::{Metric, MetricKind, Params};
use repository::Repository;

use crate::error::CollectorError;

/// Enforces hash validation and coordinates cross-kind repository calls. The
/// controller holds a reference to the repository but never mutates its
/// maps directly.
pub struct Controller {
    repository: Arc<dyn Repository>,
    hmac_key: Vec<u8>,
}

impl Controller {
    pub fn new(repository: Arc<dyn Repository>, hmac_key: Vec<u8>) -> Self {
        Self {
            repository,
            hmac_key,
        }
    }

    /// Accepts any hash (including an absent one) when no key is configured;
    /// otherwise requires a non-empty hash matching the recomputed value.
    fn check_hash(&self, metric: &Metric, hash: Option<&str>) -> Result<(), CollectorError> {
        if self.hmac_key.is_empty() {
            return Ok(());
        }
        let expected = metric.hash(&self.hmac_key);
        match hash {
            Some(given) if given == expected => Ok(()),
            _ => Err(CollectorError::InvalidHash(metric.name().to_owned())),
        }
    }

    pub async fn get_metric(&self, kind: MetricKind, name: &str) -> Result<Metric, CollectorError> {
        match kind {
            MetricKind::Gauge => Ok(Metric::Gauge(self.repository.get_gauge(name).await?)),
            MetricKind::Counter => Ok(Metric::Counter(self.repository.get_counter(name).await?)),
        }
    }

    pub async fn update_metric(&self, params: &Params) -> Result<Metric, CollectorError> {
        let metric = Metric::from_params(params)?;
        self.check_hash(&metric, params.hash.as_deref())?;

        let updated = match &metric {
            Metric::Gauge(g) => {
                Metric::Gauge(self.repository.set_gauge(&g.name, g.value).await?)
            }
            Metric::Counter(c) => {
                Metric::Counter(self.repository.add_counter(&c.name, c.value).await?)
            }
        };
        Ok(updated)
    }

    /// Validates every hash before applying anything, then partitions the
    /// batch by kind and applies gauges before counters, preserving order
    /// within each kind.
    pub async fn update_metrics(&self, batch: &[Params]) -> Result<Vec<Params>, CollectorError> {
        let mut metrics = Vec::with_capacity(batch.len());
        for params in batch {
            let metric = Metric::from_params(params)?;
            self.check_hash(&metric, params.hash.as_deref())?;
            metrics.push(metric);
        }

        let mut gauges = Vec::new();
        let mut gauge_positions = Vec::new();
        let mut counters = Vec::new();
        let mut counter_positions = Vec::new();

        for (i, metric) in metrics.iter().enumerate() {
            match metric {
                Metric::Gauge(g) => {
                    gauges.push((g.name.clone(), g.value));
                    gauge_positions.push(i);
                }
                Metric::Counter(c) => {
                    counters.push((c.name.clone(), c.value));
                    counter_positions.push(i);
                }
            }
        }

        let mut results: Vec<Option<Metric>> = vec![None; metrics.len()];

        if !gauges.is_empty() {
            let updated = self.repository.set_gauges(&gauges).await?;
            for (pos, gauge) in gauge_positions.into_iter().zip(updated) {
                results[pos] = Some(Metric::Gauge(gauge));
            }
        }
        if !counters.is_empty() {
            let updated = self.repository.add_counters(&counters).await?;
            for (pos, counter) in counter_positions.into_iter().zip(updated) {
                results[pos] = Some(Metric::Counter(counter));
            }
        }

        Ok(results
            .into_iter()
            .map(|m| {
                let metric = m.expect("every position is filled by its gauge or counter pass");
                let hash = if self.hmac_key.is_empty() {
                    None
                } else {
                    Some(metric.hash(&self.hmac_key))
                };
                metric.to_params(hash)
            })
            .collect())
    }

    /// Converts a metric to its wire form with a freshly computed hash, the
    /// same echo behavior `update_metrics` applies to every element of a
    /// batch response.
    pub fn fresh_params(&self, metric: &Metric) -> Params {
        let hash = if self.hmac_key.is_empty() {
            None
        } else {
            Some(metric.hash(&self.hmac_key))
        };
        metric.to_params(hash)
    }

    pub async fn get_all(&self) -> Result<Vec<Metric>, CollectorError> {
        Ok(self.repository.get_all().await?)
    }

    pub async fn ping(&self) -> Result<(), CollectorError> {
        Ok(self.repository.ping().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repository::MemoryRepository;

    fn controller(key: &str) -> Controller {
        Controller::new(Arc::new(MemoryRepository::new()), key.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn update_then_get_round_trips() {
        let controller = controller("");
        let params = Params {
            name: "Dog".into(),
            kind: "counter".into(),
            gauge_value: None,
            counter_delta: Some(3),
            hash: None,
        };
        controller.update_metric(&params).await.unwrap();
        let metric = controller.get_metric(MetricKind::Counter, "Dog").await.unwrap();
        assert_eq!(metric.string_value(), "3");
    }

    #[tokio::test]
    async fn empty_key_accepts_any_hash() {
        let controller = controller("");
        let params = Params {
            name: "Dog".into(),
            kind: "counter".into(),
            gauge_value: None,
            counter_delta: Some(1),
            hash: Some("bogus".into()),
        };
        assert!(controller.update_metric(&params).await.is_ok());
    }

    #[tokio::test]
    async fn configured_key_rejects_bad_hash() {
        let controller = controller("k");
        let params = Params {
            name: "Dog".into(),
            kind: "counter".into(),
            gauge_value: None,
            counter_delta: Some(1),
            hash: Some("bogus".into()),
        };
        let err = controller.update_metric(&params).await.unwrap_err();
        assert_eq!(err.kind(), metrics_model::ErrorKind::InvalidHash);
    }

    #[tokio::test]
    async fn configured_key_accepts_correct_hash() {
        let controller = controller("k");
        let metric = Metric::counter("Dog", 1);
        let hash = metric.hash(b"k");
        let params = Params {
            name: "Dog".into(),
            kind: "counter".into(),
            gauge_value: None,
            counter_delta: Some(1),
            hash: Some(hash),
        };
        assert!(controller.update_metric(&params).await.is_ok());
    }

    #[tokio::test]
    async fn update_metrics_batch_preserves_order_and_echoes_fresh_hashes() {
        let controller = controller("k");
        let a = Metric::gauge("A", 0.5);
        let b = Metric::counter("B", 2);
        let batch = vec![
            a.to_params(Some(a.hash(b"k"))),
            b.to_params(Some(b.hash(b"k"))),
        ];
        let results = controller.update_metrics(&batch).await.unwrap();
        assert_eq!(results[0].name, "A");
        assert_eq!(results[1].name, "B");
        assert!(results[0].hash.is_some());
    }

    #[tokio::test]
    async fn update_metrics_batch_rejects_whole_batch_on_one_bad_hash() {
        let controller = controller("k");
        let a = Metric::gauge("A", 0.5);
        let batch = vec![
            a.to_params(Some(a.hash(b"k"))),
            Params {
                name: "B".into(),
                kind: "counter".into(),
                gauge_value: None,
                counter_delta: Some(2),
                hash: Some("bogus".into()),
            },
        ];
        assert!(controller.update_metrics(&batch).await.is_err());

        // Neither metric should be observable, since validation runs before any write.
        assert!(controller.get_metric(MetricKind::Gauge, "A").await.is_err());
    }
}
