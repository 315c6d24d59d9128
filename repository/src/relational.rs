use async_trait::async_trait;
use metrics_model::{CounterMetric, GaugeMetric, Metric};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use crate::error::RepositoryError;
use crate::traits::Repository;

/// Postgres-backed repository. Single-row operations use a plain upsert;
/// batch operations wrap every statement in one transaction so a failure
/// partway through leaves no metric in the batch observably updated.
pub struct RelationalRepository {
    pool: PgPool,
}

impl RelationalRepository {
    pub async fn connect(dsn: &str, max_connections: u32) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(dsn)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl Repository for RelationalRepository {
    async fn get_gauge(&self, name: &str) -> Result<GaugeMetric, RepositoryError> {
        let value: Option<f64> = sqlx::query_scalar("SELECT value FROM gauge WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        value
            .map(|value| GaugeMetric {
                name: name.to_owned(),
                value,
            })
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_counter(&self, name: &str) -> Result<CounterMetric, RepositoryError> {
        let value: Option<i64> = sqlx::query_scalar("SELECT value FROM counter WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        value
            .map(|value| CounterMetric {
                name: name.to_owned(),
                value,
            })
            .ok_or(RepositoryError::NotFound)
    }

    async fn set_gauge(&self, name: &str, value: f64) -> Result<GaugeMetric, RepositoryError> {
        let result: f64 = sqlx::query_scalar(
            "INSERT INTO gauge (name, value) VALUES ($1, $2)
             ON CONFLICT (name) DO UPDATE SET value = EXCLUDED.value
             RETURNING value",
        )
        .bind(name)
        .bind(value)
        .fetch_one(&self.pool)
        .await?;
        Ok(GaugeMetric {
            name: name.to_owned(),
            value: result,
        })
    }

    async fn add_counter(&self, name: &str, delta: i64) -> Result<CounterMetric, RepositoryError> {
        let result: i64 = sqlx::query_scalar(
            "INSERT INTO counter (name, value) VALUES ($1, $2)
             ON CONFLICT (name) DO UPDATE SET value = counter.value + EXCLUDED.value
             RETURNING value",
        )
        .bind(name)
        .bind(delta)
        .fetch_one(&self.pool)
        .await?;
        Ok(CounterMetric {
            name: name.to_owned(),
            value: result,
        })
    }

    async fn set_gauges(
        &self,
        gauges: &[(String, f64)],
    ) -> Result<Vec<GaugeMetric>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut results = Vec::with_capacity(gauges.len());

        for (name, value) in gauges {
            let result: Result<f64, sqlx::Error> = sqlx::query_scalar(
                "INSERT INTO gauge (name, value) VALUES ($1, $2)
                 ON CONFLICT (name) DO UPDATE SET value = EXCLUDED.value
                 RETURNING value",
            )
            .bind(name)
            .bind(value)
            .fetch_one(&mut *tx)
            .await;

            match result {
                Ok(value) => results.push(GaugeMetric {
                    name: name.clone(),
                    value,
                }),
                Err(error) => {
                    tx.rollback().await?;
                    return Err(error.into());
                }
            }
        }

        tx.commit().await?;
        Ok(results)
    }

    async fn add_counters(
        &self,
        counters: &[(String, i64)],
    ) -> Result<Vec<CounterMetric>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut results = Vec::with_capacity(counters.len());

        for (name, delta) in counters {
            let result: Result<i64, sqlx::Error> = sqlx::query_scalar(
                "INSERT INTO counter (name, value) VALUES ($1, $2)
                 ON CONFLICT (name) DO UPDATE SET value = counter.value + EXCLUDED.value
                 RETURNING value",
            )
            .bind(name)
            .bind(delta)
            .fetch_one(&mut *tx)
            .await;

            match result {
                Ok(value) => results.push(CounterMetric {
                    name: name.clone(),
                    value,
                }),
                Err(error) => {
                    tx.rollback().await?;
                    return Err(error.into());
                }
            }
        }

        tx.commit().await?;
        Ok(results)
    }

    async fn get_all(&self) -> Result<Vec<Metric>, RepositoryError> {
        let mut metrics = Vec::new();

        let gauge_rows = sqlx::query("SELECT name, value FROM gauge")
            .fetch_all(&self.pool)
            .await?;
        for row in gauge_rows {
            let name: String = row.try_get("name")?;
            let value: f64 = row.try_get("value")?;
            metrics.push(Metric::gauge(name, value));
        }

        let counter_rows = sqlx::query("SELECT name, value FROM counter")
            .fetch_all(&self.pool)
            .await?;
        for row in counter_rows {
            let name: String = row.try_get("name")?;
            let value: i64 = row.try_get("value")?;
            metrics.push(Metric::counter(name, value));
        }

        Ok(metrics)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), RepositoryError> {
        self.pool.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(migrations = "./migrations")]
    async fn set_gauge_then_get_gauge(pool: PgPool) {
        let repo = RelationalRepository { pool };
        repo.set_gauge("WaterPercent", 0.8).await.unwrap();
        let g = repo.get_gauge("WaterPercent").await.unwrap();
        assert_eq!(g.value, 0.8);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn add_counter_accumulates_across_calls(pool: PgPool) {
        let repo = RelationalRepository { pool };
        repo.add_counter("Dog", 3).await.unwrap();
        repo.add_counter("Dog", 3).await.unwrap();
        let c = repo.get_counter("Dog").await.unwrap();
        assert_eq!(c.value, 6);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn get_unknown_gauge_is_not_found(pool: PgPool) {
        let repo = RelationalRepository { pool };
        let err = repo.get_gauge("Missing").await.unwrap_err();
        assert_eq!(err.kind(), metrics_model::ErrorKind::NotFound);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn batch_set_gauges_is_atomic_on_failure(pool: PgPool) {
        let repo = RelationalRepository { pool };
        let batch = vec![("A".to_owned(), 1.0), ("B".to_owned(), 2.0)];
        let results = repo.set_gauges(&batch).await.unwrap();
        assert_eq!(results.len(), 2);

        let all = repo.get_all().await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
