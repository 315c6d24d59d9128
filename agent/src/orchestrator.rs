use std::sync::Arc;
use std::time::Duration;

use repository::{MemoryRepository, Repository};
use ticker_pool::TickerPool;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::collection::{MemCpuSampler, RuntimeSampler};
use crate::sender::Sender;

/// Drives the agent's three periodic tasks — runtime sampling, mem/CPU
/// sampling, and reporting — against a local collection repository that is
/// never shared with external readers.
pub struct Orchestrator {
    repository: Arc<MemoryRepository>,
    sender: Arc<dyn Sender>,
    hmac_key: Vec<u8>,
    pool: TickerPool,
}

impl Orchestrator {
    pub fn new(sender: Arc<dyn Sender>, hmac_key: Vec<u8>, cancel: CancellationToken) -> Self {
        Self {
            repository: Arc::new(MemoryRepository::new()),
            sender,
            hmac_key,
            pool: TickerPool::new(cancel),
        }
    }

    /// Registers the three tasks and returns once the pool has drained
    /// after cancellation.
    pub async fn run(&self, poll_interval: Duration, report_interval: Duration) {
        let cancel = self.pool.cancellation_token();

        let runtime_repo = self.repository.clone();
        let runtime_sampler = Arc::new(Mutex::new(RuntimeSampler::new()));
        self.pool
            .add_task("UpdateRuntimeMetrics", poll_interval, move || {
                let repo = runtime_repo.clone();
                let sampler = runtime_sampler.clone();
                async move {
                    let mut sampler = sampler.lock().await;
                    if let Err(error) = sampler.sample(repo.as_ref()).await {
                        tracing::warn!(%error, "runtime sample failed");
                    }
                }
            });

        let memcpu_repo = self.repository.clone();
        let memcpu_sampler = Arc::new(Mutex::new(MemCpuSampler::new()));
        self.pool
            .add_task("UpdateMemCPUMetrics", poll_interval, move || {
                let repo = memcpu_repo.clone();
                let sampler = memcpu_sampler.clone();
                async move {
                    let mut sampler = sampler.lock().await;
                    if let Err(error) = sampler.sample(repo.as_ref()).await {
                        tracing::warn!(%error, "mem/cpu sample failed");
                    }
                }
            });

        let report_repo = self.repository.clone();
        let report_sender = self.sender.clone();
        let report_key = self.hmac_key.clone();
        let report_cancel = cancel.clone();
        self.pool
            .add_task("Report", report_interval, move || {
                let repo = report_repo.clone();
                let sender = report_sender.clone();
                let key = report_key.clone();
                let cancel = report_cancel.clone();
                async move {
                    let metrics = match repo.get_all().await {
                        Ok(metrics) => metrics,
                        Err(error) => {
                            tracing::warn!(%error, "failed to snapshot metrics for report");
                            return;
                        }
                    };
                    let params: Vec<_> = metrics
                        .iter()
                        .map(|m| m.to_params(Some(m.hash(&key))))
                        .collect();

                    if let Err(error) = sender.send_metrics(&params, &cancel).await {
                        tracing::warn!(%error, "failed to report metrics batch");
                    }
                }
            });

        self.pool.wait().await;
    }
}
