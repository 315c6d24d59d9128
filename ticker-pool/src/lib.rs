use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// A fan-out of independently ticking workers sharing one cancellation handle.
/// Each registered task ticks serially (no overlapping invocations of the same
/// task); different tasks run concurrently with each other.
pub struct TickerPool {
    cancel: CancellationToken,
    tasks: Mutex<JoinSet<()>>,
}

impl TickerPool {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Registers a task that calls `f` every `interval`. An `interval` of zero
    /// disables the task entirely (it returns immediately without ticking).
    pub fn add_task<F, Fut>(&self, name: impl Into<String>, interval: Duration, mut f: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let cancel = self.cancel.clone();

        let mut tasks = self.tasks.lock().expect("ticker pool mutex poisoned");
        tasks.spawn(async move {
            if interval.is_zero() {
                tracing::debug!(task = %name, "ticker task disabled (interval=0)");
                return;
            }

            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!(task = %name, "ticker task cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        f().await;
                    }
                }
            }
        });
    }

    /// Blocks until every registered task has exited.
    pub async fn wait(&self) {
        let mut tasks = {
            let mut guard = self.tasks.lock().expect("ticker pool mutex poisoned");
            std::mem::replace(&mut *guard, JoinSet::new())
        };

        while let Some(result) = tasks.join_next().await {
            if let Err(error) = result {
                tracing::error!(%error, "ticker pool task panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn task_ticks_and_stops_on_cancellation() {
        let cancel = CancellationToken::new();
        let pool = TickerPool::new(cancel.clone());
        let ticks = Arc::new(AtomicUsize::new(0));

        let counter = ticks.clone();
        pool.add_task("count", Duration::from_millis(10), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(35)).await;
        cancel.cancel();
        pool.wait().await;

        assert!(ticks.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn zero_interval_task_never_ticks() {
        let cancel = CancellationToken::new();
        let pool = TickerPool::new(cancel.clone());
        let ticks = Arc::new(AtomicUsize::new(0));

        let counter = ticks.clone();
        pool.add_task("disabled", Duration::from_millis(0), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        pool.wait().await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }
}
