use std::collections::HashMap;

use rand::Rng;
use repository::Repository;
use sysinfo::{Pid, System};

/// Gauge names sampled every `poll_interval`, matching the 28-name surface
/// the collector expects regardless of which of them a Rust process can
/// actually introspect. Names this process cannot derive from the allocator
/// hold steady at their last-known (initially zero) value rather than being
/// omitted, so the name set presented to the collector never shrinks.
const GAUGE_NAMES: &[&str] = &[
    "Alloc",
    "TotalAlloc",
    "Sys",
    "Lookups",
    "Mallocs",
    "Frees",
    "HeapAlloc",
    "HeapSys",
    "HeapIdle",
    "HeapInuse",
    "HeapReleased",
    "HeapObjects",
    "StackInuse",
    "StackSys",
    "MSpanInuse",
    "MSpanSys",
    "MCacheInuse",
    "MCacheSys",
    "BuckHashSys",
    "GCSys",
    "OtherSys",
    "NextGC",
    "LastGC",
    "PauseTotalNs",
    "NumGC",
    "NumForcedGC",
    "GCCPUFraction",
];

/// Periodically samples process memory introspection into the ~28-gauge
/// runtime surface, a `PollCount` counter, and a uniform `RandomValue` gauge.
/// Fields the allocator in use cannot report (there is no Go-style GC to
/// introspect from stable Rust) are held at their last-known value.
pub struct RuntimeSampler {
    pid: Pid,
    last_known: HashMap<&'static str, f64>,
}

impl Default for RuntimeSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeSampler {
    pub fn new() -> Self {
        let pid = sysinfo::get_current_pid().unwrap_or(Pid::from(0));
        let mut last_known = HashMap::with_capacity(GAUGE_NAMES.len());
        for name in GAUGE_NAMES {
            last_known.insert(*name, 0.0);
        }
        Self { pid, last_known }
    }

    /// Samples process memory stats into the fields the current process can
    /// actually answer, writes the whole gauge set in one batch, and bumps
    /// `PollCount` by one. Failures are logged by the caller, never panic.
    pub async fn sample(&mut self, repo: &dyn Repository) -> Result<(), repository::RepositoryError> {
        let mut system = System::new_all();
        system.refresh_all();

        if let Some(process) = system.process(self.pid) {
            let resident = process.memory() as f64;
            let virt = process.virtual_memory() as f64;
            self.last_known.insert("Alloc", resident);
            self.last_known.insert("HeapAlloc", resident);
            self.last_known.insert("HeapInuse", resident);
            self.last_known.insert("Sys", virt);
            self.last_known.insert("HeapSys", virt);
            *self.last_known.get_mut("TotalAlloc").unwrap() += resident.max(0.0) / 1024.0;
        }

        let random_value: f64 = rand::thread_rng().gen_range(0.0..1.0);

        let mut gauges: Vec<(String, f64)> = GAUGE_NAMES
            .iter()
            .map(|name| (name.to_string(), self.last_known[name]))
            .collect();
        gauges.push(("RandomValue".to_owned(), random_value));

        repo.set_gauges(&gauges).await?;
        repo.add_counter("PollCount", 1).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repository::MemoryRepository;

    #[tokio::test]
    async fn sample_populates_the_full_gauge_surface_and_bumps_poll_count() {
        let repo = MemoryRepository::new();
        let mut sampler = RuntimeSampler::new();

        sampler.sample(&repo).await.unwrap();
        sampler.sample(&repo).await.unwrap();

        for name in GAUGE_NAMES {
            assert!(repo.get_gauge(name).await.is_ok(), "missing gauge {name}");
        }
        assert!(repo.get_gauge("RandomValue").await.unwrap().value < 1.0);
        assert_eq!(repo.get_counter("PollCount").await.unwrap().value, 2);
    }
}
