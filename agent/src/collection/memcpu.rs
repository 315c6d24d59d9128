use repository::Repository;
use sysinfo::System;

/// Periodically samples host memory and per-core CPU utilization into
/// `TotalMemory`, `FreeMemory`, and one `CPUutilization{i}` gauge per
/// logical CPU (1-indexed).
#[derive(Default)]
pub struct MemCpuSampler {
    system: System,
}

impl MemCpuSampler {
    pub fn new() -> Self {
        Self {
            system: System::new_all(),
        }
    }

    pub async fn sample(&mut self, repo: &dyn Repository) -> Result<(), repository::RepositoryError> {
        self.system.refresh_memory();
        self.system.refresh_cpu_usage();

        let mut gauges = vec![
            ("TotalMemory".to_owned(), self.system.total_memory() as f64),
            ("FreeMemory".to_owned(), self.system.free_memory() as f64),
        ];

        for (i, cpu) in self.system.cpus().iter().enumerate() {
            gauges.push((format!("CPUutilization{}", i + 1), cpu.cpu_usage() as f64));
        }

        repo.set_gauges(&gauges).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repository::MemoryRepository;

    #[tokio::test]
    async fn sample_populates_memory_and_per_cpu_gauges() {
        let repo = MemoryRepository::new();
        let mut sampler = MemCpuSampler::new();

        sampler.sample(&repo).await.unwrap();

        assert!(repo.get_gauge("TotalMemory").await.is_ok());
        assert!(repo.get_gauge("FreeMemory").await.is_ok());
        assert!(repo.get_gauge("CPUutilization1").await.is_ok());
    }
}
