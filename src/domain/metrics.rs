use serde::{Deserialize, Serialize};

/// Raw CPU counters from one stats reading of a container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuUsage {
    /// Cumulative CPU time consumed by the container (ns)
    pub total_usage: u64,
    /// Cumulative CPU time of the whole host (ns)
    pub system_usage: u64,
    /// Number of per-CPU usage entries reported, if any
    pub percpu_entries: Option<usize>,
    /// Online CPU count reported by the runtime
    pub online_cpus: Option<u64>,
}

impl CpuUsage {
    pub fn new(total_usage: u64, system_usage: u64) -> Self {
        Self {
            total_usage,
            system_usage,
            percpu_entries: None,
            online_cpus: None,
        }
    }

    pub fn with_percpu_entries(mut self, entries: usize) -> Self {
        self.percpu_entries = Some(entries);
        self
    }

    pub fn with_online_cpus(mut self, online_cpus: u64) -> Self {
        self.online_cpus = Some(online_cpus);
        self
    }

    /// CPU count used to scale the usage ratio.
    ///
    /// Per-CPU entries win; cgroup v2 hosts omit them, so the runtime's
    /// online count is next, then 1.
    pub fn cpu_count(&self) -> f64 {
        self.percpu_entries
            .filter(|n| *n > 0)
            .map(|n| n as u64)
            .or(self.online_cpus.filter(|n| *n > 0))
            .unwrap_or(1) as f64
    }
}

/// CPU utilization between two readings.
///
/// `(cpu_delta / system_delta) * cpu_count`. Returns 0.0 when the system
/// delta is not positive, which is the case for a degenerate first sample.
pub fn cpu_fraction(current: &CpuUsage, previous: &CpuUsage) -> f64 {
    let system_delta = current.system_usage as f64 - previous.system_usage as f64;
    if system_delta <= 0.0 {
        return 0.0;
    }

    // Counters reset on container restart
    let cpu_delta = current.total_usage.saturating_sub(previous.total_usage) as f64;

    (cpu_delta / system_delta) * current.cpu_count()
}
