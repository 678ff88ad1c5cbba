use std::time::Duration;

use crate::error::ConfigError;

/// Immutable tuning for the autoscale loop.
///
/// Only constructible through [`ScalingConfig::new`], which rejects
/// combinations the loop cannot run with.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingConfig {
    interval: Duration,
    cpu_threshold: f64,
    min_replicas: u32,
    max_replicas: u32,
}

impl ScalingConfig {
    pub fn new(
        interval: Duration,
        cpu_threshold: f64,
        min_replicas: u32,
        max_replicas: u32,
    ) -> Result<Self, ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::Scaling("interval must be positive".to_string()));
        }
        if !(cpu_threshold > 0.0 && cpu_threshold <= 1.0) {
            return Err(ConfigError::Scaling(format!(
                "cpu_threshold must be in (0, 1], got {}",
                cpu_threshold
            )));
        }
        if max_replicas < min_replicas {
            return Err(ConfigError::Scaling(format!(
                "max_replicas ({}) is below min_replicas ({})",
                max_replicas, min_replicas
            )));
        }

        Ok(Self {
            interval,
            cpu_threshold,
            min_replicas,
            max_replicas,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn cpu_threshold(&self) -> f64 {
        self.cpu_threshold
    }

    pub fn min_replicas(&self) -> u32 {
        self.min_replicas
    }

    pub fn max_replicas(&self) -> u32 {
        self.max_replicas
    }

    /// Average CPU below which the service is scaled down
    pub fn scale_down_threshold(&self) -> f64 {
        self.cpu_threshold / 2.0
    }
}
