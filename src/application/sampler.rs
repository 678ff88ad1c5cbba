use std::sync::Arc;

use tracing::debug;

use crate::domain::{ContainerRef, ContainerSample, ServiceIdentity};
use crate::error::GatewayError;
use crate::ports::RuntimeGateway;

/// Measures the CPU load of one service across its running containers
#[derive(Clone)]
pub struct CpuSampler {
    gateway: Arc<dyn RuntimeGateway>,
    service: ServiceIdentity,
}

impl CpuSampler {
    pub fn new(gateway: Arc<dyn RuntimeGateway>, service: ServiceIdentity) -> Self {
        Self { gateway, service }
    }

    pub fn service(&self) -> &ServiceIdentity {
        &self.service
    }

    /// Containers in the inventory that belong to the service
    pub async fn matching_containers(&self, include_stopped: bool) -> Result<Vec<ContainerRef>, GatewayError> {
        let containers = self.gateway.list_containers(include_stopped).await?;

        Ok(containers
            .into_iter()
            .filter(|c| self.service.matches(&c.name))
            .collect())
    }

    /// Read CPU for every running container of the service.
    ///
    /// A failed read of any single container fails the whole sample.
    pub async fn sample(&self) -> Result<Vec<ContainerSample>, GatewayError> {
        let containers = self.matching_containers(false).await?;
        let mut samples = Vec::with_capacity(containers.len());

        for container in &containers {
            let sample = ContainerSample::new(container, self.gateway.cpu_fraction(container).await?);
            debug!(
                container = %sample.name,
                id = sample.id.as_str(),
                cpu = sample.cpu_fraction,
                "sampled container CPU"
            );
            samples.push(sample);
        }

        Ok(samples)
    }

    /// Mean CPU fraction across the service, 0.0 when nothing matches
    pub async fn measure_aggregate_cpu(&self) -> Result<f64, GatewayError> {
        let samples = self.sample().await?;
        Ok(aggregate_cpu(&samples))
    }
}

/// Arithmetic mean of the sampled fractions.
///
/// An empty sample is treated as an idle service.
pub fn aggregate_cpu(samples: &[ContainerSample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    samples.iter().map(|s| s.cpu_fraction).sum::<f64>() / samples.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::FakeGateway;

    fn sampler(gateway: FakeGateway) -> (Arc<FakeGateway>, CpuSampler) {
        let gateway = Arc::new(gateway);
        let sampler = CpuSampler::new(gateway.clone(), ServiceIdentity::new("my_stack", "web"));
        (gateway, sampler)
    }

    #[tokio::test]
    async fn test_mean_over_matching_containers_only() {
        let (gateway, sampler) = sampler(
            FakeGateway::new()
                .with_container("a", "/my_stack_web_1", 0.9)
                .with_container("b", "/my_stack_web_2", 0.3)
                .with_container("c", "/my_stack_db_1", 1.0),
        );

        let cpu = sampler.measure_aggregate_cpu().await.unwrap();
        assert!((cpu - 0.6).abs() < 1e-9);
        // running containers only
        assert_eq!(gateway.list_calls(), vec![false]);
    }

    #[tokio::test]
    async fn test_no_matching_containers_is_zero() {
        let (_, sampler) = sampler(
            FakeGateway::new()
                .with_container("a", "/other_web_1", 0.9)
                .with_stopped_container("b", "/my_stack_web_1"),
        );

        assert_eq!(sampler.measure_aggregate_cpu().await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_single_failed_read_fails_the_sample() {
        let (_, sampler) = sampler(
            FakeGateway::new()
                .with_container("a", "/my_stack_web_1", 0.5)
                .with_vanished_container("b", "/my_stack_web_2"),
        );

        let err = sampler.measure_aggregate_cpu().await.unwrap_err();
        assert!(matches!(err, GatewayError::RuntimeUnavailable(_)));
    }

    #[tokio::test]
    async fn test_inventory_failure_propagates() {
        let (gateway, sampler) = sampler(FakeGateway::new());
        gateway.fail_next_list(GatewayError::RuntimeUnavailable("socket closed".to_string()));

        assert!(sampler.sample().await.is_err());
        assert!(sampler.sample().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_matching_containers_can_include_stopped() {
        let (_, sampler) = sampler(
            FakeGateway::new()
                .with_container("a", "/my_stack_web_1", 0.1)
                .with_stopped_container("b", "/my_stack_web_2"),
        );

        assert_eq!(sampler.matching_containers(false).await.unwrap().len(), 1);
        assert_eq!(sampler.matching_containers(true).await.unwrap().len(), 2);
    }
}
