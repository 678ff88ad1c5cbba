//! In-memory port implementations for driving the sampler and controller in tests.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{ContainerRef, ContainerState, ServiceIdentity};
use crate::error::{GatewayError, NotifyError};
use crate::ports::{Notifier, RuntimeGateway};

#[derive(Default)]
pub struct FakeGateway {
    containers: Mutex<Vec<ContainerRef>>,
    cpu: Mutex<HashMap<String, f64>>,
    list_failures: Mutex<VecDeque<GatewayError>>,
    scale_failures: Mutex<VecDeque<GatewayError>>,
    list_calls: Mutex<Vec<bool>>,
    scale_calls: Mutex<Vec<(ServiceIdentity, u32)>>,
    scale_delay: Option<Duration>,
    scales_in_flight: AtomicUsize,
    max_scales_in_flight: AtomicUsize,
    panic_on_list: AtomicBool,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_container(self, id: &str, name: &str, cpu: f64) -> Self {
        self.containers
            .lock()
            .unwrap()
            .push(ContainerRef::new(id, name, ContainerState::Running).with_status("Up"));
        self.cpu.lock().unwrap().insert(id.to_string(), cpu);
        self
    }

    pub fn with_stopped_container(self, id: &str, name: &str) -> Self {
        self.containers
            .lock()
            .unwrap()
            .push(ContainerRef::new(id, name, ContainerState::Stopped).with_status("Exited (0)"));
        self
    }

    /// Register a running container whose stats lookup fails
    pub fn with_vanished_container(self, id: &str, name: &str) -> Self {
        self.containers
            .lock()
            .unwrap()
            .push(ContainerRef::new(id, name, ContainerState::Running));
        self
    }

    /// Make every `apply_replica_count` take `delay` before returning
    pub fn with_scale_delay(mut self, delay: Duration) -> Self {
        self.scale_delay = Some(delay);
        self
    }

    /// Make the next `list_containers` call panic, killing whichever task runs it
    pub fn panic_on_next_list(&self) {
        self.panic_on_list.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_list(&self, error: GatewayError) {
        self.list_failures.lock().unwrap().push_back(error);
    }

    pub fn fail_next_scale(&self, error: GatewayError) {
        self.scale_failures.lock().unwrap().push_back(error);
    }

    pub fn list_calls(&self) -> Vec<bool> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn scale_calls(&self) -> Vec<u32> {
        self.scale_calls.lock().unwrap().iter().map(|(_, n)| *n).collect()
    }

    pub fn scaled_services(&self) -> Vec<ServiceIdentity> {
        self.scale_calls.lock().unwrap().iter().map(|(s, _)| s.clone()).collect()
    }

    pub fn scales_in_flight(&self) -> usize {
        self.scales_in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of overlapping `apply_replica_count` calls seen so far
    pub fn max_scales_in_flight(&self) -> usize {
        self.max_scales_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RuntimeGateway for FakeGateway {
    async fn list_containers(&self, include_stopped: bool) -> Result<Vec<ContainerRef>, GatewayError> {
        self.list_calls.lock().unwrap().push(include_stopped);
        if self.panic_on_list.swap(false, Ordering::SeqCst) {
            panic!("container listing blew up");
        }
        if let Some(error) = self.list_failures.lock().unwrap().pop_front() {
            return Err(error);
        }

        Ok(self
            .containers
            .lock()
            .unwrap()
            .iter()
            .filter(|c| include_stopped || c.state.is_running())
            .cloned()
            .collect())
    }

    async fn cpu_fraction(&self, container: &ContainerRef) -> Result<f64, GatewayError> {
        self.cpu
            .lock()
            .unwrap()
            .get(container.id.as_str())
            .copied()
            .ok_or_else(|| {
                GatewayError::RuntimeUnavailable(format!("No such container: {}", container.id.as_str()))
            })
    }

    async fn apply_replica_count(&self, service: &ServiceIdentity, count: u32) -> Result<(), GatewayError> {
        self.scale_calls.lock().unwrap().push((service.clone(), count));

        let in_flight = self.scales_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_scales_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        if let Some(delay) = self.scale_delay {
            tokio::time::sleep(delay).await;
        }
        self.scales_in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.scale_failures.lock().unwrap().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
    failing: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every message but reports each delivery as failed
    pub fn failing() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        self.messages.lock().unwrap().push(message.to_string());
        if self.failing {
            return Err(NotifyError::Rejected("channel down".to_string()));
        }
        Ok(())
    }
}

/// Poll `condition` until it holds, panicking after two seconds
pub async fn wait_until<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not met in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Await `fut`, panicking if it takes longer than one second
pub async fn promptly<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(1), fut)
        .await
        .expect("operation did not complete promptly")
}
