use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::domain::{ScalingConfig, ServiceIdentity};
use crate::error::TickError;
use crate::ports::{Notifier, RuntimeGateway};

use super::policy::next_replica_count;
use super::sampler::CpuSampler;

/// Snapshot of the autoscaler published after every tick
#[derive(Debug, Clone, Serialize)]
pub struct AutoscalerStatus {
    pub service: ServiceIdentity,
    pub running: bool,
    pub current_replicas: u32,
    pub min_replicas: u32,
    pub max_replicas: u32,
    pub cpu_threshold: f64,
    pub last_cpu_avg: Option<f64>,
    pub last_error: Option<String>,
    pub last_tick_at: Option<DateTime<Utc>>,
    pub ticks: u64,
}

impl AutoscalerStatus {
    fn stopped(service: &ServiceIdentity, config: &ScalingConfig) -> Self {
        Self {
            service: service.clone(),
            running: false,
            current_replicas: config.min_replicas(),
            min_replicas: config.min_replicas(),
            max_replicas: config.max_replicas(),
            cpu_threshold: config.cpu_threshold(),
            last_cpu_avg: None,
            last_error: None,
            last_tick_at: None,
            ticks: 0,
        }
    }
}

/// Result of a tick that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Unchanged { replicas: u32, cpu_avg: f64 },
    Scaled { from: u32, to: u32, cpu_avg: f64 },
}

/// Handle to a running control loop
struct Worker {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Lifecycle of the background loop.
///
/// `Stopping` keeps the slot occupied while `stop` awaits the task, so no
/// second loop can be spawned until the first has fully exited.
enum Lifecycle {
    Stopped,
    Running(Worker),
    Stopping,
}

/// Background CPU autoscaler for one compose service.
///
/// `start` spawns a single control loop task; `stop` signals it and waits
/// for the in-flight tick to finish. Both are safe to call repeatedly.
pub struct Autoscaler {
    service: ServiceIdentity,
    config: ScalingConfig,
    gateway: Arc<dyn RuntimeGateway>,
    notifier: Arc<dyn Notifier>,
    status: Arc<watch::Sender<AutoscalerStatus>>,
    lifecycle: Mutex<Lifecycle>,
}

impl Autoscaler {
    pub fn new(
        service: ServiceIdentity,
        config: ScalingConfig,
        gateway: Arc<dyn RuntimeGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (status, _) = watch::channel(AutoscalerStatus::stopped(&service, &config));

        Self {
            service,
            config,
            gateway,
            notifier,
            status: Arc::new(status),
            lifecycle: Mutex::new(Lifecycle::Stopped),
        }
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        let mut lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        self.reap_finished(&mut lifecycle);
        lifecycle
    }

    /// Move a loop that exited on its own (a panic) back to `Stopped`
    fn reap_finished(&self, lifecycle: &mut Lifecycle) {
        if matches!(lifecycle, Lifecycle::Running(w) if w.task.is_finished()) {
            warn!(service = %self.service, "autoscaler loop exited unexpectedly");
            *lifecycle = Lifecycle::Stopped;
            self.status.send_modify(|s| s.running = false);
        }
    }

    /// Spawn the control loop.
    ///
    /// Returns `false` if a loop is already running or still stopping.
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> bool {
        let mut lifecycle = self.lifecycle();

        match *lifecycle {
            Lifecycle::Running(_) => {
                debug!(service = %self.service, "autoscaler already running");
                return false;
            }
            Lifecycle::Stopping => {
                debug!(service = %self.service, "autoscaler is stopping, not restarting");
                return false;
            }
            Lifecycle::Stopped => {}
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let control_loop = self.control_loop();
        self.status.send_replace(AutoscalerStatus {
            running: true,
            ..AutoscalerStatus::stopped(&self.service, &self.config)
        });

        let task = tokio::spawn(control_loop.run(shutdown_rx));
        *lifecycle = Lifecycle::Running(Worker { shutdown, task });

        true
    }

    /// Request shutdown and wait for the current tick to complete.
    ///
    /// A no-op when the loop is not running or another caller is already stopping it.
    pub async fn stop(&self) {
        let worker = {
            let mut lifecycle = self.lifecycle();
            match std::mem::replace(&mut *lifecycle, Lifecycle::Stopping) {
                Lifecycle::Running(worker) => worker,
                other => {
                    *lifecycle = other;
                    return;
                }
            }
        };

        info!(service = %self.service, "stopping autoscaler");
        // Fails only if the loop already exited
        let _ = worker.shutdown.send(true);

        if let Err(e) = worker.task.await {
            if e.is_panic() {
                error!(service = %self.service, "autoscaler task panicked: {}", e);
            }
        }

        *self.lifecycle() = Lifecycle::Stopped;
        self.status.send_modify(|s| s.running = false);
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.lifecycle(), Lifecycle::Running(_))
    }

    /// Latest published status
    pub fn status(&self) -> AutoscalerStatus {
        // Clears `running` if the loop died since the last look
        drop(self.lifecycle());
        self.status.borrow().clone()
    }

    fn control_loop(&self) -> ControlLoop {
        ControlLoop {
            sampler: CpuSampler::new(self.gateway.clone(), self.service.clone()),
            gateway: self.gateway.clone(),
            notifier: self.notifier.clone(),
            service: self.service.clone(),
            config: self.config.clone(),
            current_replicas: self.config.min_replicas(),
            last_cpu_avg: None,
            ticks: 0,
            status: self.status.clone(),
        }
    }
}

/// State owned by the loop task; the only writer of `current_replicas`
struct ControlLoop {
    sampler: CpuSampler,
    gateway: Arc<dyn RuntimeGateway>,
    notifier: Arc<dyn Notifier>,
    service: ServiceIdentity,
    config: ScalingConfig,
    current_replicas: u32,
    last_cpu_avg: Option<f64>,
    ticks: u64,
    status: Arc<watch::Sender<AutoscalerStatus>>,
}

impl ControlLoop {
    async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            service = %self.service,
            interval_secs = self.config.interval().as_secs_f64(),
            cpu_threshold = self.config.cpu_threshold(),
            min_replicas = self.config.min_replicas(),
            max_replicas = self.config.max_replicas(),
            "autoscaler started"
        );

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            // Errors are reported inside tick and never end the loop
            let _ = self.tick().await;

            tokio::select! {
                _ = tokio::time::sleep(self.config.interval()) => {}
                // Stop requested, or the handle was dropped
                _ = shutdown.changed() => break,
            }
        }

        info!(service = %self.service, replicas = self.current_replicas, "autoscaler stopped");
    }

    /// Run one measure/decide/act cycle and report the outcome
    async fn tick(&mut self) -> Result<TickOutcome, TickError> {
        let result = self.evaluate().await;
        self.ticks += 1;

        if let Err(e) = &result {
            error!(service = %self.service, "Autoscaler error: {}", e);
            self.notify(&format!("Autoscaler error: {}", e)).await;
        }

        self.publish(result.as_ref().err());
        result
    }

    async fn evaluate(&mut self) -> Result<TickOutcome, TickError> {
        let cpu_avg = self
            .sampler
            .measure_aggregate_cpu()
            .await
            .map_err(TickError::Measurement)?;
        self.last_cpu_avg = Some(cpu_avg);
        info!(service = %self.service, "Autoscaler CPU avg={:.2}", cpu_avg);

        let from = self.current_replicas;
        let to = next_replica_count(from, cpu_avg, &self.config);
        if to == from {
            return Ok(TickOutcome::Unchanged { replicas: from, cpu_avg });
        }

        self.gateway
            .apply_replica_count(&self.service, to)
            .await
            .map_err(|source| TickError::Scale { target: to, source })?;

        self.current_replicas = to;
        info!(service = %self.service, from, to, cpu_avg, "scaled service");
        self.notify(&format!(
            "Autoscale: {} -> {} replicas (CPU avg={:.2})",
            from, to, cpu_avg
        ))
        .await;

        Ok(TickOutcome::Scaled { from, to, cpu_avg })
    }

    async fn notify(&self, message: &str) {
        if let Err(e) = self.notifier.send(message).await {
            warn!(service = %self.service, "Failed to send autoscaler notification: {}", e);
        }
    }

    fn publish(&self, error: Option<&TickError>) {
        self.status.send_modify(|s| {
            s.current_replicas = self.current_replicas;
            s.last_cpu_avg = self.last_cpu_avg;
            s.last_error = error.map(|e| e.to_string());
            s.last_tick_at = Some(Utc::now());
            s.ticks = self.ticks;
        });
    }
}
