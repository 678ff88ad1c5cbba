mod adapters;
mod application;
mod config;
mod domain;
mod error;
mod interface;
mod ports;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adapters::{ComposeScaler, DockerAdapter, FanoutNotifier, LogNotifier, TelegramNotifier, WebhookNotifier};
use application::{Autoscaler, CpuSampler};
use config::Config;
use interface::http::create_router;
use ports::{Notifier, RuntimeGateway};

fn build_notifier(config: &Config) -> Result<FanoutNotifier, crate::error::NotifyError> {
    let mut notifier = FanoutNotifier::new().with_channel(Arc::new(LogNotifier));

    if let Some(telegram) = &config.telegram {
        notifier = notifier.with_channel(Arc::new(TelegramNotifier::new(
            telegram.token.clone(),
            telegram.chat_ids.clone(),
        )?));
        info!("✓ Telegram notifications enabled for {} chat(s)", telegram.chat_ids.len());
    }

    if let Some(url) = &config.webhook_url {
        notifier = notifier.with_channel(Arc::new(WebhookNotifier::new(url.clone())?));
        info!("✓ Webhook notifications enabled");
    }

    Ok(notifier)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("dockscale={},tower_http=info", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting dockscale v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {:?}", config);

    // Initialize adapters
    let compose = ComposeScaler::new(config.compose_project_dir.clone());
    info!("Compose project directory: {}", compose.project_dir().display());

    let docker = match DockerAdapter::connect(config.docker_host.as_deref(), compose) {
        Ok(adapter) => adapter,
        Err(e) => {
            error!("✗ Failed to connect to Docker: {}", e);
            return Err(e);
        }
    };
    match docker.ping().await {
        Ok(()) => info!("✓ Connected to Docker daemon"),
        // The loop reports outages itself, keep going
        Err(e) => warn!("⚠ Docker daemon not responding yet: {}", e),
    }
    let gateway: Arc<dyn RuntimeGateway> = Arc::new(docker);

    let notifier: Arc<dyn Notifier> = Arc::new(build_notifier(&config)?);

    // Start the autoscaler
    let autoscaler = Arc::new(Autoscaler::new(
        config.service.clone(),
        config.scaling.clone(),
        gateway.clone(),
        notifier,
    ));
    autoscaler.start();
    info!(
        "✓ Autoscaler watching {} (containers prefixed {})",
        config.service,
        config.service.container_prefix()
    );

    // Create HTTP server
    let app = create_router(
        autoscaler.clone(),
        CpuSampler::new(gateway, config.service.clone()),
    );
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("✓ dockscale listening on {}", addr);
    info!("  → Status: http://localhost:{}/api/autoscaler", config.port);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if autoscaler.is_running() {
        info!("Stopping autoscaler");
        autoscaler.stop().await;
    } else {
        warn!("Autoscaler loop was no longer running at shutdown");
    }
    info!("Autoscaler stopped at {} replica(s)", autoscaler.status().current_replicas);

    served?;
    Ok(())
}
