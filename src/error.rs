use thiserror::Error;

/// Failures reported by the container runtime gateway
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("container runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    #[error("compose scale failed: {0}")]
    ScaleFailed(String),
}

/// Recoverable failure of a single autoscaler tick
#[derive(Debug, Clone, Error)]
pub enum TickError {
    #[error("measurement failed: {0}")]
    Measurement(#[source] GatewayError),

    #[error("scale to {target} replicas failed: {source}")]
    Scale {
        target: u32,
        #[source]
        source: GatewayError,
    },
}

/// Invalid or missing configuration; fatal at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(String),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Invalid scaling config: {0}")]
    Scaling(String),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Notification could not be delivered; never escalated past the notifier caller
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Delivery rejected: {0}")]
    Rejected(String),
}
