use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::{ScalingConfig, ServiceIdentity};
use crate::error::ConfigError;

/// Telegram delivery settings
#[derive(Clone)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_ids: Vec<i64>,
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"<redacted>")
            .field("chat_ids", &self.chat_ids)
            .finish()
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub log_level: String,
    pub docker_host: Option<String>,
    pub service: ServiceIdentity,
    pub compose_project_dir: PathBuf,
    pub scaling: ScalingConfig,
    pub telegram: Option<TelegramConfig>,
    pub webhook_url: Option<String>,
}

/// Optional overrides loaded from the `DOCKSCALE_CONFIG` TOML file
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    service: ServiceSection,
    scaling: ScalingSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ServiceSection {
    project: Option<String>,
    service: Option<String>,
    project_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ScalingSection {
    interval_secs: Option<u64>,
    cpu_threshold: Option<f64>,
    min_replicas: Option<u32>,
    max_replicas: Option<u32>,
}

impl FileConfig {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let file = match var("DOCKSCALE_CONFIG") {
            Some(path) => FileConfig::load(Path::new(&path))?,
            None => FileConfig::default(),
        };

        let service = ServiceIdentity::new(
            file.service
                .project
                .or_else(|| var("COMPOSE_PROJECT"))
                .unwrap_or_else(|| "tg-scale-lab".to_string()),
            file.service
                .service
                .or_else(|| var("COMPOSE_SERVICE"))
                .unwrap_or_else(|| "web".to_string()),
        );
        let compose_project_dir = file
            .service
            .project_dir
            .or_else(|| var("COMPOSE_PROJECT_DIR").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("/tg-scale-lab"));

        let interval_secs = match file.scaling.interval_secs {
            Some(v) => v,
            None => parse_or(&var, "AUTOSCALE_INTERVAL", 30)?,
        };
        let cpu_threshold = match file.scaling.cpu_threshold {
            Some(v) => v,
            None => parse_or(&var, "CPU_THRESHOLD", 0.7)?,
        };
        let min_replicas = match file.scaling.min_replicas {
            Some(v) => v,
            None => parse_or(&var, "MIN_REPLICAS", 1)?,
        };
        let max_replicas = match file.scaling.max_replicas {
            Some(v) => v,
            None => parse_or(&var, "MAX_REPLICAS", 5)?,
        };
        let scaling = ScalingConfig::new(
            Duration::from_secs(interval_secs),
            cpu_threshold,
            min_replicas,
            max_replicas,
        )?;

        let telegram = match (var("TELEGRAM_TOKEN"), var("TELEGRAM_ALLOWED_CHATS")) {
            (None, None) => None,
            (None, Some(_)) => return Err(ConfigError::Missing("TELEGRAM_TOKEN".to_string())),
            (Some(_), None) => return Err(ConfigError::Missing("TELEGRAM_ALLOWED_CHATS".to_string())),
            (Some(token), Some(chats)) => Some(TelegramConfig {
                token,
                chat_ids: parse_chat_ids(&chats)?,
            }),
        };

        Ok(Self {
            port: parse_or(&var, "DOCKSCALE_PORT", 3000)?,
            log_level: var("DOCKSCALE_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            docker_host: var("DOCKER_HOST"),
            service,
            compose_project_dir,
            scaling,
            telegram,
            webhook_url: var("DOCKSCALE_WEBHOOK_URL"),
        })
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_chat_ids(raw: &str) -> Result<Vec<i64>, ConfigError> {
    let ids = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse().map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                key: "TELEGRAM_ALLOWED_CHATS".to_string(),
                reason: format!("{}: {}", s, e),
            })
        })
        .collect::<Result<Vec<i64>, _>>()?;

    if ids.is_empty() {
        return Err(ConfigError::Missing("TELEGRAM_ALLOWED_CHATS".to_string()));
    }
    Ok(ids)
}
