//! Configuration types for the boiler dashboard

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::status::ConnectionStatus;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
}

/// Remote service endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Mobile API base URL, including the `/api` prefix
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_chatbot_url")]
    pub chatbot_url: String,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
    #[serde(default = "default_history_hours")]
    pub history_hours: u32,
    #[serde(default = "default_entity_id")]
    pub entity_id: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            chatbot_url: default_chatbot_url(),
            auth_token: None,
            request_timeout: default_request_timeout(),
            history_hours: default_history_hours(),
            entity_id: default_entity_id(),
        }
    }
}

/// Refresh loop timing and retry policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Upper bound for one whole refresh batch
    #[serde(default = "default_batch_timeout", with = "humantime_serde")]
    pub batch_timeout: Duration,
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,
    #[serde(default = "default_offline_interval", with = "humantime_serde")]
    pub offline_interval: Duration,
    /// Counted failures before the dashboard goes offline
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the refresh that follows a successful command
    #[serde(default = "default_reconcile_delay", with = "humantime_serde")]
    pub reconcile_delay: Duration,
}

impl RefreshConfig {
    /// Polling interval to use while in `status`
    pub fn interval_for(&self, status: ConnectionStatus) -> Duration {
        match status {
            ConnectionStatus::Offline => self.offline_interval,
            _ => self.interval,
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            batch_timeout: default_batch_timeout(),
            interval: default_interval(),
            offline_interval: default_offline_interval(),
            max_retries: default_max_retries(),
            reconcile_delay: default_reconcile_delay(),
        }
    }
}

fn default_base_url() -> String {
    "http://192.168.1.18:8004/api".to_string()
}

fn default_chatbot_url() -> String {
    "http://192.168.1.18:8003".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_history_hours() -> u32 {
    720
}

fn default_entity_id() -> String {
    "climate.boiler".to_string()
}

fn default_batch_timeout() -> Duration {
    Duration::from_secs(8)
}

fn default_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_offline_interval() -> Duration {
    Duration::from_secs(15)
}

fn default_max_retries() -> u32 {
    3
}

fn default_reconcile_delay() -> Duration {
    Duration::from_secs(1)
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::DashboardError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Reject settings that would stall the dashboard or hammer the server
    pub fn validate(&self) -> crate::Result<()> {
        if self.refresh.max_retries == 0 {
            return Err(crate::DashboardError::Config(
                "refresh.max_retries must be at least 1".to_string(),
            ));
        }

        let durations = [
            ("api.request_timeout", self.api.request_timeout),
            ("refresh.batch_timeout", self.refresh.batch_timeout),
            ("refresh.interval", self.refresh.interval),
            ("refresh.offline_interval", self.refresh.offline_interval),
        ];
        if let Some((name, _)) = durations.iter().find(|(_, value)| value.is_zero()) {
            return Err(crate::DashboardError::Config(format!(
                "{} must be greater than zero",
                name
            )));
        }

        Ok(())
    }
}
