//! Mobile API client for boiler status and control

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::ApiConfig;
use crate::io::{HttpClient, HttpResponse};
use crate::models::{BoilerStatus, EnergyData, RoomStatus, Schedule, WindowSensor};
use crate::DashboardError;

/// Remote operations the dashboard depends on
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait BoilerApi: Send + Sync {
    async fn boiler_status(&self) -> crate::Result<BoilerStatus>;

    async fn room_status(&self) -> crate::Result<RoomStatus>;

    async fn window_sensors(&self) -> crate::Result<Vec<WindowSensor>>;

    async fn schedules(&self) -> crate::Result<Vec<Schedule>>;

    async fn energy_data(&self) -> crate::Result<EnergyData>;

    /// Request a new target temperature; `Ok(false)` means the server declined
    async fn set_target_temperature(&self, temperature: f64) -> crate::Result<bool>;

    /// Switch the boiler on or off; `Ok(false)` means the server declined
    async fn set_boiler_enabled(&self, enabled: bool) -> crate::Result<bool>;

    async fn check_health(&self) -> bool;
}

/// `BoilerApi` over the REST mobile API
pub struct MobileApiClient {
    base_url: String,
    history_hours: u32,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for MobileApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MobileApiClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl MobileApiClient {
    pub fn new(config: &ApiConfig, http: Arc<dyn HttpClient>) -> Self {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        tracing::debug!("Created MobileApiClient at {}", base_url);
        Self {
            base_url,
            history_hours: config.history_hours,
            http,
        }
    }

    /// AI maintenance report covering the last `hours`, passed through as raw JSON
    pub async fn maintenance_report(&self, hours: u32) -> crate::Result<Value> {
        self.get_json(&format!("/maintenance/report?hours={}", hours))
            .await
    }

    /// Health endpoint lives at the service root, outside `/api`
    fn health_url(&self) -> String {
        let root = self.base_url.strip_suffix("/api").unwrap_or(&self.base_url);
        format!("{}/health", root)
    }

    async fn get_json(&self, path: &str) -> crate::Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.get(&url).await?;
        parse_json(&url, response)
    }

    async fn post_command(&self, path: &str, body: Value) -> crate::Result<bool> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.post_json(&url, &body).await?;
        let value = parse_json(&url, response)?;
        Ok(value.get("success").and_then(Value::as_bool) == Some(true))
    }
}

fn parse_json(url: &str, response: HttpResponse) -> crate::Result<Value> {
    if !response.is_success() {
        tracing::debug!("Non-2xx response from {}: status={}", url, response.status);
        return Err(DashboardError::Status {
            url: url.to_string(),
            status: response.status,
        });
    }
    Ok(serde_json::from_str(&response.body)?)
}

#[async_trait]
impl BoilerApi for MobileApiClient {
    async fn boiler_status(&self) -> crate::Result<BoilerStatus> {
        let value = self.get_json("/boiler/status").await?;
        Ok(BoilerStatus::from_wire(&value))
    }

    async fn room_status(&self) -> crate::Result<RoomStatus> {
        let environment = self.get_json("/environment").await?;
        let boiler = self.boiler_status().await?;
        Ok(RoomStatus::from_wire(&environment, boiler.setpoint))
    }

    async fn window_sensors(&self) -> crate::Result<Vec<WindowSensor>> {
        let environment = self.get_json("/environment").await?;
        Ok(WindowSensor::list_from_wire(&environment))
    }

    async fn schedules(&self) -> crate::Result<Vec<Schedule>> {
        let value = self.get_json("/schedules").await?;
        Ok(Schedule::list_from_wire(&value))
    }

    async fn energy_data(&self) -> crate::Result<EnergyData> {
        let path = format!("/history?hours={}", self.history_hours);
        let _history = self.get_json(&path).await?;
        // TODO: derive monthly figures from the history series once the backend defines units
        Ok(EnergyData::placeholder())
    }

    async fn set_target_temperature(&self, temperature: f64) -> crate::Result<bool> {
        tracing::debug!("Setting target temperature to {}", temperature);
        self.post_command(
            "/boiler/set_temperature",
            json!({ "temperature": temperature }),
        )
        .await
    }

    async fn set_boiler_enabled(&self, enabled: bool) -> crate::Result<bool> {
        let path = if enabled {
            "/boiler/turn_on"
        } else {
            "/boiler/turn_off"
        };
        self.post_command(path, json!({})).await
    }

    async fn check_health(&self) -> bool {
        let url = self.health_url();
        match self.http.get(&url).await {
            Ok(response) => response.is_success(),
            Err(e) => {
                tracing::debug!("Health check failed: {}", e);
                false
            }
        }
    }
}
