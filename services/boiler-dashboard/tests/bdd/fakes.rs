//! Shared fake backends for BDD tests

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use boiler_dashboard::api::BoilerApi;
use boiler_dashboard::io::{HttpClient, HttpResponse};
use boiler_dashboard::models::{
    fallback, BoilerStatus, EnergyData, RoomStatus, Schedule, WindowSensor,
};
use boiler_dashboard::{DashboardError, Result};

/// Mobile API whose reachability and latency can be flipped mid-scenario
#[derive(Debug)]
pub struct FakeBoilerApi {
    reachable: AtomicBool,
    accept_commands: AtomicBool,
    delay: Duration,
    water_temp: f64,
    fetches: AtomicU32,
    commands: AtomicU32,
}

impl FakeBoilerApi {
    pub fn new(reachable: bool) -> Self {
        Self {
            reachable: AtomicBool::new(reachable),
            accept_commands: AtomicBool::new(true),
            delay: Duration::ZERO,
            water_temp: 58.5,
            fetches: AtomicU32::new(0),
            commands: AtomicU32::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn set_accept_commands(&self, accept: bool) {
        self.accept_commands.store(accept, Ordering::SeqCst);
    }

    pub fn water_temp(&self) -> f64 {
        self.water_temp
    }

    /// Number of boiler status fetches, one per refresh batch
    pub fn fetch_count(&self) -> u32 {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn command_count(&self) -> u32 {
        self.commands.load(Ordering::SeqCst)
    }

    async fn answer<T>(&self, value: T) -> Result<T> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.reachable.load(Ordering::SeqCst) {
            Ok(value)
        } else {
            Err(DashboardError::Http("connection refused".to_string()))
        }
    }

    async fn command(&self) -> Result<bool> {
        self.commands.fetch_add(1, Ordering::SeqCst);
        let accepted = self.accept_commands.load(Ordering::SeqCst);
        self.answer(accepted).await
    }
}

#[async_trait]
impl BoilerApi for FakeBoilerApi {
    async fn boiler_status(&self) -> Result<BoilerStatus> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.answer(BoilerStatus {
            water_temp: self.water_temp,
            flame_on: true,
            setpoint: Some(22.0),
            enabled: Some(true),
            ..fallback::boiler()
        })
        .await
    }

    async fn room_status(&self) -> Result<RoomStatus> {
        self.answer(RoomStatus {
            current_temp: 20.4,
            target_temp: 22.0,
        })
        .await
    }

    async fn window_sensors(&self) -> Result<Vec<WindowSensor>> {
        self.answer(fallback::windows()).await
    }

    async fn schedules(&self) -> Result<Vec<Schedule>> {
        self.answer(fallback::schedules()).await
    }

    async fn energy_data(&self) -> Result<EnergyData> {
        self.answer(EnergyData::placeholder()).await
    }

    async fn set_target_temperature(&self, _temperature: f64) -> Result<bool> {
        self.command().await
    }

    async fn set_boiler_enabled(&self, _enabled: bool) -> Result<bool> {
        self.command().await
    }

    async fn check_health(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }
}

/// HTTP client answering chat requests by URL
#[derive(Debug, Default)]
pub struct FakeChatHttp {
    pub mobile_api_reply: Option<String>,
    pub chatbot_reply: Option<String>,
}

impl FakeChatHttp {
    fn reply_for(&self, url: &str) -> Option<&String> {
        if url.contains("/api/") {
            self.mobile_api_reply.as_ref()
        } else {
            self.chatbot_reply.as_ref()
        }
    }
}

#[async_trait]
impl HttpClient for FakeChatHttp {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        Err(DashboardError::Http(format!("no route for GET {}", url)))
    }

    async fn post_json(&self, url: &str, _body: &serde_json::Value) -> Result<HttpResponse> {
        match self.reply_for(url) {
            Some(text) => Ok(HttpResponse {
                status: 200,
                body: serde_json::json!({ "response": text, "validated": true }).to_string(),
            }),
            None => Err(DashboardError::Http(format!("connection refused: {}", url))),
        }
    }
}
