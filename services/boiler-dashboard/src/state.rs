//! Shared dashboard state read by the presentation layer

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::models::{
    fallback, BoilerStatus, EnergyData, RefreshResult, RoomStatus, Schedule, WindowSensor,
};
use crate::status::{ConnectionStatus, MessageUpdate, Transition};

/// Everything the dashboard renders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub boiler: BoilerStatus,
    pub room: RoomStatus,
    pub windows: Vec<WindowSensor>,
    pub schedules: Vec<Schedule>,
    pub energy: EnergyData,
    pub is_loading: bool,
    pub connection_status: ConnectionStatus,
    pub last_updated: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub retry_count: u32,
}

impl Default for DashboardSnapshot {
    fn default() -> Self {
        Self {
            boiler: fallback::boiler(),
            room: fallback::room(),
            windows: fallback::windows(),
            schedules: fallback::schedules(),
            energy: fallback::energy(),
            is_loading: true,
            connection_status: ConnectionStatus::Connecting,
            last_updated: None,
            error_message: None,
            retry_count: 0,
        }
    }
}

impl DashboardSnapshot {
    /// Store a fresh batch of remote data
    pub fn store(&mut self, result: RefreshResult, now: DateTime<Utc>) {
        self.boiler = result.boiler;
        self.room = result.room;
        self.windows = result.windows;
        self.schedules = result.schedules;
        self.energy = result.energy;
        self.last_updated = Some(now);
    }

    /// Apply a state machine transition, returning true if the status changed
    pub fn apply(&mut self, transition: Transition) -> bool {
        let changed = self.connection_status != transition.status;
        self.connection_status = transition.status;
        self.retry_count = transition.retry_count;
        match transition.message {
            MessageUpdate::Clear => self.error_message = None,
            MessageUpdate::Keep => {}
            MessageUpdate::Set(message) => self.error_message = Some(message.to_string()),
        }
        changed
    }

    /// Banner text: the error message when there is one, the status otherwise
    pub fn status_message(&self) -> String {
        match &self.error_message {
            Some(message) => message.clone(),
            None => self.connection_status.banner().to_string(),
        }
    }
}

/// Thread-safe shared state handle
pub type StateHandle = Arc<RwLock<DashboardSnapshot>>;

pub fn new_state_handle() -> StateHandle {
    Arc::new(RwLock::new(DashboardSnapshot::default()))
}
