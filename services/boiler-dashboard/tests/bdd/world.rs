//! BDD test world for the boiler dashboard

use std::sync::Arc;

use boiler_dashboard::chat::ChatReply;
use boiler_dashboard::config::RefreshConfig;
use boiler_dashboard::{DashboardController, RefreshOutcome};
use cucumber::World;

use crate::fakes::{FakeBoilerApi, FakeChatHttp};

#[derive(Debug, Default, World)]
pub struct DashboardWorld {
    // Controller testing
    pub api: Option<Arc<FakeBoilerApi>>,
    pub refresh_config: Option<RefreshConfig>,
    pub controller: Option<DashboardController>,
    pub last_outcome: Option<RefreshOutcome>,
    pub cached_water_temp: Option<f64>,

    // Command testing
    pub command_result: Option<boiler_dashboard::Result<()>>,
    pub fetches_at_command: u32,

    // Chat testing
    pub chat_http: Option<FakeChatHttp>,
    pub chat_result: Option<boiler_dashboard::Result<ChatReply>>,
}

impl DashboardWorld {
    pub fn controller(&self) -> &DashboardController {
        self.controller
            .as_ref()
            .expect("controller should be built in a Given step")
    }

    pub fn api(&self) -> &FakeBoilerApi {
        self.api
            .as_deref()
            .expect("mobile API should be set up in a Given step")
    }
}
