//! BDD step definitions for connectivity feature

use std::sync::Arc;
use std::time::Duration;

use cucumber::{given, then, when};
use tokio_util::sync::CancellationToken;

use boiler_dashboard::clock::SystemClock;
use boiler_dashboard::config::RefreshConfig;
use boiler_dashboard::state::new_state_handle;
use boiler_dashboard::{ConnectionStatus, DashboardController, RefreshOutcome};

use crate::fakes::FakeBoilerApi;
use crate::world::DashboardWorld;

fn parse_status(s: &str) -> ConnectionStatus {
    match s {
        "connected" => ConnectionStatus::Connected,
        "connecting" => ConnectionStatus::Connecting,
        "offline" => ConnectionStatus::Offline,
        "error" => ConnectionStatus::Error,
        other => panic!("Unknown connection status: {}", other),
    }
}

/// Production intervals with the timeouts shrunk so scenarios run in real time
fn scenario_refresh_config() -> RefreshConfig {
    RefreshConfig {
        batch_timeout: Duration::from_millis(100),
        reconcile_delay: Duration::from_millis(50),
        ..RefreshConfig::default()
    }
}

pub fn install_api(world: &mut DashboardWorld, api: FakeBoilerApi) {
    let api = Arc::new(api);
    let config = scenario_refresh_config();
    world.controller = Some(DashboardController::new(
        api.clone(),
        Arc::new(SystemClock),
        config.clone(),
        new_state_handle(),
        CancellationToken::new(),
    ));
    world.refresh_config = Some(config);
    world.api = Some(api);
}

#[given("a reachable mobile API")]
async fn reachable_api(world: &mut DashboardWorld) {
    install_api(world, FakeBoilerApi::new(true));
}

#[given("an unreachable mobile API")]
async fn unreachable_api(world: &mut DashboardWorld) {
    install_api(world, FakeBoilerApi::new(false));
}

#[given(expr = "a mobile API that answers after {int} milliseconds")]
async fn slow_api(world: &mut DashboardWorld, millis: u64) {
    install_api(
        world,
        FakeBoilerApi::new(true).with_delay(Duration::from_millis(millis)),
    );
}

#[given("the dashboard has refreshed")]
async fn has_refreshed(world: &mut DashboardWorld) {
    world.last_outcome = Some(world.controller().refresh().await);
    world.cached_water_temp = Some(world.controller().snapshot().await.boiler.water_temp);
}

#[given(expr = "the dashboard has refreshed {int} times")]
async fn has_refreshed_times(world: &mut DashboardWorld, times: u32) {
    for _ in 0..times {
        world.last_outcome = Some(world.controller().refresh().await);
    }
}

#[when("the mobile API becomes unreachable")]
async fn api_goes_down(world: &mut DashboardWorld) {
    world.api().set_reachable(false);
}

#[when("the mobile API becomes reachable")]
async fn api_comes_back(world: &mut DashboardWorld) {
    world.api().set_reachable(true);
}

#[when("the dashboard refreshes")]
async fn dashboard_refreshes(world: &mut DashboardWorld) {
    world.last_outcome = Some(world.controller().refresh().await);
}

#[when("the user retries the connection")]
async fn user_retries(world: &mut DashboardWorld) {
    world.last_outcome = Some(world.controller().retry_connection().await);
}

#[then(expr = "the connection status should be {string}")]
async fn connection_status_is(world: &mut DashboardWorld, expected: String) {
    assert_eq!(
        world.controller().connection_status().await,
        parse_status(&expected)
    );
}

#[then(expr = "the retry count should be {int}")]
async fn retry_count_is(world: &mut DashboardWorld, expected: u32) {
    assert_eq!(world.controller().snapshot().await.retry_count, expected);
}

#[then("the last updated time should be set")]
async fn last_updated_set(world: &mut DashboardWorld) {
    assert!(world.controller().snapshot().await.last_updated.is_some());
}

#[then("there should be no error message")]
async fn no_error_message(world: &mut DashboardWorld) {
    assert_eq!(world.controller().snapshot().await.error_message, None);
}

#[then(expr = "the error message should be {string}")]
async fn error_message_is(world: &mut DashboardWorld, expected: String) {
    assert_eq!(
        world.controller().snapshot().await.error_message,
        Some(expected)
    );
}

#[then("the cached boiler data should be unchanged")]
async fn cached_data_unchanged(world: &mut DashboardWorld) {
    let snapshot = world.controller().snapshot().await;
    assert_eq!(Some(snapshot.boiler.water_temp), world.cached_water_temp);
    assert_eq!(snapshot.boiler.water_temp, world.api().water_temp());
    assert!(snapshot.last_updated.is_some());
}

#[then(expr = "the refresh should fail with {string}")]
async fn refresh_failed_with(world: &mut DashboardWorld, expected: String) {
    assert_eq!(world.last_outcome, Some(RefreshOutcome::Failed(expected)));
}

#[then(expr = "the polling interval should be {int} seconds")]
async fn polling_interval_is(world: &mut DashboardWorld, seconds: u64) {
    let status = world.controller().connection_status().await;
    let config = world
        .refresh_config
        .as_ref()
        .expect("refresh config not set");
    assert_eq!(config.interval_for(status), Duration::from_secs(seconds));
}
