//! BDD step definitions for boiler command feature

use std::time::Duration;

use cucumber::{given, then, when};

use crate::fakes::FakeBoilerApi;
use crate::steps::connectivity_steps::install_api;
use crate::world::DashboardWorld;

#[given("a reachable mobile API that declines commands")]
async fn declining_api(world: &mut DashboardWorld) {
    let api = FakeBoilerApi::new(true);
    api.set_accept_commands(false);
    install_api(world, api);
}

#[when(expr = "the user sets the target temperature to {float}")]
async fn user_sets_temperature(world: &mut DashboardWorld, temperature: f64) {
    world.fetches_at_command = world.api().fetch_count();
    world.command_result = Some(world.controller().set_target_temperature(temperature).await);
}

#[when("the user turns the boiler off")]
async fn user_turns_boiler_off(world: &mut DashboardWorld) {
    world.fetches_at_command = world.api().fetch_count();
    world.command_result = Some(world.controller().set_boiler_enabled(false).await);
}

#[then("the command should succeed")]
async fn command_succeeds(world: &mut DashboardWorld) {
    let result = world.command_result.as_ref().expect("no command sent");
    assert!(result.is_ok(), "command failed: {:?}", result);
}

#[then("the command should fail")]
async fn command_fails(world: &mut DashboardWorld) {
    let result = world.command_result.as_ref().expect("no command sent");
    assert!(result.is_err(), "command unexpectedly succeeded");
}

#[then(expr = "the room target temperature should be {float}")]
async fn room_target_is(world: &mut DashboardWorld, expected: f64) {
    let snapshot = world.controller().snapshot().await;
    assert!(
        (snapshot.room.target_temp - expected).abs() < f64::EPSILON,
        "target was {}",
        snapshot.room.target_temp
    );
}

#[then("the boiler should be disabled")]
async fn boiler_disabled(world: &mut DashboardWorld) {
    assert_eq!(world.controller().snapshot().await.boiler.enabled, Some(false));
}

#[then("a reconciling refresh should follow")]
async fn reconciling_refresh_follows(world: &mut DashboardWorld) {
    let delay = world
        .refresh_config
        .as_ref()
        .expect("refresh config not set")
        .reconcile_delay;
    tokio::time::sleep(delay * 4 + Duration::from_millis(50)).await;
    assert_eq!(world.api().fetch_count(), world.fetches_at_command + 1);
}

#[then("no command should have reached the mobile API")]
async fn no_command_sent(world: &mut DashboardWorld) {
    assert_eq!(world.api().command_count(), 0);
}
