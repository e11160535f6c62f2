//! Boiler Dashboard - connectivity and refresh controller for a heating boiler
//!
//! Polls the boiler mobile API, tracks whether the server is reachable, and
//! exposes the latest readings plus a connection status to the presentation layer.

pub mod api;
pub mod chat;
pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod io;
pub mod models;
pub mod state;
pub mod status;

pub use config::{load_config, Config};
pub use controller::{DashboardController, RefreshOutcome};
pub use error::{DashboardError, Result};
pub use state::DashboardSnapshot;
pub use status::ConnectionStatus;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::api::MobileApiClient;
use crate::clock::SystemClock;
use crate::io::ReqwestHttpClient;

/// Build a controller wired to the real mobile API
pub fn build_controller(config: &Config, cancel: CancellationToken) -> Result<DashboardController> {
    let http: Arc<dyn io::HttpClient> = Arc::new(ReqwestHttpClient::new(
        config.api.request_timeout,
        config.api.auth_token.clone(),
    )?);
    let api = Arc::new(MobileApiClient::new(&config.api, http));

    Ok(DashboardController::new(
        api,
        Arc::new(SystemClock),
        config.refresh.clone(),
        state::new_state_handle(),
        cancel,
    ))
}

/// Perform a single refresh and return the resulting snapshot
pub async fn refresh_once(config: Config) -> Result<DashboardSnapshot> {
    let controller = build_controller(&config, CancellationToken::new())?;
    let outcome = controller.refresh().await;
    tracing::debug!("Single refresh finished: {:?}", outcome);
    Ok(controller.snapshot().await)
}

/// Send one message to the boiler assistant
pub async fn send_chat(config: &Config, message: &str) -> Result<chat::ChatReply> {
    let http: Arc<dyn io::HttpClient> = Arc::new(ReqwestHttpClient::new(
        config.api.request_timeout,
        config.api.auth_token.clone(),
    )?);
    let reply = chat::ChatService::new(&config.api, http).send(message).await?;
    tracing::debug!("Chat reply from {:?}", reply.source);
    Ok(reply)
}

/// Fetch the AI maintenance report for the last `hours`
pub async fn maintenance_report(config: &Config, hours: u32) -> Result<serde_json::Value> {
    let http: Arc<dyn io::HttpClient> = Arc::new(ReqwestHttpClient::new(
        config.api.request_timeout,
        config.api.auth_token.clone(),
    )?);
    MobileApiClient::new(&config.api, http)
        .maintenance_report(hours)
        .await
}

/// Run the dashboard controller until ctrl-c
pub async fn run(config: Config) -> Result<()> {
    let cancel = CancellationToken::new();
    let controller = build_controller(&config, cancel)?;

    // Setup shutdown handler
    let controller_for_signal = controller.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => tracing::error!("Failed to listen for ctrl-c: {}", e),
        }
        controller_for_signal.shutdown().await;
    });

    tracing::info!("Boiler dashboard started");
    drive(controller, config.api.base_url).await;
    tracing::info!("Boiler dashboard stopped");
    Ok(())
}

/// Run the refresh loop until the controller is shut down.
///
/// The health check and the change reporter run alongside; the first refresh
/// starts at once.
async fn drive(controller: DashboardController, base_url: String) {
    let health = controller.clone();
    tokio::spawn(async move {
        if health.check_health().await {
            tracing::info!("Mobile API at {} is healthy", base_url);
        } else {
            tracing::warn!("Mobile API at {} failed its health check", base_url);
        }
    });

    let cancel = CancellationToken::new();
    let reporter = tokio::spawn(report_changes(controller.subscribe(), cancel.clone()));

    controller.run().await;

    cancel.cancel();
    if let Err(e) = reporter.await {
        tracing::debug!("Change reporter ended abnormally: {}", e);
    }
}

/// Log every status or message change, the way a status bar would show it
async fn report_changes(
    mut changes: tokio::sync::watch::Receiver<DashboardSnapshot>,
    cancel: CancellationToken,
) {
    let mut last: Option<(ConnectionStatus, Option<String>)> = None;
    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = cancel.cancelled() => break,
        }

        let snapshot = changes.borrow_and_update().clone();
        let current = (snapshot.connection_status, snapshot.error_message.clone());
        if last.as_ref() == Some(&current) {
            tracing::debug!("Dashboard data updated at {:?}", snapshot.last_updated);
            continue;
        }

        tracing::info!(
            "[{}] {} (water {:.1}°C, room {:.1}°C -> {:.1}°C)",
            snapshot.connection_status,
            snapshot.status_message(),
            snapshot.boiler.water_temp,
            snapshot.room.current_temp,
            snapshot.room.target_temp
        );
        last = Some(current);
    }
}
