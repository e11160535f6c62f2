//! Controller: refreshes dashboard data and drives the connection state machine

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::BoilerApi;
use crate::clock::Clock;
use crate::config::RefreshConfig;
use crate::models::RefreshResult;
use crate::state::{DashboardSnapshot, StateHandle};
use crate::status::{next_transition, ConnectionStatus};
use crate::DashboardError;

/// Message shown when a command is attempted while offline
pub const OFFLINE_COMMAND_MESSAGE: &str = "Cannot send commands while offline";

/// What a call to [`DashboardController::refresh`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// All resources were fetched and stored
    Updated,
    /// The batch failed; cached data was kept
    Failed(String),
    /// Another refresh was already in flight
    Skipped,
}

struct Inner {
    api: Arc<dyn BoilerApi>,
    clock: Arc<dyn Clock>,
    config: RefreshConfig,
    state: StateHandle,
    changes: watch::Sender<DashboardSnapshot>,
    in_flight: AtomicBool,
    idle: Notify,
    cancel: CancellationToken,
    reconcile: Mutex<Option<JoinHandle<()>>>,
}

/// Clears the in-flight flag when a refresh finishes or is dropped midway,
/// then wakes anyone waiting for the controller to go idle
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
    idle: &'a Notify,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        self.idle.notify_waiters();
    }
}

/// Owns the connection status and keeps the dashboard data fresh.
///
/// Cloning is cheap and every clone drives the same state.
#[derive(Clone)]
pub struct DashboardController {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for DashboardController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardController")
            .field("config", &self.inner.config)
            .field("in_flight", &self.inner.in_flight.load(Ordering::Acquire))
            .finish()
    }
}

impl DashboardController {
    pub fn new(
        api: Arc<dyn BoilerApi>,
        clock: Arc<dyn Clock>,
        config: RefreshConfig,
        state: StateHandle,
        cancel: CancellationToken,
    ) -> Self {
        let initial = state
            .try_read()
            .map(|snapshot| snapshot.clone())
            .unwrap_or_default();
        let (changes, _) = watch::channel(initial);

        Self {
            inner: Arc::new(Inner {
                api,
                clock,
                config,
                state,
                changes,
                in_flight: AtomicBool::new(false),
                idle: Notify::new(),
                cancel,
                reconcile: Mutex::new(None),
            }),
        }
    }

    pub fn state(&self) -> StateHandle {
        Arc::clone(&self.inner.state)
    }

    /// Receive a copy of the snapshot every time the controller changes it
    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.inner.changes.subscribe()
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        self.inner.state.read().await.clone()
    }

    pub async fn connection_status(&self) -> ConnectionStatus {
        self.inner.state.read().await.connection_status
    }

    pub async fn status_message(&self) -> String {
        self.inner.state.read().await.status_message()
    }

    pub async fn check_health(&self) -> bool {
        self.inner.api.check_health().await
    }

    /// Mutate the shared state under the write lock and publish the result to subscribers
    async fn update<R>(&self, mutate: impl FnOnce(&mut DashboardSnapshot) -> R) -> R {
        let mut state = self.inner.state.write().await;
        let result = mutate(&mut state);
        self.inner.changes.send_if_modified(|published| {
            if *published == *state {
                false
            } else {
                *published = state.clone();
                true
            }
        });
        result
    }

    /// Fetch all resources as one batch and feed the outcome into the state machine.
    ///
    /// Never fails: errors become a status change. Returns `Skipped` without
    /// touching the network when another refresh is still running.
    pub async fn refresh(&self) -> RefreshOutcome {
        if self.inner.in_flight.swap(true, Ordering::AcqRel) {
            tracing::debug!("Refresh already in flight, skipping");
            return RefreshOutcome::Skipped;
        }
        let _guard = InFlightGuard {
            flag: &self.inner.in_flight,
            idle: &self.inner.idle,
        };

        let fetched = self.fetch_all().await;
        let now = self.inner.clock.now();
        let max_retries = self.inner.config.max_retries;

        self.update(|state| {
            let previous = state.connection_status;
            let transition =
                next_transition(previous, fetched.is_ok(), state.retry_count, max_retries);

            let outcome = match fetched {
                Ok(result) => {
                    state.store(result, now);
                    RefreshOutcome::Updated
                }
                Err(e) => {
                    tracing::warn!("Error refreshing data: {}", e);
                    RefreshOutcome::Failed(e.to_string())
                }
            };

            if state.apply(transition) {
                tracing::info!(
                    "Connection status {} -> {} (retries={})",
                    previous,
                    transition.status,
                    transition.retry_count
                );
            }
            state.is_loading = false;

            outcome
        })
        .await
    }

    /// Refresh once, waiting for a refresh already in flight to finish first.
    ///
    /// The in-flight batch may have been fetched before the latest command
    /// landed, so its result cannot stand in for this one.
    async fn refresh_after_in_flight(&self) -> RefreshOutcome {
        loop {
            let idle = self.inner.idle.notified();
            tokio::pin!(idle);
            idle.as_mut().enable();

            match self.refresh().await {
                RefreshOutcome::Skipped => {
                    tracing::debug!("Waiting for the in-flight refresh before reconciling");
                    idle.await;
                }
                outcome => return outcome,
            }
        }
    }

    /// Issue the five fetches concurrently, bounded by the batch timeout.
    ///
    /// On timeout or on the first error the joined future is dropped, which
    /// cancels every fetch still pending.
    async fn fetch_all(&self) -> crate::Result<RefreshResult> {
        let api = &self.inner.api;
        let batch = async {
            let (boiler, room, windows, schedules, energy) = tokio::try_join!(
                api.boiler_status(),
                api.room_status(),
                api.window_sensors(),
                api.schedules(),
                api.energy_data(),
            )?;
            Ok::<_, DashboardError>(RefreshResult {
                boiler,
                room,
                windows,
                schedules,
                energy,
            })
        };

        match tokio::time::timeout(self.inner.config.batch_timeout, batch).await {
            Ok(result) => result,
            Err(_) => Err(DashboardError::Timeout),
        }
    }

    /// Reset the retry counter and try again right away
    pub async fn retry_connection(&self) -> RefreshOutcome {
        self.update(|state| {
            state.retry_count = 0;
            state.error_message = None;
            state.connection_status = ConnectionStatus::Connecting;
        })
        .await;
        tracing::info!("Manual retry requested");
        self.refresh().await
    }

    /// Ask the boiler for a new target temperature.
    ///
    /// On success the local target is updated at once and a refresh is
    /// scheduled to pick up what the server actually applied.
    pub async fn set_target_temperature(&self, temperature: f64) -> crate::Result<()> {
        self.ensure_online().await?;
        let result = self.inner.api.set_target_temperature(temperature).await;
        self.finish_command("set temperature", result, |state| {
            state.room.target_temp = temperature;
        })
        .await
    }

    /// Switch the boiler on or off
    pub async fn set_boiler_enabled(&self, enabled: bool) -> crate::Result<()> {
        self.ensure_online().await?;
        let result = self.inner.api.set_boiler_enabled(enabled).await;
        let action = if enabled {
            "turn boiler on"
        } else {
            "turn boiler off"
        };
        self.finish_command(action, result, |state| {
            state.boiler.enabled = Some(enabled);
        })
        .await
    }

    async fn ensure_online(&self) -> crate::Result<()> {
        self.update(|state| {
            if state.connection_status == ConnectionStatus::Offline {
                state.error_message = Some(OFFLINE_COMMAND_MESSAGE.to_string());
                return Err(DashboardError::Offline);
            }
            Ok(())
        })
        .await
    }

    async fn finish_command(
        &self,
        action: &str,
        result: crate::Result<bool>,
        apply: impl FnOnce(&mut DashboardSnapshot),
    ) -> crate::Result<()> {
        match result {
            Ok(true) => {
                tracing::info!("Command '{}' accepted", action);
                self.update(apply).await;
                self.schedule_reconcile().await;
                Ok(())
            }
            Ok(false) => {
                tracing::warn!("Command '{}' declined by server", action);
                self.update(|state| state.error_message = Some(format!("Failed to {}", action)))
                    .await;
                Err(DashboardError::Command(format!("server declined {}", action)))
            }
            Err(e) => {
                tracing::warn!("Command '{}' failed: {}", action, e);
                self.update(|state| state.error_message = Some(format!("Failed to {}", action)))
                    .await;
                Err(e)
            }
        }
    }

    /// Refresh once after the reconcile delay, replacing any pending one
    async fn schedule_reconcile(&self) {
        let controller = self.clone();
        let delay = self.inner.config.reconcile_delay;
        let cancel = self.inner.cancel.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                outcome = async {
                    tokio::time::sleep(delay).await;
                    controller.refresh_after_in_flight().await
                } => {
                    tracing::debug!("Reconciled after command: {:?}", outcome);
                }
                _ = cancel.cancelled() => {}
            }
        });

        if let Some(previous) = self.inner.reconcile.lock().await.replace(handle) {
            previous.abort();
        }
    }

    /// Refresh now, then on the configured interval until shut down
    pub async fn run(&self) {
        tracing::info!("Refresh loop started");
        let cancel = &self.inner.cancel;

        loop {
            tokio::select! {
                _ = self.refresh() => {}
                _ = cancel.cancelled() => break,
            }

            let interval = self
                .inner
                .config
                .interval_for(self.connection_status().await);
            tracing::debug!("Next refresh in {:?}", interval);

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = cancel.cancelled() => break,
            }
        }

        tracing::info!("Refresh loop stopped");
    }

    /// Stop the refresh loop and any pending reconcile refresh
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        if let Some(handle) = self.inner.reconcile.lock().await.take() {
            handle.abort();
        }
    }
}
