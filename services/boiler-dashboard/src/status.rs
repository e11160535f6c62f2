//! Connection status and the refresh state machine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Message shown when a connected dashboard loses the server
pub const LOST_CONNECTION_MESSAGE: &str = "Connection lost, using cached data";

/// Message shown once the dashboard gives up and goes offline
pub const OFFLINE_MESSAGE: &str = "Server unreachable, offline mode";

/// Connection status of the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Connecting,
    Connected,
    Error,
    Offline,
}

impl ConnectionStatus {
    /// Banner text for the status bar
    pub fn banner(&self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Connecting => "Connecting...",
            ConnectionStatus::Error => "Connection error",
            ConnectionStatus::Offline => "Offline",
        }
    }

    /// Whether the status bar should offer a manual retry
    pub fn offers_retry(&self) -> bool {
        matches!(self, ConnectionStatus::Error | ConnectionStatus::Offline)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Connecting => write!(f, "connecting"),
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Error => write!(f, "error"),
            ConnectionStatus::Offline => write!(f, "offline"),
        }
    }
}

/// What a transition does to the user-facing error message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageUpdate {
    Clear,
    Keep,
    Set(&'static str),
}

/// Result of feeding one refresh outcome into the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub status: ConnectionStatus,
    pub retry_count: u32,
    pub message: MessageUpdate,
}

/// Compute the next status from the previous status, the refresh outcome and
/// the current retry count.
///
/// A success always lands in `Connected` with the counter cleared. A failure
/// while connected keeps the cached data and moves to `Error` without counting.
/// Any other failure counts, and the `max_retries`-th counted failure goes
/// `Offline`.
pub fn next_transition(
    previous: ConnectionStatus,
    succeeded: bool,
    retry_count: u32,
    max_retries: u32,
) -> Transition {
    if succeeded {
        return Transition {
            status: ConnectionStatus::Connected,
            retry_count: 0,
            message: MessageUpdate::Clear,
        };
    }

    if previous == ConnectionStatus::Connected {
        return Transition {
            status: ConnectionStatus::Error,
            retry_count,
            message: MessageUpdate::Set(LOST_CONNECTION_MESSAGE),
        };
    }

    let retry_count = retry_count.saturating_add(1);
    if retry_count >= max_retries {
        Transition {
            status: ConnectionStatus::Offline,
            retry_count,
            message: MessageUpdate::Set(OFFLINE_MESSAGE),
        }
    } else {
        Transition {
            status: ConnectionStatus::Connecting,
            retry_count,
            message: MessageUpdate::Keep,
        }
    }
}
