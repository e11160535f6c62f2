//! Error types for the boiler dashboard

/// Errors that can occur in the boiler dashboard
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Unexpected HTTP status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Request timeout")]
    Timeout,

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot send commands while offline")]
    Offline,

    #[error("Command rejected: {0}")]
    Command(String),

    #[error("Chat error: {0}")]
    Chat(String),
}

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, DashboardError>;
