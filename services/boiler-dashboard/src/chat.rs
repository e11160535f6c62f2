//! Chat client for the boiler assistant
//!
//! Messages go to the mobile API first, then straight to the chatbot service.
//! When neither answers, a small table of cached replies keeps the
//! conversation going.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::ApiConfig;
use crate::io::HttpClient;
use crate::DashboardError;

/// Parsed intent reported by the chatbot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub action: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub confidence: f64,
}

/// Chatbot answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default)]
    pub action_taken: Option<String>,
    #[serde(default)]
    pub validated: bool,
    #[serde(default)]
    pub intent: Option<Intent>,
}

/// Where a reply came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    MobileApi,
    Chatbot,
    Cache,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub response: ChatResponse,
    pub source: ReplySource,
}

/// Ordered keyword table; the first matching entry wins
#[derive(Debug, Clone)]
pub struct CachedReplies {
    entries: Vec<(String, String)>,
}

impl CachedReplies {
    pub fn new<P, R>(entries: impl IntoIterator<Item = (P, R)>) -> Self
    where
        P: Into<String>,
        R: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(pattern, reply)| (pattern.into().to_lowercase(), reply.into()))
                .collect(),
        }
    }

    /// Reply for `message`, matching by substring containment in either direction
    pub fn lookup(&self, message: &str) -> Option<&str> {
        let message = message.trim().to_lowercase();
        if message.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|(pattern, _)| message.contains(pattern.as_str()) || pattern.contains(&message))
            .map(|(_, reply)| reply.as_str())
    }
}

impl Default for CachedReplies {
    fn default() -> Self {
        Self::new([
            (
                "temperatura",
                "Non riesco a raggiungere la caldaia. La dashboard mostra l'ultima temperatura nota.",
            ),
            (
                "temperature",
                "I can't reach the boiler right now. The dashboard shows the last known temperature.",
            ),
            (
                "schedule",
                "The heating schedule is 06:00 22°C, 09:00 19°C, 17:00 21°C, 22:00 18°C.",
            ),
            (
                "window",
                "Window sensors will update as soon as the connection is back.",
            ),
            (
                "energy",
                "This month's consumption is available on the Energy tab.",
            ),
            (
                "ciao",
                "Ciao! Sono offline al momento, ma posso rispondere a domande semplici.",
            ),
            (
                "hello",
                "Hello! I'm offline at the moment, but I can answer simple questions.",
            ),
        ])
    }
}

/// Chat client with mobile API, direct chatbot and cached fallbacks
pub struct ChatService {
    mobile_api_url: String,
    chatbot_url: String,
    entity_id: String,
    cached: CachedReplies,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field("mobile_api_url", &self.mobile_api_url)
            .field("chatbot_url", &self.chatbot_url)
            .finish()
    }
}

impl ChatService {
    pub fn new(config: &ApiConfig, http: Arc<dyn HttpClient>) -> Self {
        Self {
            mobile_api_url: config.base_url.trim_end_matches('/').to_string(),
            chatbot_url: config.chatbot_url.trim_end_matches('/').to_string(),
            entity_id: config.entity_id.clone(),
            cached: CachedReplies::default(),
            http,
        }
    }

    pub fn with_cached_replies(mut self, cached: CachedReplies) -> Self {
        self.cached = cached;
        self
    }

    /// Send a message about the configured entity
    pub async fn send(&self, message: &str) -> crate::Result<ChatReply> {
        self.send_message(message, &self.entity_id).await
    }

    pub async fn send_message(&self, message: &str, entity_id: &str) -> crate::Result<ChatReply> {
        let body = json!({ "message": message, "entity_id": entity_id });

        let via_api = format!("{}/chat", self.mobile_api_url);
        match self.post_chat(&via_api, &body).await {
            Ok(response) => {
                return Ok(ChatReply {
                    response,
                    source: ReplySource::MobileApi,
                })
            }
            Err(e) => tracing::warn!("Chat via mobile API failed: {}", e),
        }

        let direct = format!("{}/chat", self.chatbot_url);
        match self.post_chat(&direct, &body).await {
            Ok(response) => {
                return Ok(ChatReply {
                    response,
                    source: ReplySource::Chatbot,
                })
            }
            Err(e) => tracing::warn!("Chat via chatbot service failed: {}", e),
        }

        match self.cached.lookup(message) {
            Some(reply) => {
                tracing::debug!("Answering from cached replies");
                Ok(ChatReply {
                    response: ChatResponse {
                        response: reply.to_string(),
                        action_taken: None,
                        validated: false,
                        intent: None,
                    },
                    source: ReplySource::Cache,
                })
            }
            None => Err(DashboardError::Chat(
                "chat services unreachable and no cached reply".to_string(),
            )),
        }
    }

    async fn post_chat(&self, url: &str, body: &serde_json::Value) -> crate::Result<ChatResponse> {
        let response = self.http.post_json(url, body).await?;
        if !response.is_success() {
            return Err(DashboardError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }
        Ok(serde_json::from_str(&response.body)?)
    }

    /// Mobile API liveness
    pub async fn check_health(&self) -> bool {
        let root = self
            .mobile_api_url
            .strip_suffix("/api")
            .unwrap_or(&self.mobile_api_url);
        self.is_healthy(&format!("{}/health", root)).await
    }

    /// Chatbot service liveness
    pub async fn check_chatbot_health(&self) -> bool {
        self.is_healthy(&format!("{}/health", self.chatbot_url)).await
    }

    async fn is_healthy(&self, url: &str) -> bool {
        match self.http.get(url).await {
            Ok(response) => response.is_success(),
            Err(e) => {
                tracing::debug!("Health check {} failed: {}", url, e);
                false
            }
        }
    }
}
