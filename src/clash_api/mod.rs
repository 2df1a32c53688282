// Client for the official Clash Royale REST API.

pub mod models;

use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ClashApiConfig;
use crate::metrics;

pub use models::{ApiCard, Battle, GameMode, Participant, Player};

#[derive(Debug, thiserror::Error)]
pub enum ClashApiError {
    #[error("Clash Royale API key is not configured")]
    MissingApiKey,
    #[error("Clash Royale API error [{status}]: {message}")]
    Status { status: u16, message: String },
    #[error("Clash Royale API request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Clash Royale API returned an unexpected body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// How a failed call should be reported to API users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamFailure {
    Configuration,
    NotFound,
    Unauthorized,
    Forbidden,
    Generic,
}

impl ClashApiError {
    pub fn kind(&self) -> UpstreamFailure {
        match self {
            ClashApiError::MissingApiKey => UpstreamFailure::Configuration,
            ClashApiError::Status { status: 404, .. } => UpstreamFailure::NotFound,
            ClashApiError::Status { status: 401, .. } => UpstreamFailure::Unauthorized,
            ClashApiError::Status { status: 403, .. } => UpstreamFailure::Forbidden,
            _ => UpstreamFailure::Generic,
        }
    }
}

/// Encode a player tag for use in a URL path (`#` becomes `%23`).
pub fn format_tag(tag: &str) -> String {
    tag.replace('#', "%23")
}

/// Authenticated, stateless wrapper around the Clash Royale API.
#[derive(Debug, Clone)]
pub struct ClashRoyaleClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ClashRoyaleClient {
    /// Build a client. Fails when no API key is configured.
    pub fn new(config: &ClashApiConfig) -> Result<Self, ClashApiError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ClashApiError::MissingApiKey)?
            .to_string();

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// URL of a player's profile.
    pub fn player_url(&self, tag: &str) -> String {
        format!("{}/players/{}", self.base_url, format_tag(tag))
    }

    /// URL of a player's battle log.
    pub fn battle_log_url(&self, tag: &str) -> String {
        format!("{}/players/{}/battlelog", self.base_url, format_tag(tag))
    }

    /// Fetch a player's profile.
    pub async fn get_player(&self, tag: &str) -> Result<Player, ClashApiError> {
        self.get_json("get_player", &self.player_url(tag), "Failed to fetch player data")
            .await
    }

    /// Fetch a player's recent battles, most recent first.
    pub async fn get_player_battles(&self, tag: &str) -> Result<Vec<Battle>, ClashApiError> {
        let raw: Vec<Value> = self
            .get_json(
                "get_player_battles",
                &self.battle_log_url(tag),
                "Failed to fetch battle log",
            )
            .await?;
        raw.into_iter()
            .map(|value| Battle::from_value(value).map_err(ClashApiError::from))
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|e| tracing::error!("Clash Royale API error (get_player_battles): {e}"))
    }

    /// Fetch the battle at `index` in the log (0 is the most recent).
    /// Returns `None` when the log is shorter than that.
    pub async fn get_battle_by_index(
        &self,
        tag: &str,
        index: usize,
    ) -> Result<Option<Battle>, ClashApiError> {
        let mut battles = self.get_player_battles(tag).await?;
        if index < battles.len() {
            Ok(Some(battles.swap_remove(index)))
        } else {
            Ok(None)
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        url: &str,
        fallback_message: &str,
    ) -> Result<T, ClashApiError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .inspect_err(|e| {
                metrics::CLASH_API_REQUESTS_TOTAL
                    .with_label_values(&[operation, "error"])
                    .inc();
                tracing::error!("Clash Royale API error ({operation}): {e}");
            })?;

        let status = response.status();
        metrics::CLASH_API_REQUESTS_TOTAL
            .with_label_values(&[operation, status.as_str()])
            .inc();

        let body = response.text().await.inspect_err(|e| {
            tracing::error!("Clash Royale API error ({operation}): {e}");
        })?;

        if !status.is_success() {
            let message = error_message(&body, fallback_message);
            tracing::error!(
                status = status.as_u16(),
                "Clash Royale API error ({operation}): Status {} - {message}",
                status.as_u16()
            );
            return Err(ClashApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Clash Royale API error ({operation}): {e}");
            ClashApiError::Decode(e)
        })
    }
}

/// Best-effort message for a failed call: the JSON `message` field, else the
/// raw body, else the fallback.
fn error_message(body: &str, fallback: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(message) = json.get("message").and_then(Value::as_str) {
            return message.to_string();
        }
    }
    if body.trim().is_empty() {
        fallback.to_string()
    } else {
        body.to_string()
    }
}
