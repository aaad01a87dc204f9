use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum SlackApiError {
    #[error("slack request failed: {0}")]
    Transport(String),
    #[error("slack returned http status {0}")]
    Status(u16),
    #[error("slack response could not be decoded: {0}")]
    Decode(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_archived: bool,
}

/// Slack reports application failures in-band: `ok` is false and `error`
/// carries a code such as `channel_not_found`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChannelInfoResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub channel: Option<ChannelInfo>,
}

#[async_trait]
pub trait SlackWebApi: Send + Sync {
    async fn channel_info(
        &self,
        access_token: &SecretString,
        channel_id: &str,
    ) -> Result<ChannelInfoResponse, SlackApiError>;
}

#[derive(Clone, Debug)]
pub struct HttpSlackClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSlackClient {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self, SlackApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .map_err(|error| SlackApiError::Transport(error.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl SlackWebApi for HttpSlackClient {
    async fn channel_info(
        &self,
        access_token: &SecretString,
        channel_id: &str,
    ) -> Result<ChannelInfoResponse, SlackApiError> {
        let url = format!("{}/conversations.info", self.base_url);
        debug!(event_name = "slack.api.channel_info", channel_id, "requesting channel info");

        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token.expose_secret())
            .query(&[("channel", channel_id)])
            .send()
            .await
            .map_err(|error| {
                warn!(
                    event_name = "slack.api.transport_error",
                    channel_id,
                    error = %error,
                    "slack channel info request failed"
                );
                SlackApiError::Transport(error.to_string())
            })?;

        if !response.status().is_success() {
            return Err(SlackApiError::Status(response.status().as_u16()));
        }

        response
            .json::<ChannelInfoResponse>()
            .await
            .map_err(|error| SlackApiError::Decode(error.to_string()))
    }
}
