use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::domain::team::TeamId;

pub const SLACK_SERVICE: &str = "slack";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlackChannelId(pub String);

/// A Slack channel linked to a team. `channel_id` is Slack's own identifier,
/// `id` is ours.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackChannel {
    pub id: String,
    pub channel_id: SlackChannelId,
    pub name: String,
    pub team_id: TeamId,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl SlackChannel {
    pub fn new(channel_id: SlackChannelId, name: impl Into<String>, team_id: TeamId) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            channel_id,
            name: name.into(),
            team_id,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

/// A team's credential for a third-party service.
#[derive(Clone, Debug)]
pub struct Provider {
    pub id: String,
    pub team_id: TeamId,
    pub service: String,
    pub access_token: Option<SecretString>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Provider {
    pub fn new(team_id: TeamId, service: impl Into<String>, access_token: SecretString) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            team_id,
            service: service.into(),
            access_token: Some(access_token),
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
