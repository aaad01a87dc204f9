use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use huddle_core::domain::slack::{Provider, SLACK_SERVICE};
use huddle_core::domain::team::{AuthToken, TeamId};
use huddle_db::{
    InMemoryBillingEventRepository, InMemoryProviderRepository, InMemorySlackChannelRepository,
};
use huddle_slack::{ChannelInfo, ChannelInfoResponse, SlackApiError, SlackWebApi};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;

use crate::channels::ChannelLinkService;
use crate::graphql::{build_schema, AppServices, HuddleSchema, RequestContext};
use crate::pubsub::PubSub;

pub const WEBHOOK_SECRET: &str = "whsec_test_signing_secret";
pub const SERVER_SECRET: &str = "internal-server-secret";

pub fn member_token(user_id: &str, teams: &[&str]) -> AuthToken {
    AuthToken {
        sub: user_id.to_string(),
        tms: teams.iter().map(|team| team.to_string()).collect(),
        exp: (Utc::now().timestamp() + 3600) as u64,
    }
}

pub fn provider_repository(team_id: &str, access_token: Option<&str>) -> Arc<InMemoryProviderRepository> {
    Arc::new(InMemoryProviderRepository::with_providers(vec![Provider {
        id: format!("provider-{team_id}"),
        team_id: TeamId(team_id.to_string()),
        service: SLACK_SERVICE.to_string(),
        access_token: access_token.map(|token| SecretString::from(token.to_string())),
        is_active: true,
        created_at: Utc::now(),
    }]))
}

pub struct StubSlackApi {
    response: ChannelInfoResponse,
    calls: Mutex<Vec<(String, String)>>,
}

impl StubSlackApi {
    pub fn new(response: ChannelInfoResponse) -> Self {
        Self { response, calls: Mutex::new(Vec::new()) }
    }

    pub async fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl SlackWebApi for StubSlackApi {
    async fn channel_info(
        &self,
        access_token: &SecretString,
        channel_id: &str,
    ) -> Result<ChannelInfoResponse, SlackApiError> {
        self.calls
            .lock()
            .await
            .push((access_token.expose_secret().to_string(), channel_id.to_string()));
        Ok(self.response.clone())
    }
}

/// Schema wired to in-memory repositories and a Slack stub that reports an
/// active `#general` channel for team-1.
pub struct TestHarness {
    pub schema: HuddleSchema,
    pub channels: Arc<InMemorySlackChannelRepository>,
    pub billing_events: Arc<InMemoryBillingEventRepository>,
    pub pubsub: PubSub,
}

impl TestHarness {
    pub fn new() -> Self {
        let channels = Arc::new(InMemorySlackChannelRepository::default());
        let billing_events = Arc::new(InMemoryBillingEventRepository::default());
        let pubsub = PubSub::new(16);
        let slack = Arc::new(StubSlackApi::new(ChannelInfoResponse {
            ok: true,
            error: None,
            channel: Some(ChannelInfo {
                id: "C123".to_string(),
                name: "general".to_string(),
                is_archived: false,
            }),
        }));

        let services = AppServices {
            channels: ChannelLinkService::new(
                provider_repository("team-1", Some("xoxp-team-1")),
                channels.clone(),
                slack,
                pubsub.clone(),
            ),
            billing_events: billing_events.clone(),
            server_secret: SecretString::from(SERVER_SECRET.to_string()),
        };

        Self { schema: build_schema(services), channels, billing_events, pubsub }
    }

    pub fn internal_context(&self) -> RequestContext {
        RequestContext::internal(SecretString::from(SERVER_SECRET.to_string()), "evt_test")
    }
}
