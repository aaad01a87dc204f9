use std::sync::Arc;

use huddle_core::domain::slack::{SlackChannel, SlackChannelId, SLACK_SERVICE};
use huddle_core::domain::team::{AuthToken, TeamId, TeamMemberId};
use huddle_core::errors::ChannelLinkError;
use huddle_db::{ProviderRepository, SlackChannelRepository};
use huddle_slack::SlackWebApi;
use secrecy::ExposeSecret;
use serde_json::json;
use tracing::{info, warn};

use crate::pubsub::{team_topic, Notification, PubSub};

pub const SLACK_CHANNEL_ADDED: &str = "slackChannelAdded";

/// Links Slack channels to teams and lists the links. The caller must be a
/// member of the team named by the request.
#[derive(Clone)]
pub struct ChannelLinkService {
    providers: Arc<dyn ProviderRepository>,
    channels: Arc<dyn SlackChannelRepository>,
    slack: Arc<dyn SlackWebApi>,
    pubsub: PubSub,
}

impl ChannelLinkService {
    pub fn new(
        providers: Arc<dyn ProviderRepository>,
        channels: Arc<dyn SlackChannelRepository>,
        slack: Arc<dyn SlackWebApi>,
        pubsub: PubSub,
    ) -> Self {
        Self { providers, channels, slack, pubsub }
    }

    pub async fn add_slack_channel(
        &self,
        viewer: Option<&AuthToken>,
        team_member_id: &str,
        slack_channel_id: &str,
        mutator_id: Option<&str>,
        correlation_id: &str,
    ) -> Result<SlackChannel, ChannelLinkError> {
        let member = TeamMemberId::parse(team_member_id)?;
        let team_id = member.team_id;
        authorize(viewer, &team_id, correlation_id)?;

        let access_token = self
            .providers
            .find_active(&team_id, SLACK_SERVICE)
            .await
            .map_err(|error| ChannelLinkError::Persistence(error.to_string()))?
            .and_then(|provider| provider.access_token)
            .filter(|token| !token.expose_secret().is_empty())
            .ok_or_else(|| ChannelLinkError::ProviderNotFound {
                team_id: team_id.0.clone(),
                slack_channel_id: slack_channel_id.to_string(),
            })?;

        let response = self
            .slack
            .channel_info(&access_token, slack_channel_id)
            .await
            .map_err(|error| ChannelLinkError::Integration(error.to_string()))?;
        if !response.ok {
            let code = response.error.unwrap_or_else(|| "unknown_error".to_string());
            warn!(
                event_name = "slack.channel.lookup_rejected",
                correlation_id,
                team_id = %team_id,
                slack_channel_id,
                slack_error = %code,
                "slack rejected channel lookup"
            );
            return Err(ChannelLinkError::SlackPassthrough(code));
        }
        let info = response.channel.ok_or_else(|| {
            ChannelLinkError::Integration("slack response did not include a channel".to_string())
        })?;
        if info.is_archived {
            return Err(ChannelLinkError::ChannelArchived { name: info.name });
        }

        let channel =
            SlackChannel::new(SlackChannelId(slack_channel_id.to_string()), info.name, team_id);
        self.channels
            .insert(channel.clone())
            .await
            .map_err(|error| ChannelLinkError::Persistence(error.to_string()))?;

        self.pubsub.publish(Notification {
            topic: team_topic(SLACK_CHANNEL_ADDED, &channel.team_id),
            payload: json!({ SLACK_CHANNEL_ADDED: { "channel": &channel } }),
            mutator_id: mutator_id.map(str::to_string),
        });

        info!(
            event_name = "slack.channel.linked",
            correlation_id,
            team_id = %channel.team_id,
            slack_channel_id = %channel.channel_id.0,
            channel_name = %channel.name,
            "slack channel linked to team"
        );
        Ok(channel)
    }

    pub async fn list_slack_channels(
        &self,
        viewer: Option<&AuthToken>,
        team_id: &TeamId,
        correlation_id: &str,
    ) -> Result<Vec<SlackChannel>, ChannelLinkError> {
        authorize(viewer, team_id, correlation_id)?;
        self.channels
            .list_active_for_team(team_id)
            .await
            .map_err(|error| ChannelLinkError::Persistence(error.to_string()))
    }
}

fn authorize(
    viewer: Option<&AuthToken>,
    team_id: &TeamId,
    correlation_id: &str,
) -> Result<(), ChannelLinkError> {
    if viewer.is_some_and(|token| token.is_team_member(team_id)) {
        return Ok(());
    }
    warn!(
        event_name = "auth.team_access.denied",
        correlation_id,
        team_id = %team_id,
        viewer = viewer.map(|token| token.sub.as_str()).unwrap_or("anonymous"),
        "viewer is not a member of the team"
    );
    Err(ChannelLinkError::TeamAccess { team_id: team_id.0.clone() })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use huddle_core::domain::team::TeamId;
    use huddle_core::errors::ChannelLinkError;
    use huddle_db::{InMemorySlackChannelRepository, SlackChannelRepository};
    use huddle_slack::{ChannelInfo, ChannelInfoResponse};

    use super::ChannelLinkService;
    use crate::pubsub::PubSub;
    use crate::test_support::{member_token, provider_repository, StubSlackApi};

    fn service(
        response: ChannelInfoResponse,
    ) -> (ChannelLinkService, Arc<InMemorySlackChannelRepository>, Arc<StubSlackApi>, PubSub) {
        let channels = Arc::new(InMemorySlackChannelRepository::default());
        let slack = Arc::new(StubSlackApi::new(response));
        let pubsub = PubSub::new(16);
        let service = ChannelLinkService::new(
            provider_repository("team-1", Some("xoxp-team-1")),
            channels.clone(),
            slack.clone(),
            pubsub.clone(),
        );
        (service, channels, slack, pubsub)
    }

    fn active_channel(name: &str) -> ChannelInfoResponse {
        ChannelInfoResponse {
            ok: true,
            error: None,
            channel: Some(ChannelInfo {
                id: "C123".to_string(),
                name: name.to_string(),
                is_archived: false,
            }),
        }
    }

    #[tokio::test]
    async fn links_channel_and_notifies_the_team() {
        let (service, channels, slack, pubsub) = service(active_channel("general"));
        let mut notifications = pubsub.subscribe();
        let token = member_token("user-1", &["team-1"]);

        let channel = service
            .add_slack_channel(
                Some(&token),
                "user-1::team-1",
                "C123",
                Some("socket-9"),
                "req_test",
            )
            .await
            .expect("channel should be linked");

        assert_eq!(channel.name, "general");
        assert_eq!(channel.team_id, TeamId("team-1".to_string()));
        assert_eq!(channels.len().await, 1);
        assert_eq!(slack.calls().await, vec![("xoxp-team-1".to_string(), "C123".to_string())]);

        let notification = notifications.try_recv().expect("one notification");
        assert_eq!(notification.topic, "slackChannelAdded.team-1");
        assert_eq!(notification.mutator_id.as_deref(), Some("socket-9"));
        assert_eq!(notification.payload["slackChannelAdded"]["channel"]["name"], "general");
        assert!(notifications.try_recv().is_err());
    }

    #[tokio::test]
    async fn rejects_viewer_outside_the_team_before_any_lookup() {
        let (service, channels, slack, _) = service(active_channel("general"));
        let token = member_token("user-1", &["team-2"]);

        let error = service
            .add_slack_channel(Some(&token), "user-1::team-1", "C123", None, "req_test")
            .await
            .expect_err("viewer is not a member");

        assert_eq!(error, ChannelLinkError::TeamAccess { team_id: "team-1".to_string() });
        assert!(channels.is_empty().await);
        assert!(slack.calls().await.is_empty());
    }

    #[tokio::test]
    async fn anonymous_viewer_has_no_team_access() {
        let (service, channels, _, _) = service(active_channel("general"));

        let error = service
            .add_slack_channel(None, "user-1::team-1", "C123", None, "req_test")
            .await
            .expect_err("anonymous viewer");

        assert!(error.is_authorization());
        assert!(channels.is_empty().await);
    }

    #[tokio::test]
    async fn archived_channel_is_rejected_without_side_effects() {
        let mut archived = active_channel("old-standups");
        if let Some(channel) = archived.channel.as_mut() {
            channel.is_archived = true;
        }
        let (service, channels, _, pubsub) = service(archived);
        let mut notifications = pubsub.subscribe();
        let token = member_token("user-1", &["team-1"]);

        let error = service
            .add_slack_channel(Some(&token), "user-1::team-1", "C123", None, "req_test")
            .await
            .expect_err("archived channel");

        assert_eq!(error, ChannelLinkError::ChannelArchived { name: "old-standups".to_string() });
        assert!(channels.is_empty().await);
        assert!(notifications.try_recv().is_err());
    }

    #[tokio::test]
    async fn slack_errors_are_passed_through() {
        let (service, channels, _, _) = service(ChannelInfoResponse {
            ok: false,
            error: Some("channel_not_found".to_string()),
            channel: None,
        });
        let token = member_token("user-1", &["team-1"]);

        let error = service
            .add_slack_channel(Some(&token), "user-1::team-1", "C404", None, "req_test")
            .await
            .expect_err("slack rejected lookup");

        assert_eq!(error, ChannelLinkError::SlackPassthrough("channel_not_found".to_string()));
        assert!(channels.is_empty().await);
    }

    #[tokio::test]
    async fn missing_provider_is_reported_with_team_and_channel() {
        let channels = Arc::new(InMemorySlackChannelRepository::default());
        let slack = Arc::new(StubSlackApi::new(active_channel("general")));
        let service = ChannelLinkService::new(
            provider_repository("team-1", None),
            channels.clone(),
            slack.clone(),
            PubSub::default(),
        );
        let token = member_token("user-1", &["team-1"]);

        let error = service
            .add_slack_channel(Some(&token), "user-1::team-1", "C123", None, "req_test")
            .await
            .expect_err("no provider token");

        assert_eq!(
            error,
            ChannelLinkError::ProviderNotFound {
                team_id: "team-1".to_string(),
                slack_channel_id: "C123".to_string(),
            }
        );
        assert!(slack.calls().await.is_empty());
    }

    #[tokio::test]
    async fn malformed_member_id_is_a_domain_error() {
        let (service, _, _, _) = service(active_channel("general"));
        let token = member_token("user-1", &["team-1"]);

        let error = service
            .add_slack_channel(Some(&token), "user-1", "C123", None, "req_test")
            .await
            .expect_err("malformed member id");

        assert_eq!(error.code(), "BAD_REQUEST");
    }

    #[tokio::test]
    async fn lists_only_the_viewers_team_channels() {
        let (service, channels, _, _) = service(active_channel("general"));
        let token = member_token("user-1", &["team-1"]);
        service
            .add_slack_channel(Some(&token), "user-1::team-1", "C123", None, "req_test")
            .await
            .expect("linked");
        channels
            .insert(huddle_core::SlackChannel::new(
                huddle_core::SlackChannelId("C999".to_string()),
                "elsewhere",
                TeamId("team-2".to_string()),
            ))
            .await
            .expect("insert");

        let listed = service
            .list_slack_channels(Some(&token), &TeamId("team-1".to_string()), "req_test")
            .await
            .expect("member can list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "general");

        let denied = service
            .list_slack_channels(Some(&token), &TeamId("team-2".to_string()), "req_test")
            .await;
        assert!(matches!(denied, Err(ChannelLinkError::TeamAccess { .. })));
    }
}
