use async_graphql::{Context, InputObject, Object, Result, SimpleObject, ID};
use huddle_core::domain::slack::SlackChannel;
use huddle_core::domain::team::TeamId;
use huddle_core::errors::ChannelLinkError;

use super::{coded_error, AppServices, RequestContext};

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "SlackChannel")]
pub struct SlackChannelNode {
    pub id: ID,
    pub channel_id: ID,
    pub name: String,
    pub team_id: ID,
    pub is_active: bool,
    pub created_at: String,
}

impl From<SlackChannel> for SlackChannelNode {
    fn from(channel: SlackChannel) -> Self {
        Self {
            id: ID(channel.id),
            channel_id: ID(channel.channel_id.0),
            name: channel.name,
            team_id: ID(channel.team_id.0),
            is_active: channel.is_active,
            created_at: channel.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, InputObject)]
pub struct AddSlackChannelInput {
    pub team_member_id: ID,
    pub slack_channel_id: ID,
}

#[derive(Debug, SimpleObject)]
pub struct AddSlackChannelPayload {
    pub channel: SlackChannelNode,
}

#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Active Slack channels linked to a team the viewer belongs to.
    async fn slack_channels(&self, ctx: &Context<'_>, team_id: ID) -> Result<Vec<SlackChannelNode>> {
        let services = ctx.data::<AppServices>()?;
        let request = ctx.data::<RequestContext>()?;

        let channels = services
            .channels
            .list_slack_channels(
                request.viewer.as_ref(),
                &TeamId(team_id.0),
                &request.correlation_id,
            )
            .await
            .map_err(link_error)?;
        Ok(channels.into_iter().map(SlackChannelNode::from).collect())
    }
}

#[derive(Default)]
pub struct ChannelMutations;

#[Object]
impl ChannelMutations {
    /// Links a Slack channel to the team named in `teamMemberId`.
    async fn add_slack_channel(
        &self,
        ctx: &Context<'_>,
        input: AddSlackChannelInput,
    ) -> Result<AddSlackChannelPayload> {
        let services = ctx.data::<AppServices>()?;
        let request = ctx.data::<RequestContext>()?;

        let channel = services
            .channels
            .add_slack_channel(
                request.viewer.as_ref(),
                input.team_member_id.as_str(),
                input.slack_channel_id.as_str(),
                request.socket_id.as_deref(),
                &request.correlation_id,
            )
            .await
            .map_err(link_error)?;

        Ok(AddSlackChannelPayload { channel: channel.into() })
    }
}

fn link_error(error: ChannelLinkError) -> async_graphql::Error {
    coded_error(error.to_string(), error.code())
}
