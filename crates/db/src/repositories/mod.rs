use async_trait::async_trait;
use thiserror::Error;

use huddle_core::domain::billing::{BillingEvent, BillingEventKind};
use huddle_core::domain::slack::{Provider, SlackChannel};
use huddle_core::domain::team::TeamId;

pub mod billing_event;
pub mod memory;
pub mod provider;
pub mod slack_channel;

pub use billing_event::SqlBillingEventRepository;
pub use memory::{
    InMemoryBillingEventRepository, InMemoryProviderRepository, InMemorySlackChannelRepository,
};
pub use provider::SqlProviderRepository;
pub use slack_channel::SqlSlackChannelRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait ProviderRepository: Send + Sync {
    /// First active provider of `service` for the team, if any.
    async fn find_active(
        &self,
        team_id: &TeamId,
        service: &str,
    ) -> Result<Option<Provider>, RepositoryError>;

    async fn save(&self, provider: Provider) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait SlackChannelRepository: Send + Sync {
    async fn insert(&self, channel: SlackChannel) -> Result<(), RepositoryError>;

    async fn list_active_for_team(
        &self,
        team_id: &TeamId,
    ) -> Result<Vec<SlackChannel>, RepositoryError>;
}

#[async_trait]
pub trait BillingEventRepository: Send + Sync {
    /// Stores the event unless one with the same kind and object id exists.
    /// Returns the stored row either way.
    async fn record(&self, event: BillingEvent) -> Result<BillingEvent, RepositoryError>;

    async fn find(
        &self,
        kind: BillingEventKind,
        object_id: &str,
    ) -> Result<Option<BillingEvent>, RepositoryError>;
}

pub(crate) fn decode_timestamp(
    raw: &str,
) -> Result<chrono::DateTime<chrono::Utc>, RepositoryError> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|value| value.with_timezone(&chrono::Utc))
        .map_err(|error| RepositoryError::Decode(format!("invalid timestamp `{raw}`: {error}")))
}
