use std::collections::HashMap;

use tokio::sync::RwLock;

use huddle_core::domain::billing::{BillingEvent, BillingEventKind};
use huddle_core::domain::slack::{Provider, SlackChannel};
use huddle_core::domain::team::TeamId;

use super::{BillingEventRepository, ProviderRepository, RepositoryError, SlackChannelRepository};

#[derive(Default)]
pub struct InMemoryProviderRepository {
    providers: RwLock<Vec<Provider>>,
}

impl InMemoryProviderRepository {
    pub fn with_providers(providers: Vec<Provider>) -> Self {
        Self { providers: RwLock::new(providers) }
    }
}

#[async_trait::async_trait]
impl ProviderRepository for InMemoryProviderRepository {
    async fn find_active(
        &self,
        team_id: &TeamId,
        service: &str,
    ) -> Result<Option<Provider>, RepositoryError> {
        let providers = self.providers.read().await;
        Ok(providers
            .iter()
            .find(|provider| {
                &provider.team_id == team_id && provider.service == service && provider.is_active
            })
            .cloned())
    }

    async fn save(&self, provider: Provider) -> Result<(), RepositoryError> {
        let mut providers = self.providers.write().await;
        providers.retain(|existing| existing.id != provider.id);
        providers.push(provider);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemorySlackChannelRepository {
    channels: RwLock<Vec<SlackChannel>>,
}

impl InMemorySlackChannelRepository {
    pub async fn len(&self) -> usize {
        self.channels.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.channels.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl SlackChannelRepository for InMemorySlackChannelRepository {
    async fn insert(&self, channel: SlackChannel) -> Result<(), RepositoryError> {
        let mut channels = self.channels.write().await;
        channels.push(channel);
        Ok(())
    }

    async fn list_active_for_team(
        &self,
        team_id: &TeamId,
    ) -> Result<Vec<SlackChannel>, RepositoryError> {
        let channels = self.channels.read().await;
        Ok(channels
            .iter()
            .filter(|channel| &channel.team_id == team_id && channel.is_active)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryBillingEventRepository {
    events: RwLock<HashMap<(BillingEventKind, String), BillingEvent>>,
}

#[async_trait::async_trait]
impl BillingEventRepository for InMemoryBillingEventRepository {
    async fn record(&self, event: BillingEvent) -> Result<BillingEvent, RepositoryError> {
        let mut events = self.events.write().await;
        let stored = events.entry((event.kind, event.object_id.clone())).or_insert(event);
        Ok(stored.clone())
    }

    async fn find(
        &self,
        kind: BillingEventKind,
        object_id: &str,
    ) -> Result<Option<BillingEvent>, RepositoryError> {
        let events = self.events.read().await;
        Ok(events.get(&(kind, object_id.to_string())).cloned())
    }
}
