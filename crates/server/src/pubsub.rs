use huddle_core::domain::team::TeamId;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

const DEFAULT_CAPACITY: usize = 256;

/// A message fanned out to every connected client of a team. `mutator_id` is
/// the socket of the client that caused it so that client can skip it.
#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub topic: String,
    pub payload: Value,
    pub mutator_id: Option<String>,
}

pub fn team_topic(event: &str, team_id: &TeamId) -> String {
    format!("{event}.{team_id}")
}

#[derive(Clone, Debug)]
pub struct PubSub {
    sender: broadcast::Sender<Notification>,
}

impl Default for PubSub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl PubSub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns how many subscribers received the notification. Zero
    /// subscribers is not an error.
    pub fn publish(&self, notification: Notification) -> usize {
        let topic = notification.topic.clone();
        let delivered = self.sender.send(notification).unwrap_or(0);
        debug!(event_name = "pubsub.published", topic = %topic, delivered, "notification published");
        delivered
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}
