use std::sync::Arc;

use huddle_core::domain::team::AuthToken;
use huddle_db::BillingEventRepository;
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::channels::ChannelLinkService;

/// Process-wide services shared by every resolver.
#[derive(Clone)]
pub struct AppServices {
    pub channels: ChannelLinkService,
    pub billing_events: Arc<dyn BillingEventRepository>,
    pub server_secret: SecretString,
}

/// Built fresh for every operation. A user request carries the decoded bearer
/// token and the caller's socket id; a server-originated request carries the
/// internal server secret instead. `correlation_id` tags every log line the
/// operation emits.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub viewer: Option<AuthToken>,
    pub socket_id: Option<String>,
    pub correlation_id: String,
    server_secret: Option<SecretString>,
}

impl RequestContext {
    /// Starts with a generated `req_` id; see [`RequestContext::with_correlation_id`].
    pub fn for_user(viewer: Option<AuthToken>, socket_id: Option<String>) -> Self {
        Self { viewer, socket_id, correlation_id: new_request_id(), server_secret: None }
    }

    pub fn internal(server_secret: SecretString, correlation_id: impl Into<String>) -> Self {
        Self {
            viewer: None,
            socket_id: None,
            correlation_id: correlation_id.into(),
            server_secret: Some(server_secret),
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }

    pub fn carries_server_secret(&self, expected: &SecretString) -> bool {
        let Some(presented) = self.server_secret.as_ref() else {
            return false;
        };
        presented.expose_secret().as_bytes().ct_eq(expected.expose_secret().as_bytes()).into()
    }
}

pub fn new_request_id() -> String {
    format!("req_{}", Uuid::new_v4().simple())
}
