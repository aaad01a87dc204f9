pub mod billing;
pub mod config;
pub mod domain;
pub mod errors;

pub use billing::{
    classify, DispatchEntry, DispatchTable, EventClassification, SignatureError, WebhookEvent,
    WebhookVerifier,
};
pub use domain::billing::{BillingEvent, BillingEventKind};
pub use domain::slack::{Provider, SlackChannel, SlackChannelId, SLACK_SERVICE};
pub use domain::team::{AuthToken, TeamId, TeamMemberId, UserId};
pub use errors::{ApplicationError, ChannelLinkError, DomainError};
