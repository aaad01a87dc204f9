use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid team member id `{0}` (expected `<userId>::<teamId>`)")]
    InvalidTeamMemberId(String),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("integration failure: {0}")]
    Integration(String),
}

impl ApplicationError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Domain(_) => "BAD_REQUEST",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Persistence(_) | Self::Integration(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

/// Rejections produced while linking a Slack channel to a team. None of them
/// leave a side effect behind.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChannelLinkError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("viewer does not have access to team `{team_id}`")]
    TeamAccess { team_id: String },
    #[error("no active slack provider for team `{team_id}` (channel `{slack_channel_id}`)")]
    ProviderNotFound { team_id: String, slack_channel_id: String },
    #[error("slack rejected the request: {0}")]
    SlackPassthrough(String),
    #[error("slack channel `{name}` is archived")]
    ChannelArchived { name: String },
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl ChannelLinkError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Domain(_) => "BAD_REQUEST",
            Self::TeamAccess { .. } => "TEAM_ACCESS",
            Self::ProviderNotFound { .. } => "SLACK_PROVIDER_NOT_FOUND",
            Self::SlackPassthrough(_) => "SLACK_ERROR",
            Self::ChannelArchived { .. } => "SLACK_CHANNEL_ARCHIVED",
            Self::Integration(_) | Self::Persistence(_) => "SERVICE_UNAVAILABLE",
        }
    }

    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::TeamAccess { .. })
    }
}
