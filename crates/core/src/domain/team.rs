use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamId(pub String);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Composite `<userId>::<teamId>` identifier of a team membership.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TeamMemberId {
    pub user_id: UserId,
    pub team_id: TeamId,
}

impl TeamMemberId {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let (user_id, team_id) = raw
            .split_once("::")
            .filter(|(user, team)| !user.is_empty() && !team.is_empty())
            .ok_or_else(|| DomainError::InvalidTeamMemberId(raw.to_string()))?;

        Ok(Self { user_id: UserId(user_id.to_string()), team_id: TeamId(team_id.to_string()) })
    }
}

impl fmt::Display for TeamMemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.user_id.0, self.team_id.0)
    }
}

/// Claims carried by a user's bearer token. `tms` lists the teams the user
/// belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub sub: String,
    #[serde(default)]
    pub tms: Vec<String>,
    pub exp: u64,
}

impl AuthToken {
    pub fn is_team_member(&self, team_id: &TeamId) -> bool {
        self.tms.iter().any(|team| team == &team_id.0)
    }
}
