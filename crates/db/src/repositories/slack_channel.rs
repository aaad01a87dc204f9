use sqlx::Row;

use huddle_core::domain::slack::{SlackChannel, SlackChannelId};
use huddle_core::domain::team::TeamId;

use super::{decode_timestamp, RepositoryError, SlackChannelRepository};
use crate::DbPool;

pub struct SqlSlackChannelRepository {
    pool: DbPool,
}

impl SqlSlackChannelRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_channel(row: &sqlx::sqlite::SqliteRow) -> Result<SlackChannel, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let channel_id: String =
        row.try_get("channel_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let team_id: String =
        row.try_get("team_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let is_active: bool =
        row.try_get("is_active").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(SlackChannel {
        id,
        channel_id: SlackChannelId(channel_id),
        name,
        team_id: TeamId(team_id),
        is_active,
        created_at: decode_timestamp(&created_at)?,
    })
}

#[async_trait::async_trait]
impl SlackChannelRepository for SqlSlackChannelRepository {
    async fn insert(&self, channel: SlackChannel) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO slack_channel (id, channel_id, name, team_id, is_active, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&channel.id)
        .bind(&channel.channel_id.0)
        .bind(&channel.name)
        .bind(&channel.team_id.0)
        .bind(channel.is_active)
        .bind(channel.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_active_for_team(
        &self,
        team_id: &TeamId,
    ) -> Result<Vec<SlackChannel>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, channel_id, name, team_id, is_active, created_at
             FROM slack_channel
             WHERE team_id = ? AND is_active = 1
             ORDER BY created_at ASC",
        )
        .bind(&team_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_channel).collect()
    }
}
