use secrecy::ExposeSecret;
use sqlx::Row;

use huddle_core::domain::slack::Provider;
use huddle_core::domain::team::TeamId;

use super::{decode_timestamp, ProviderRepository, RepositoryError};
use crate::DbPool;

pub struct SqlProviderRepository {
    pool: DbPool,
}

impl SqlProviderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_provider(row: &sqlx::sqlite::SqliteRow) -> Result<Provider, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let team_id: String =
        row.try_get("team_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let service: String =
        row.try_get("service").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let access_token: Option<String> =
        row.try_get("access_token").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let is_active: bool =
        row.try_get("is_active").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Provider {
        id,
        team_id: TeamId(team_id),
        service,
        access_token: access_token.filter(|token| !token.is_empty()).map(Into::into),
        is_active,
        created_at: decode_timestamp(&created_at)?,
    })
}

#[async_trait::async_trait]
impl ProviderRepository for SqlProviderRepository {
    async fn find_active(
        &self,
        team_id: &TeamId,
        service: &str,
    ) -> Result<Option<Provider>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, team_id, service, access_token, is_active, created_at
             FROM provider
             WHERE team_id = ? AND service = ? AND is_active = 1
             ORDER BY created_at ASC
             LIMIT 1",
        )
        .bind(&team_id.0)
        .bind(service)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_provider).transpose()
    }

    async fn save(&self, provider: Provider) -> Result<(), RepositoryError> {
        let access_token = provider.access_token.as_ref().map(|token| token.expose_secret().to_string());
        sqlx::query(
            "INSERT INTO provider (id, team_id, service, access_token, is_active, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                team_id = excluded.team_id,
                service = excluded.service,
                access_token = excluded.access_token,
                is_active = excluded.is_active",
        )
        .bind(&provider.id)
        .bind(&provider.team_id.0)
        .bind(&provider.service)
        .bind(access_token)
        .bind(provider.is_active)
        .bind(provider.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
