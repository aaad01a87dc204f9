use sqlx::Row;

use huddle_core::domain::billing::{BillingEvent, BillingEventKind};

use super::{decode_timestamp, BillingEventRepository, RepositoryError};
use crate::DbPool;

pub struct SqlBillingEventRepository {
    pool: DbPool,
}

impl SqlBillingEventRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> Result<BillingEvent, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let kind: String = row.try_get("kind").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let object_id: String =
        row.try_get("object_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let received_at: String =
        row.try_get("received_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let kind = BillingEventKind::parse(&kind)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown billing event kind `{kind}`")))?;

    Ok(BillingEvent { id, kind, object_id, received_at: decode_timestamp(&received_at)? })
}

#[async_trait::async_trait]
impl BillingEventRepository for SqlBillingEventRepository {
    async fn record(&self, event: BillingEvent) -> Result<BillingEvent, RepositoryError> {
        sqlx::query(
            "INSERT INTO billing_event (id, kind, object_id, received_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(kind, object_id) DO NOTHING",
        )
        .bind(&event.id)
        .bind(event.kind.as_str())
        .bind(&event.object_id)
        .bind(event.received_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        self.find(event.kind, &event.object_id).await?.ok_or_else(|| {
            RepositoryError::Decode(format!(
                "billing event {}/{} vanished after insert",
                event.kind, event.object_id
            ))
        })
    }

    async fn find(
        &self,
        kind: BillingEventKind,
        object_id: &str,
    ) -> Result<Option<BillingEvent>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, kind, object_id, received_at
             FROM billing_event
             WHERE kind = ? AND object_id = ?",
        )
        .bind(kind.as_str())
        .bind(object_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_event).transpose()
    }
}
